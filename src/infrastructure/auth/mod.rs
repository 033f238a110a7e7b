//! Authentication infrastructure module
//!
//! JWT issuance and the per-request token validation hook.

mod jwt;
mod validator;

pub use jwt::{IssuedToken, JwtClaims, JwtConfig, JwtGenerator, JwtService};
pub use validator::{TokenRejection, TokenValidation, TokenValidator};
