//! Bearer token validation with revocation check

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::revocation::RevocationStore;

use super::jwt::{JwtClaims, JwtGenerator};

/// Why a presented token was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    /// Bad signature, expired, wrong issuer or audience, or malformed
    Invalid(String),
    /// The token's identifier is on the revocation list
    Revoked,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(reason) => write!(f, "{}", reason),
            Self::Revoked => write!(f, "Token has been revoked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenValidation {
    Accepted(JwtClaims),
    Rejected(TokenRejection),
}

/// Runs after signature checks on every authenticated request
///
/// Performs at most one revocation lookup. Tokens without an identifier are
/// accepted since they cannot be revoked.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    jwt: Arc<dyn JwtGenerator>,
    revocations: Arc<dyn RevocationStore>,
}

impl TokenValidator {
    pub fn new(jwt: Arc<dyn JwtGenerator>, revocations: Arc<dyn RevocationStore>) -> Self {
        Self { jwt, revocations }
    }

    pub async fn validate(&self, token: &str) -> TokenValidation {
        let claims = match self.jwt.validate(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Rejected token");
                return TokenValidation::Rejected(TokenRejection::Invalid(e.to_string()));
            }
        };

        let Some(jti) = claims.jti() else {
            warn!(user_id = %claims.sub, "Token has no JTI, skipping revocation check");
            return TokenValidation::Accepted(claims);
        };

        if self.revocations.is_revoked(jti).await {
            debug!(jti = %jti, user_id = %claims.sub, "Rejected revoked token");
            return TokenValidation::Rejected(TokenRejection::Revoked);
        }

        TokenValidation::Accepted(claims)
    }
}
