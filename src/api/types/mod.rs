//! HTTP request, response and error types

pub mod cart;
pub mod error;
pub mod json;

pub use cart::{AddItemRequest, CartItemResponse, CartResponse, UpdateItemRequest};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
