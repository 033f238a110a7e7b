//! User authentication extractors using JWT tokens

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::user::UserRole;
use crate::infrastructure::auth::{JwtClaims, TokenRejection, TokenValidation};

/// Extractor that requires a valid, unrevoked JWT
///
/// Extracts the JWT token from:
/// - Authorization header: `Bearer <jwt_token>`
#[derive(Debug, Clone)]
pub struct RequireUser(pub JwtClaims);

/// Extractor for routes open to anonymous callers
///
/// No Authorization header yields `None`. A header carrying an invalid or
/// revoked token is rejected rather than treated as anonymous.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<JwtClaims>);

impl OptionalUser {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(JwtClaims::user_id)
    }
}

/// Extractor that requires a valid token issued to an admin
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub JwtClaims);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_jwt_token(&parts.headers)?;
        let claims = authenticate(&token, state).await?;

        Ok(RequireUser(claims))
    }
}

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(OptionalUser(None));
        }

        let token = extract_jwt_token(&parts.headers)?;
        let claims = authenticate(&token, state).await?;

        Ok(OptionalUser(Some(claims)))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(claims) = RequireUser::from_request_parts(parts, state).await?;

        if claims.role != UserRole::Admin {
            debug!(user_id = %claims.user_id(), "Admin access denied");
            return Err(ApiError::forbidden("Admin access required"));
        }

        Ok(RequireAdmin(claims))
    }
}

async fn authenticate(token: &str, state: &AppState) -> Result<JwtClaims, ApiError> {
    debug!("Validating JWT token");

    match state.token_validator.validate(token).await {
        TokenValidation::Accepted(claims) => Ok(claims),
        TokenValidation::Rejected(TokenRejection::Revoked) => {
            Err(ApiError::unauthorized("Token has been revoked").with_code("token_revoked"))
        }
        TokenValidation::Rejected(TokenRejection::Invalid(reason)) => {
            Err(ApiError::unauthorized(format!("Invalid token: {}", reason))
                .with_code("invalid_token"))
        }
    }
}

/// Extract JWT token from Authorization header
pub fn extract_jwt_token(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    Err(ApiError::unauthorized(
        "Authentication required. Provide JWT token via 'Authorization: Bearer <token>' header",
    ))
}
