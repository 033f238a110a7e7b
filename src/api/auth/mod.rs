//! Authentication API endpoints
//!
//! Registration creates customer accounts. Login folds the caller's anonymous
//! cart into their user cart; logout revokes the presented token until it
//! would have expired anyway.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::cart::expired_cart_cookie;
use crate::api::middleware::{RequireAdmin, RequireUser};
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::user::{User, UserRole};
use crate::infrastructure::user::CreateUserRequest;

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
        .route("/admin-only", get(admin_only))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
    pub expires_at: String,
}

/// User response (safe to expose)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().as_str().to_string(),
            email: user.email().to_string(),
            name: user.name().to_string(),
            role: user.role(),
            created_at: user.created_at().to_rfc3339(),
            last_login_at: user.last_login_at().map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a customer account
///
/// POST /api/auth/register
///
/// No token is issued; the caller logs in afterwards.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }

    let user = state
        .user_service
        .create(CreateUserRequest {
            id: None,
            email: request.email,
            name: request.name.trim().to_string(),
            password: request.password,
            role: UserRole::Customer,
        })
        .await?;

    info!(user_id = %user.id(), "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Login with email and password
///
/// POST /api/auth/login
///
/// A cart held under the anonymous cookie is merged into the user's cart and
/// the cookie is cleared. The merge never fails the login.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let user = state
        .user_service
        .authenticate(&request.email, &request.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let issued = state.jwt_service.generate(&user)?;

    let anonymous_id = jar
        .get(&state.cart_cookie.name)
        .map(|cookie| cookie.value().to_string());

    let jar = match anonymous_id {
        Some(anonymous_id) => {
            let outcome = state
                .cart_service
                .merge_on_login(&anonymous_id, user.id().as_str())
                .await;
            debug!(user_id = %user.id(), ?outcome, "Merged anonymous cart on login");

            jar.remove(expired_cart_cookie(&state.cart_cookie))
        }
        None => jar,
    };

    info!(user_id = %user.id(), "User logged in");

    Ok((
        jar,
        Json(LoginResponse {
            token: issued.access_token,
            user: UserResponse::from(&user),
            expires_at: issued.expires_at.to_rfc3339(),
        }),
    ))
}

/// Logout by revoking the presented token
///
/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
) -> Json<MessageResponse> {
    match (claims.jti(), claims.expires_at()) {
        (Some(jti), Some(expires_at)) => {
            state.revocations.revoke(jti, expires_at).await;
            info!(user_id = %claims.user_id(), jti = %jti, "Token revoked on logout");
        }
        _ => debug!(user_id = %claims.user_id(), "Token has no identifier to revoke"),
    }

    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

/// Get current authenticated user
///
/// GET /api/auth/me
pub async fn get_current_user(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .get(claims.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /api/auth/admin-only
pub async fn admin_only(RequireAdmin(claims): RequireAdmin) -> Json<MessageResponse> {
    debug!(user_id = %claims.user_id(), "Admin endpoint accessed");

    Json(MessageResponse {
        message: "Welcome, admin".to_string(),
    })
}
