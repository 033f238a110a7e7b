//! Cart API endpoints
//!
//! Carts are keyed by the authenticated user when a bearer token is present,
//! otherwise by the anonymous cart cookie. A new anonymous cookie is only
//! issued once a cart has actually been written.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::api::middleware::OptionalUser;
use crate::api::state::{AppState, CartCookieSettings};
use crate::api::types::{AddItemRequest, ApiError, CartResponse, Json, UpdateItemRequest};
use crate::domain::cart::{existing_cart_key, resolve_cart_key, CartKey};
use crate::infrastructure::cart::{AddItemOutcome, UpdateItemOutcome};

/// Create the cart router
pub fn create_cart_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/", delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/{product_id}", put(update_item))
        .route("/items/{product_id}", delete(remove_item))
}

/// Cookie carrying a freshly minted anonymous cart identifier
pub fn anonymous_cart_cookie(settings: &CartCookieSettings, cart_id: &str) -> Cookie<'static> {
    let max_age = time::Duration::seconds(settings.max_age.as_secs() as i64);

    Cookie::build((settings.name.clone(), cart_id.to_string()))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Removal cookie matching [`anonymous_cart_cookie`]
pub fn expired_cart_cookie(settings: &CartCookieSettings) -> Cookie<'static> {
    Cookie::build(settings.name.clone()).path("/").build()
}

fn anonymous_id<'a>(jar: &'a CookieJar, state: &AppState) -> Option<&'a str> {
    jar.get(&state.cart_cookie.name).map(|cookie| cookie.value())
}

fn existing_key(jar: &CookieJar, state: &AppState, user: &OptionalUser) -> Result<CartKey, ApiError> {
    existing_cart_key(anonymous_id(jar, state), user.user_id())
        .ok_or_else(|| ApiError::bad_request("No cart identifier supplied"))
}

/// GET /api/cart
pub async fn get_cart(
    State(state): State<AppState>,
    user: OptionalUser,
    jar: CookieJar,
) -> Result<Json<CartResponse>, ApiError> {
    let resolved = resolve_cart_key(anonymous_id(&jar, &state), user.user_id());

    // A key minted for this request cannot exist yet
    if resolved.minted {
        return Ok(Json(CartResponse::empty()));
    }

    let cart = state.cart_service.get_cart(&resolved.key).await?;

    Ok(Json(
        cart.as_ref()
            .map(CartResponse::from)
            .unwrap_or_else(CartResponse::empty),
    ))
}

/// POST /api/cart/items
pub async fn add_item(
    State(state): State<AppState>,
    user: OptionalUser,
    jar: CookieJar,
    Json(request): Json<AddItemRequest>,
) -> Result<(CookieJar, Json<CartResponse>), ApiError> {
    let resolved = resolve_cart_key(anonymous_id(&jar, &state), user.user_id());

    let outcome = state
        .cart_service
        .add_item(&resolved.key, request.product_id, request.quantity)
        .await?;

    match outcome {
        AddItemOutcome::Added(cart) => {
            let jar = if resolved.minted {
                jar.add(anonymous_cart_cookie(&state.cart_cookie, resolved.key.as_str()))
            } else {
                jar
            };

            Ok((jar, Json(CartResponse::from(&cart))))
        }
        AddItemOutcome::Rejected(reason) => Err(ApiError::rejected(&reason)),
    }
}

/// PUT /api/cart/items/{product_id}
pub async fn update_item(
    State(state): State<AppState>,
    user: OptionalUser,
    jar: CookieJar,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let key = existing_key(&jar, &state, &user)?;

    match state
        .cart_service
        .update_item(&key, product_id, request.quantity)
        .await?
    {
        UpdateItemOutcome::Updated(cart) => Ok(Json(CartResponse::from(&cart))),
        UpdateItemOutcome::NotFound => Err(ApiError::not_found(format!(
            "Product '{}' is not in the cart",
            product_id
        ))),
        UpdateItemOutcome::Rejected(reason) => Err(ApiError::rejected(&reason)),
    }
}

/// DELETE /api/cart/items/{product_id}
pub async fn remove_item(
    State(state): State<AppState>,
    user: OptionalUser,
    jar: CookieJar,
    Path(product_id): Path<Uuid>,
) -> Result<Json<CartResponse>, ApiError> {
    let key = existing_key(&jar, &state, &user)?;

    let cart = state
        .cart_service
        .remove_item(&key, product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cart not found"))?;

    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /api/cart
///
/// Called once an order has been placed from the cart.
pub async fn clear_cart(
    State(state): State<AppState>,
    user: OptionalUser,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    let Some(key) = existing_cart_key(anonymous_id(&jar, &state), user.user_id()) else {
        return Ok((jar, StatusCode::NO_CONTENT));
    };

    state.cart_service.delete_cart(&key).await?;

    let jar = if key.is_anonymous() {
        jar.remove(expired_cart_cookie(&state.cart_cookie))
    } else {
        jar
    };

    Ok((jar, StatusCode::NO_CONTENT))
}
