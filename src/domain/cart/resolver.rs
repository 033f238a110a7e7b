//! Cart key resolution from request identity

use uuid::Uuid;

use super::key::CartKey;

/// Outcome of resolving the cart key for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCartKey {
    pub key: CartKey,
    /// The key was generated for this request and the client does not hold
    /// it yet. Hand it out only once a cart has actually been written.
    pub minted: bool,
}

/// Derive the canonical cart key for a request.
///
/// An authenticated user always wins: the anonymous identifier is ignored here
/// and only consumed once, at login, by the merge. Without either identifier
/// a fresh anonymous key is minted. Empty identifiers count as absent, and so
/// do anonymous identifiers that are not UUIDs.
pub fn resolve_cart_key(anonymous_id: Option<&str>, user_id: Option<&str>) -> ResolvedCartKey {
    if let Some(key) = existing_cart_key(anonymous_id, user_id) {
        return ResolvedCartKey { key, minted: false };
    }

    ResolvedCartKey {
        key: CartKey::anonymous(Uuid::new_v4().to_string()),
        minted: true,
    }
}

/// Like [`resolve_cart_key`] but never mints; `None` when the request carries
/// no usable identifier. An anonymous identifier that is not a UUID is
/// ignored.
pub fn existing_cart_key(anonymous_id: Option<&str>, user_id: Option<&str>) -> Option<CartKey> {
    fn present(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    if let Some(user_id) = present(user_id) {
        return Some(CartKey::user(user_id));
    }

    present(anonymous_id).and_then(CartKey::parse_anonymous)
}
