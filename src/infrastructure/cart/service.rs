//! Cart service: item operations and login-time merge

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem, CartKey, CartRepository};
use crate::domain::catalog::ProductCatalog;
use crate::domain::DomainError;

/// Why an item change was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    NonPositiveQuantity,
    ProductNotFound,
    InsufficientStock { requested: u32, available: u32 },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveQuantity => write!(f, "Quantity must be positive"),
            Self::ProductNotFound => write!(f, "Product not found"),
            Self::InsufficientStock {
                requested,
                available,
            } => write!(
                f,
                "Insufficient stock: requested {}, available {}",
                requested, available
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddItemOutcome {
    Added(Cart),
    Rejected(RejectionReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateItemOutcome {
    Updated(Cart),
    /// The cart or the line does not exist
    NotFound,
    Rejected(RejectionReason),
}

impl UpdateItemOutcome {
    /// The updated cart, if any
    pub fn into_cart(self) -> Option<Cart> {
        match self {
            Self::Updated(cart) => Some(cart),
            Self::NotFound | Self::Rejected(_) => None,
        }
    }
}

/// What a login-time merge did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No usable anonymous cart, or the anonymous key is the user key
    NothingToMerge,
    /// The anonymous cart was moved to the user key unchanged
    Transferred,
    /// Lines were folded into an existing user cart
    Merged,
    /// A store call failed; the carts are left as they were at the failure
    Failed,
}

/// Document found under a cart key
enum Stored {
    Absent,
    Available(Cart),
    /// A user's cart reached through an anonymous key. Never served or
    /// overwritten from that key.
    Claimed,
}

/// Cart operations over the cart store and product catalog
///
/// Reads bind the document to the key it was read from, so a cart moved by
/// rename reports its new identity and owner. Store failures propagate except
/// during merge, which never fails a login.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn ProductCatalog>,
}

impl fmt::Debug for CartService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartService")
            .field("carts", &self.carts)
            .field("catalog", &"<ProductCatalog>")
            .finish()
    }
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { carts, catalog }
    }

    /// Get the cart stored under a key
    pub async fn get_cart(&self, key: &CartKey) -> Result<Option<Cart>, DomainError> {
        match self.load(key).await? {
            Stored::Available(cart) => Ok(Some(cart)),
            Stored::Absent | Stored::Claimed => Ok(None),
        }
    }

    /// Anonymous and user keys share the store namespace. A document under an
    /// anonymous key that names an owner, or was written under another key,
    /// belongs to a user and is claimed.
    async fn load(&self, key: &CartKey) -> Result<Stored, DomainError> {
        let Some(mut cart) = self.carts.get(key.as_str()).await? else {
            return Ok(Stored::Absent);
        };

        if key.is_anonymous() && (cart.owner_user_id().is_some() || cart.id() != key.as_str()) {
            warn!(cart_key = %key, "Anonymous key resolves to a user cart; ignoring it");
            return Ok(Stored::Claimed);
        }

        cart.bind_to(key);
        Ok(Stored::Available(cart))
    }

    /// Add units of a product, creating the cart on first add
    pub async fn add_item(
        &self,
        key: &CartKey,
        product_id: Uuid,
        quantity: i64,
    ) -> Result<AddItemOutcome, DomainError> {
        if quantity <= 0 {
            return Ok(AddItemOutcome::Rejected(RejectionReason::NonPositiveQuantity));
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let Some(product) = self.catalog.get(product_id).await? else {
            warn!(product_id = %product_id, "Product not found for cart add");
            return Ok(AddItemOutcome::Rejected(RejectionReason::ProductNotFound));
        };

        let mut cart = match self.load(key).await? {
            Stored::Available(cart) => cart,
            Stored::Absent => Cart::new(key),
            Stored::Claimed => {
                return Err(DomainError::conflict("Cart key is already in use"));
            }
        };

        let requested = cart.quantity_of(product_id).saturating_add(quantity);
        if !product.has_stock_for(requested) {
            warn!(
                product_id = %product_id,
                requested,
                available = product.stock_quantity,
                "Not enough stock for cart add"
            );
            return Ok(AddItemOutcome::Rejected(RejectionReason::InsufficientStock {
                requested,
                available: product.stock_quantity,
            }));
        }

        cart.add_item(CartItem::new(
            product.id,
            product.name,
            product.unit_price,
            quantity,
        ));
        self.carts.put(key.as_str(), &cart).await?;

        debug!(cart_key = %key, product_id = %product_id, quantity, "Added item to cart");

        Ok(AddItemOutcome::Added(cart))
    }

    /// Set the quantity of a line; zero or below removes it
    pub async fn update_item(
        &self,
        key: &CartKey,
        product_id: Uuid,
        quantity: i64,
    ) -> Result<UpdateItemOutcome, DomainError> {
        let Some(mut cart) = self.get_cart(key).await? else {
            return Ok(UpdateItemOutcome::NotFound);
        };

        if cart.item(product_id).is_none() {
            return Ok(UpdateItemOutcome::NotFound);
        }

        if quantity > 0 {
            let Some(product) = self.catalog.get(product_id).await? else {
                return Ok(UpdateItemOutcome::Rejected(RejectionReason::ProductNotFound));
            };

            let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
            if !product.has_stock_for(requested) {
                return Ok(UpdateItemOutcome::Rejected(
                    RejectionReason::InsufficientStock {
                        requested,
                        available: product.stock_quantity,
                    },
                ));
            }
        }

        cart.set_quantity(product_id, quantity);
        self.carts.put(key.as_str(), &cart).await?;

        debug!(cart_key = %key, product_id = %product_id, quantity, "Updated cart item");

        Ok(UpdateItemOutcome::Updated(cart))
    }

    /// Remove a line. An absent line leaves the cart untouched and unwritten.
    pub async fn remove_item(
        &self,
        key: &CartKey,
        product_id: Uuid,
    ) -> Result<Option<Cart>, DomainError> {
        let Some(mut cart) = self.get_cart(key).await? else {
            return Ok(None);
        };

        if cart.remove_item(product_id).is_some() {
            self.carts.put(key.as_str(), &cart).await?;
            debug!(cart_key = %key, product_id = %product_id, "Removed cart item");
        }

        Ok(Some(cart))
    }

    /// Delete a cart, e.g. after checkout
    pub async fn delete_cart(&self, key: &CartKey) -> Result<bool, DomainError> {
        if key.is_anonymous() {
            match self.load(key).await? {
                Stored::Available(_) => {}
                Stored::Absent | Stored::Claimed => return Ok(false),
            }
        }

        let deleted = self.carts.delete(key.as_str()).await?;
        debug!(cart_key = %key, deleted, "Deleted cart");
        Ok(deleted)
    }

    /// Fold the anonymous cart into the user's cart at login.
    ///
    /// Never fails: store errors are logged and reported as
    /// [`MergeOutcome::Failed`]. A failure between writing the user cart and
    /// deleting the anonymous one leaves an orphan that expires on its own.
    pub async fn merge_on_login(&self, anonymous_id: &str, user_id: &str) -> MergeOutcome {
        match self.try_merge(anonymous_id, user_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    anonymous_cart = %anonymous_id,
                    user_id = %user_id,
                    error = %e,
                    "Cart merge failed"
                );
                MergeOutcome::Failed
            }
        }
    }

    async fn try_merge(&self, anonymous_id: &str, user_id: &str) -> Result<MergeOutcome, DomainError> {
        let Some(anonymous_key) = CartKey::parse_anonymous(anonymous_id) else {
            return Ok(MergeOutcome::NothingToMerge);
        };
        let anonymous_id = anonymous_key.as_str();
        if anonymous_id == user_id {
            return Ok(MergeOutcome::NothingToMerge);
        }

        let Stored::Available(anonymous_cart) = self.load(&anonymous_key).await? else {
            return Ok(MergeOutcome::NothingToMerge);
        };

        let user_key = CartKey::user(user_id);

        match self.carts.get(user_id).await? {
            None => {
                if !self.carts.rename(anonymous_id, user_id).await? {
                    warn!(
                        anonymous_cart = %anonymous_id,
                        user_id = %user_id,
                        "Anonymous cart vanished before transfer"
                    );
                    return Ok(MergeOutcome::NothingToMerge);
                }

                info!(
                    anonymous_cart = %anonymous_id,
                    user_cart = %user_key,
                    "Transferred anonymous cart to user"
                );
                Ok(MergeOutcome::Transferred)
            }
            Some(mut user_cart) => {
                user_cart.bind_to(&user_key);
                user_cart.absorb(anonymous_cart);

                self.carts.put(user_id, &user_cart).await?;
                self.carts.delete(anonymous_id).await?;

                info!(
                    anonymous_cart = %anonymous_id,
                    user_cart = %user_key,
                    "Merged anonymous cart into user cart"
                );
                Ok(MergeOutcome::Merged)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::domain::catalog::{MockProductCatalog, ProductSnapshot};
    use crate::infrastructure::cart::CacheCartRepository;
    use mockall::predicate::eq;
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::time::Duration;

    const ANON: &str = "0b7e3c1a-2f4d-4e8a-9c6b-1d2e3f4a5b6c";
    const USER: &str = "user-42";
    const USER_UUID: &str = "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d";

    fn product(name: &str, price: &str, stock: u32) -> ProductSnapshot {
        ProductSnapshot {
            id: Uuid::new_v4(),
            name: name.to_string(),
            unit_price: Decimal::from_str(price).unwrap(),
            stock_quantity: stock,
        }
    }

    fn catalog_of(products: &[ProductSnapshot]) -> MockProductCatalog {
        let by_id: HashMap<Uuid, ProductSnapshot> =
            products.iter().map(|p| (p.id, p.clone())).collect();

        let mut catalog = MockProductCatalog::new();
        catalog
            .expect_get()
            .returning(move |id| Ok(by_id.get(&id).cloned()));
        catalog
    }

    fn service(cache: &Arc<MockCache>, catalog: MockProductCatalog) -> CartService {
        let carts = CacheCartRepository::new(cache.clone());
        CartService::new(Arc::new(carts), Arc::new(catalog))
    }

    fn line(product: &ProductSnapshot, quantity: u32) -> CartItem {
        CartItem::new(product.id, product.name.clone(), product.unit_price, quantity)
    }

    fn stored_cart(key: &CartKey, lines: Vec<CartItem>) -> Cart {
        let mut cart = Cart::new(key);
        for item in lines {
            cart.add_item(item);
        }
        cart
    }

    fn added(outcome: AddItemOutcome) -> Cart {
        match outcome {
            AddItemOutcome::Added(cart) => cart,
            AddItemOutcome::Rejected(reason) => panic!("unexpected rejection: {reason}"),
        }
    }

    // Item operations

    #[tokio::test]
    async fn test_first_add_creates_cart() {
        let mug = product("Mug", "12.50", 10);
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[mug.clone()]));
        let key = CartKey::anonymous(ANON);

        let cart = added(svc.add_item(&key, mug.id, 2).await.unwrap());

        assert_eq!(cart.id(), ANON);
        assert_eq!(cart.quantity_of(mug.id), 2);
        assert_eq!(cart.total_price(), Decimal::from_str("25.00").unwrap());
        assert!(cache.contains(&format!("cart:{ANON}")));
    }

    #[tokio::test]
    async fn test_adding_same_product_twice_sums_quantity() {
        let mug = product("Mug", "12.50", 10);
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[mug.clone()]));
        let key = CartKey::anonymous(ANON);

        svc.add_item(&key, mug.id, 2).await.unwrap();
        let cart = added(svc.add_item(&key, mug.id, 3).await.unwrap());

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(mug.id), 5);
    }

    #[tokio::test]
    async fn test_add_through_user_key_sets_owner() {
        let mug = product("Mug", "12.50", 10);
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[mug.clone()]));

        let cart = added(svc.add_item(&CartKey::user(USER), mug.id, 1).await.unwrap());

        assert_eq!(cart.owner_user_id(), Some(USER));
    }

    #[tokio::test]
    async fn test_add_rejects_non_positive_quantity_without_lookups() {
        let cache = Arc::new(MockCache::new());
        let mut catalog = MockProductCatalog::new();
        catalog.expect_get().never();
        let svc = service(&cache, catalog);

        let outcome = svc
            .add_item(&CartKey::anonymous(ANON), Uuid::new_v4(), 0)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AddItemOutcome::Rejected(RejectionReason::NonPositiveQuantity)
        );
        assert_eq!(cache.calls(), 0);
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_product() {
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[]));

        let outcome = svc
            .add_item(&CartKey::anonymous(ANON), Uuid::new_v4(), 1)
            .await
            .unwrap();

        assert_eq!(outcome, AddItemOutcome::Rejected(RejectionReason::ProductNotFound));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_add_stock_check_counts_existing_quantity() {
        let mug = product("Mug", "12.50", 4);
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[mug.clone()]));
        let key = CartKey::anonymous(ANON);

        svc.add_item(&key, mug.id, 3).await.unwrap();
        let outcome = svc.add_item(&key, mug.id, 2).await.unwrap();

        assert_eq!(
            outcome,
            AddItemOutcome::Rejected(RejectionReason::InsufficientStock {
                requested: 5,
                available: 4
            })
        );
        let cart = svc.get_cart(&key).await.unwrap().unwrap();
        assert_eq!(cart.quantity_of(mug.id), 3);
    }

    #[tokio::test]
    async fn test_add_keeps_snapshot_price() {
        let mug = product("Mug", "12.50", 10);
        let cache = Arc::new(MockCache::new());
        let key = CartKey::anonymous(ANON);

        service(&cache, catalog_of(&[mug.clone()]))
            .add_item(&key, mug.id, 1)
            .await
            .unwrap();

        let repriced = ProductSnapshot {
            unit_price: Decimal::from_str("99.00").unwrap(),
            ..mug.clone()
        };
        let cart = added(
            service(&cache, catalog_of(&[repriced]))
                .add_item(&key, mug.id, 1)
                .await
                .unwrap(),
        );

        assert_eq!(cart.item(mug.id).unwrap().unit_price, mug.unit_price);
        assert_eq!(cart.total_price(), Decimal::from_str("25.00").unwrap());
    }

    #[tokio::test]
    async fn test_update_sets_quantity() {
        let mug = product("Mug", "12.50", 10);
        let key = CartKey::anonymous(ANON);
        let cache = Arc::new(MockCache::new().with_entry(
            &format!("cart:{ANON}"),
            &stored_cart(&key, vec![line(&mug, 1)]),
            Duration::from_secs(60),
        ));
        let svc = service(&cache, catalog_of(&[mug.clone()]));

        let cart = svc
            .update_item(&key, mug.id, 7)
            .await
            .unwrap()
            .into_cart()
            .unwrap();

        assert_eq!(cart.quantity_of(mug.id), 7);
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_and_keeps_empty_cart() {
        let mug = product("Mug", "12.50", 10);
        let key = CartKey::anonymous(ANON);
        let cache = Arc::new(MockCache::new().with_entry(
            &format!("cart:{ANON}"),
            &stored_cart(&key, vec![line(&mug, 2)]),
            Duration::from_secs(60),
        ));
        let mut catalog = MockProductCatalog::new();
        catalog.expect_get().never();
        let svc = service(&cache, catalog);

        let cart = svc
            .update_item(&key, mug.id, 0)
            .await
            .unwrap()
            .into_cart()
            .unwrap();
        assert!(cart.is_empty());

        let stored = svc.get_cart(&key).await.unwrap();
        assert_eq!(stored.map(|c| c.is_empty()), Some(true));
    }

    #[tokio::test]
    async fn test_update_negative_quantity_removes() {
        let mug = product("Mug", "12.50", 10);
        let key = CartKey::anonymous(ANON);
        let cache = Arc::new(MockCache::new().with_entry(
            &format!("cart:{ANON}"),
            &stored_cart(&key, vec![line(&mug, 2)]),
            Duration::from_secs(60),
        ));
        let svc = service(&cache, catalog_of(&[mug.clone()]));

        let cart = svc
            .update_item(&key, mug.id, -3)
            .await
            .unwrap()
            .into_cart()
            .unwrap();

        assert!(cart.item(mug.id).is_none());
    }

    #[tokio::test]
    async fn test_update_missing_cart_or_item_is_not_found() {
        let mug = product("Mug", "12.50", 10);
        let key = CartKey::anonymous(ANON);
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[mug.clone()]));

        assert_eq!(
            svc.update_item(&key, mug.id, 1).await.unwrap(),
            UpdateItemOutcome::NotFound
        );

        svc.add_item(&key, mug.id, 1).await.unwrap();
        assert_eq!(
            svc.update_item(&key, Uuid::new_v4(), 1).await.unwrap(),
            UpdateItemOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_update_above_stock_is_rejected() {
        let mug = product("Mug", "12.50", 3);
        let key = CartKey::anonymous(ANON);
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[mug.clone()]));
        svc.add_item(&key, mug.id, 1).await.unwrap();

        let outcome = svc.update_item(&key, mug.id, 4).await.unwrap();

        assert_eq!(
            outcome,
            UpdateItemOutcome::Rejected(RejectionReason::InsufficientStock {
                requested: 4,
                available: 3
            })
        );
    }

    #[tokio::test]
    async fn test_remove_item() {
        let mug = product("Mug", "12.50", 10);
        let tee = product("Tee", "20.00", 10);
        let key = CartKey::anonymous(ANON);
        let cache = Arc::new(MockCache::new().with_entry(
            &format!("cart:{ANON}"),
            &stored_cart(&key, vec![line(&mug, 1), line(&tee, 2)]),
            Duration::from_secs(60),
        ));
        let svc = service(&cache, catalog_of(&[]));

        let cart = svc.remove_item(&key, mug.id).await.unwrap().unwrap();

        assert!(cart.item(mug.id).is_none());
        assert_eq!(cart.quantity_of(tee.id), 2);
    }

    #[tokio::test]
    async fn test_remove_absent_item_returns_cart_without_write() {
        let mug = product("Mug", "12.50", 10);
        let key = CartKey::anonymous(ANON);
        let stored = stored_cart(&key, vec![line(&mug, 1)]);
        let cache = Arc::new(MockCache::new().with_entry(
            &format!("cart:{ANON}"),
            &stored,
            Duration::from_secs(60),
        ));
        let svc = service(&cache, catalog_of(&[]));

        let cart = svc.remove_item(&key, Uuid::new_v4()).await.unwrap();

        assert_eq!(cart, Some(stored));
        assert_eq!(cache.calls(), 1);
    }

    #[tokio::test]
    async fn test_remove_from_missing_cart() {
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[]));

        let cart = svc
            .remove_item(&CartKey::anonymous(ANON), Uuid::new_v4())
            .await
            .unwrap();

        assert!(cart.is_none());
    }

    #[tokio::test]
    async fn test_delete_cart() {
        let mug = product("Mug", "12.50", 10);
        let key = CartKey::user(USER);
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[mug.clone()]));
        svc.add_item(&key, mug.id, 1).await.unwrap();

        assert!(svc.delete_cart(&key).await.unwrap());
        assert!(svc.get_cart(&key).await.unwrap().is_none());
        assert!(!svc.delete_cart(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_cart_expires_after_ttl() {
        let mug = product("Mug", "12.50", 10);
        let key = CartKey::anonymous(ANON);
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[mug.clone()]));
        svc.add_item(&key, mug.id, 1).await.unwrap();

        cache.advance(Duration::from_secs(7 * 24 * 60 * 60));

        assert!(svc.get_cart(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_cart_fails_when_store_unreachable() {
        let cache = Arc::new(MockCache::unavailable());
        let svc = service(&cache, catalog_of(&[]));

        let result = svc.get_cart(&CartKey::anonymous(ANON)).await;

        assert!(matches!(result, Err(DomainError::StoreUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_add_fails_when_store_unreachable() {
        let mug = product("Mug", "12.50", 10);
        let cache = Arc::new(MockCache::unavailable());
        let svc = service(&cache, catalog_of(&[mug.clone()]));

        let result = svc.add_item(&CartKey::anonymous(ANON), mug.id, 1).await;

        assert!(result.unwrap_err().is_store_unavailable());
    }

    #[tokio::test]
    async fn test_concurrent_adds_last_writer_wins() {
        let mug = product("Mug", "12.50", 10);
        let tee = product("Tee", "20.00", 10);
        let key = CartKey::anonymous(ANON);
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[mug.clone(), tee.clone()]));

        // Both requests read the same (absent) cart before either writes
        let snapshot = svc.get_cart(&key).await.unwrap();
        assert!(snapshot.is_none());

        let mut first = Cart::new(&key);
        first.add_item(line(&mug, 1));
        let mut second = Cart::new(&key);
        second.add_item(line(&tee, 1));

        let carts = CacheCartRepository::new(cache.clone());
        carts.put(ANON, &first).await.unwrap();
        carts.put(ANON, &second).await.unwrap();

        let stored = svc.get_cart(&key).await.unwrap().unwrap();
        assert!(stored.item(mug.id).is_none());
        assert_eq!(stored.quantity_of(tee.id), 1);
    }

    // Merge

    #[tokio::test]
    async fn test_merge_without_user_cart_transfers() {
        let mug = product("Mug", "12.50", 10);
        let anon_key = CartKey::anonymous(ANON);
        let cache = Arc::new(MockCache::new().with_entry(
            &format!("cart:{ANON}"),
            &stored_cart(&anon_key, vec![line(&mug, 2)]),
            Duration::from_secs(60),
        ));
        let svc = service(&cache, catalog_of(&[]));

        let outcome = svc.merge_on_login(ANON, USER).await;

        assert_eq!(outcome, MergeOutcome::Transferred);
        assert!(svc.get_cart(&anon_key).await.unwrap().is_none());

        let user_cart = svc.get_cart(&CartKey::user(USER)).await.unwrap().unwrap();
        assert_eq!(user_cart.id(), USER);
        assert_eq!(user_cart.owner_user_id(), Some(USER));
        assert_eq!(user_cart.quantity_of(mug.id), 2);
    }

    #[tokio::test]
    async fn test_merge_transfer_keeps_remaining_ttl() {
        let mug = product("Mug", "12.50", 10);
        let anon_key = CartKey::anonymous(ANON);
        let cache = Arc::new(MockCache::new().with_entry(
            &format!("cart:{ANON}"),
            &stored_cart(&anon_key, vec![line(&mug, 2)]),
            Duration::from_secs(60),
        ));
        let svc = service(&cache, catalog_of(&[]));

        svc.merge_on_login(ANON, USER).await;
        cache.advance(Duration::from_secs(60));

        assert!(svc.get_cart(&CartKey::user(USER)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_sums_shared_products_and_deletes_anonymous() {
        let mug = product("Mug", "12.50", 10);
        let tee = product("Tee", "20.00", 10);
        let hat = product("Hat", "8.00", 10);
        let anon_key = CartKey::anonymous(ANON);
        let user_key = CartKey::user(USER);
        let cache = Arc::new(
            MockCache::new()
                .with_entry(
                    &format!("cart:{ANON}"),
                    &stored_cart(&anon_key, vec![line(&mug, 2), line(&hat, 1)]),
                    Duration::from_secs(60),
                )
                .with_entry(
                    &format!("cart:{USER}"),
                    &stored_cart(&user_key, vec![line(&mug, 3), line(&tee, 1)]),
                    Duration::from_secs(60),
                ),
        );
        let svc = service(&cache, catalog_of(&[]));

        let outcome = svc.merge_on_login(ANON, USER).await;

        assert_eq!(outcome, MergeOutcome::Merged);
        assert!(!cache.contains(&format!("cart:{ANON}")));

        let merged = svc.get_cart(&user_key).await.unwrap().unwrap();
        assert_eq!(merged.items().len(), 3);
        assert_eq!(merged.quantity_of(mug.id), 5);
        assert_eq!(merged.quantity_of(tee.id), 1);
        assert_eq!(merged.quantity_of(hat.id), 1);
        assert_eq!(merged.owner_user_id(), Some(USER));
    }

    #[tokio::test]
    async fn test_merge_without_anonymous_cart_leaves_user_cart() {
        let mug = product("Mug", "12.50", 10);
        let user_key = CartKey::user(USER);
        let user_cart = stored_cart(&user_key, vec![line(&mug, 3)]);
        let cache = Arc::new(MockCache::new().with_entry(
            &format!("cart:{USER}"),
            &user_cart,
            Duration::from_secs(60),
        ));
        let svc = service(&cache, catalog_of(&[]));

        let outcome = svc.merge_on_login(ANON, USER).await;

        assert_eq!(outcome, MergeOutcome::NothingToMerge);
        assert_eq!(svc.get_cart(&user_key).await.unwrap(), Some(user_cart));
    }

    #[tokio::test]
    async fn test_merge_into_same_key_is_noop() {
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog_of(&[]));

        assert_eq!(svc.merge_on_login(USER, USER).await, MergeOutcome::NothingToMerge);
        assert_eq!(svc.merge_on_login("", USER).await, MergeOutcome::NothingToMerge);
        assert_eq!(svc.merge_on_login(USER_UUID, USER_UUID).await, MergeOutcome::NothingToMerge);
        assert_eq!(cache.calls(), 0);
    }

    #[tokio::test]
    async fn test_merge_ignores_non_uuid_anonymous_id() {
        let mug = product("Mug", "12.50", 10);
        let victim = stored_cart(&CartKey::user("user-7"), vec![line(&mug, 4)]);
        let cache = Arc::new(MockCache::new().with_entry(
            "cart:user-7",
            &victim,
            Duration::from_secs(60),
        ));
        let svc = service(&cache, catalog_of(&[]));

        let outcome = svc.merge_on_login("user-7", USER).await;

        assert_eq!(outcome, MergeOutcome::NothingToMerge);
        assert_eq!(cache.calls(), 0);
        assert!(!cache.contains(&format!("cart:{USER}")));
        assert_eq!(
            svc.get_cart(&CartKey::user("user-7")).await.unwrap(),
            Some(victim)
        );
    }

    fn user_cart_cache(lines: Vec<CartItem>) -> (Arc<MockCache>, Cart) {
        let cart = stored_cart(&CartKey::user(USER_UUID), lines);
        let cache = Arc::new(MockCache::new().with_entry(
            &format!("cart:{USER_UUID}"),
            &cart,
            Duration::from_secs(60),
        ));
        (cache, cart)
    }

    #[tokio::test]
    async fn test_user_cart_is_not_reachable_through_anonymous_key() {
        let mug = product("Mug", "12.50", 10);
        let (cache, victim) = user_cart_cache(vec![line(&mug, 4)]);
        let svc = service(&cache, catalog_of(&[mug.clone()]));
        let spoofed = CartKey::anonymous(USER_UUID);

        assert_eq!(svc.get_cart(&spoofed).await.unwrap(), None);
        assert!(matches!(
            svc.add_item(&spoofed, mug.id, 1).await,
            Err(DomainError::Conflict { .. })
        ));
        assert_eq!(
            svc.update_item(&spoofed, mug.id, 1).await.unwrap(),
            UpdateItemOutcome::NotFound
        );
        assert_eq!(svc.remove_item(&spoofed, mug.id).await.unwrap(), None);
        assert!(!svc.delete_cart(&spoofed).await.unwrap());
        assert_eq!(
            svc.merge_on_login(USER_UUID, USER).await,
            MergeOutcome::NothingToMerge
        );

        let owner = CartKey::user(USER_UUID);
        assert_eq!(svc.get_cart(&owner).await.unwrap(), Some(victim));
        assert!(!cache.contains(&format!("cart:{USER}")));
    }

    #[tokio::test]
    async fn test_transferred_cart_is_not_reachable_through_anonymous_key() {
        let mug = product("Mug", "12.50", 10);
        let cache = Arc::new(MockCache::new().with_entry(
            &format!("cart:{ANON}"),
            &stored_cart(&CartKey::anonymous(ANON), vec![line(&mug, 2)]),
            Duration::from_secs(60),
        ));
        let svc = service(&cache, catalog_of(&[]));

        assert_eq!(
            svc.merge_on_login(ANON, USER_UUID).await,
            MergeOutcome::Transferred
        );

        // The renamed document still carries the anonymous identity it was
        // written with
        assert_eq!(svc.get_cart(&CartKey::anonymous(USER_UUID)).await.unwrap(), None);
        let owned = svc.get_cart(&CartKey::user(USER_UUID)).await.unwrap().unwrap();
        assert_eq!(owned.quantity_of(mug.id), 2);
    }

    #[tokio::test]
    async fn test_merge_swallows_store_failure() {
        let cache = Arc::new(MockCache::unavailable());
        let svc = service(&cache, catalog_of(&[]));

        let outcome = svc.merge_on_login(ANON, USER).await;

        assert_eq!(outcome, MergeOutcome::Failed);
    }

    #[derive(Debug)]
    struct VanishingRepository;

    #[async_trait::async_trait]
    impl CartRepository for VanishingRepository {
        async fn get(&self, key: &str) -> Result<Option<Cart>, DomainError> {
            Ok((key == ANON).then(|| Cart::new(&CartKey::anonymous(ANON))))
        }

        async fn put(&self, _key: &str, _cart: &Cart) -> Result<(), DomainError> {
            Ok(())
        }

        async fn delete(&self, _key: &str) -> Result<bool, DomainError> {
            Ok(false)
        }

        async fn rename(&self, _from: &str, _to: &str) -> Result<bool, DomainError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_merge_rename_race_is_nothing_to_merge() {
        let svc = CartService::new(Arc::new(VanishingRepository), Arc::new(catalog_of(&[])));

        assert_eq!(svc.merge_on_login(ANON, USER).await, MergeOutcome::NothingToMerge);
    }

    #[tokio::test]
    async fn test_catalog_is_queried_once_per_add() {
        let mug = product("Mug", "12.50", 10);
        let snapshot = mug.clone();
        let mut catalog = MockProductCatalog::new();
        catalog
            .expect_get()
            .with(eq(mug.id))
            .times(1)
            .returning(move |_| Ok(Some(snapshot.clone())));
        let cache = Arc::new(MockCache::new());
        let svc = service(&cache, catalog);

        svc.add_item(&CartKey::anonymous(ANON), mug.id, 1)
            .await
            .unwrap();
    }
}
