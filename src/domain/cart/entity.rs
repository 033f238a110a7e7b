//! Cart entity and related types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::key::CartKey;

/// A line in a cart
///
/// Name and price are snapshots taken from the catalog when the product was
/// first added; they are never re-validated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(
        product_id: Uuid,
        product_name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            unit_price,
            quantity,
        }
    }

    /// Price of this line (unit price times quantity)
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Shopping cart document as stored in the key-value store
///
/// Holds at most one line per product and every line has a quantity of at
/// least one. The total is derived on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner_user_id: Option<String>,
    #[serde(default)]
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart for the given key
    pub fn new(key: &CartKey) -> Self {
        Self {
            id: key.as_str().to_string(),
            owner_user_id: key.owner().map(str::to_string),
            items: Vec::new(),
        }
    }

    // Getters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_user_id(&self) -> Option<&str> {
        self.owner_user_id.as_deref()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn item(&self, product_id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity currently held for a product, zero when absent
    pub fn quantity_of(&self, product_id: Uuid) -> u32 {
        self.item(product_id).map_or(0, |i| i.quantity)
    }

    /// Sum of unit price times quantity over all lines
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total number of units across all lines
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    // Mutators

    /// Align the document identity with the key it was read from.
    ///
    /// A cart moved by key rename still carries the identity it was created
    /// with; the store key is authoritative, for the owner as well.
    pub fn bind_to(&mut self, key: &CartKey) {
        self.id = key.as_str().to_string();
        self.owner_user_id = key.owner().map(str::to_string);
    }

    /// Add an item, summing quantities when the product is already present.
    /// Items with a zero quantity are ignored.
    pub fn add_item(&mut self, item: CartItem) {
        if item.quantity == 0 {
            return;
        }

        match self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => self.items.push(item),
        }
    }

    /// Set the quantity of an existing line. A quantity of zero or below
    /// removes the line. Returns `false` when the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: i64) -> bool {
        let Some(position) = self.items.iter().position(|i| i.product_id == product_id) else {
            return false;
        };

        if quantity <= 0 {
            self.items.remove(position);
        } else {
            self.items[position].quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }

        true
    }

    /// Remove a line, returning it if it was present
    pub fn remove_item(&mut self, product_id: Uuid) -> Option<CartItem> {
        let position = self.items.iter().position(|i| i.product_id == product_id)?;
        Some(self.items.remove(position))
    }

    /// Fold every line of `other` into this cart, summing shared products
    pub fn absorb(&mut self, other: Cart) {
        for item in other.items {
            self.add_item(item);
        }
    }
}
