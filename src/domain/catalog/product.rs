use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Product state as reported by the catalog at lookup time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub stock_quantity: u32,
}

impl ProductSnapshot {
    /// Whether `quantity` units can be supplied
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock_quantity >= quantity
    }
}

/// Read-only product lookup
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks up a product by ID
    async fn get(&self, product_id: Uuid) -> Result<Option<ProductSnapshot>, DomainError>;
}
