//! In-memory product catalog

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::catalog::{ProductCatalog, ProductSnapshot};
use crate::domain::DomainError;

/// Product catalog held in process memory, for local runs and tests
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<HashMap<Uuid, ProductSnapshot>>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<ProductSnapshot>) -> Self {
        let products = products.into_iter().map(|p| (p.id, p)).collect();

        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    /// Load products from a JSON array of snapshots
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();

        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read catalog seed file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let products: Vec<ProductSnapshot> = serde_json::from_str(json).map_err(|e| {
            DomainError::configuration(format!("Invalid catalog seed data: {}", e))
        })?;

        Ok(Self::with_products(products))
    }

    /// Insert or replace a product
    pub async fn upsert(&self, product: ProductSnapshot) {
        self.products.write().await.insert(product.id, product);
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get(&self, product_id: Uuid) -> Result<Option<ProductSnapshot>, DomainError> {
        let products = self.products.read().await;
        Ok(products.get(&product_id).cloned())
    }
}
