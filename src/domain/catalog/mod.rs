//! Product catalog domain
//!
//! The catalog is an external collaborator; carts only consult it when an
//! item is added or its quantity changes.

mod product;

pub use product::{ProductCatalog, ProductSnapshot};

#[cfg(test)]
pub use product::MockProductCatalog;
