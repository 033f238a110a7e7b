//! Product catalog implementations

mod in_memory;

pub use in_memory::InMemoryProductCatalog;
