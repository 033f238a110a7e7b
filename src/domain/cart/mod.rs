//! Cart domain
//!
//! Cart documents, key resolution and the cart store trait.

mod entity;
mod key;
mod repository;
mod resolver;

pub use entity::{Cart, CartItem};
pub use key::CartKey;
pub use repository::CartRepository;
pub use resolver::{existing_cart_key, resolve_cart_key, ResolvedCartKey};
