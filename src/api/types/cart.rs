//! Cart request and response bodies

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem};

#[derive(Debug, Clone, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            line_total: item.line_total(),
        }
    }
}

/// Cart as returned to clients, with derived totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartResponse {
    /// Absent for a cart that has not been created yet
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    pub items: Vec<CartItemResponse>,
    pub total_quantity: u64,
    pub total_price: Decimal,
}

impl CartResponse {
    /// Body for a caller without a stored cart
    pub fn empty() -> Self {
        Self {
            id: None,
            owner_user_id: None,
            items: Vec::new(),
            total_quantity: 0,
            total_price: Decimal::ZERO,
        }
    }
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: Some(cart.id().to_string()),
            owner_user_id: cart.owner_user_id().map(str::to_string),
            items: cart.items().iter().map(CartItemResponse::from).collect(),
            total_quantity: cart.total_quantity(),
            total_price: cart.total_price(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartKey;
    use std::str::FromStr;

    #[test]
    fn test_response_includes_totals() {
        let mut cart = Cart::new(&CartKey::user("user-1"));
        cart.add_item(CartItem::new(
            Uuid::new_v4(),
            "Mug",
            Decimal::from_str("12.50").unwrap(),
            2,
        ));
        cart.add_item(CartItem::new(
            Uuid::new_v4(),
            "Tee",
            Decimal::from_str("20.00").unwrap(),
            1,
        ));

        let response = CartResponse::from(&cart);

        assert_eq!(response.id.as_deref(), Some("user-1"));
        assert_eq!(response.total_quantity, 3);
        assert_eq!(response.total_price, Decimal::from_str("45.00").unwrap());
        assert_eq!(response.items[0].line_total, Decimal::from_str("25.00").unwrap());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total_price"], "45.00");
    }

    #[test]
    fn test_empty_response() {
        let json = serde_json::to_value(CartResponse::empty()).unwrap();

        assert!(json["id"].is_null());
        assert_eq!(json["items"].as_array().map(Vec::len), Some(0));
        assert!(json.get("owner_user_id").is_none());
    }
}
