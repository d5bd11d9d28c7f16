//! Cart Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Most portions of one kind a single cart or order line may hold
pub const MAX_PORTION_QTY: u32 = 999;

/// Placeholder name for a cart line whose product was deleted
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Stored cart entry, one per (user, product)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub user_id: i64,
    pub product_id: i64,
    pub full_portion_qty: u32,
    pub half_portion_qty: u32,
}

impl CartEntry {
    /// Document key `{userId}_{productId}`
    pub fn key(user_id: i64, product_id: i64) -> String {
        format!("{}_{}", user_id, product_id)
    }
}

/// Add-to-cart payload; quantities are added to any existing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAdd {
    pub product_id: i64,
    #[serde(default)]
    pub full_portion_qty: u32,
    #[serde(default)]
    pub half_portion_qty: u32,
}

/// Cart entry joined with its product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i64,
    pub product_name: String,
    pub full_portion_qty: u32,
    pub half_portion_qty: u32,
    pub full_portion_price: Decimal,
    pub half_portion_price: Decimal,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.full_portion_qty) * self.full_portion_price
            + Decimal::from(self.half_portion_qty) * self.half_portion_price
    }
}

/// Checkout payload; table number as typed or scanned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub table_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_key() {
        assert_eq!(CartEntry::key(12, 345), "12_345");
    }

    #[test]
    fn test_cart_add_defaults() {
        let add: CartAdd = serde_json::from_str(r#"{"productId": 3, "halfPortionQty": 2}"#).unwrap();
        assert_eq!(add.full_portion_qty, 0);
        assert_eq!(add.half_portion_qty, 2);
    }
}
