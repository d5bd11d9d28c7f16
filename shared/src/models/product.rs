//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upper bound for a portion price; keeps order totals far from `Decimal` overflow
pub const MAX_PORTION_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Menu product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub full_portion_price: Decimal,
    pub half_portion_price: Decimal,
    pub description: String,
    pub is_vegetarian: bool,
    pub image_url: Option<String>,
    pub created_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub name: String,
    pub category: String,
    pub full_portion_price: Decimal,
    pub half_portion_price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_vegetarian: bool,
    pub image_url: Option<String>,
}
