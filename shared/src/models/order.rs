//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status
///
/// Created as `Pending`; only an explicit admin action moves it to `Completed`.
/// Tray assignment never changes an order's status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Completed",
        }
    }
}

/// Order line item (full / half portions of one product)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: i64,
    pub full_portion_qty: u32,
    pub half_portion_qty: u32,
    /// Unit price captured at checkout
    pub full_portion_price: Decimal,
    /// Unit price captured at checkout
    pub half_portion_price: Decimal,
}

impl OrderItem {
    /// `full * fullPrice + half * halfPrice`
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.full_portion_qty) * self.full_portion_price
            + Decimal::from(self.half_portion_qty) * self.half_portion_price
    }

    /// Both quantities zero - not kept in an order
    pub fn is_empty(&self) -> bool {
        self.full_portion_qty == 0 && self.half_portion_qty == 0
    }
}

/// Sum of line totals
pub fn total_amount(items: &[OrderItem]) -> Decimal {
    items.iter().map(OrderItem::line_total).sum()
}

/// Order document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// Physical table, always > 0
    pub table_number: u32,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    /// Creation time (Unix millis); the only ordering key for tray selection
    pub order_date: i64,
}

/// Create order payload (built by checkout)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub user_id: i64,
    pub table_number: u32,
    pub items: Vec<OrderItem>,
}

/// New quantities for one line of a pending order, by position
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemQuantity {
    pub full_portion_qty: u32,
    pub half_portion_qty: u32,
}

/// Customer edit of a pending order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemsUpdate {
    pub items: Vec<OrderItemQuantity>,
}

/// Result of editing a pending order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OrderEditOutcome {
    Updated { order: Order },
    /// Every quantity was zero, the order was removed
    Deleted { order_id: i64 },
}

/// Order status filter for list queries
#[derive(Debug, Clone, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

/// Line item as shown in admin / customer views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: i64,
    /// Product name, or a placeholder when the product was deleted
    pub product_name: String,
    pub full_portion_qty: u32,
    pub half_portion_qty: u32,
    pub full_portion_price: Decimal,
    pub half_portion_price: Decimal,
}

/// Order joined with user and product names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: i64,
    /// "First Last", or a placeholder when the user was deleted
    pub user_name: String,
    pub table_number: u32,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub order_date: i64,
    pub items: Vec<OrderItemView>,
}
