//! Checkout
//!
//! Turns a user's cart into a Pending order, then refills the trays.

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::models::{CartLine, Order, OrderCreate, OrderItem, Product, UNKNOWN_PRODUCT};

use crate::db::repository::{CartRepository, OrderRepository, ProductRepository};
use crate::trays::{Repopulator, Trigger};
use crate::utils::validation::parse_table_number;
use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Clone)]
pub struct CheckoutService {
    orders: OrderRepository,
    carts: CartRepository,
    products: ProductRepository,
    repopulator: Repopulator,
}

impl CheckoutService {
    pub fn new(
        orders: OrderRepository,
        carts: CartRepository,
        products: ProductRepository,
        repopulator: Repopulator,
    ) -> Self {
        Self {
            orders,
            carts,
            products,
            repopulator,
        }
    }

    /// Cart entries joined with their products
    ///
    /// A product deleted after it was added shows as [`UNKNOWN_PRODUCT`] at
    /// zero price.
    pub fn cart_lines(&self, user_id: i64) -> AppResult<Vec<CartLine>> {
        let entries = self.carts.entries(user_id)?;
        let ids: Vec<i64> = entries.iter().map(|e| e.product_id).collect();
        let products = self.products.find_many(&ids)?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let product = products.get(&entry.product_id);
                CartLine {
                    product_id: entry.product_id,
                    product_name: product
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
                    full_portion_qty: entry.full_portion_qty,
                    half_portion_qty: entry.half_portion_qty,
                    full_portion_price: product
                        .map(|p| p.full_portion_price)
                        .unwrap_or(Decimal::ZERO),
                    half_portion_price: product
                        .map(|p| p.half_portion_price)
                        .unwrap_or(Decimal::ZERO),
                }
            })
            .collect())
    }

    /// 下单
    ///
    /// 订单创建成功后才清空购物车并补位托盘；补位失败只记录日志，不影响下单结果。
    pub async fn place_order(&self, user_id: i64, table_input: &str) -> AppResult<Order> {
        let table_number = parse_table_number(table_input)?;

        let entries = self.carts.entries(user_id)?;
        if entries.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty).with_detail("user_id", user_id));
        }
        let ids: Vec<i64> = entries.iter().map(|e| e.product_id).collect();
        let products = self.products.find_many(&ids)?;

        let items: Vec<OrderItem> = entries
            .iter()
            .map(|entry| {
                order_item(
                    entry.product_id,
                    entry.full_portion_qty,
                    entry.half_portion_qty,
                    &products,
                )
            })
            .collect();

        let order = self.orders.create(OrderCreate {
            user_id,
            table_number,
            items,
        })?;

        if let Err(e) = self.carts.clear(user_id) {
            tracing::warn!(user_id, order_id = order.id, error = %e, "Failed to clear cart after checkout");
        }

        tracing::info!(
            order_id = order.id,
            user_id,
            table = order.table_number,
            total = %order.total_amount,
            "Order placed"
        );

        if let Err(e) = self.repopulator.run(Trigger::Checkout).await {
            tracing::warn!(order_id = order.id, error = %e, "Tray refill after checkout failed");
        }

        Ok(order)
    }
}

/// Price captured at checkout time
fn order_item(
    product_id: i64,
    full_portion_qty: u32,
    half_portion_qty: u32,
    products: &HashMap<i64, Product>,
) -> OrderItem {
    let product = products.get(&product_id);
    OrderItem {
        product_id,
        full_portion_qty,
        half_portion_qty,
        full_portion_price: product.map(|p| p.full_portion_price).unwrap_or(Decimal::ZERO),
        half_portion_price: product.map(|p| p.half_portion_price).unwrap_or(Decimal::ZERO),
    }
}
