//! Order views for the admin and customer screens

use std::collections::HashMap;

use shared::models::{Order, OrderItemView, OrderView, Product, User};

use crate::db::repository::{ProductRepository, UserRepository};
use crate::utils::AppResult;

/// Shown when the ordering user no longer exists
pub const UNKNOWN_USER: &str = "Unknown";
/// Shown when an ordered product no longer exists
pub const UNKNOWN_FOOD: &str = "Unknown Food";

/// Join orders with user and product names
pub fn render_orders(
    orders: Vec<Order>,
    users: &UserRepository,
    products: &ProductRepository,
) -> AppResult<Vec<OrderView>> {
    let users: HashMap<i64, User> = users
        .find_all()?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();
    let product_ids: Vec<i64> = orders
        .iter()
        .flat_map(|order| order.items.iter().map(|item| item.product_id))
        .collect();
    let products = products.find_many(&product_ids)?;

    Ok(orders
        .into_iter()
        .map(|order| render(order, &users, &products))
        .collect())
}

fn render(order: Order, users: &HashMap<i64, User>, products: &HashMap<i64, Product>) -> OrderView {
    let user_name = users
        .get(&order.user_id)
        .map(User::display_name)
        .unwrap_or_else(|| UNKNOWN_USER.to_string());

    let items = order
        .items
        .into_iter()
        .map(|item| OrderItemView {
            product_name: products
                .get(&item.product_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| UNKNOWN_FOOD.to_string()),
            product_id: item.product_id,
            full_portion_qty: item.full_portion_qty,
            half_portion_qty: item.half_portion_qty,
            full_portion_price: item.full_portion_price,
            half_portion_price: item.half_portion_price,
        })
        .collect();

    OrderView {
        id: order.id,
        user_name,
        table_number: order.table_number,
        total_amount: order.total_amount,
        status: order.status,
        order_date: order.order_date,
        items,
    }
}
