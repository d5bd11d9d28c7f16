//! Order Repository
//!
//! Pending orders are additionally indexed by `(order_date, order_id)` so the
//! tray refill can read the oldest ones without scanning completed history.

use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::order::total_amount;
use shared::models::{
    MAX_PORTION_PRICE, Order, OrderCreate, OrderEditOutcome, OrderItem, OrderItemQuantity,
    OrderStatus,
};
use shared::util::{now_millis, snowflake_id};

use super::{RepoError, RepoResult};
use crate::db::StorageResult;
use crate::utils::validation::validate_portion_qty;
use crate::utils::{AppError, ErrorCode};

/// Order documents: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

/// Every order by creation time: key = (order_date, order_id)
const ORDERS_BY_DATE_TABLE: TableDefinition<(i64, i64), ()> =
    TableDefinition::new("orders_by_date");

/// Pending orders by creation time: key = (order_date, order_id)
const PENDING_BY_DATE_TABLE: TableDefinition<(i64, i64), ()> =
    TableDefinition::new("pending_by_date");

pub(crate) fn create_tables(txn: &WriteTransaction) -> StorageResult<()> {
    let _ = txn.open_table(ORDERS_TABLE)?;
    let _ = txn.open_table(ORDERS_BY_DATE_TABLE)?;
    let _ = txn.open_table(PENDING_BY_DATE_TABLE)?;
    Ok(())
}

fn order_not_found(id: i64) -> RepoError {
    AppError::new(ErrorCode::OrderNotFound)
        .with_detail("order_id", id)
        .into()
}

#[derive(Clone)]
pub struct OrderRepository {
    db: Arc<Database>,
}

impl OrderRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a Pending order stamped with the current time
    ///
    /// `orderDate` is kept strictly increasing across creations, so two
    /// checkouts within the same millisecond still have a defined age order.
    pub fn create(&self, data: OrderCreate) -> RepoResult<Order> {
        self.insert_new(data, None)
    }

    /// Create a Pending order with an explicit creation time (imports, tests)
    pub fn create_at(&self, data: OrderCreate, order_date: i64) -> RepoResult<Order> {
        self.insert_new(data, Some(order_date))
    }

    fn insert_new(&self, data: OrderCreate, order_date: Option<i64>) -> RepoResult<Order> {
        if data.table_number == 0 {
            return Err(AppError::new(ErrorCode::TableNumberInvalid)
                .with_detail("value", 0)
                .into());
        }
        let items: Vec<OrderItem> = data.items.into_iter().filter(|i| !i.is_empty()).collect();
        for item in &items {
            validate_portion_qty(item.full_portion_qty, item.half_portion_qty)?;
            if item.full_portion_price > MAX_PORTION_PRICE
                || item.half_portion_price > MAX_PORTION_PRICE
            {
                return Err(AppError::new(ErrorCode::ProductInvalidPrice)
                    .with_detail("product_id", item.product_id)
                    .into());
            }
        }
        if items.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty)
                .with_detail("user_id", data.user_id)
                .into());
        }

        let txn = self.db.begin_write()?;
        let order = {
            let mut orders = txn.open_table(ORDERS_TABLE)?;
            let mut by_date = txn.open_table(ORDERS_BY_DATE_TABLE)?;
            let mut pending = txn.open_table(PENDING_BY_DATE_TABLE)?;

            let order_date = match order_date {
                Some(date) => date,
                None => {
                    let now = now_millis();
                    let last = by_date.last()?.map(|(key, _)| key.value().0);
                    match last {
                        Some(last) if last >= now => last + 1,
                        _ => now,
                    }
                }
            };

            let order = Order {
                id: snowflake_id(),
                user_id: data.user_id,
                table_number: data.table_number,
                total_amount: total_amount(&items),
                items,
                status: OrderStatus::Pending,
                order_date,
            };

            let value = serde_json::to_vec(&order)?;
            orders.insert(order.id, value.as_slice())?;
            by_date.insert((order.order_date, order.id), ())?;
            pending.insert((order.order_date, order.id), ())?;
            order
        };
        txn.commit()?;

        Ok(order)
    }

    /// Get an order by ID
    pub fn find_by_id(&self, id: i64) -> RepoResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        match table.get(id)? {
            Some(value) => {
                let order: Order = serde_json::from_slice(value.value())?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Oldest `limit` Pending orders, ascending by `orderDate`
    pub fn pending_oldest_first(&self, limit: usize) -> RepoResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let pending = read_txn.open_table(PENDING_BY_DATE_TABLE)?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;

        let mut result = Vec::new();
        for entry in pending.iter()? {
            if result.len() >= limit {
                break;
            }
            let (key, _value) = entry?;
            let (_, id) = key.value();
            if let Some(value) = orders.get(id)? {
                let order: Order = serde_json::from_slice(value.value())?;
                if order.status == OrderStatus::Pending {
                    result.push(order);
                }
            }
        }

        Ok(result)
    }

    /// All orders with the given status, oldest first
    pub fn list_by_status(&self, status: OrderStatus) -> RepoResult<Vec<Order>> {
        if status == OrderStatus::Pending {
            return self.pending_oldest_first(usize::MAX);
        }

        let read_txn = self.db.begin_read()?;
        let by_date = read_txn.open_table(ORDERS_BY_DATE_TABLE)?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;

        let mut result = Vec::new();
        for entry in by_date.iter()? {
            let (key, _value) = entry?;
            let (_, id) = key.value();
            if let Some(value) = orders.get(id)? {
                let order: Order = serde_json::from_slice(value.value())?;
                if order.status == status {
                    result.push(order);
                }
            }
        }

        Ok(result)
    }

    /// A customer's orders, newest first
    pub fn list_for_user(&self, user_id: i64) -> RepoResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let by_date = read_txn.open_table(ORDERS_BY_DATE_TABLE)?;
        let orders = read_txn.open_table(ORDERS_TABLE)?;

        let mut result = Vec::new();
        for entry in by_date.iter()?.rev() {
            let (key, _value) = entry?;
            let (_, id) = key.value();
            if let Some(value) = orders.get(id)? {
                let order: Order = serde_json::from_slice(value.value())?;
                if order.user_id == user_id {
                    result.push(order);
                }
            }
        }

        Ok(result)
    }

    /// Pending -> Completed (admin action)
    pub fn complete(&self, id: i64) -> RepoResult<Order> {
        let txn = self.db.begin_write()?;
        let order = {
            let mut orders = txn.open_table(ORDERS_TABLE)?;
            let mut pending = txn.open_table(PENDING_BY_DATE_TABLE)?;

            let mut order: Order = match orders.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(order_not_found(id)),
            };
            if order.status == OrderStatus::Completed {
                return Err(AppError::new(ErrorCode::OrderAlreadyCompleted)
                    .with_detail("order_id", id)
                    .into());
            }

            order.status = OrderStatus::Completed;
            let value = serde_json::to_vec(&order)?;
            orders.insert(id, value.as_slice())?;
            pending.remove((order.order_date, id))?;
            order
        };
        txn.commit()?;

        Ok(order)
    }

    /// Customer edit of a Pending order
    ///
    /// `quantities` replaces the quantities of the existing lines by position.
    /// Lines left with zero portions are dropped; if nothing is left the
    /// order itself is deleted.
    pub fn update_items(
        &self,
        id: i64,
        quantities: &[OrderItemQuantity],
    ) -> RepoResult<OrderEditOutcome> {
        let txn = self.db.begin_write()?;
        let outcome = {
            let mut orders = txn.open_table(ORDERS_TABLE)?;
            let mut by_date = txn.open_table(ORDERS_BY_DATE_TABLE)?;
            let mut pending = txn.open_table(PENDING_BY_DATE_TABLE)?;

            let mut order: Order = match orders.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(order_not_found(id)),
            };
            if order.status != OrderStatus::Pending {
                return Err(AppError::new(ErrorCode::OrderNotEditable)
                    .with_detail("order_id", id)
                    .into());
            }
            if quantities.len() != order.items.len() {
                return Err(AppError::validation(format!(
                    "expected {} item quantities, got {}",
                    order.items.len(),
                    quantities.len()
                ))
                .into());
            }

            for qty in quantities {
                validate_portion_qty(qty.full_portion_qty, qty.half_portion_qty)?;
            }

            let items: Vec<OrderItem> = order
                .items
                .iter()
                .zip(quantities)
                .map(|(item, qty)| OrderItem {
                    full_portion_qty: qty.full_portion_qty,
                    half_portion_qty: qty.half_portion_qty,
                    ..item.clone()
                })
                .filter(|item| !item.is_empty())
                .collect();

            let key = (order.order_date, id);
            if items.is_empty() {
                orders.remove(id)?;
                by_date.remove(key)?;
                pending.remove(key)?;
                OrderEditOutcome::Deleted { order_id: id }
            } else {
                order.total_amount = total_amount(&items);
                order.items = items;
                let value = serde_json::to_vec(&order)?;
                orders.insert(id, value.as_slice())?;
                OrderEditOutcome::Updated { order }
            }
        };
        txn.commit()?;

        Ok(outcome)
    }
}
