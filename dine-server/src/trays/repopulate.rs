//! Tray repopulation
//!
//! One algorithm for every trigger. A served signal resets the trays first,
//! checkout only refills. Concurrent runs are not serialized; the last write
//! to the tray keys wins and the next trigger converges the state again.

use std::fmt;
use std::sync::Arc;

use shared::models::{TrayAssignment, TraySlots};

use super::{MAX_TRAY_ORDERS, PendingOrderSource, assign};
use crate::realtime::TrayStateStore;
use crate::utils::AppResult;

/// What started a repopulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Robot reported all trays emptied
    Served,
    /// A customer just placed an order
    Checkout,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Served => "served",
            Trigger::Checkout => "checkout",
        }
    }

    fn resets_first(&self) -> bool {
        matches!(self, Trigger::Served)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 托盘重排器
///
/// 持有订单来源和托盘状态存储，所有会话与结账流程共享同一实例。
#[derive(Clone)]
pub struct Repopulator {
    orders: Arc<dyn PendingOrderSource>,
    store: Arc<dyn TrayStateStore>,
}

impl fmt::Debug for Repopulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repopulator").finish_non_exhaustive()
    }
}

impl Repopulator {
    pub fn new(orders: Arc<dyn PendingOrderSource>, store: Arc<dyn TrayStateStore>) -> Self {
        Self { orders, store }
    }

    pub fn store(&self) -> &Arc<dyn TrayStateStore> {
        &self.store
    }

    /// Empty all trays and clear `has_served`
    pub async fn reset(&self) -> AppResult<()> {
        self.store
            .write_tray_slots(TrayAssignment::from(TraySlots::EMPTY))
            .await?;
        self.store.write_has_served_flag(false).await
    }

    /// Query the oldest Pending orders and write their tables to the trays
    pub async fn refill(&self) -> AppResult<TrayAssignment> {
        let selected = self.orders.pending_oldest_first(MAX_TRAY_ORDERS).await?;
        let assignment = assign(&selected);
        self.store.write_tray_slots(assignment).await?;
        Ok(assignment)
    }

    /// Full run for `trigger`
    ///
    /// On error the trays keep whatever was last written; a served run that
    /// fails after the reset leaves them empty.
    pub async fn run(&self, trigger: Trigger) -> AppResult<TrayAssignment> {
        if trigger.resets_first() {
            self.reset().await?;
        }

        let assignment = self.refill().await?;
        if trigger.resets_first() {
            self.store
                .write_has_served_flag(assignment.slots().is_carrying())
                .await?;
        }

        tracing::info!(
            trigger = %trigger,
            tray1 = assignment.tray1,
            tray2 = assignment.tray2,
            tray3 = assignment.tray3,
            tray_count = assignment.tray_count,
            "Trays repopulated"
        );
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::RealtimeTree;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use shared::models::{Order, OrderStatus};

    struct FixedOrders(Mutex<Vec<Order>>);

    impl FixedOrders {
        fn new(tables: &[u32]) -> Arc<Self> {
            let orders = tables
                .iter()
                .enumerate()
                .map(|(i, table)| Order {
                    id: i as i64 + 1,
                    user_id: 1,
                    table_number: *table,
                    items: vec![],
                    total_amount: Decimal::ZERO,
                    status: OrderStatus::Pending,
                    order_date: i as i64 + 1,
                })
                .collect();
            Arc::new(Self(Mutex::new(orders)))
        }
    }

    #[async_trait]
    impl PendingOrderSource for FixedOrders {
        async fn pending_oldest_first(&self, limit: usize) -> AppResult<Vec<Order>> {
            Ok(self.0.lock().iter().take(limit).cloned().collect())
        }
    }

    fn repopulator(tables: &[u32]) -> (Repopulator, RealtimeTree) {
        let tree = RealtimeTree::new();
        let repopulator = Repopulator::new(FixedOrders::new(tables), Arc::new(tree.clone()));
        (repopulator, tree)
    }

    #[tokio::test]
    async fn test_served_run_sets_has_served() {
        let (repopulator, tree) = repopulator(&[12, 5, 30]);
        let assignment = repopulator.run(Trigger::Served).await.unwrap();

        assert_eq!(assignment.slots().as_array(), [5, 12, 30]);
        assert_eq!(tree.read_tray_assignment(), assignment);
        assert!(tree.read_has_served_flag().await.unwrap());
    }

    #[tokio::test]
    async fn test_served_run_with_no_orders_clears_everything() {
        let (repopulator, tree) = repopulator(&[]);
        tree.write_tray_assignment(TraySlots::place([5, 12, 30]).into());
        tree.write_has_served_flag(true).await.unwrap();

        let assignment = repopulator.run(Trigger::Served).await.unwrap();
        assert_eq!(assignment.tray_count, 0);
        assert_eq!(tree.read_tray_assignment().slots(), TraySlots::EMPTY);
        assert!(!tree.read_has_served_flag().await.unwrap());
    }

    #[tokio::test]
    async fn test_checkout_run_does_not_touch_has_served() {
        let (repopulator, tree) = repopulator(&[5, 9]);
        tree.write_tray_assignment(TraySlots::place([5]).into());

        let assignment = repopulator.run(Trigger::Checkout).await.unwrap();
        assert_eq!(assignment.slots().as_array(), [5, 9, 0]);
        assert_eq!(assignment.tray_count, 2);
        // left to the session mirror
        assert!(!tree.read_has_served_flag().await.unwrap());
    }

    #[tokio::test]
    async fn test_run_is_idempotent() {
        let (repopulator, _tree) = repopulator(&[4, 2, 8, 1]);
        let first = repopulator.run(Trigger::Served).await.unwrap();
        let second = repopulator.run(Trigger::Served).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.slots().as_array(), [2, 4, 8]);
    }
}
