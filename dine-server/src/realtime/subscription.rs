//! Single-path subscription

use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};

use super::{RealtimeTree, TreeChange};

/// 单路径订阅
///
/// 第一次 [`recv`](Subscription::recv) 返回订阅时的当前值，之后返回该路径的每次变更。
/// 广播滞后时重新读取当前值，订阅者总能收敛到最新状态。
/// Drop 即取消订阅。
pub struct Subscription {
    path: String,
    initial: Option<Value>,
    rx: broadcast::Receiver<TreeChange>,
    tree: RealtimeTree,
}

impl Subscription {
    pub(super) fn new(
        path: String,
        current: Value,
        rx: broadcast::Receiver<TreeChange>,
        tree: RealtimeTree,
    ) -> Self {
        Self {
            path,
            initial: Some(current),
            rx,
            tree,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 等待下一个值 (cancel-safe，可用于 `tokio::select!`)
    ///
    /// 返回 `None` 表示树已关闭。
    pub async fn recv(&mut self) -> Option<Value> {
        if let Some(value) = self.initial.take() {
            return Some(value);
        }

        loop {
            match self.rx.recv().await {
                Ok(change) if change.path == self.path => return Some(change.value),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        path = %self.path,
                        skipped = skipped,
                        "Subscription lagged, re-reading current value"
                    );
                    return Some(self.tree.get(&self.path).unwrap_or(Value::Null));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::realtime::{RealtimeTree, TreeConfig};
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_current_value_first() {
        let tree = RealtimeTree::new();
        tree.set("orders/served", false);

        let mut sub = tree.subscribe("orders/served");
        assert_eq!(sub.recv().await, Some(json!(false)));

        tree.set("trays/tray1", 4);
        tree.set("orders/served", true);
        assert_eq!(sub.recv().await, Some(json!(true)));
    }

    #[tokio::test]
    async fn test_absent_path_delivers_null() {
        let tree = RealtimeTree::new();
        let mut sub = tree.subscribe("trays/tray2");
        assert_eq!(sub.recv().await, Some(Value::Null));

        tree.set("trays/tray2", 8);
        assert_eq!(sub.recv().await, Some(json!(8)));
    }

    #[tokio::test]
    async fn test_lag_re_reads_current_value() {
        let tree = RealtimeTree::from_config(TreeConfig {
            channel_capacity: 2,
        });
        let mut sub = tree.subscribe("trays/tray1");
        assert_eq!(sub.recv().await, Some(Value::Null));

        for table in 1..=10 {
            tree.set("trays/tray1", table);
        }
        assert_eq!(sub.recv().await, Some(json!(10)));
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let tree = RealtimeTree::new();
        let sub = tree.subscribe("trays/tray1");
        assert_eq!(tree.receiver_count(), 1);
        drop(sub);
        assert_eq!(tree.receiver_count(), 0);
    }
}
