//! Realtime tree core

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;

use super::Subscription;

/// Configuration for the realtime tree
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Capacity of the broadcast channel (default: 1024)
    pub channel_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// One path changed; `Value::Null` means the path was removed
#[derive(Debug, Clone, PartialEq)]
pub struct TreeChange {
    pub path: String,
    pub value: Value,
}

/// 实时键值树 - 进程内替代托管实时数据库
///
/// # 职责
///
/// - 路径读写 (get, set, update, remove)
/// - 变更广播 (值未变化时不产生事件)
/// - 单路径订阅 ([`Subscription`])
///
/// 写入 `Value::Null` 等同于删除该路径。
#[derive(Clone)]
pub struct RealtimeTree {
    values: Arc<RwLock<BTreeMap<String, Value>>>,
    tx: broadcast::Sender<TreeChange>,
}

impl std::fmt::Debug for RealtimeTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeTree")
            .field("paths", &self.values.read().len())
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}

impl Default for RealtimeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeTree {
    /// 创建默认配置的实时树
    pub fn new() -> Self {
        Self::from_config(TreeConfig::default())
    }

    /// 从配置创建实时树
    pub fn from_config(config: TreeConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            values: Arc::new(RwLock::new(BTreeMap::new())),
            tx,
        }
    }

    /// 读取路径当前值
    pub fn get(&self, path: &str) -> Option<Value> {
        self.values.read().get(path).cloned()
    }

    /// 读取前缀下的所有路径 (`"trays"` 匹配 `trays/*`)
    pub fn get_prefix(&self, prefix: &str) -> BTreeMap<String, Value> {
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        self.values
            .read()
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .map(|(path, value)| (path.clone(), value.clone()))
            .collect()
    }

    /// 写入单个路径
    ///
    /// 返回值表示是否实际发生变更
    pub fn set(&self, path: &str, value: impl Into<Value>) -> bool {
        self.update([(path.to_string(), value.into())]) > 0
    }

    /// 删除路径
    pub fn remove(&self, path: &str) -> bool {
        self.set(path, Value::Null)
    }

    /// 多路径原子写入
    ///
    /// 所有路径在同一把写锁下更新，观察者不会看到部分写入的状态。
    /// 返回实际变更的路径数量。
    pub fn update<I, P>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (P, Value)>,
        P: Into<String>,
    {
        let mut values = self.values.write();
        let mut changed = 0;

        for (path, value) in entries {
            let path = path.into();
            let previous = if value.is_null() {
                values.remove(&path)
            } else {
                values.insert(path.clone(), value.clone())
            };

            if previous.as_ref().unwrap_or(&Value::Null) == &value {
                continue;
            }
            changed += 1;

            // 没有订阅者时 send 返回 Err，属正常情况
            let _ = self.tx.send(TreeChange { path, value });
        }

        changed
    }

    /// 订阅单个路径
    ///
    /// 先投递当前值 (不存在时为 `Value::Null`)，之后投递每次变更。
    pub fn subscribe(&self, path: &str) -> Subscription {
        // 持有读锁时创建 receiver，保证当前值与后续事件之间没有空隙
        let values = self.values.read();
        let rx = self.tx.subscribe();
        let current = values.get(path).cloned().unwrap_or(Value::Null);
        drop(values);

        Subscription::new(path.to_string(), current, rx, self.clone())
    }

    /// 订阅所有变更 (原始广播)
    #[cfg(test)]
    fn subscribe_all(&self) -> broadcast::Receiver<TreeChange> {
        self.tx.subscribe()
    }

    /// 当前订阅者数量
    #[cfg(test)]
    pub(crate) fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let tree = RealtimeTree::new();
        assert!(tree.get("trays/tray1").is_none());

        assert!(tree.set("trays/tray1", 5));
        assert_eq!(tree.get("trays/tray1"), Some(json!(5)));

        // same value is not a change
        assert!(!tree.set("trays/tray1", 5));

        assert!(tree.remove("trays/tray1"));
        assert!(tree.get("trays/tray1").is_none());
        assert!(!tree.remove("trays/tray1"));
    }

    #[test]
    fn test_get_prefix() {
        let tree = RealtimeTree::new();
        tree.set("trays/tray1", 1);
        tree.set("trays/trayCount", 1);
        tree.set("traysX/other", 9);
        tree.set("robot/battery", 80);

        let trays = tree.get_prefix("trays");
        assert_eq!(trays.len(), 2);
        assert_eq!(trays.get("trays/tray1"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_update_emits_only_real_changes() {
        let tree = RealtimeTree::new();
        tree.set("trays/tray1", 5);

        let mut rx = tree.subscribe_all();
        let changed = tree.update([
            ("trays/tray1", json!(5)),
            ("trays/tray2", json!(12)),
            ("trays/trayCount", json!(2)),
        ]);
        assert_eq!(changed, 2);

        assert_eq!(rx.recv().await.unwrap().path, "trays/tray2");
        assert_eq!(rx.recv().await.unwrap().path, "trays/trayCount");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_update_is_observed_atomically() {
        let tree = RealtimeTree::new();
        let mut rx = tree.subscribe_all();
        tree.update([("trays/tray1", json!(3)), ("trays/trayCount", json!(1))]);

        // by the time the first event is visible, the whole write is visible
        let first = rx.try_recv().unwrap();
        assert_eq!(first.path, "trays/tray1");
        assert_eq!(tree.get("trays/trayCount"), Some(json!(1)));
    }
}
