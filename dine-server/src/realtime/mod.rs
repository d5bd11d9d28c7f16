//! 实时键值树
//!
//! 托盘、机器人状态的共享存储，所有会话观察同一棵树。
//!
//! # 架构
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 RealtimeTree                  │
//! │  RwLock<BTreeMap<path, Value>>                │
//! │  broadcast::Sender<TreeChange>  (仅实际变更)  │
//! └──────────────────────┬───────────────────────┘
//!                        │ subscribe(path)
//!          ┌─────────────┼─────────────┐
//!          ▼             ▼             ▼
//!     Subscription  Subscription  Subscription
//!     (trays/tray1) (orders/served)  ...
//! ```
//!
//! - [`RealtimeTree`] - 路径到 JSON 值的扁平映射，多路径原子写入
//! - [`Subscription`] - 单路径订阅，先投递当前值，drop 即取消订阅
//! - [`TrayStateStore`] - 托盘状态读写抽象 (测试可替换为失败后端)

mod store;
mod subscription;
mod tree;

pub use store::{TrayStateStore, flag_value, slot_value};
pub use subscription::Subscription;
pub use tree::{RealtimeTree, TreeChange, TreeConfig};
