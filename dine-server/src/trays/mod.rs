//! 托盘同步
//!
//! 让实时树中的托盘状态与待处理订单队列保持一致。
//!
//! ```text
//!  orders/served = true ──► TraySession (served task)
//!                                │
//!                                ▼
//!  checkout ─────────────► Repopulator ──► PendingOrderSource (oldest 3 Pending)
//!                                │
//!                                ▼
//!                         TrayStateStore  (tray1..3 + trayCount)
//!                                │
//!                                ▼
//!  trays/tray{1,2,3} ────► TraySession (mirror task) ──► robot/has_served
//! ```
//!
//! - [`assign`] - 纯函数：按创建时间选单，按桌号放置
//! - [`Repopulator`] - 唯一的重排算法，served 信号和结账共用
//! - [`TraySynchronizer`] / [`TraySession`] - 每个会话一组监听任务

mod assignment;
mod repopulate;
mod synchronizer;

pub use assignment::{MAX_TRAY_ORDERS, assign};
pub use repopulate::{Repopulator, Trigger};
pub use synchronizer::{SessionInfo, SynchronizerConfig, TraySession, TraySynchronizer};

use async_trait::async_trait;
use shared::models::Order;

use crate::db::repository::OrderRepository;
use crate::utils::AppResult;

/// 待处理订单来源
#[async_trait]
pub trait PendingOrderSource: Send + Sync {
    /// Pending orders ascending by `orderDate`, at most `limit`
    async fn pending_oldest_first(&self, limit: usize) -> AppResult<Vec<Order>>;
}

#[async_trait]
impl PendingOrderSource for OrderRepository {
    async fn pending_oldest_first(&self, limit: usize) -> AppResult<Vec<Order>> {
        Ok(OrderRepository::pending_oldest_first(self, limit)?)
    }
}
