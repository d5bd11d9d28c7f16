//! 托盘同步会话
//!
//! 每个会话持有一个子 `CancellationToken` 和两个监听任务：
//! - mirror: 镜像 tray1/tray2/tray3/trayCount 到会话视图，并按三个托盘重算 `has_served`
//! - served: `orders/served` 变为 true 时执行重排，稳定延迟后清除信号
//!
//! 会话关闭或 drop 时取消全部监听与未完成的延迟，之后不再写入托盘状态。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use shared::models::{TraySlots, TrayView, tray};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{Repopulator, Trigger};
use crate::realtime::{RealtimeTree, Subscription, TrayStateStore, flag_value, slot_value};

/// 默认稳定延迟：重排完成到清除 served 信号之间
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy)]
pub struct SynchronizerConfig {
    pub settle_delay: Duration,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Registry entry for an open session
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: u64,
    pub label: String,
    pub opened_at: i64,
}

/// 托盘同步器
///
/// 所有会话观察同一棵实时树、共享同一个 [`Repopulator`]。
#[derive(Clone)]
pub struct TraySynchronizer {
    tree: RealtimeTree,
    repopulator: Repopulator,
    config: SynchronizerConfig,
    shutdown: CancellationToken,
    sessions: Arc<DashMap<u64, SessionInfo>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for TraySynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraySynchronizer")
            .field("config", &self.config)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

impl TraySynchronizer {
    /// `shutdown` is the parent of every session token
    pub fn new(
        tree: RealtimeTree,
        repopulator: Repopulator,
        config: SynchronizerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            tree,
            repopulator,
            config,
            shutdown,
            sessions: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn repopulator(&self) -> &Repopulator {
        &self.repopulator
    }

    /// 打开一个会话
    ///
    /// 订阅在返回前同步建立，之后的树变更都不会丢失。必须在 tokio 运行时内调用。
    pub fn observe(&self, label: impl Into<String>) -> TraySession {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let label = label.into();
        let token = self.shutdown.child_token();
        // 视图从树的当前值开始，mirror 随后覆盖
        let initial = TrayView::from(self.tree.read_tray_assignment());
        let (view_tx, view_rx) = watch::channel(initial);
        let view_tx = Arc::new(view_tx);

        let mirror = Mirror {
            slots: tray::paths::SLOTS.map(|path| self.tree.subscribe(path)),
            count: self.tree.subscribe(tray::paths::TRAY_COUNT),
            view: view_tx.clone(),
            store: self.repopulator.store().clone(),
            token: token.clone(),
            session: id,
        };
        let served = ServedHandler {
            served: self.tree.subscribe(tray::paths::SERVED),
            repopulator: self.repopulator.clone(),
            view: view_tx,
            settle_delay: self.config.settle_delay,
            token: token.clone(),
            session: id,
        };

        let handles = vec![tokio::spawn(mirror.run()), tokio::spawn(served.run())];

        self.sessions.insert(
            id,
            SessionInfo {
                id,
                label: label.clone(),
                opened_at: shared::util::now_millis(),
            },
        );
        tracing::debug!(session = id, label = %label, "Tray session opened");

        TraySession {
            id,
            token,
            view: view_rx,
            handles,
            sessions: self.sessions.clone(),
        }
    }

    pub fn active_sessions(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> =
            self.sessions.iter().map(|entry| entry.value().clone()).collect();
        sessions.sort_by_key(|s| s.id);
        sessions
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Cancel every open session
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// 会话句柄
///
/// drop 即关闭；需要等待监听任务退出时使用 [`TraySession::close`]。
pub struct TraySession {
    id: u64,
    token: CancellationToken,
    view: watch::Receiver<TrayView>,
    handles: Vec<JoinHandle<()>>,
    sessions: Arc<DashMap<u64, SessionInfo>>,
}

impl TraySession {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Session-local observable tray state
    pub fn view(&self) -> watch::Receiver<TrayView> {
        self.view.clone()
    }

    pub fn current(&self) -> TrayView {
        *self.view.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel the listeners and wait for them to exit
    pub async fn close(mut self) {
        self.token.cancel();
        for handle in std::mem::take(&mut self.handles) {
            if let Err(e) = handle.await
                && e.is_panic()
            {
                tracing::error!(session = self.id, "Tray session task panicked");
            }
        }
    }
}

impl Drop for TraySession {
    fn drop(&mut self) {
        self.token.cancel();
        if self.sessions.remove(&self.id).is_some() {
            tracing::debug!(session = self.id, "Tray session closed");
        }
    }
}

impl std::fmt::Debug for TraySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraySession")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

enum TrayEvent {
    Slot(usize, Value),
    Count(Value),
}

struct Mirror {
    slots: [Subscription; tray::TRAY_SLOT_COUNT],
    count: Subscription,
    view: Arc<watch::Sender<TrayView>>,
    store: Arc<dyn TrayStateStore>,
    token: CancellationToken,
    session: u64,
}

impl Mirror {
    async fn run(self) {
        let Mirror {
            slots: [mut tray1, mut tray2, mut tray3],
            mut count,
            view,
            store,
            token,
            session,
        } = self;

        // Initial values are delivered immediately on every subscription
        let mut slots = TraySlots::EMPTY;
        for (index, sub) in [&mut tray1, &mut tray2, &mut tray3].into_iter().enumerate() {
            let Some(value) = sub.recv().await else {
                return;
            };
            slots = slots.with_slot(index, slot_value(&value));
        }
        let Some(initial_count) = count.recv().await else {
            return;
        };
        view.send_modify(|v| {
            set_slots(v, slots);
            v.tray_count = slot_value(&initial_count);
        });
        if token.is_cancelled() {
            return;
        }
        sync_has_served(store.as_ref(), slots, session).await;

        loop {
            let event = tokio::select! {
                _ = token.cancelled() => break,
                Some(value) = tray1.recv() => TrayEvent::Slot(0, value),
                Some(value) = tray2.recv() => TrayEvent::Slot(1, value),
                Some(value) = tray3.recv() => TrayEvent::Slot(2, value),
                Some(value) = count.recv() => TrayEvent::Count(value),
                else => break,
            };

            match event {
                TrayEvent::Slot(index, value) => {
                    slots = slots.with_slot(index, slot_value(&value));
                    view.send_modify(|v| set_slots(v, slots));
                    if token.is_cancelled() {
                        break;
                    }
                    sync_has_served(store.as_ref(), slots, session).await;
                }
                TrayEvent::Count(value) => {
                    let tray_count = slot_value(&value);
                    view.send_modify(|v| v.tray_count = tray_count);
                }
            }
        }
    }
}

fn set_slots(view: &mut TrayView, slots: TraySlots) {
    view.tray1 = slots.tray1;
    view.tray2 = slots.tray2;
    view.tray3 = slots.tray3;
}

/// Write `has_served` only when it disagrees with the slots
async fn sync_has_served(store: &dyn TrayStateStore, slots: TraySlots, session: u64) {
    let carrying = slots.is_carrying();
    if let Ok(current) = store.read_has_served_flag().await
        && current == carrying
    {
        return;
    }
    if let Err(e) = store.write_has_served_flag(carrying).await {
        tracing::warn!(session, error = %e, "Failed to update has_served");
    }
}

struct ServedHandler {
    served: Subscription,
    repopulator: Repopulator,
    view: Arc<watch::Sender<TrayView>>,
    settle_delay: Duration,
    token: CancellationToken,
    session: u64,
}

impl ServedHandler {
    async fn run(mut self) {
        loop {
            let value = tokio::select! {
                _ = self.token.cancelled() => break,
                value = self.served.recv() => match value {
                    Some(value) => value,
                    None => break,
                },
            };
            if !flag_value(&value) {
                continue;
            }

            tracing::info!(session = self.session, "Served signal received");
            self.view.send_modify(|v| v.loading = true);
            if !self.handle_served().await {
                break;
            }
            self.view.send_modify(|v| v.loading = false);
        }
    }

    /// Returns `false` when the session was cancelled mid-run
    async fn handle_served(&self) -> bool {
        let result = tokio::select! {
            _ = self.token.cancelled() => return false,
            result = self.repopulator.run(Trigger::Served) => result,
        };

        match result {
            Ok(_) => {
                tokio::select! {
                    _ = self.token.cancelled() => return false,
                    _ = tokio::time::sleep(self.settle_delay) => {}
                }
                if let Err(e) = self.repopulator.store().write_served_signal(false).await {
                    tracing::warn!(session = self.session, error = %e, "Failed to clear served signal");
                }
            }
            // served stays true; the next signal retries
            Err(e) => {
                tracing::error!(session = self.session, error = %e, "Tray repopulation failed");
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trays::PendingOrderSource;
    use crate::utils::AppResult;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use shared::models::{Order, OrderStatus};

    struct NoOrders;

    #[async_trait]
    impl PendingOrderSource for NoOrders {
        async fn pending_oldest_first(&self, _limit: usize) -> AppResult<Vec<Order>> {
            Ok(vec![])
        }
    }

    struct OneOrder(u32);

    #[async_trait]
    impl PendingOrderSource for OneOrder {
        async fn pending_oldest_first(&self, _limit: usize) -> AppResult<Vec<Order>> {
            Ok(vec![Order {
                id: 1,
                user_id: 1,
                table_number: self.0,
                items: vec![],
                total_amount: Decimal::ZERO,
                status: OrderStatus::Pending,
                order_date: 1,
            }])
        }
    }

    fn synchronizer(source: Arc<dyn PendingOrderSource>) -> (TraySynchronizer, RealtimeTree) {
        let tree = RealtimeTree::new();
        let repopulator = Repopulator::new(source, Arc::new(tree.clone()));
        let sync = TraySynchronizer::new(
            tree.clone(),
            repopulator,
            SynchronizerConfig::default(),
            CancellationToken::new(),
        );
        (sync, tree)
    }

    async fn wait_for(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_starts_from_current_trays() {
        let (sync, tree) = synchronizer(Arc::new(NoOrders));
        tree.write_tray_assignment(TraySlots::place([4, 9]).into());

        let session = sync.observe("late");
        let view = session.current();
        assert_eq!(view.slots().as_array(), [4, 9, 0]);
        assert_eq!(view.tray_count, 2);
        assert!(!view.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mirror_recomputes_has_served() {
        let (sync, tree) = synchronizer(Arc::new(NoOrders));
        let session = sync.observe("test");

        tree.set(tray::paths::TRAY2, 9);
        wait_for(|| flag_value(&tree.get(tray::paths::HAS_SERVED).unwrap_or(Value::Null))).await;
        assert_eq!(session.current().tray2, 9);

        tree.set(tray::paths::TRAY2, 0);
        wait_for(|| tree.get(tray::paths::HAS_SERVED) == Some(Value::Bool(false))).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_served_signal_cleared_after_settle() {
        let (sync, tree) = synchronizer(Arc::new(OneOrder(7)));
        let session = sync.observe("test");

        tree.set(tray::paths::SERVED, true);
        wait_for(|| tree.get(tray::paths::SERVED) == Some(Value::Bool(false))).await;

        assert_eq!(tree.read_tray_assignment().slots().as_array(), [7, 0, 0]);
        assert!(!session.current().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_tracks_sessions() {
        let (sync, _tree) = synchronizer(Arc::new(NoOrders));
        let first = sync.observe("a");
        let second = sync.observe("b");
        assert_eq!(sync.session_count(), 2);
        assert_eq!(sync.active_sessions()[1].label, "b");

        drop(first);
        assert_eq!(sync.session_count(), 1);
        second.close().await;
        assert_eq!(sync.session_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_sessions() {
        let (sync, _tree) = synchronizer(Arc::new(NoOrders));
        let session = sync.observe("test");
        sync.shutdown();
        assert!(session.is_closed());
    }
}
