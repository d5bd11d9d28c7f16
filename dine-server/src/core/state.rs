use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::db::repository::{
    AdminRepository, CartRepository, OrderRepository, ProductRepository, UserRepository,
};
use crate::realtime::{RealtimeTree, TreeConfig};
use crate::services::CheckoutService;
use crate::trays::{Repopulator, SynchronizerConfig, TraySynchronizer};

/// 服务器状态 - 持有所有服务的引用
///
/// ServerState 是整个服务器的核心状态容器，所有字段都是 Arc 或 Clone，
/// 可以廉价地在 handler 之间共享。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置 |
/// | db | DbService | redb 数据库 |
/// | orders / users / admins / products / carts | Repository | 文档存储 |
/// | tree | RealtimeTree | 托盘、机器人实时状态 |
/// | synchronizer | TraySynchronizer | 托盘同步会话工厂 |
/// | checkout | CheckoutService | 结账 |
/// | shutdown | CancellationToken | 全局关闭信号 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub orders: OrderRepository,
    pub users: UserRepository,
    pub admins: AdminRepository,
    pub products: ProductRepository,
    pub carts: CartRepository,
    pub tree: RealtimeTree,
    pub synchronizer: TraySynchronizer,
    pub checkout: CheckoutService,
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录结构
    /// 2. 打开 `{work_dir}/database/dine.redb`
    /// 3. 组装存储、实时树、同步器与结账服务
    /// 4. 写入配置中的管理员账号 (如有)
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let db = DbService::open(config.database_path())?;
        let state = Self::with_db(config, db);

        if let (Some(mobile), Some(password)) = (&config.admin_mobile, &config.admin_password) {
            state.admins.upsert(mobile, password).map_err(|e| {
                ServerError::Internal(anyhow::anyhow!("Failed to seed admin account: {e}"))
            })?;
            tracing::info!(mobile = %mobile, "Admin account ready");
        }

        Ok(state)
    }

    /// 在已打开的数据库上组装状态
    pub fn with_db(config: &Config, db: DbService) -> Self {
        let orders = OrderRepository::new(db.db.clone());
        let users = UserRepository::new(db.db.clone());
        let admins = AdminRepository::new(db.db.clone());
        let products = ProductRepository::new(db.db.clone());
        let carts = CartRepository::new(db.db.clone());

        let tree = RealtimeTree::from_config(TreeConfig {
            channel_capacity: config.tree_channel_capacity,
        });
        let shutdown = CancellationToken::new();
        let repopulator = Repopulator::new(Arc::new(orders.clone()), Arc::new(tree.clone()));
        let synchronizer = TraySynchronizer::new(
            tree.clone(),
            repopulator.clone(),
            SynchronizerConfig {
                settle_delay: config.settle_delay(),
            },
            shutdown.child_token(),
        );
        let checkout = CheckoutService::new(
            orders.clone(),
            carts.clone(),
            products.clone(),
            repopulator,
        );

        Self {
            config: config.clone(),
            db,
            orders,
            users,
            admins,
            products,
            carts,
            tree,
            synchronizer,
            checkout,
            shutdown,
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用。常驻一个托盘同步会话，
    /// 没有任何客户端连接时 served 信号也会被处理。
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new(self.shutdown.clone());

        let session = self.synchronizer.observe("server");
        let token = tasks.shutdown_token();
        tasks.spawn("tray_synchronizer", TaskKind::Listener, async move {
            token.cancelled().await;
            session.close().await;
        });

        tasks.log_summary();
        tasks
    }
}
