//! FineDine Server - 餐厅点餐与送餐机器人后端
//!
//! # 架构概述
//!
//! - **数据库** (`db`): 嵌入式 redb 文档存储 (订单、用户、菜品、购物车、管理员)
//! - **实时树** (`realtime`): 托盘与机器人状态，按路径订阅
//! - **托盘同步** (`trays`): 按订单队列重排三个托盘，维护 `has_served`
//! - **服务** (`services`): 结账、订单视图
//! - **HTTP API** (`api`): 顾客端、管理端、机器人接口
//!
//! # 模块结构
//!
//! ```text
//! dine-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # redb 存储层
//! ├── realtime/      # 实时键值树
//! ├── trays/         # 托盘分配与同步会话
//! ├── services/      # 结账、订单视图
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod realtime;
pub mod services;
pub mod trays;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use realtime::RealtimeTree;
pub use trays::{Repopulator, TraySession, TraySynchronizer};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 加载 `.env` 并初始化日志
pub fn setup_environment() {
    dotenv::dotenv().ok();
    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
    _______              ____  _
   / ____(_)___  ___    / __ \(_)___  ___
  / /_  / / __ \/ _ \  / / / / / __ \/ _ \
 / __/ / / / / /  __/ / /_/ / / / / /  __/
/_/   /_/_/ /_/\___/ /_____/_/_/ /_/\___/
    "#
    );
}
