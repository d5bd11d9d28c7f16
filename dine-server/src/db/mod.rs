//! Database Module
//!
//! redb 嵌入式存储：订单、用户、管理员、商品、购物车
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` (JSON) | 订单文档 |
//! | `orders_by_date` | `(order_date, order_id)` | `()` | 全部订单按时间索引 |
//! | `pending_by_date` | `(order_date, order_id)` | `()` | 待处理订单按时间索引 (托盘选单) |
//! | `users` | `user_id` | `User` (JSON) | 顾客 |
//! | `users_by_mobile` | `mobile` | `user_id` | 手机号唯一索引 |
//! | `admins` | `mobile` | `Admin` (JSON) | 管理员 |
//! | `products` | `product_id` | `Product` (JSON) | 菜单 |
//! | `cart` | `"{user_id}_{product_id}"` | `CartEntry` (JSON) | 购物车 |

pub mod repository;

use redb::Database;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::utils::AppError;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::database(err.to_string())
    }
}

/// Database service - owns the shared redb handle
#[derive(Clone)]
pub struct DbService {
    pub db: Arc<Database>,
}

impl std::fmt::Debug for DbService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbService").finish_non_exhaustive()
    }
}

impl DbService {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable once `commit()` returns, so a power loss
    /// never leaves a half-written order behind.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create all tables if they don't exist
        let write_txn = db.begin_write()?;
        repository::create_tables(&write_txn)?;
        write_txn.commit()?;

        tracing::info!("Database ready (redb)");
        Ok(Self { db: Arc::new(db) })
    }
}
