//! Repository Module
//!
//! redb 上的文档存储，每个仓库持有共享的 `Arc<Database>`。

// Auth
pub mod admin;
pub mod user;

// Menu
pub mod cart;
pub mod product;

// Orders
pub mod order;

// Re-exports
pub use admin::AdminRepository;
pub use cart::CartRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use user::UserRepository;

use redb::WriteTransaction;
use thiserror::Error;

use super::{StorageError, StorageResult};
use crate::utils::AppError;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    /// redb / serde failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Business rule rejected the operation
    #[error("{0}")]
    Rejected(AppError),
}

macro_rules! storage_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for RepoError {
                fn from(err: $ty) -> Self {
                    RepoError::Storage(StorageError::from(err))
                }
            }
        )*
    };
}

storage_error_from!(
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    serde_json::Error,
);

impl From<AppError> for RepoError {
    fn from(err: AppError) -> Self {
        RepoError::Rejected(err)
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Storage(e) => e.into(),
            RepoError::Rejected(e) => e,
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Create every table so that read transactions never hit a missing table
pub(crate) fn create_tables(txn: &WriteTransaction) -> StorageResult<()> {
    order::create_tables(txn)?;
    user::create_tables(txn)?;
    admin::create_tables(txn)?;
    product::create_tables(txn)?;
    cart::create_tables(txn)?;
    Ok(())
}
