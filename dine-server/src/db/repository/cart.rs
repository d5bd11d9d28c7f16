//! Cart Repository
//!
//! One entry per (user, product), keyed `"{user_id}_{product_id}"`.

use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{CartAdd, CartEntry, MAX_PORTION_QTY};

use super::RepoResult;
use crate::db::StorageResult;
use crate::utils::validation::validate_portion_qty;
use crate::utils::{AppError, ErrorCode};

/// Cart entries: key = "{user_id}_{product_id}", value = JSON-serialized CartEntry
const CART_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cart");

pub(crate) fn create_tables(txn: &WriteTransaction) -> StorageResult<()> {
    let _ = txn.open_table(CART_TABLE)?;
    Ok(())
}

/// Key range covering every entry of one user (a backtick sorts right after `_`)
fn user_range(user_id: i64) -> (String, String) {
    (format!("{}_", user_id), format!("{}`", user_id))
}

fn accumulate(current: u32, added: u32) -> Result<u32, AppError> {
    current.checked_add(added).ok_or_else(|| {
        AppError::new(ErrorCode::PortionQuantityTooLarge).with_detail("max", MAX_PORTION_QTY)
    })
}

#[derive(Clone)]
pub struct CartRepository {
    db: Arc<Database>,
}

impl CartRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Add portions; quantities accumulate on an existing entry
    pub fn add(&self, user_id: i64, data: &CartAdd) -> RepoResult<CartEntry> {
        if data.full_portion_qty == 0 && data.half_portion_qty == 0 {
            return Err(AppError::new(ErrorCode::CartQuantityRequired).into());
        }

        let key = CartEntry::key(user_id, data.product_id);
        let txn = self.db.begin_write()?;
        let entry = {
            let mut table = txn.open_table(CART_TABLE)?;
            let existing: Option<CartEntry> = match table.get(key.as_str())? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };

            let entry = match existing {
                Some(mut entry) => {
                    entry.full_portion_qty =
                        accumulate(entry.full_portion_qty, data.full_portion_qty)?;
                    entry.half_portion_qty =
                        accumulate(entry.half_portion_qty, data.half_portion_qty)?;
                    entry
                }
                None => CartEntry {
                    user_id,
                    product_id: data.product_id,
                    full_portion_qty: data.full_portion_qty,
                    half_portion_qty: data.half_portion_qty,
                },
            };
            validate_portion_qty(entry.full_portion_qty, entry.half_portion_qty)?;
            let value = serde_json::to_vec(&entry)?;
            table.insert(key.as_str(), value.as_slice())?;
            entry
        };
        txn.commit()?;

        Ok(entry)
    }

    /// A user's cart entries
    pub fn entries(&self, user_id: i64) -> RepoResult<Vec<CartEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CART_TABLE)?;

        let (start, end) = user_range(user_id);
        let mut entries = Vec::new();
        for result in table.range(start.as_str()..end.as_str())? {
            let (_key, value) = result?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        Ok(entries)
    }

    pub fn remove(&self, user_id: i64, product_id: i64) -> RepoResult<()> {
        let key = CartEntry::key(user_id, product_id);
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(CART_TABLE)?;
            table.remove(key.as_str())?.is_some()
        };
        if !removed {
            return Err(AppError::new(ErrorCode::CartItemNotFound)
                .with_detail("product_id", product_id)
                .into());
        }
        txn.commit()?;
        Ok(())
    }

    /// Empty a user's cart, returning how many entries were removed
    pub fn clear(&self, user_id: i64) -> RepoResult<usize> {
        let (start, end) = user_range(user_id);
        let txn = self.db.begin_write()?;
        let count = {
            let mut table = txn.open_table(CART_TABLE)?;
            let mut keys = Vec::new();
            for result in table.range(start.as_str()..end.as_str())? {
                let (key, _value) = result?;
                keys.push(key.value().to_string());
            }
            for key in &keys {
                table.remove(key.as_str())?;
            }
            keys.len()
        };
        txn.commit()?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn add(product_id: i64, full: u32, half: u32) -> CartAdd {
        CartAdd {
            product_id,
            full_portion_qty: full,
            half_portion_qty: half,
        }
    }

    #[test]
    fn test_add_accumulates() {
        let repo = CartRepository::new(DbService::open_in_memory().unwrap().db);
        repo.add(1, &add(10, 1, 0)).unwrap();
        let entry = repo.add(1, &add(10, 2, 1)).unwrap();
        assert_eq!((entry.full_portion_qty, entry.half_portion_qty), (3, 1));
        assert_eq!(repo.entries(1).unwrap().len(), 1);
    }

    #[test]
    fn test_add_requires_a_portion() {
        let repo = CartRepository::new(DbService::open_in_memory().unwrap().db);
        let err: AppError = repo.add(1, &add(10, 0, 0)).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::CartQuantityRequired);
    }

    #[test]
    fn test_add_rejects_quantity_past_limit() {
        let repo = CartRepository::new(DbService::open_in_memory().unwrap().db);
        let err: AppError = repo.add(1, &add(10, u32::MAX, 0)).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::PortionQuantityTooLarge);
        assert!(repo.entries(1).unwrap().is_empty());

        repo.add(1, &add(10, MAX_PORTION_QTY, 0)).unwrap();
        let err: AppError = repo.add(1, &add(10, 1, 0)).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::PortionQuantityTooLarge);

        // stored entry unchanged by the rejected add
        let entries = repo.entries(1).unwrap();
        assert_eq!(entries[0].full_portion_qty, MAX_PORTION_QTY);
    }

    #[test]
    fn test_entries_are_per_user() {
        let repo = CartRepository::new(DbService::open_in_memory().unwrap().db);
        repo.add(1, &add(10, 1, 0)).unwrap();
        repo.add(12, &add(10, 1, 0)).unwrap();
        repo.add(12, &add(11, 0, 1)).unwrap();

        assert_eq!(repo.entries(1).unwrap().len(), 1);
        assert_eq!(repo.entries(12).unwrap().len(), 2);

        assert_eq!(repo.clear(12).unwrap(), 2);
        assert!(repo.entries(12).unwrap().is_empty());
        assert_eq!(repo.entries(1).unwrap().len(), 1);
    }

    #[test]
    fn test_remove() {
        let repo = CartRepository::new(DbService::open_in_memory().unwrap().db);
        repo.add(1, &add(10, 1, 0)).unwrap();
        repo.remove(1, 10).unwrap();
        let err: AppError = repo.remove(1, 10).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::CartItemNotFound);
    }
}
