//! User Repository

use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{User, UserCreate};
use shared::util::{now_millis, snowflake_id};

use super::RepoResult;
use crate::db::StorageResult;
use crate::utils::validation::{MAX_NAME_LEN, validate_mobile, validate_required_text};
use crate::utils::{AppError, ErrorCode};

/// User documents: key = user_id, value = JSON-serialized User
const USERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("users");

/// Unique mobile index: key = mobile, value = user_id
const USERS_BY_MOBILE_TABLE: TableDefinition<&str, i64> = TableDefinition::new("users_by_mobile");

pub(crate) fn create_tables(txn: &WriteTransaction) -> StorageResult<()> {
    let _ = txn.open_table(USERS_TABLE)?;
    let _ = txn.open_table(USERS_BY_MOBILE_TABLE)?;
    Ok(())
}

#[derive(Clone)]
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Sign up a customer; accounts start enabled
    pub fn create(&self, data: UserCreate) -> RepoResult<User> {
        validate_required_text(&data.first_name, "firstName", MAX_NAME_LEN)?;
        validate_required_text(&data.last_name, "lastName", MAX_NAME_LEN)?;
        validate_mobile(&data.mobile)?;

        let mobile = data.mobile.trim().to_string();
        let txn = self.db.begin_write()?;
        let user = {
            let mut users = txn.open_table(USERS_TABLE)?;
            let mut by_mobile = txn.open_table(USERS_BY_MOBILE_TABLE)?;

            if by_mobile.get(mobile.as_str())?.is_some() {
                return Err(AppError::new(ErrorCode::MobileAlreadyRegistered)
                    .with_detail("mobile", mobile)
                    .into());
            }

            let user = User {
                id: snowflake_id(),
                first_name: data.first_name.trim().to_string(),
                last_name: data.last_name.trim().to_string(),
                mobile,
                enabled: true,
                created_at: now_millis(),
            };
            let value = serde_json::to_vec(&user)?;
            users.insert(user.id, value.as_slice())?;
            by_mobile.insert(user.mobile.as_str(), user.id)?;
            user
        };
        txn.commit()?;

        Ok(user)
    }

    pub fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;

        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_by_mobile(&self, mobile: &str) -> RepoResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let by_mobile = read_txn.open_table(USERS_BY_MOBILE_TABLE)?;
        let users = read_txn.open_table(USERS_TABLE)?;

        let Some(id) = by_mobile.get(mobile.trim())?.map(|guard| guard.value()) else {
            return Ok(None);
        };
        match users.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Lookup login: the mobile number alone identifies the customer
    pub fn login(&self, mobile: &str) -> RepoResult<User> {
        let user = self
            .find_by_mobile(mobile)?
            .ok_or_else(AppError::invalid_credentials)?;
        if !user.enabled {
            return Err(AppError::new(ErrorCode::AccountDisabled)
                .with_detail("user_id", user.id)
                .into());
        }
        Ok(user)
    }

    /// All users, oldest account first
    pub fn find_all(&self) -> RepoResult<Vec<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;

        let mut users: Vec<User> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            users.push(serde_json::from_slice(value.value())?);
        }
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    /// Flip the enabled flag
    pub fn toggle_enabled(&self, id: i64) -> RepoResult<User> {
        let txn = self.db.begin_write()?;
        let user = {
            let mut users = txn.open_table(USERS_TABLE)?;
            let mut user: User = match users.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(AppError::not_found(format!("User {}", id)).into()),
            };
            user.enabled = !user.enabled;
            let value = serde_json::to_vec(&user)?;
            users.insert(id, value.as_slice())?;
            user
        };
        txn.commit()?;

        Ok(user)
    }
}
