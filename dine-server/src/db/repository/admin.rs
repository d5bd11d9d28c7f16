//! Admin Repository
//!
//! 管理员账号，密码使用 argon2 哈希存储

use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::Admin;
use shared::util::snowflake_id;

use super::RepoResult;
use crate::db::StorageResult;
use crate::utils::AppError;
use crate::utils::validation::{MAX_PASSWORD_LEN, validate_mobile, validate_required_text};

/// Admin documents: key = mobile, value = JSON-serialized Admin (with hash)
const ADMINS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("admins");

pub(crate) fn create_tables(txn: &WriteTransaction) -> StorageResult<()> {
    let _ = txn.open_table(ADMINS_TABLE)?;
    Ok(())
}

/// Hash password using argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// Verify password using argon2
pub fn verify_password(hash: &str, password: &str) -> Result<bool, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHash, PasswordVerifier},
    };

    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct AdminRepository {
    db: Arc<Database>,
}

impl AdminRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create or reset an admin account (startup seeding)
    pub fn upsert(&self, mobile: &str, password: &str) -> RepoResult<Admin> {
        validate_mobile(mobile)?;
        validate_required_text(password, "password", MAX_PASSWORD_LEN)?;

        let hash_pass = hash_password(password)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
        let mobile = mobile.trim();

        let txn = self.db.begin_write()?;
        let admin = {
            let mut admins = txn.open_table(ADMINS_TABLE)?;
            let existing: Option<StoredAdmin> = match admins.get(mobile)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };
            let admin = Admin {
                id: existing.map(|a| a.id).unwrap_or_else(snowflake_id),
                mobile: mobile.to_string(),
                hash_pass,
            };
            // Admin skips the hash when serialized, store it explicitly
            let value = serde_json::to_vec(&StoredAdmin::from(&admin))?;
            admins.insert(mobile, value.as_slice())?;
            admin
        };
        txn.commit()?;

        Ok(admin)
    }

    /// Verify mobile + password
    pub fn login(&self, mobile: &str, password: &str) -> RepoResult<Admin> {
        let read_txn = self.db.begin_read()?;
        let admins = read_txn.open_table(ADMINS_TABLE)?;

        let stored: StoredAdmin = match admins.get(mobile.trim())? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(AppError::invalid_credentials().into()),
        };

        let valid = verify_password(&stored.hash_pass, password).map_err(|e| {
            tracing::error!(mobile = %stored.mobile, error = %e, "Stored admin hash is unreadable");
            AppError::internal("Stored password hash is invalid")
        })?;
        if !valid {
            crate::security_log!("WARN", "admin_login_failed", mobile = stored.mobile.as_str());
            return Err(AppError::invalid_credentials().into());
        }

        Ok(stored.into())
    }
}

/// On-disk admin record
#[derive(serde::Serialize, serde::Deserialize)]
struct StoredAdmin {
    id: i64,
    mobile: String,
    hash_pass: String,
}

impl From<&Admin> for StoredAdmin {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            mobile: admin.mobile.clone(),
            hash_pass: admin.hash_pass.clone(),
        }
    }
}

impl From<StoredAdmin> for Admin {
    fn from(stored: StoredAdmin) -> Self {
        Self {
            id: stored.id,
            mobile: stored.mobile,
            hash_pass: stored.hash_pass,
        }
    }
}
