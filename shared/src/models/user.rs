//! User Model

use serde::{Deserialize, Serialize};

/// Customer account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    /// Disabled accounts cannot log in
    pub enabled: bool,
    pub created_at: i64,
}

impl User {
    /// "First Last"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Sign-up payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
}

/// Customer login: lookup by mobile number only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub mobile: String,
}

/// Administrator login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLoginRequest {
    pub mobile: String,
    pub password: String,
}

/// Administrator account (password hash never serialized)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub mobile: String,
    #[serde(skip_serializing, default)]
    pub hash_pass: String,
}
