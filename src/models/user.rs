// src/models/user.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// A user or administrator account, as seen outside the account collection.
/// Never carries the password secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,

    /// Unique across all accounts; compared case-sensitively.
    pub email: String,

    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,

    /// The seeded administrator. Cannot be deleted or demoted.
    #[serde(default)]
    pub owner: bool,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Persisted form of an account: the public record plus its Argon2 password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredAccount {
    #[serde(flatten)]
    pub account: Account,
    pub password: String,
}

impl StoredAccount {
    /// Strips the secret.
    pub fn public(&self) -> Account {
        self.account.clone()
    }
}
