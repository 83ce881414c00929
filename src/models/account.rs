use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::ScopeSet;

pub const MAX_USERNAME_LEN: usize = 255;

/// Usernames are stored and looked up byte-for-byte, so leading or trailing
/// whitespace is refused instead of trimmed.
pub fn is_valid_username(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_USERNAME_LEN && name.trim() == name
}

/// A stored identity record.
///
/// `password_hash` is a bcrypt string carrying its own salt and cost. It is
/// skipped during serialization and redacted from `Debug` output.
#[derive(Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub disabled: bool,
    pub scopes: ScopeSet,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("disabled", &self.disabled)
            .field("scopes", &self.scopes)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Registration input. The password is already hashed.
#[derive(Clone)]
pub struct NewAccount {
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub disabled: bool,
    pub scopes: ScopeSet,
}
