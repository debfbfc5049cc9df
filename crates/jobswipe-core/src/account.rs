//! Accounts and sessions: the records behind the session gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered identity. The password is only ever held as an argon2 PHC
/// string.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
  pub user_id:       Uuid,
  pub email:         String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::AccountStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub password_hash: String,
  /// Copied into the profile row created alongside the account.
  pub full_name:     Option<String>,
}

/// A live session. Stores look sessions up by the hash of the bearer token;
/// the token itself is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
}
