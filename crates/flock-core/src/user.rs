//! Users (system accounts) and the roles assigned to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A system account. The password credential is never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub name:       String,
  /// Unique across all users.
  pub email:      String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A named bundle of permissions, e.g. `admin` or `pastor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub role_id: Uuid,
  pub name:    String,
}

/// A user together with the roles currently assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
  #[serde(flatten)]
  pub user:  User,
  pub roles: Vec<Role>,
}

impl UserRecord {
  pub fn has_role(&self, name: &str) -> bool {
    self.roles.iter().any(|r| r.name == name)
  }

  /// The assigned role ids, sorted, for set comparisons.
  pub fn role_ids(&self) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = self.roles.iter().map(|r| r.role_id).collect();
    ids.sort();
    ids
  }
}

/// Input to [`crate::store::MembershipStore::create_user`].
///
/// `password` is plaintext; the store hashes it before anything is written.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:     String,
  pub email:    String,
  pub password: String,
  pub role_ids: Vec<Uuid>,
}

/// Input to [`crate::store::MembershipStore::update_user`].
///
/// `role_ids` replaces the current role set wholesale. The stored password
/// is only touched when `password` is `Some`.
#[derive(Debug, Clone)]
pub struct UserUpdate {
  pub name:     String,
  pub email:    String,
  pub password: Option<String>,
  pub role_ids: Vec<Uuid>,
}

/// What authentication needs to verify a login.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user_id:       Uuid,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}
