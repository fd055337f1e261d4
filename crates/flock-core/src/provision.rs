//! The default role catalog and the permissions each role receives.
//!
//! Storage backends apply [`default_grants`] when provisioning a fresh
//! database. Applying it twice must be a no-op.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::permission::{Action, PermissionKey, Resource};

/// The roles every installation starts with.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoleName {
  Admin,
  Pastor,
}

impl RoleName {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// `(role, permission)` pairs granted at provisioning time.
///
/// - `admin` manages users and people, and is the only role that can restore
///   or force-delete either.
/// - `pastor` manages people.
pub fn default_grants() -> Vec<(RoleName, PermissionKey)> {
  let mut grants = Vec::new();

  for &action in Action::user_actions() {
    grants.push((RoleName::Admin, PermissionKey::new(action, Resource::User)));
  }

  for &action in Action::user_actions() {
    let key = PermissionKey::new(action, Resource::Person);
    grants.push((RoleName::Admin, key));
    grants.push((RoleName::Pastor, key));
  }

  for resource in [Resource::User, Resource::Person] {
    for &action in Action::admin_actions() {
      grants.push((RoleName::Admin, PermissionKey::new(action, resource)));
    }
  }

  grants
}

#[cfg(test)]
mod tests {
  use super::*;

  fn granted(role: RoleName) -> Vec<PermissionKey> {
    let mut keys: Vec<PermissionKey> = default_grants()
      .into_iter()
      .filter(|(r, _)| *r == role)
      .map(|(_, k)| k)
      .collect();
    keys.sort();
    keys
  }

  #[test]
  fn admin_holds_the_whole_catalog() {
    let mut all: Vec<PermissionKey> = PermissionKey::all().collect();
    all.sort();
    assert_eq!(granted(RoleName::Admin), all);
  }

  #[test]
  fn pastor_manages_people_only() {
    let keys = granted(RoleName::Pastor);
    assert_eq!(keys.len(), Action::user_actions().len());
    assert!(keys.iter().all(|k| k.resource == Resource::Person));
    assert!(
      keys
        .iter()
        .all(|k| !Action::admin_actions().contains(&k.action))
    );
  }
}
