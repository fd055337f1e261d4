//! The permission catalog.
//!
//! A permission is the pair of an [`Action`] and a [`Resource`]. Its stored
//! form is `"<action> <resource>"` (e.g. `"create person"`), produced by an
//! explicit lookup table rather than by formatting at runtime, so a typo can
//! never mint a permission nobody is able to hold.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator as _, IntoStaticStr};

use crate::Error;

// ─── Action ──────────────────────────────────────────────────────────────────

/// The canonical operations an actor can attempt on a resource, in catalog
/// order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
)]
pub enum Action {
  #[serde(rename = "view any")]
  #[strum(serialize = "view any")]
  ViewAny,
  #[serde(rename = "view")]
  #[strum(serialize = "view")]
  View,
  #[serde(rename = "create")]
  #[strum(serialize = "create")]
  Create,
  #[serde(rename = "update")]
  #[strum(serialize = "update")]
  Update,
  #[serde(rename = "delete")]
  #[strum(serialize = "delete")]
  Delete,
  #[serde(rename = "restore")]
  #[strum(serialize = "restore")]
  Restore,
  #[serde(rename = "force delete")]
  #[strum(serialize = "force delete")]
  ForceDelete,
}

impl Action {
  /// The lowercase value used as the first half of a permission key.
  pub fn value(self) -> &'static str { self.into() }

  /// Actions reserved for the elevated role by provisioning convention.
  pub const fn admin_actions() -> &'static [Action] {
    &[Action::Restore, Action::ForceDelete]
  }

  /// Actions assignable to standard operational roles.
  pub const fn user_actions() -> &'static [Action] {
    &[
      Action::ViewAny,
      Action::View,
      Action::Create,
      Action::Update,
      Action::Delete,
    ]
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.value())
  }
}

// ─── Resource ────────────────────────────────────────────────────────────────

/// The entity kinds an authorization check can apply to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
  Person,
  User,
}

impl Resource {
  pub fn value(self) -> &'static str { self.into() }
}

impl fmt::Display for Resource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.value())
  }
}

// ─── PermissionKey ───────────────────────────────────────────────────────────

/// A typed `(Action, Resource)` permission.
///
/// Serialises as its stored string form, e.g. `"force delete user"`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey {
  pub action:   Action,
  pub resource: Resource,
}

impl PermissionKey {
  pub const fn new(action: Action, resource: Resource) -> Self {
    Self { action, resource }
  }

  /// The stored string form of this permission.
  pub fn as_str(&self) -> &'static str {
    use Action::*;
    use Resource::*;

    match (self.action, self.resource) {
      (ViewAny, Person) => "view any person",
      (View, Person) => "view person",
      (Create, Person) => "create person",
      (Update, Person) => "update person",
      (Delete, Person) => "delete person",
      (Restore, Person) => "restore person",
      (ForceDelete, Person) => "force delete person",
      (ViewAny, User) => "view any user",
      (View, User) => "view user",
      (Create, User) => "create user",
      (Update, User) => "update user",
      (Delete, User) => "delete user",
      (Restore, User) => "restore user",
      (ForceDelete, User) => "force delete user",
    }
  }

  /// Every permission in the catalog, grouped by resource.
  pub fn all() -> impl Iterator<Item = PermissionKey> {
    Resource::iter()
      .flat_map(|resource| Action::iter().map(move |action| Self::new(action, resource)))
  }
}

impl fmt::Display for PermissionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PermissionKey {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::all()
      .find(|key| key.as_str() == s)
      .ok_or_else(|| Error::UnknownPermission(s.to_owned()))
  }
}

impl TryFrom<String> for PermissionKey {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<PermissionKey> for String {
  fn from(key: PermissionKey) -> Self { key.as_str().to_owned() }
}
