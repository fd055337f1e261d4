//! The Person aggregate: a membership record plus its spiritual and contact
//! sub-records.
//!
//! A person always owns exactly one [`SpiritualInformation`] and one
//! [`ContactInformation`]. The three rows are written together and read
//! together; neither sub-record is ever exposed on its own.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Gender {
  Male,
  Female,
  Other,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CivilStatus {
  Single,
  Married,
  Widowed,
  Divorced,
  Separated,
  FreeUnion,
  Other,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// The identity block of a membership record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
  pub person_id:    Uuid,
  pub first_name:   String,
  pub last_name:    String,
  pub gender:       Gender,
  pub civil_status: Option<CivilStatus>,
  /// Date of birth.
  pub dob:          Option<NaiveDate>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
  /// Soft-delete tombstone. `Some` means the person is trashed but
  /// recoverable.
  pub deleted_at:   Option<DateTime<Utc>>,
}

impl Person {
  pub fn is_trashed(&self) -> bool { self.deleted_at.is_some() }
}

/// Church-life milestones for a person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiritualInformation {
  #[serde(default)]
  pub membership_at: Option<NaiveDate>,
  #[serde(default)]
  pub baptized_at:   Option<NaiveDate>,
  #[serde(default)]
  pub saved_at:      Option<NaiveDate>,
  #[serde(default)]
  pub testimony:     Option<String>,
}

/// How to reach a person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInformation {
  #[serde(default)]
  pub email:           Option<String>,
  #[serde(default)]
  pub phone:           Option<String>,
  #[serde(default)]
  pub alternate_phone: Option<String>,
  #[serde(default)]
  pub address_line_1:  Option<String>,
  #[serde(default)]
  pub address_line_2:  Option<String>,
  #[serde(default)]
  pub city:            Option<String>,
  #[serde(default)]
  pub state:           Option<String>,
  #[serde(default)]
  pub postal_code:     Option<String>,
  #[serde(default)]
  pub country:         Option<String>,
}

/// A person together with both sub-records, fully loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
  #[serde(flatten)]
  pub person:                Person,
  pub spiritual_information: SpiritualInformation,
  pub contact_information:   ContactInformation,
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Input to [`crate::store::MembershipStore::create_person`] and
/// [`crate::store::MembershipStore::update_person`].
///
/// Updates are full replacements: any optional field left as `None` is
/// written as NULL, clearing whatever was stored before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonInput {
  pub first_name:   String,
  pub last_name:    String,
  pub gender:       Gender,
  #[serde(default)]
  pub civil_status: Option<CivilStatus>,
  #[serde(default)]
  pub dob:          Option<NaiveDate>,
  #[serde(flatten)]
  pub spiritual:    SpiritualInformation,
  #[serde(flatten)]
  pub contact:      ContactInformation,
}

impl PersonInput {
  /// Convenience constructor with every optional field absent.
  pub fn new(
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    gender: Gender,
  ) -> Self {
    Self {
      first_name: first_name.into(),
      last_name: last_name.into(),
      gender,
      civil_status: None,
      dob: None,
      spiritual: SpiritualInformation::default(),
      contact: ContactInformation::default(),
    }
  }
}

/// Which people a read should consider, relative to the soft-delete
/// tombstone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrashFilter {
  /// Live people only.
  #[default]
  Without,
  /// Live and trashed people.
  With,
  /// Trashed people only.
  Only,
}
