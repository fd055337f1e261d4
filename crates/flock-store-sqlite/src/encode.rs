//! Text column codecs for the membership tables, plus the raw row structs
//! the query layer fills and the store decodes.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`,
//! enums as their snake_case names and UUIDs as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use flock_core::{
  person::{
    CivilStatus, ContactInformation, Gender, Person, PersonInput, PersonRecord,
    SpiritualInformation,
  },
  user::{Role, User, UserRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

// ─── Enums ────────────────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> &'static str { g.into() }

pub fn decode_gender(s: &str) -> Result<Gender> {
  s.parse().map_err(|_| Error::UnknownVariant {
    kind:  "gender",
    value: s.to_owned(),
  })
}

pub fn encode_civil_status(c: CivilStatus) -> &'static str { c.into() }

pub fn decode_civil_status(s: &str) -> Result<CivilStatus> {
  s.parse().map_err(|_| Error::UnknownVariant {
    kind:  "civil status",
    value: s.to_owned(),
  })
}

// ─── Person input ────────────────────────────────────────────────────────────

/// Column values for the three person tables, encoded and owned so they can
/// be moved into a `tokio_rusqlite` closure.
pub struct PersonParams {
  pub person_id:     String,
  pub first_name:    String,
  pub last_name:     String,
  pub gender:        &'static str,
  pub civil_status:  Option<&'static str>,
  pub dob:           Option<String>,
  pub now:           String,
  // spiritual_information
  pub membership_at: Option<String>,
  pub baptized_at:   Option<String>,
  pub saved_at:      Option<String>,
  pub testimony:     Option<String>,
  // contact_information
  pub contact:       ContactInformation,
}

impl PersonParams {
  pub fn encode(person_id: Uuid, input: PersonInput, now: DateTime<Utc>) -> Self {
    let PersonInput {
      first_name,
      last_name,
      gender,
      civil_status,
      dob,
      spiritual,
      contact,
    } = input;

    Self {
      person_id: encode_uuid(person_id),
      first_name,
      last_name,
      gender: encode_gender(gender),
      civil_status: civil_status.map(encode_civil_status),
      dob: dob.map(encode_date),
      now: encode_dt(now),
      membership_at: spiritual.membership_at.map(encode_date),
      baptized_at: spiritual.baptized_at.map(encode_date),
      saved_at: spiritual.saved_at.map(encode_date),
      testimony: spiritual.testimony,
      contact,
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `people` row joined with both sub-record tables.
///
/// Sub-record columns come from LEFT JOINs and are therefore all nullable.
pub struct RawPerson {
  // people columns
  pub person_id:       String,
  pub first_name:      String,
  pub last_name:       String,
  pub gender:          String,
  pub civil_status:    Option<String>,
  pub dob:             Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
  pub deleted_at:      Option<String>,
  // spiritual_information join
  pub membership_at:   Option<String>,
  pub baptized_at:     Option<String>,
  pub saved_at:        Option<String>,
  pub testimony:       Option<String>,
  // contact_information join
  pub email:           Option<String>,
  pub phone:           Option<String>,
  pub alternate_phone: Option<String>,
  pub address_line_1:  Option<String>,
  pub address_line_2:  Option<String>,
  pub city:            Option<String>,
  pub state:           Option<String>,
  pub postal_code:     Option<String>,
  pub country:         Option<String>,
}

impl RawPerson {
  pub fn into_record(self) -> Result<PersonRecord> {
    let person = Person {
      person_id:    decode_uuid(&self.person_id)?,
      first_name:   self.first_name,
      last_name:    self.last_name,
      gender:       decode_gender(&self.gender)?,
      civil_status: self
        .civil_status
        .as_deref()
        .map(decode_civil_status)
        .transpose()?,
      dob:          decode_opt_date(self.dob)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
      deleted_at:   self.deleted_at.as_deref().map(decode_dt).transpose()?,
    };

    let spiritual_information = SpiritualInformation {
      membership_at: decode_opt_date(self.membership_at)?,
      baptized_at:   decode_opt_date(self.baptized_at)?,
      saved_at:      decode_opt_date(self.saved_at)?,
      testimony:     self.testimony,
    };

    let contact_information = ContactInformation {
      email:           self.email,
      phone:           self.phone,
      alternate_phone: self.alternate_phone,
      address_line_1:  self.address_line_1,
      address_line_2:  self.address_line_2,
      city:            self.city,
      state:           self.state,
      postal_code:     self.postal_code,
      country:         self.country,
    };

    Ok(PersonRecord { person, spiritual_information, contact_information })
  }
}

/// Raw strings read from a `roles` row.
pub struct RawRole {
  pub role_id: String,
  pub name:    String,
}

impl RawRole {
  pub fn into_role(self) -> Result<Role> {
    Ok(Role { role_id: decode_uuid(&self.role_id)?, name: self.name })
  }
}

/// Raw strings read from a `users` row plus its assigned roles.
pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub email:      String,
  pub created_at: String,
  pub updated_at: String,
  pub roles:      Vec<RawRole>,
}

impl RawUser {
  pub fn into_record(self) -> Result<UserRecord> {
    let user = User {
      user_id:    decode_uuid(&self.user_id)?,
      name:       self.name,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    };
    let roles = self
      .roles
      .into_iter()
      .map(RawRole::into_role)
      .collect::<Result<_>>()?;
    Ok(UserRecord { user, roles })
  }
}
