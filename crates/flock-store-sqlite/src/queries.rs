//! Synchronous SQL helpers run inside `tokio_rusqlite` closures.
//!
//! Every helper takes a plain [`Connection`] so it can be called with either
//! the connection itself or an open [`rusqlite::Transaction`] (which derefs
//! to one). None of them commits; transaction boundaries belong to
//! [`crate::SqliteStore`].

use flock_core::person::TrashFilter;
use rusqlite::{Connection, OptionalExtension as _, Row, params};

use crate::encode::{PersonParams, RawPerson, RawRole, RawUser};

// ─── People ──────────────────────────────────────────────────────────────────

const PERSON_SELECT: &str = "
SELECT
  p.person_id, p.first_name, p.last_name, p.gender, p.civil_status, p.dob,
  p.created_at, p.updated_at, p.deleted_at,
  s.membership_at, s.baptized_at, s.saved_at, s.testimony,
  c.email, c.phone, c.alternate_phone, c.address_line_1, c.address_line_2,
  c.city, c.state, c.postal_code, c.country
FROM people p
LEFT JOIN spiritual_information s ON s.person_id = p.person_id
LEFT JOIN contact_information   c ON c.person_id = p.person_id";

fn trash_clause(filter: TrashFilter) -> &'static str {
  match filter {
    TrashFilter::Without => "p.deleted_at IS NULL",
    TrashFilter::With => "1 = 1",
    TrashFilter::Only => "p.deleted_at IS NOT NULL",
  }
}

fn raw_person(row: &Row<'_>) -> rusqlite::Result<RawPerson> {
  Ok(RawPerson {
    person_id:       row.get(0)?,
    first_name:      row.get(1)?,
    last_name:       row.get(2)?,
    gender:          row.get(3)?,
    civil_status:    row.get(4)?,
    dob:             row.get(5)?,
    created_at:      row.get(6)?,
    updated_at:      row.get(7)?,
    deleted_at:      row.get(8)?,
    membership_at:   row.get(9)?,
    baptized_at:     row.get(10)?,
    saved_at:        row.get(11)?,
    testimony:       row.get(12)?,
    email:           row.get(13)?,
    phone:           row.get(14)?,
    alternate_phone: row.get(15)?,
    address_line_1:  row.get(16)?,
    address_line_2:  row.get(17)?,
    city:            row.get(18)?,
    state:           row.get(19)?,
    postal_code:     row.get(20)?,
    country:         row.get(21)?,
  })
}

pub fn select_person(
  conn: &Connection,
  person_id: &str,
  filter: TrashFilter,
) -> rusqlite::Result<Option<RawPerson>> {
  let sql = format!(
    "{PERSON_SELECT} WHERE p.person_id = ?1 AND {}",
    trash_clause(filter)
  );
  conn.query_row(&sql, params![person_id], raw_person).optional()
}

pub fn select_people(
  conn: &Connection,
  filter: TrashFilter,
) -> rusqlite::Result<Vec<RawPerson>> {
  let sql = format!(
    "{PERSON_SELECT} WHERE {} ORDER BY p.first_name DESC, p.last_name DESC",
    trash_clause(filter)
  );
  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map([], raw_person)?
    .collect::<rusqlite::Result<Vec<_>>>()
}

pub fn insert_person(conn: &Connection, p: &PersonParams) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO people (
       person_id, first_name, last_name, gender, civil_status, dob,
       created_at, updated_at, deleted_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, NULL)",
    params![
      p.person_id,
      p.first_name,
      p.last_name,
      p.gender,
      p.civil_status,
      p.dob,
      p.now,
    ],
  )?;
  Ok(())
}

/// Overwrite the identity block of a live person. Returns `false` if no live
/// person has that id.
pub fn update_person(conn: &Connection, p: &PersonParams) -> rusqlite::Result<bool> {
  let changed = conn.execute(
    "UPDATE people
        SET first_name = ?2, last_name = ?3, gender = ?4,
            civil_status = ?5, dob = ?6, updated_at = ?7
      WHERE person_id = ?1 AND deleted_at IS NULL",
    params![
      p.person_id,
      p.first_name,
      p.last_name,
      p.gender,
      p.civil_status,
      p.dob,
      p.now,
    ],
  )?;
  Ok(changed == 1)
}

/// Write the spiritual sub-record, replacing every column.
pub fn upsert_spiritual(conn: &Connection, p: &PersonParams) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO spiritual_information (
       person_id, membership_at, baptized_at, saved_at, testimony
     ) VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (person_id) DO UPDATE SET
       membership_at = excluded.membership_at,
       baptized_at   = excluded.baptized_at,
       saved_at      = excluded.saved_at,
       testimony     = excluded.testimony",
    params![
      p.person_id,
      p.membership_at,
      p.baptized_at,
      p.saved_at,
      p.testimony,
    ],
  )?;
  Ok(())
}

/// Write the contact sub-record, replacing every column.
pub fn upsert_contact(conn: &Connection, p: &PersonParams) -> rusqlite::Result<()> {
  let c = &p.contact;
  conn.execute(
    "INSERT INTO contact_information (
       person_id, email, phone, alternate_phone, address_line_1,
       address_line_2, city, state, postal_code, country,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
     ON CONFLICT (person_id) DO UPDATE SET
       email           = excluded.email,
       phone           = excluded.phone,
       alternate_phone = excluded.alternate_phone,
       address_line_1  = excluded.address_line_1,
       address_line_2  = excluded.address_line_2,
       city            = excluded.city,
       state           = excluded.state,
       postal_code     = excluded.postal_code,
       country         = excluded.country,
       updated_at      = excluded.updated_at",
    params![
      p.person_id,
      c.email,
      c.phone,
      c.alternate_phone,
      c.address_line_1,
      c.address_line_2,
      c.city,
      c.state,
      c.postal_code,
      c.country,
      p.now,
    ],
  )?;
  Ok(())
}

/// Set or clear the tombstone. `trash = true` only matches live people,
/// `trash = false` only matches trashed ones. Returns whether a row changed.
pub fn set_trashed(
  conn: &Connection,
  person_id: &str,
  trash: bool,
  now: &str,
) -> rusqlite::Result<bool> {
  let sql = if trash {
    "UPDATE people SET deleted_at = ?2, updated_at = ?2
      WHERE person_id = ?1 AND deleted_at IS NULL"
  } else {
    "UPDATE people SET deleted_at = NULL, updated_at = ?2
      WHERE person_id = ?1 AND deleted_at IS NOT NULL"
  };
  Ok(conn.execute(sql, params![person_id, now])? == 1)
}

pub fn delete_person(conn: &Connection, person_id: &str) -> rusqlite::Result<bool> {
  Ok(conn.execute("DELETE FROM people WHERE person_id = ?1", params![person_id])? == 1)
}

// ─── Users ───────────────────────────────────────────────────────────────────

fn raw_role(row: &Row<'_>) -> rusqlite::Result<RawRole> {
  Ok(RawRole { role_id: row.get(0)?, name: row.get(1)? })
}

fn roles_of(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<RawRole>> {
  let mut stmt = conn.prepare(
    "SELECT r.role_id, r.name
       FROM roles r
       JOIN user_roles ur ON ur.role_id = r.role_id
      WHERE ur.user_id = ?1
      ORDER BY r.name",
  )?;
  stmt
    .query_map(params![user_id], raw_role)?
    .collect::<rusqlite::Result<Vec<_>>>()
}

fn raw_user(row: &Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:    row.get(0)?,
    name:       row.get(1)?,
    email:      row.get(2)?,
    created_at: row.get(3)?,
    updated_at: row.get(4)?,
    roles:      Vec::new(),
  })
}

pub fn select_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<RawUser>> {
  let user = conn
    .query_row(
      "SELECT user_id, name, email, created_at, updated_at
         FROM users WHERE user_id = ?1",
      params![user_id],
      raw_user,
    )
    .optional()?;

  match user {
    Some(mut user) => {
      user.roles = roles_of(conn, &user.user_id)?;
      Ok(Some(user))
    }
    None => Ok(None),
  }
}

pub fn select_users(conn: &Connection) -> rusqlite::Result<Vec<RawUser>> {
  let mut stmt = conn.prepare(
    "SELECT user_id, name, email, created_at, updated_at
       FROM users ORDER BY name, email",
  )?;
  let mut users = stmt
    .query_map([], raw_user)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  for user in &mut users {
    user.roles = roles_of(conn, &user.user_id)?;
  }
  Ok(users)
}

/// Grant each role in `role_ids` to the user. An id with no matching role
/// fails the foreign-key check.
pub fn assign_roles(
  conn: &Connection,
  user_id: &str,
  role_ids: &[String],
) -> rusqlite::Result<()> {
  let mut stmt =
    conn.prepare("INSERT INTO user_roles (user_id, role_id) VALUES (?1, ?2)")?;
  for role_id in role_ids {
    stmt.execute(params![user_id, role_id])?;
  }
  Ok(())
}

pub fn revoke_all_roles(conn: &Connection, user_id: &str) -> rusqlite::Result<()> {
  conn.execute("DELETE FROM user_roles WHERE user_id = ?1", params![user_id])?;
  Ok(())
}

/// Permission keys reachable from the user's roles, as stored.
pub fn permissions_of(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT DISTINCT rp.permission
       FROM user_roles ur
       JOIN role_permissions rp ON rp.role_id = ur.role_id
      WHERE ur.user_id = ?1",
  )?;
  stmt
    .query_map(params![user_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()
}

// ─── Roles & permissions ─────────────────────────────────────────────────────

pub fn select_roles(conn: &Connection) -> rusqlite::Result<Vec<RawRole>> {
  let mut stmt = conn.prepare("SELECT role_id, name FROM roles ORDER BY name")?;
  stmt
    .query_map([], raw_role)?
    .collect::<rusqlite::Result<Vec<_>>>()
}

pub fn ensure_permission(conn: &Connection, name: &str) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO permissions (name) VALUES (?1)",
    params![name],
  )?;
  Ok(())
}

/// Insert a role unless one with `name` already exists.
pub fn ensure_role(
  conn: &Connection,
  role_id: &str,
  name: &str,
  now: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO roles (role_id, name, created_at) VALUES (?1, ?2, ?3)",
    params![role_id, name, now],
  )?;
  Ok(())
}

pub fn insert_role(
  conn: &Connection,
  role_id: &str,
  name: &str,
  now: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO roles (role_id, name, created_at) VALUES (?1, ?2, ?3)",
    params![role_id, name, now],
  )?;
  Ok(())
}

pub fn grant(conn: &Connection, role_id: &str, permission: &str) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO role_permissions (role_id, permission) VALUES (?1, ?2)",
    params![role_id, permission],
  )?;
  Ok(())
}

/// Like [`grant`], addressing the role by name.
pub fn grant_by_name(
  conn: &Connection,
  role_name: &str,
  permission: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO role_permissions (role_id, permission)
     SELECT role_id, ?2 FROM roles WHERE name = ?1",
    params![role_name, permission],
  )?;
  Ok(())
}
