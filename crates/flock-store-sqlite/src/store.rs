//! [`SqliteStore`], the SQLite implementation of [`MembershipStore`].

use std::path::Path;

use chrono::Utc;
use flock_core::{
  permission::PermissionKey,
  person::{PersonInput, PersonRecord, TrashFilter},
  policy::{Actor, PermissionSet},
  provision::{RoleName, default_grants},
  store::MembershipStore,
  user::{Credentials, NewUser, Role, UserRecord, UserUpdate},
};
use rusqlite::OptionalExtension as _;
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{PersonParams, RawPerson, RawRole, RawUser, decode_uuid, encode_dt, encode_uuid},
  password::hash_password,
  queries,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Flock membership store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, as used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection { &self.conn }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Deduplicate and encode role ids; assigning the same role twice would
/// otherwise trip the `user_roles` primary key.
fn encode_role_ids(role_ids: &[Uuid]) -> Vec<String> {
  let mut ids = role_ids.to_vec();
  ids.sort();
  ids.dedup();
  ids.into_iter().map(encode_uuid).collect()
}

// ─── MembershipStore impl ────────────────────────────────────────────────────

impl MembershipStore for SqliteStore {
  type Error = Error;

  // ── People ────────────────────────────────────────────────────────────────

  async fn create_person(&self, input: PersonInput) -> Result<PersonRecord> {
    let person_id = Uuid::new_v4();
    let params = PersonParams::encode(person_id, input, Utc::now());

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        queries::insert_person(&tx, &params)?;
        queries::upsert_spiritual(&tx, &params)?;
        queries::upsert_contact(&tx, &params)?;
        let raw = queries::select_person(&tx, &params.person_id, TrashFilter::With)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.ok_or(Error::PersonNotFound(person_id))?.into_record()
  }

  async fn update_person(&self, id: Uuid, input: PersonInput) -> Result<PersonRecord> {
    let params = PersonParams::encode(id, input, Utc::now());

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Dropping `tx` without committing rolls back.
        if !queries::update_person(&tx, &params)? {
          return Ok(None);
        }
        queries::upsert_spiritual(&tx, &params)?;
        queries::upsert_contact(&tx, &params)?;
        let raw = queries::select_person(&tx, &params.person_id, TrashFilter::Without)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.ok_or(Error::PersonNotFound(id))?.into_record()
  }

  async fn delete_person(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let now    = encode_dt(Utc::now());

    let trashed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let trashed = queries::set_trashed(&tx, &id_str, true, &now)?;
        tx.commit()?;
        Ok(trashed)
      })
      .await?;

    if trashed { Ok(()) } else { Err(Error::PersonNotFound(id)) }
  }

  async fn restore_person(&self, id: Uuid) -> Result<PersonRecord> {
    let id_str = encode_uuid(id);
    let now    = encode_dt(Utc::now());

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !queries::set_trashed(&tx, &id_str, false, &now)? {
          return Ok(None);
        }
        let raw = queries::select_person(&tx, &id_str, TrashFilter::Without)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.ok_or(Error::PersonNotFound(id))?.into_record()
  }

  async fn force_delete_person(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let deleted = queries::delete_person(&tx, &id_str)?;
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    if deleted { Ok(()) } else { Err(Error::PersonNotFound(id)) }
  }

  async fn get_person(&self, id: Uuid, trashed: TrashFilter) -> Result<Option<PersonRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| Ok(queries::select_person(conn, &id_str, trashed)?))
      .await?;

    raw.map(RawPerson::into_record).transpose()
  }

  async fn list_people(&self, trashed: TrashFilter) -> Result<Vec<PersonRecord>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| Ok(queries::select_people(conn, trashed)?))
      .await?;

    raws.into_iter().map(RawPerson::into_record).collect()
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<UserRecord> {
    let user_id       = Uuid::new_v4();
    let user_id_str   = encode_uuid(user_id);
    let password_hash = hash_password(&input.password)?;
    let role_ids      = encode_role_ids(&input.role_ids);
    let now           = encode_dt(Utc::now());
    let NewUser { name, email, .. } = input;

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (user_id, name, email, password_hash, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![user_id_str, name, email, password_hash, now],
        )?;
        queries::assign_roles(&tx, &user_id_str, &role_ids)?;
        let raw = queries::select_user(&tx, &user_id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.ok_or(Error::UserNotFound(user_id))?.into_record()
  }

  async fn update_user(&self, id: Uuid, input: UserUpdate) -> Result<UserRecord> {
    let user_id_str   = encode_uuid(id);
    let password_hash = input.password.as_deref().map(hash_password).transpose()?;
    let role_ids      = encode_role_ids(&input.role_ids);
    let now           = encode_dt(Utc::now());
    let UserUpdate { name, email, .. } = input;

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE users SET name = ?2, email = ?3, updated_at = ?4 WHERE user_id = ?1",
          rusqlite::params![user_id_str, name, email, now],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        if let Some(hash) = password_hash {
          tx.execute(
            "UPDATE users SET password_hash = ?2 WHERE user_id = ?1",
            rusqlite::params![user_id_str, hash],
          )?;
        }
        queries::revoke_all_roles(&tx, &user_id_str)?;
        queries::assign_roles(&tx, &user_id_str, &role_ids)?;
        let raw = queries::select_user(&tx, &user_id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.ok_or(Error::UserNotFound(id))?.into_record()
  }

  async fn delete_user(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let deleted =
          tx.execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(deleted == 1)
      })
      .await?;

    if deleted { Ok(()) } else { Err(Error::UserNotFound(id)) }
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<UserRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| Ok(queries::select_user(conn, &id_str)?))
      .await?;

    raw.map(RawUser::into_record).transpose()
  }

  async fn list_users(&self) -> Result<Vec<UserRecord>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| Ok(queries::select_users(conn)?))
      .await?;

    raws.into_iter().map(RawUser::into_record).collect()
  }

  // ── Authentication & authorization data ───────────────────────────────────

  async fn find_credentials(&self, email: String) -> Result<Option<Credentials>> {
    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, password_hash FROM users WHERE email = ?1",
            rusqlite::params![email],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    row
      .map(|(user_id, password_hash)| -> Result<Credentials> {
        Ok(Credentials { user_id: decode_uuid(&user_id)?, password_hash })
      })
      .transpose()
  }

  async fn load_actor(&self, user_id: Uuid) -> Result<Option<Actor>> {
    let id_str = encode_uuid(user_id);

    let keys: Option<Vec<String>> = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !exists {
          return Ok(None);
        }
        Ok(Some(queries::permissions_of(conn, &id_str)?))
      })
      .await?;

    // Rows outside the catalog cannot be checked against and are skipped.
    Ok(keys.map(|keys| {
      let permissions: PermissionSet =
        keys.iter().filter_map(|k| k.parse::<PermissionKey>().ok()).collect();
      Actor::new(user_id, permissions)
    }))
  }

  // ── Roles ─────────────────────────────────────────────────────────────────

  async fn list_roles(&self) -> Result<Vec<Role>> {
    let raws: Vec<RawRole> = self
      .conn
      .call(|conn| Ok(queries::select_roles(conn)?))
      .await?;

    raws.into_iter().map(RawRole::into_role).collect()
  }

  async fn create_role(&self, name: String, permissions: Vec<PermissionKey>) -> Result<Role> {
    let role_id     = Uuid::new_v4();
    let role_id_str = encode_uuid(role_id);
    let now         = encode_dt(Utc::now());
    let role_name   = name.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        queries::insert_role(&tx, &role_id_str, &role_name, &now)?;
        for key in &permissions {
          queries::ensure_permission(&tx, key.as_str())?;
          queries::grant(&tx, &role_id_str, key.as_str())?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(Role { role_id, name })
  }

  async fn provision(&self) -> Result<()> {
    let now = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for key in PermissionKey::all() {
          queries::ensure_permission(&tx, key.as_str())?;
        }
        for role in RoleName::iter() {
          queries::ensure_role(&tx, &encode_uuid(Uuid::new_v4()), role.as_str(), &now)?;
        }
        for (role, key) in default_grants() {
          queries::grant_by_name(&tx, role.as_str(), key.as_str())?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}
