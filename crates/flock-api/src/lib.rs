//! JSON REST API for Flock.
//!
//! Exposes an axum [`Router`] backed by any
//! [`flock_core::store::MembershipStore`]. Every route authenticates the
//! caller with HTTP Basic (`email:password`) and runs the resource policy
//! before touching the store. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", flock_api::api_router(store.clone()))
//! ```

pub mod auth;
pub mod error;
pub mod people;
pub mod roles;
pub mod users;
pub mod validate;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use flock_core::store::MembershipStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: MembershipStore + 'static,
{
  Router::new()
    // People
    .route("/people", get(people::list::<S>).post(people::create::<S>))
    .route(
      "/people/{id}",
      get(people::get_one::<S>)
        .put(people::update::<S>)
        .delete(people::delete::<S>),
    )
    .route("/people/{id}/restore", post(people::restore::<S>))
    .route("/people/{id}/force", delete(people::force_delete::<S>))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route(
      "/users/{id}",
      get(users::get_one::<S>)
        .put(users::update::<S>)
        .delete(users::delete::<S>),
    )
    // Roles & self
    .route("/roles", get(roles::list::<S>))
    .route("/me", get(roles::me::<S>))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use flock_core::{
    permission::{Action, PermissionKey, Resource},
    person::{Gender, PersonInput, TrashFilter},
    provision::RoleName,
    user::{NewUser, UserRecord},
  };
  use flock_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const PASSWORD: &str = "password123";

  struct Fixture {
    store:       Arc<SqliteStore>,
    admin_role:  Uuid,
    pastor_role: Uuid,
    member_role: Uuid,
    admin:       UserRecord,
    pastor:      UserRecord,
    member:      UserRecord,
  }

  async fn fixture() -> Fixture {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.provision().await.unwrap();
    let member_role = store
      .create_role("member".into(), vec![])
      .await
      .unwrap()
      .role_id;

    let roles = store.list_roles().await.unwrap();
    let role_id = |name: RoleName| {
      roles
        .iter()
        .find(|r| r.name == name.as_str())
        .map(|r| r.role_id)
        .unwrap()
    };
    let admin_role = role_id(RoleName::Admin);
    let pastor_role = role_id(RoleName::Pastor);

    let mut users = Vec::new();
    for (name, role) in [
      ("admin", admin_role),
      ("pastor", pastor_role),
      ("member", member_role),
    ] {
      let user = store
        .create_user(NewUser {
          name:     name.to_owned(),
          email:    format!("{name}@example.com"),
          password: PASSWORD.to_owned(),
          role_ids: vec![role],
        })
        .await
        .unwrap();
      users.push(user);
    }
    let member = users.pop().unwrap();
    let pastor = users.pop().unwrap();
    let admin = users.pop().unwrap();

    Fixture {
      store: Arc::new(store),
      admin_role,
      pastor_role,
      member_role,
      admin,
      pastor,
      member,
    }
  }

  fn auth_header(user: &UserRecord) -> String {
    format!("Basic {}", B64.encode(format!("{}:{PASSWORD}", user.user.email)))
  }

  async fn send(
    store: &Arc<SqliteStore>,
    method: Method,
    uri: &str,
    auth: Option<String>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = api_router(store.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
  }

  async fn seeded_person(store: &SqliteStore) -> Uuid {
    store
      .create_person(PersonInput::new("Ana", "Silva", Gender::Female))
      .await
      .unwrap()
      .person
      .person_id
  }

  // ── Authentication ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_credentials_return_401_with_challenge() {
    let fx = fixture().await;
    let req = Request::builder().uri("/people").body(Body::empty()).unwrap();
    let resp = api_router(fx.store.clone()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let challenge = resp.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert_eq!(challenge, "Basic realm=\"flock\"");
  }

  #[tokio::test]
  async fn wrong_password_returns_401() {
    let fx = fixture().await;
    let auth = format!("Basic {}", B64.encode("admin@example.com:nope-nope"));
    let (status, _) =
      send(&fx.store, Method::GET, "/people", Some(auth), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn email_lookup_ignores_case() {
    let fx = fixture().await;
    let auth = format!("Basic {}", B64.encode(format!("PASTOR@Example.com:{PASSWORD}")));
    let (status, _) =
      send(&fx.store, Method::GET, "/people", Some(auth), None).await;
    assert_eq!(status, StatusCode::OK);
  }

  // ── People ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn pastor_creates_and_lists_people() {
    let fx = fixture().await;
    let body = json!({
      "first_name": " Ana ",
      "last_name": "Silva",
      "gender": "female",
      "civil_status": "married",
      "baptized_at": "2001-05-06",
      "city": "Lima"
    });
    let (status, created) = send(
      &fx.store,
      Method::POST,
      "/people",
      Some(auth_header(&fx.pastor)),
      Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["first_name"], "Ana");
    assert_eq!(created["spiritual_information"]["baptized_at"], "2001-05-06");
    assert_eq!(created["contact_information"]["city"], "Lima");

    let (status, listed) =
      send(&fx.store, Method::GET, "/people", Some(auth_header(&fx.pastor)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn member_without_permission_gets_403_before_validation() {
    let fx = fixture().await;
    let (status, body) = send(
      &fx.store,
      Method::POST,
      "/people",
      Some(auth_header(&fx.member)),
      Some(json!({ "first_name": "", "last_name": "", "gender": "male" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "this action is unauthorized");
    assert!(fx.store.list_people(TrashFilter::With).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn invalid_person_returns_422_with_fields() {
    let fx = fixture().await;
    let (status, body) = send(
      &fx.store,
      Method::POST,
      "/people",
      Some(auth_header(&fx.pastor)),
      Some(json!({ "first_name": "  ", "last_name": "Silva", "gender": "male" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation failed");
    assert!(body["fields"]["first_name"].is_array());
    assert!(body["fields"].get("last_name").is_none());
  }

  #[tokio::test]
  async fn unknown_person_returns_404() {
    let fx = fixture().await;
    let uri = format!("/people/{}", Uuid::new_v4());
    let (status, _) =
      send(&fx.store, Method::GET, &uri, Some(auth_header(&fx.admin)), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn trashed_person_is_hidden_but_listed_with_filter() {
    let fx = fixture().await;
    let id = seeded_person(&fx.store).await;
    fx.store.delete_person(id).await.unwrap();

    let auth = auth_header(&fx.pastor);
    let (status, _) = send(
      &fx.store,
      Method::GET,
      &format!("/people/{id}"),
      Some(auth.clone()),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, listed) = send(
      &fx.store,
      Method::GET,
      "/people?trashed=only",
      Some(auth),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["person_id"], id.to_string());
  }

  #[tokio::test]
  async fn pastor_cannot_restore_but_admin_can() {
    let fx = fixture().await;
    let id = seeded_person(&fx.store).await;
    fx.store.delete_person(id).await.unwrap();
    let uri = format!("/people/{id}/restore");

    let (status, _) =
      send(&fx.store, Method::POST, &uri, Some(auth_header(&fx.pastor)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let still = fx.store.get_person(id, TrashFilter::With).await.unwrap().unwrap();
    assert!(still.person.is_trashed());

    let (status, restored) =
      send(&fx.store, Method::POST, &uri, Some(auth_header(&fx.admin)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(restored["deleted_at"].is_null());
  }

  #[tokio::test]
  async fn malformed_body_from_denied_caller_is_forbidden() {
    let fx = fixture().await;
    let (status, body) = send(
      &fx.store,
      Method::POST,
      "/people",
      Some(auth_header(&fx.member)),
      Some(json!({ "first_name": "a" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "this action is unauthorized");
    assert!(fx.store.list_people(TrashFilter::With).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn malformed_body_from_allowed_caller_is_a_json_error() {
    let fx = fixture().await;
    let (status, body) = send(
      &fx.store,
      Method::POST,
      "/people",
      Some(auth_header(&fx.pastor)),
      Some(json!({ "first_name": "a" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("last_name"));
    assert!(fx.store.list_people(TrashFilter::With).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn restoring_a_live_person_returns_404() {
    let fx = fixture().await;
    let id = seeded_person(&fx.store).await;
    let uri = format!("/people/{id}/restore");

    let (status, _) =
      send(&fx.store, Method::POST, &uri, Some(auth_header(&fx.admin)), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn updating_a_trashed_person_returns_404() {
    let fx = fixture().await;
    let id = seeded_person(&fx.store).await;
    fx.store.delete_person(id).await.unwrap();

    let (status, _) = send(
      &fx.store,
      Method::PUT,
      &format!("/people/{id}"),
      Some(auth_header(&fx.admin)),
      Some(json!({ "first_name": "Bea", "last_name": "Silva", "gender": "female" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let stored = fx.store.get_person(id, TrashFilter::Only).await.unwrap().unwrap();
    assert_eq!(stored.person.first_name, "Ana");
  }

  #[tokio::test]
  async fn admin_force_deletes_person() {
    let fx = fixture().await;
    let id = seeded_person(&fx.store).await;
    let uri = format!("/people/{id}/force");

    let (status, _) =
      send(&fx.store, Method::DELETE, &uri, Some(auth_header(&fx.admin)), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(fx.store.get_person(id, TrashFilter::With).await.unwrap().is_none());
  }

  // ── Users ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn member_sees_itself_but_not_others() {
    let fx = fixture().await;
    let auth = auth_header(&fx.member);

    let own = format!("/users/{}", fx.member.user.user_id);
    let (status, body) =
      send(&fx.store, Method::GET, &own, Some(auth.clone()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "member@example.com");
    assert!(body.get("password_hash").is_none());

    let other = format!("/users/{}", fx.admin.user.user_id);
    let (status, _) = send(&fx.store, Method::GET, &other, Some(auth), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn self_update_cannot_change_roles() {
    let fx = fixture().await;
    let uri = format!("/users/{}", fx.member.user.user_id);
    let body = |role: Uuid| {
      json!({
        "name": "Renamed",
        "email": "member@example.com",
        "role_ids": [role],
      })
    };

    let (status, _) = send(
      &fx.store,
      Method::PUT,
      &uri,
      Some(auth_header(&fx.member)),
      Some(body(fx.admin_role)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
      &fx.store,
      Method::PUT,
      &uri,
      Some(auth_header(&fx.member)),
      Some(body(fx.member_role)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Renamed");
  }

  #[tokio::test]
  async fn admin_changes_another_users_roles() {
    let fx = fixture().await;
    let uri = format!("/users/{}", fx.member.user.user_id);
    let (status, updated) = send(
      &fx.store,
      Method::PUT,
      &uri,
      Some(auth_header(&fx.admin)),
      Some(json!({
        "name": "member",
        "email": "member@example.com",
        "role_ids": [fx.pastor_role],
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["roles"][0]["name"], "pastor");
  }

  #[tokio::test]
  async fn duplicate_email_returns_409() {
    let fx = fixture().await;
    let (status, body) = send(
      &fx.store,
      Method::POST,
      "/users",
      Some(auth_header(&fx.admin)),
      Some(json!({
        "name": "Imposter",
        "email": "pastor@example.com",
        "password": "password456",
        "password_confirmation": "password456",
        "role_ids": [fx.pastor_role],
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "the request conflicts with existing data");
    assert_eq!(fx.store.list_users().await.unwrap().len(), 3);
  }

  #[tokio::test]
  async fn user_without_roles_updates_own_profile() {
    let fx = fixture().await;
    let loner = fx
      .store
      .create_user(NewUser {
        name:     "loner".to_owned(),
        email:    "loner@example.com".to_owned(),
        password: PASSWORD.to_owned(),
        role_ids: vec![],
      })
      .await
      .unwrap();
    let uri = format!("/users/{}", loner.user.user_id);

    for (name, body) in [
      ("Omitted", json!({ "name": "Omitted", "email": "loner@example.com" })),
      (
        "Unchanged",
        json!({ "name": "Unchanged", "email": "loner@example.com", "role_ids": [] }),
      ),
    ] {
      let (status, updated) =
        send(&fx.store, Method::PUT, &uri, Some(auth_header(&loner)), Some(body))
          .await;
      assert_eq!(status, StatusCode::OK);
      assert_eq!(updated["name"], name);
      assert_eq!(updated["roles"], json!([]));
    }
  }

  #[tokio::test]
  async fn self_update_without_role_ids_keeps_roles() {
    let fx = fixture().await;
    let uri = format!("/users/{}", fx.member.user.user_id);
    let (status, updated) = send(
      &fx.store,
      Method::PUT,
      &uri,
      Some(auth_header(&fx.member)),
      Some(json!({ "name": "Member", "email": "member@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["roles"][0]["name"], "member");
  }

  #[tokio::test]
  async fn member_deletes_own_account() {
    let fx = fixture().await;
    let uri = format!("/users/{}", fx.member.user.user_id);
    let (status, _) =
      send(&fx.store, Method::DELETE, &uri, Some(auth_header(&fx.member)), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(fx.store.get_user(fx.member.user.user_id).await.unwrap().is_none());
  }

  // ── Roles & self ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn me_reports_effective_permissions() {
    let fx = fixture().await;
    let (status, body) =
      send(&fx.store, Method::GET, "/me", Some(auth_header(&fx.pastor)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "pastor@example.com");

    let permissions = body["permissions"].as_array().unwrap();
    assert_eq!(permissions.len(), 5);
    let update_person = PermissionKey::new(Action::Update, Resource::Person);
    assert!(permissions.contains(&json!(update_person.as_str())));
  }

  #[tokio::test]
  async fn any_authenticated_caller_lists_roles() {
    let fx = fixture().await;
    let (status, body) =
      send(&fx.store, Method::GET, "/roles", Some(auth_header(&fx.member)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
  }
}
