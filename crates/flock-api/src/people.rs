//! Handlers for `/people` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/people` | Optional `?trashed=with\|only` |
//! | `POST`   | `/people` | Body: a full person with both sub-records |
//! | `GET`    | `/people/:id` | 404 if missing or trashed |
//! | `PUT`    | `/people/:id` | Full replace; absent optionals are cleared |
//! | `DELETE` | `/people/:id` | Soft delete |
//! | `POST`   | `/people/:id/restore` | 404 unless trashed |
//! | `DELETE` | `/people/:id/force` | Permanent; trashed or not |
//!
//! Bodies are decoded after the policy check, so a denied caller gets 403
//! whatever it sent.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use flock_core::{
  permission::Action,
  person::{PersonInput, PersonRecord, TrashFilter},
  policy::{PersonPolicy, authorize},
  store::MembershipStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::CurrentActor, error::ApiError, validate};

/// Load a person under `trashed`, or 404.
async fn find<S: MembershipStore>(
  store: &S,
  id: Uuid,
  trashed: TrashFilter,
) -> Result<PersonRecord, ApiError> {
  store
    .get_person(id, trashed)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub trashed: TrashFilter,
}

/// `GET /people[?trashed=with|only]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PersonRecord>>, ApiError>
where
  S: MembershipStore + 'static,
{
  authorize::<PersonPolicy>(&actor, Action::ViewAny, None)?;
  let people = store
    .list_people(params.trashed)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(people))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /people`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  body: Result<Json<PersonInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MembershipStore + 'static,
{
  authorize::<PersonPolicy>(&actor, Action::Create, None)?;
  let Json(body) = body?;
  let input = validate::person(body)?;

  let record = store.create_person(input).await.map_err(ApiError::store)?;
  tracing::info!(
    person_id = %record.person.person_id,
    actor = %actor.user_id,
    "person created"
  );
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /people/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<PersonRecord>, ApiError>
where
  S: MembershipStore + 'static,
{
  let record = find(store.as_ref(), id, TrashFilter::Without).await?;
  authorize::<PersonPolicy>(&actor, Action::View, Some(&record.person))?;
  Ok(Json(record))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /people/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
  body: Result<Json<PersonInput>, JsonRejection>,
) -> Result<Json<PersonRecord>, ApiError>
where
  S: MembershipStore + 'static,
{
  let current = find(store.as_ref(), id, TrashFilter::Without).await?;
  authorize::<PersonPolicy>(&actor, Action::Update, Some(&current.person))?;
  let Json(body) = body?;
  let input = validate::person(body)?;

  let record = store.update_person(id, input).await.map_err(ApiError::store)?;
  tracing::info!(person_id = %id, actor = %actor.user_id, "person updated");
  Ok(Json(record))
}

// ─── Delete / restore / force delete ──────────────────────────────────────────

/// `DELETE /people/:id`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: MembershipStore + 'static,
{
  let current = find(store.as_ref(), id, TrashFilter::Without).await?;
  authorize::<PersonPolicy>(&actor, Action::Delete, Some(&current.person))?;

  store.delete_person(id).await.map_err(ApiError::store)?;
  tracing::info!(person_id = %id, actor = %actor.user_id, "person trashed");
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /people/:id/restore`
pub async fn restore<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<Json<PersonRecord>, ApiError>
where
  S: MembershipStore + 'static,
{
  let current = find(store.as_ref(), id, TrashFilter::Only).await?;
  authorize::<PersonPolicy>(&actor, Action::Restore, Some(&current.person))?;

  let record = store.restore_person(id).await.map_err(ApiError::store)?;
  tracing::info!(person_id = %id, actor = %actor.user_id, "person restored");
  Ok(Json(record))
}

/// `DELETE /people/:id/force`
pub async fn force_delete<S>(
  State(store): State<Arc<S>>,
  CurrentActor(actor): CurrentActor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: MembershipStore + 'static,
{
  let current = find(store.as_ref(), id, TrashFilter::With).await?;
  authorize::<PersonPolicy>(&actor, Action::ForceDelete, Some(&current.person))?;

  store.force_delete_person(id).await.map_err(ApiError::store)?;
  tracing::info!(person_id = %id, actor = %actor.user_id, "person force deleted");
  Ok(StatusCode::NO_CONTENT)
}
