//! Handlers for the profile editor and avatar bucket.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/profile` | Defaults if nothing is stored |
//! | `PUT`    | `/profile` | Body: [`ProfilePatch`]; rebuilds the feed |
//! | `PUT`    | `/profile/avatar?file_name=` | Raw body |
//! | `POST`   | `/profile/skills` | Body: `{"skill":"rust"}` |
//! | `DELETE` | `/profile/skills/{skill}` | |
//! | `GET`    | `/avatars/{id}/{file}` | Public |

use axum::{
  Json,
  body::Body,
  extract::{Path, Query, State},
  http::header,
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use jobswipe_core::profile::{self, Profile, ProfileDraft, ProfilePatch};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState, Backend,
  auth::Viewer,
  error::Error,
  handlers::feed,
  storage::content_type,
};

/// Save `draft` and rebuild the viewer's feed, since overlap depends on the
/// viewer's own skills.
async fn save_and_refresh<S: Backend>(
  state: &AppState<S>,
  viewer: &Viewer,
  draft: ProfileDraft,
) -> Result<Profile, Error> {
  let saved = profile::save_profile(&*state.store, viewer.user_id, draft).await?;
  if let Some(role) = viewer.role {
    feed::rebuild(state, viewer.user_id, role).await;
  }
  tracing::debug!(user_id = %viewer.user_id, "profile saved");
  Ok(saved)
}

/// `GET /profile`
pub async fn load<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
) -> Result<Json<Profile>, Error> {
  Ok(Json(profile::load_profile(&*state.store, viewer.user_id).await?))
}

/// `PUT /profile`
///
/// Fields missing from the body keep their stored value.
pub async fn save<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Json(patch): Json<ProfilePatch>,
) -> Result<Json<Profile>, Error> {
  let mut draft = profile::load_profile(&*state.store, viewer.user_id).await?.draft();
  patch.apply(&mut draft);
  Ok(Json(save_and_refresh(&state, &viewer, draft).await?))
}

// ─── Skills ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SkillBody {
  pub skill: String,
}

/// `POST /profile/skills`
///
/// Blank or already-present skills leave the profile untouched.
pub async fn add_skill<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Json(body): Json<SkillBody>,
) -> Result<Json<Profile>, Error> {
  let current = profile::load_profile(&*state.store, viewer.user_id).await?;
  let mut draft = current.draft();
  if !draft.add_skill(&body.skill) {
    return Ok(Json(current));
  }
  Ok(Json(save_and_refresh(&state, &viewer, draft).await?))
}

/// `DELETE /profile/skills/{skill}`
pub async fn remove_skill<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Path(skill): Path<String>,
) -> Result<Json<Profile>, Error> {
  let current = profile::load_profile(&*state.store, viewer.user_id).await?;
  let mut draft = current.draft();
  if !draft.remove_skill(&skill) {
    return Ok(Json(current));
  }
  Ok(Json(save_and_refresh(&state, &viewer, draft).await?))
}

// ─── Avatars ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AvatarParams {
  pub file_name: String,
}

/// `PUT /profile/avatar?file_name=<name>`
pub async fn upload_avatar<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Query(params): Query<AvatarParams>,
  body: Bytes,
) -> Result<Json<Profile>, Error> {
  if body.is_empty() {
    return Err(Error::BadRequest("avatar body is empty".to_string()));
  }
  let updated = profile::upload_avatar(
    &*state.store,
    &*state.avatars,
    viewer.user_id,
    &params.file_name,
    body.to_vec(),
  )
  .await?;
  Ok(Json(updated))
}

/// `GET /avatars/{id}/{file}`
pub async fn avatar<S: Backend>(
  State(state): State<AppState<S>>,
  Path((owner, file)): Path<(Uuid, String)>,
) -> Result<Response, Error> {
  let bytes = state
    .avatars
    .read(owner, &file)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("avatar {owner}/{file}")))?;

  Ok(
    (
      [
        (header::CONTENT_TYPE, content_type(&file)),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
      ],
      Body::from(bytes),
    )
      .into_response(),
  )
}
