//! Handlers for `/matches` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/matches` | Newest first, with unread counts |
//! | `GET`  | `/matches/{id}/messages` | Oldest first; participants only |
//! | `POST` | `/matches/{id}/messages` | Body: `{"content":"…"}` |
//! | `POST` | `/matches/{id}/read` | Marks received messages read |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use jobswipe_core::{
  chat,
  inbox::{self, MatchSummary},
  matching::Message,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, Backend, auth::Viewer, error::Error};

/// `GET /matches`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
) -> Json<Vec<MatchSummary>> {
  Json(inbox::list_matches(&*state.store, viewer.user_id).await)
}

/// `GET /matches/{id}/messages`
pub async fn messages<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Path(match_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, Error> {
  chat::participant_match(&*state.store, match_id, viewer.user_id).await?;
  Ok(Json(chat::load_messages(&*state.store, match_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub content: String,
}

/// `POST /matches/{id}/messages`
pub async fn send<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Path(match_id): Path<Uuid>,
  Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, Error> {
  let message = chat::send_message(&*state.store, match_id, viewer.user_id, &body.content).await?;
  Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
  pub updated: usize,
}

/// `POST /matches/{id}/read`
pub async fn mark_read<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Path(match_id): Path<Uuid>,
) -> Result<Json<ReadResponse>, Error> {
  let updated = inbox::mark_read(&*state.store, match_id, viewer.user_id).await?;
  Ok(Json(ReadResponse { updated }))
}
