//! Handlers for `/feed` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/feed` | Optional `?refresh=true` rebuilds from the store |
//! | `POST` | `/feed/reject` | `{"notice": null}` on an empty feed |
//! | `POST` | `/feed/accept` | `{"notice": null}` on an empty feed or failed write |
//!
//! The per-viewer [`FeedSession`] map is locked only to read or move the
//! cursor. Store reads and the match write happen with the lock released.

use axum::{
  Json,
  extract::{Query, State},
};
use jobswipe_core::{
  feed::{FeedEntry, load_feed},
  profile::Role,
  swipe::{self, FeedSession, Notice},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, Backend, auth::Viewer, error::Error};

#[derive(Debug, Serialize)]
pub struct FeedView {
  #[serde(flatten)]
  pub session: FeedSession,
  pub current: Option<FeedEntry>,
}

impl From<&FeedSession> for FeedView {
  fn from(session: &FeedSession) -> Self {
    Self { current: session.current().cloned(), session: session.clone() }
  }
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
  pub notice: Option<Notice>,
}

/// Build a fresh feed for `viewer_id` and replace any cached one.
pub(crate) async fn rebuild<S: Backend>(state: &AppState<S>, viewer_id: Uuid, role: Role) -> FeedView {
  let fresh = load_feed(&*state.store, viewer_id, role).await;
  let view = FeedView::from(&fresh);
  state.feeds.lock().await.insert(viewer_id, fresh);
  view
}

/// Run `f` on the viewer's cached feed, building one first if there is none.
async fn with_feed<S, R>(
  state: &AppState<S>,
  viewer_id: Uuid,
  role: Role,
  f: impl FnOnce(&mut FeedSession) -> R,
) -> R
where
  S: Backend,
{
  {
    let mut feeds = state.feeds.lock().await;
    if let Some(session) = feeds.get_mut(&viewer_id) {
      return f(session);
    }
  }

  let fresh = load_feed(&*state.store, viewer_id, role).await;
  let mut feeds = state.feeds.lock().await;
  // Another request may have built one meanwhile; keep whichever came first.
  f(feeds.entry(viewer_id).or_insert(fresh))
}

// ─── Current ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
  #[serde(default)]
  pub refresh: bool,
}

/// `GET /feed[?refresh=true]`
pub async fn current<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
  Query(params): Query<FeedParams>,
) -> Result<Json<FeedView>, Error> {
  let role = viewer.require_role()?;
  if params.refresh {
    return Ok(Json(rebuild(&state, viewer.user_id, role).await));
  }
  let view = with_feed(&state, viewer.user_id, role, |session| FeedView::from(&*session)).await;
  Ok(Json(view))
}

// ─── Swipes ───────────────────────────────────────────────────────────────────

/// `POST /feed/reject`
pub async fn reject<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
) -> Result<Json<SwipeResponse>, Error> {
  let role = viewer.require_role()?;
  let notice = with_feed(&state, viewer.user_id, role, swipe::reject).await;
  Ok(Json(SwipeResponse { notice }))
}

/// `POST /feed/accept`
///
/// The cursor moves before the match is written; a failed write is logged
/// and reported as no notice.
pub async fn accept<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
) -> Result<Json<SwipeResponse>, Error> {
  let role = viewer.require_role()?;
  let Some(entry) = with_feed(&state, viewer.user_id, role, FeedSession::advance).await else {
    return Ok(Json(SwipeResponse { notice: None }));
  };

  let policy = state.config.match_policy();
  let notice = match swipe::accept_entry(&*state.store, viewer.user_id, role, &entry, policy).await {
    Ok(notice) => Some(notice),
    Err(e) => {
      tracing::warn!(viewer_id = %viewer.user_id, error = %e, "failed to persist match");
      None
    }
  };
  Ok(Json(SwipeResponse { notice }))
}
