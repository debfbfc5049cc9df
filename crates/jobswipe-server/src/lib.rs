//! HTTP and WebSocket surface for JobSwipe.
//!
//! Exposes an axum [`Router`] over any [`AccountStore`]. Feed sessions live
//! in memory per viewer; everything else is read from the store on demand.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod realtime;
pub mod storage;

pub use error::Error;

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use jobswipe_core::{
  inbox::ReloadPolicy,
  store::AccountStore,
  swipe::{FeedSession, MatchPolicy},
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use handlers::{account, feed, matches, profile};
use storage::FsAvatarStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `JOBSWIPE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  pub avatar_dir:            PathBuf,
  /// Prefix of public avatar URLs, e.g. `http://localhost:8080`.
  pub public_base_url:       String,
  #[serde(default)]
  pub require_mutual_accept: bool,
  #[serde(default)]
  pub enforce_unique_pair:   bool,
  #[serde(default)]
  pub reload_policy:         ReloadPolicy,
}

impl ServerConfig {
  pub fn match_policy(&self) -> MatchPolicy {
    MatchPolicy {
      require_mutual_accept: self.require_mutual_accept,
      enforce_unique_pair:   self.enforce_unique_pair,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Store bound shared by every handler.
pub trait Backend: AccountStore + Clone + 'static {}

impl<T: AccountStore + Clone + 'static> Backend for T {}

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub avatars: Arc<FsAvatarStore>,
  pub config:  Arc<ServerConfig>,
  /// Feed sessions by viewer. Never held across a store call.
  pub feeds:   Arc<Mutex<HashMap<Uuid, FeedSession>>>,
}

impl<S: Backend> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let avatars = FsAvatarStore::new(config.avatar_dir.clone(), &config.public_base_url);
    Self {
      store:   Arc::new(store),
      avatars: Arc::new(avatars),
      config:  Arc::new(config),
      feeds:   Arc::new(Mutex::new(HashMap::new())),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the JobSwipe server.
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    // Session gate
    .route("/auth/pending-role",         post(account::pending_role::<S>))
    .route("/auth/signup",               post(account::sign_up::<S>))
    .route("/auth/signin",               post(account::sign_in::<S>))
    .route("/auth/signout",              post(account::sign_out::<S>))
    .route("/auth/session",              get(account::session::<S>))
    // Profile editor
    .route("/profile",                   get(profile::load::<S>).put(profile::save::<S>))
    .route("/profile/avatar",            put(profile::upload_avatar::<S>))
    .route("/profile/skills",            post(profile::add_skill::<S>))
    .route("/profile/skills/{skill}",    delete(profile::remove_skill::<S>))
    .route("/avatars/{id}/{file}",       get(profile::avatar::<S>))
    // Feed and swiping
    .route("/feed",                      get(feed::current::<S>))
    .route("/feed/reject",               post(feed::reject::<S>))
    .route("/feed/accept",               post(feed::accept::<S>))
    // Matches and chat
    .route("/matches",                   get(matches::list::<S>))
    .route("/matches/{id}/messages",     get(matches::messages::<S>).post(matches::send::<S>))
    .route("/matches/{id}/read",         post(matches::mark_read::<S>))
    // Realtime
    .route("/realtime/matches",          get(realtime::inbox::<S>))
    .route("/realtime/matches/{id}",     get(realtime::chat::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
