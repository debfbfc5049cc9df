//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/pending-role` | Body: `{"role":"recruiter"}` → `{"token":…}` |
//! | `POST` | `/auth/signup` | 409 if the email is taken |
//! | `POST` | `/auth/signin` | 401 on bad credentials |
//! | `POST` | `/auth/signout` | Ends the calling session only |
//! | `GET`  | `/auth/session` | Identity, email and role |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use jobswipe_core::{
  account::NewAccount,
  profile::Role,
  role::{claim_pending_role, resolve_role},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState, Backend,
  auth::{Viewer, hash_password, hash_token, issue_pending_role, new_token, verify_password},
  error::Error,
};

const MIN_PASSWORD_LEN: usize = 6;

/// What a successful sign-in or sign-up hands back.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
  pub access_token: String,
  pub user_id:      Uuid,
  pub email:        String,
  pub role:         Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
  pub user_id: Uuid,
  pub email:   String,
  pub role:    Option<Role>,
}

fn normalise_email(email: &str) -> Result<String, Error> {
  let email = email.trim().to_lowercase();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
    _ => Err(Error::BadRequest(format!("{email:?} is not an email address"))),
  }
}

/// Role for a freshly authenticated identity: an explicit role first, then
/// a pending-role token, then whatever is already stored. A token that came
/// along with an explicit role is spent all the same.
async fn settle_role<S: Backend>(
  store: &S,
  user_id: Uuid,
  explicit: Option<Role>,
  pending_token: Option<&str>,
) -> Result<Option<Role>, Error> {
  let role = match (explicit, pending_token) {
    (Some(role), Some(token)) => {
      let discarded = store
        .take_pending_role(hash_token(token))
        .await
        .map_err(Error::store)?;
      tracing::debug!(%user_id, ?discarded, "pending role overridden by explicit role");
      resolve_role(store, user_id, Some(role)).await?
    }
    (Some(role), None) => resolve_role(store, user_id, Some(role)).await?,
    (None, Some(token)) => claim_pending_role(store, user_id, hash_token(token)).await?,
    (None, None) => resolve_role(store, user_id, None).await?,
  };
  Ok(role)
}

async fn open_session<S: Backend>(
  store: &S,
  user_id: Uuid,
  email: String,
  role: Option<Role>,
) -> Result<SessionResponse, Error> {
  let access_token = new_token();
  store
    .create_session(user_id, hash_token(&access_token))
    .await
    .map_err(Error::store)?;
  Ok(SessionResponse { access_token, user_id, email, role })
}

// ─── Pending role ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PendingRoleBody {
  pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct PendingRoleResponse {
  pub token: String,
}

/// `POST /auth/pending-role`
pub async fn pending_role<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<PendingRoleBody>,
) -> Result<impl IntoResponse, Error> {
  let token = issue_pending_role(&*state.store, body.role).await?;
  Ok((StatusCode::CREATED, Json(PendingRoleResponse { token })))
}

// ─── Sign up / sign in ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignUpBody {
  pub email:         String,
  pub password:      String,
  pub full_name:     Option<String>,
  pub role:          Option<Role>,
  pub pending_token: Option<String>,
}

/// `POST /auth/signup`
pub async fn sign_up<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignUpBody>,
) -> Result<impl IntoResponse, Error> {
  let email = normalise_email(&body.email)?;
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let account = state
    .store
    .create_account(NewAccount {
      email:         email.clone(),
      password_hash: hash_password(&body.password)?,
      full_name:     body.full_name.filter(|n| !n.trim().is_empty()),
    })
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::Conflict(format!("{email} is already registered")))?;
  tracing::info!(user_id = %account.user_id, "account created");

  let role = settle_role(
    &*state.store,
    account.user_id,
    body.role,
    body.pending_token.as_deref(),
  )
  .await?;
  let session = open_session(&*state.store, account.user_id, account.email, role).await?;
  Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Debug, Deserialize)]
pub struct SignInBody {
  pub email:         String,
  pub password:      String,
  pub pending_token: Option<String>,
}

/// `POST /auth/signin`
pub async fn sign_in<S: Backend>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignInBody>,
) -> Result<Json<SessionResponse>, Error> {
  let email = normalise_email(&body.email).map_err(|_| Error::Unauthorized)?;
  let account = state
    .store
    .find_account(email)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;
  if !verify_password(&body.password, &account.password_hash) {
    tracing::debug!(user_id = %account.user_id, "sign-in rejected");
    return Err(Error::Unauthorized);
  }

  let role = settle_role(&*state.store, account.user_id, None, body.pending_token.as_deref()).await?;
  let session = open_session(&*state.store, account.user_id, account.email, role).await?;
  tracing::info!(user_id = %session.user_id, "signed in");
  Ok(Json(session))
}

// ─── Session ──────────────────────────────────────────────────────────────────

/// `POST /auth/signout`
pub async fn sign_out<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
) -> Result<StatusCode, Error> {
  state
    .store
    .delete_session(viewer.token_hash)
    .await
    .map_err(Error::store)?;
  state.feeds.lock().await.remove(&viewer.user_id);
  tracing::info!(user_id = %viewer.user_id, "signed out");
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/session`
pub async fn session<S: Backend>(
  State(state): State<AppState<S>>,
  viewer: Viewer,
) -> Result<Json<SessionInfo>, Error> {
  let account = state
    .store
    .get_account(viewer.user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;
  Ok(Json(SessionInfo { user_id: viewer.user_id, email: account.email, role: viewer.role }))
}
