//! Password hashing, bearer tokens and the [`Viewer`] extractor.
//!
//! Tokens are random 256-bit values handed to the client once. The store only
//! ever sees their SHA-256, so a leaked database does not leak sessions.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, Query},
  http::{header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use jobswipe_core::profile::Role;
use rand_core::{OsRng, RngCore};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{AppState, Backend, error::Error};

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Internal(format!("argon2 error: {e}")))
}

/// Whether `password` matches the PHC string. A malformed hash never matches.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// A fresh URL-safe bearer token.
pub fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  B64.encode(bytes)
}

/// Hex SHA-256 of a token; the form tokens are stored and looked up in.
pub fn hash_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// Issue a one-time callback token carrying `role` and return the plain
/// token.
pub async fn issue_pending_role<S: Backend>(store: &S, role: Role) -> Result<String, Error> {
  let token = new_token();
  store
    .put_pending_role(hash_token(&token), role)
    .await
    .map_err(Error::store)?;
  tracing::debug!(?role, "pending role issued");
  Ok(token)
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Viewer {
  pub user_id:    Uuid,
  /// `None` until a role has been provisioned.
  pub role:       Option<Role>,
  pub token_hash: String,
}

impl Viewer {
  /// The viewer's role, or 403 if none has been set yet.
  pub fn require_role(&self) -> Result<Role, Error> {
    self
      .role
      .ok_or_else(|| jobswipe_core::Error::RoleNotSet(self.user_id).into())
  }
}

#[derive(Deserialize)]
struct TokenQuery {
  access_token: Option<String>,
}

/// The bearer token from the `Authorization` header, falling back to the
/// `access_token` query parameter (browsers cannot set headers on WebSockets).
fn bearer_token(parts: &Parts) -> Option<String> {
  let from_header = parts
    .headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(|t| t.trim().to_owned());
  if from_header.is_some() {
    return from_header;
  }

  Query::<TokenQuery>::try_from_uri(&parts.uri)
    .ok()
    .and_then(|Query(q)| q.access_token)
}

impl<S: Backend> FromRequestParts<AppState<S>> for Viewer {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(parts).ok_or(Error::Unauthorized)?;
    let token_hash = hash_token(&token);

    let session = state
      .store
      .get_session(token_hash.clone())
      .await
      .map_err(Error::store)?
      .ok_or(Error::Unauthorized)?;
    let role = state
      .store
      .get_role(session.user_id)
      .await
      .map_err(Error::store)?;

    Ok(Viewer { user_id: session.user_id, role, token_hash })
  }
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use jobswipe_core::{account::NewAccount, store::AccountStore};
  use jobswipe_store_sqlite::SqliteStore;

  use super::*;
  use crate::tests::test_state;

  async fn extract(req: Request<Body>, state: &AppState<SqliteStore>) -> Result<Viewer, Error> {
    let (mut parts, _) = req.into_parts();
    Viewer::from_request_parts(&mut parts, state).await
  }

  async fn signed_in(state: &AppState<SqliteStore>) -> (Uuid, String) {
    let account = state
      .store
      .create_account(NewAccount {
        email:         "v@x.test".into(),
        password_hash: hash_password("pw").unwrap(),
        full_name:     None,
      })
      .await
      .unwrap()
      .unwrap();
    let token = new_token();
    state
      .store
      .create_session(account.user_id, hash_token(&token))
      .await
      .unwrap();
    (account.user_id, token)
  }

  #[test]
  fn password_round_trip() {
    let phc = hash_password("hunter2").unwrap();
    assert!(verify_password("hunter2", &phc));
    assert!(!verify_password("hunter3", &phc));
    assert!(!verify_password("hunter2", "not-a-phc-string"));
  }

  #[test]
  fn tokens_are_unique_and_hash_is_stable() {
    let a = new_token();
    let b = new_token();
    assert_ne!(a, b);
    assert_eq!(a.len(), 43);
    assert_eq!(hash_token(&a), hash_token(&a));
    assert_eq!(hash_token(&a).len(), 64);
  }

  #[tokio::test]
  async fn bearer_header_authenticates() {
    let state = test_state().await;
    let (user_id, token) = signed_in(&state).await;

    let req = Request::builder()
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .body(Body::empty())
      .unwrap();
    let viewer = extract(req, &state).await.unwrap();
    assert_eq!(viewer.user_id, user_id);
    assert_eq!(viewer.role, None);
    assert!(viewer.require_role().is_err());
  }

  #[tokio::test]
  async fn query_token_authenticates() {
    let state = test_state().await;
    let (user_id, token) = signed_in(&state).await;

    let req = Request::builder()
      .uri(format!("/realtime/matches?access_token={token}"))
      .body(Body::empty())
      .unwrap();
    assert_eq!(extract(req, &state).await.unwrap().user_id, user_id);
  }

  #[tokio::test]
  async fn unknown_or_missing_token_is_rejected() {
    let state = test_state().await;

    let req = Request::builder()
      .header(header::AUTHORIZATION, "Bearer nope")
      .body(Body::empty())
      .unwrap();
    assert!(matches!(extract(req, &state).await, Err(Error::Unauthorized)));

    let req = Request::builder().body(Body::empty()).unwrap();
    assert!(matches!(extract(req, &state).await, Err(Error::Unauthorized)));
  }
}
