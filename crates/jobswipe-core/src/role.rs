//! Role resolution after sign-in.
//!
//! A role picked before an OAuth-style redirect travels as a one-time
//! callback token: the token is issued with the role, passed through the
//! redirect, and claimed exactly once when the identity comes back.

use uuid::Uuid;

use crate::{
  Error, Result,
  profile::Role,
  store::{AccountStore, SwipeStore},
};

/// The stored role for `id`, provisioning `pending` if none is stored yet.
///
/// A stored role always wins; an insert that loses the race is a duplicate
/// and is ignored.
pub async fn resolve_role<S: SwipeStore>(
  store: &S,
  id: Uuid,
  pending: Option<Role>,
) -> Result<Option<Role>> {
  if let Some(role) = store.get_role(id).await.map_err(Error::store)? {
    return Ok(Some(role));
  }
  let Some(role) = pending else {
    return Ok(None);
  };

  if store.insert_role(id, role).await.map_err(Error::store)? {
    tracing::info!(%id, ?role, "role provisioned");
  } else {
    tracing::debug!(%id, ?role, "role already set; duplicate ignored");
  }
  store.get_role(id).await.map_err(Error::store)
}

/// Consume a pending-role token (by hash) and resolve `id`'s role with it.
/// An unknown or already-used token behaves like no pending role.
pub async fn claim_pending_role<S: AccountStore>(
  store: &S,
  id: Uuid,
  token_hash: String,
) -> Result<Option<Role>> {
  let pending = store
    .take_pending_role(token_hash)
    .await
    .map_err(Error::store)?;
  if pending.is_none() {
    tracing::warn!(%id, "pending-role token unknown or already used");
  }
  resolve_role(store, id, pending).await
}
