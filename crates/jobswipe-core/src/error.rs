//! Error types for `jobswipe-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Chat content was empty after trimming; nothing was persisted.
  #[error("message content is empty")]
  EmptyMessage,

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("match not found: {0}")]
  MatchNotFound(Uuid),

  #[error("profile not found: {0}")]
  ProfileNotFound(Uuid),

  #[error("{user_id} is not a participant of match {match_id}")]
  NotParticipant { match_id: Uuid, user_id: Uuid },

  #[error("no role has been set for {0}")]
  RoleNotSet(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error. Used as `.map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
