//! Match, like and message records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pairing created when one side accepts the other in its feed.
///
/// Nothing at the storage level prevents two rows for the same pair; see
/// [`crate::swipe::MatchPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
  pub match_id:      Uuid,
  pub recruiter_id:  Uuid,
  pub job_seeker_id: Uuid,
  pub created_at:    DateTime<Utc>,
}

impl Match {
  pub fn involves(&self, user_id: Uuid) -> bool {
    self.recruiter_id == user_id || self.job_seeker_id == user_id
  }

  /// The other party, as seen from `viewer`.
  pub fn counterpart(&self, viewer: Uuid) -> Uuid {
    if self.recruiter_id == viewer {
      self.job_seeker_id
    } else {
      self.recruiter_id
    }
  }
}

/// Input to [`crate::store::SwipeStore::create_match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewMatch {
  pub recruiter_id:  Uuid,
  pub job_seeker_id: Uuid,
}

/// A chat message. Immutable apart from the `read` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub message_id: Uuid,
  pub match_id:   Uuid,
  pub sender_id:  Uuid,
  pub content:    String,
  pub created_at: DateTime<Utc>,
  pub read:       bool,
}

/// Input to [`crate::store::SwipeStore::insert_message`]. `created_at` and
/// `read` are set by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub match_id:  Uuid,
  pub sender_id: Uuid,
  pub content:   String,
}
