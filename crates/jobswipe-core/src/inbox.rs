//! Match list with per-match unread counts.
//!
//! Unread counts are not maintained anywhere; they are recomputed every time
//! the list is built. [`ReloadPolicy`] decides which change events force a
//! rebuild.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  chat::participant_match,
  matching::Match,
  realtime::{ChangeEvent, Table},
  store::SwipeStore,
};

/// Shown in place of the counterpart's email when their profile has none.
pub const UNKNOWN_USER: &str = "Unknown User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
  #[serde(flatten)]
  pub record:            Match,
  pub counterpart_id:    Uuid,
  pub counterpart_email: String,
  pub unread_count:      u32,
}

/// All of `viewer`'s matches, newest first, with counterpart email and unread
/// count.
///
/// A failed match listing is logged and yields an empty list. A failed lookup
/// for a single match only degrades that entry: the email becomes
/// [`UNKNOWN_USER`] and the unread count 0.
pub async fn list_matches<S: SwipeStore>(store: &S, viewer: Uuid) -> Vec<MatchSummary> {
  let matches = match store.list_matches(viewer).await {
    Ok(matches) => matches,
    Err(e) => {
      tracing::warn!(%viewer, error = %e, "failed to list matches");
      return Vec::new();
    }
  };

  let mut out = Vec::with_capacity(matches.len());
  for record in matches {
    out.push(summarise(store, viewer, record).await);
  }
  out
}

async fn summarise<S: SwipeStore>(store: &S, viewer: Uuid, record: Match) -> MatchSummary {
  let match_id = record.match_id;
  let counterpart_id = record.counterpart(viewer);

  let counterpart_email = match store.get_profile(counterpart_id).await {
    Ok(profile) => profile.and_then(|p| p.email),
    Err(e) => {
      tracing::warn!(%match_id, %counterpart_id, error = %e, "failed to load counterpart profile");
      None
    }
  }
  .unwrap_or_else(|| UNKNOWN_USER.to_owned());

  let unread_count = store.count_unread(match_id, viewer).await.unwrap_or_else(|e| {
    tracing::warn!(%match_id, error = %e, "failed to count unread messages");
    0
  });

  MatchSummary { record, counterpart_id, counterpart_email, unread_count }
}

/// Mark the messages `viewer` has received in a match as read. Returns how
/// many changed.
pub async fn mark_read<S: SwipeStore>(store: &S, match_id: Uuid, viewer: Uuid) -> Result<usize> {
  participant_match(store, match_id, viewer).await?;
  let updated = store.mark_read(match_id, viewer).await.map_err(Error::store)?;
  Ok(updated.len())
}

// ─── Reload policy ───────────────────────────────────────────────────────────

/// Which change events make a viewer's match list stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
  /// Any message event anywhere triggers a full reload.
  #[default]
  AnyMessage,
  /// Only message events in one of the viewer's matches, and new matches
  /// that involve the viewer.
  OwnMatches,
}

impl ReloadPolicy {
  /// `known` is the set of match ids from the viewer's last list.
  pub fn needs_reload(self, event: &ChangeEvent, viewer: Uuid, known: &HashSet<Uuid>) -> bool {
    match self {
      Self::AnyMessage => event.table == Table::Messages,
      Self::OwnMatches => match (event.message(), event.match_row()) {
        (Some(m), _) => known.contains(&m.match_id),
        (None, Some(m)) => m.involves(viewer),
        (None, None) => false,
      },
    }
  }
}
