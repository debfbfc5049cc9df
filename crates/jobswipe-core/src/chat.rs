//! Chat channel for a single match.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
  Error, Result,
  matching::{Match, Message, NewMessage},
  realtime::{ChangeEvent, Op},
  store::SwipeStore,
};

/// Trim `content`, rejecting it if nothing is left.
pub fn validate_content(content: &str) -> Result<&str> {
  let trimmed = content.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyMessage);
  }
  Ok(trimmed)
}

/// The match, provided `user_id` is one of its two parties.
pub async fn participant_match<S: SwipeStore>(
  store: &S,
  match_id: Uuid,
  user_id: Uuid,
) -> Result<Match> {
  let record = store
    .get_match(match_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::MatchNotFound(match_id))?;
  if !record.involves(user_id) {
    return Err(Error::NotParticipant { match_id, user_id });
  }
  Ok(record)
}

/// All messages in the match, oldest first.
pub async fn load_messages<S: SwipeStore>(store: &S, match_id: Uuid) -> Result<Vec<Message>> {
  store.list_messages(match_id).await.map_err(Error::store)
}

/// Validate and persist a message from `sender`.
///
/// Blank content fails with [`Error::EmptyMessage`] before the store is
/// touched. On any error nothing was written, so the caller should keep the
/// text it tried to send.
pub async fn send_message<S: SwipeStore>(
  store: &S,
  match_id: Uuid,
  sender: Uuid,
  content: &str,
) -> Result<Message> {
  let content = validate_content(content)?.to_owned();
  participant_match(store, match_id, sender).await?;

  let message = store
    .insert_message(NewMessage { match_id, sender_id: sender, content })
    .await
    .map_err(Error::store)?;
  tracing::debug!(%match_id, message_id = %message.message_id, "message sent");
  Ok(message)
}

// ─── In-memory log ───────────────────────────────────────────────────────────

/// The ordered message list a chat view holds.
///
/// Messages that arrive both through the initial load and the realtime
/// subscription are kept once.
#[derive(Debug, Clone)]
pub struct ChatLog {
  match_id: Uuid,
  messages: Vec<Message>,
  seen:     HashSet<Uuid>,
}

impl ChatLog {
  pub fn new(match_id: Uuid) -> Self {
    Self { match_id, messages: Vec::new(), seen: HashSet::new() }
  }

  pub fn match_id(&self) -> Uuid { self.match_id }

  pub fn messages(&self) -> &[Message] { &self.messages }

  /// Merge a fetched snapshot (oldest first).
  ///
  /// Messages already received live are kept in receipt order after the
  /// snapshot.
  pub fn load(&mut self, snapshot: Vec<Message>) {
    let live: Vec<Message> = self.messages.drain(..).collect();
    self.seen.clear();
    for m in snapshot.into_iter().chain(live) {
      self.push(m);
    }
  }

  /// Append a message received live. Returns `false` if it belongs to
  /// another match or is already present.
  pub fn append_live(&mut self, message: Message) -> bool {
    if message.match_id != self.match_id {
      return false;
    }
    self.push(message)
  }

  /// Apply a change event; only message inserts for this match are relevant.
  /// Returns the newly appended message.
  pub fn apply(&mut self, event: &ChangeEvent) -> Option<&Message> {
    if event.op != Op::Insert {
      return None;
    }
    let message = event.message()?.clone();
    if self.append_live(message) {
      self.messages.last()
    } else {
      None
    }
  }

  fn push(&mut self, message: Message) -> bool {
    if !self.seen.insert(message.message_id) {
      return false;
    }
    self.messages.push(message);
    true
  }
}
