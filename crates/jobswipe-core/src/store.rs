//! Storage traits.
//!
//! [`SwipeStore`] covers the tables the matching logic reads and writes,
//! [`AccountStore`] the tables behind sign-in, and [`AvatarStore`] the object
//! storage for profile pictures. Higher layers depend on these traits, not on
//! a concrete backend.

use std::future::Future;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  account::{Account, NewAccount, Session},
  matching::{Match, Message, NewMatch, NewMessage},
  profile::{Profile, ProfileDraft, Role},
  realtime::ChangeEvent,
};

// ─── Matching tables ─────────────────────────────────────────────────────────

/// Profiles, roles, matches, likes and messages.
///
/// Every write to `matches` or `messages` is published to the channel
/// returned by [`SwipeStore::subscribe`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SwipeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Retrieve a profile by identity. Returns `None` if not found.
  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Overwrite the mutable fields of a profile and bump `updated_at`.
  /// Returns `None` if the profile does not exist.
  fn update_profile(
    &self,
    id: Uuid,
    draft: ProfileDraft,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Set `avatar_url`. Returns `None` if the profile does not exist.
  fn set_avatar_url(
    &self,
    id: Uuid,
    url: String,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// All profiles whose identity has `role`, except `exclude`.
  /// Order is whatever the backend returns.
  fn list_profiles_by_role(
    &self,
    role: Role,
    exclude: Uuid,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  // ── Roles ─────────────────────────────────────────────────────────────

  fn get_role(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + '_;

  /// Insert a role for `id`. The first insert wins; a later insert is a
  /// duplicate, is ignored, and returns `false`.
  fn insert_role(
    &self,
    id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Matches ───────────────────────────────────────────────────────────

  /// Persist a new match. No uniqueness check is made.
  fn create_match(
    &self,
    pair: NewMatch,
  ) -> impl Future<Output = Result<Match, Self::Error>> + Send + '_;

  fn get_match(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Match>, Self::Error>> + Send + '_;

  /// The oldest existing match for this exact pair, if any.
  fn find_match(
    &self,
    recruiter_id: Uuid,
    job_seeker_id: Uuid,
  ) -> impl Future<Output = Result<Option<Match>, Self::Error>> + Send + '_;

  /// All matches where `user_id` is either party, newest first.
  fn list_matches(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Match>, Self::Error>> + Send + '_;

  /// Record that `swiper` accepted `target`. Repeats are ignored.
  fn record_like(
    &self,
    swiper: Uuid,
    target: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn has_like(
    &self,
    swiper: Uuid,
    target: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  fn insert_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Messages of a match, oldest first.
  fn list_messages(
    &self,
    match_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  /// Messages in the match with `read = false` not sent by `viewer`.
  fn count_unread(
    &self,
    match_id: Uuid,
    viewer: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// Mark every unread message in the match not sent by `viewer` as read and
  /// return the updated rows.
  fn mark_read(
    &self,
    match_id: Uuid,
    viewer: Uuid,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  // ── Realtime ──────────────────────────────────────────────────────────

  /// A fresh receiver for change events written after this call.
  fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

// ─── Account tables ──────────────────────────────────────────────────────────

/// Accounts, sessions and pending-role callback tokens.
///
/// Tokens are handed to the store already hashed; the plain token only
/// exists on the client.
pub trait AccountStore: SwipeStore {
  /// Create an account and its (mostly empty) profile row together.
  /// Returns `None` if the email is already registered.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn find_account(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn create_session(
    &self,
    user_id: Uuid,
    token_hash: String,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  fn get_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// Returns whether a session was removed.
  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn put_pending_role(
    &self,
    token_hash: String,
    role: Role,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove and return the pending role for a token. A token can be taken
  /// at most once.
  fn take_pending_role(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + '_;
}

// ─── Object storage ──────────────────────────────────────────────────────────

/// The avatar bucket.
pub trait AvatarStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Write `bytes` at `path`, replacing whatever was there.
  fn put(
    &self,
    path: String,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The URL under which `path` is publicly readable.
  fn public_url(&self, path: &str) -> String;
}
