//! A store whose reads and writes fail, for exercising the degrade paths.

use std::io;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  matching::{Match, Message, NewMatch, NewMessage},
  profile::{Profile, ProfileDraft, Role},
  realtime::ChangeEvent,
  store::SwipeStore,
};

/// Every call fails with an I/O error except `list_matches`, which returns
/// `matches` when set.
#[derive(Default)]
pub(crate) struct BrokenStore {
  pub matches: Option<Vec<Match>>,
}

fn down() -> io::Error { io::Error::other("store offline") }

impl SwipeStore for BrokenStore {
  type Error = io::Error;

  async fn get_profile(&self, _: Uuid) -> Result<Option<Profile>, Self::Error> { Err(down()) }
  async fn update_profile(&self, _: Uuid, _: ProfileDraft) -> Result<Option<Profile>, Self::Error> { Err(down()) }
  async fn set_avatar_url(&self, _: Uuid, _: String) -> Result<Option<Profile>, Self::Error> { Err(down()) }
  async fn list_profiles_by_role(&self, _: Role, _: Uuid) -> Result<Vec<Profile>, Self::Error> { Err(down()) }
  async fn get_role(&self, _: Uuid) -> Result<Option<Role>, Self::Error> { Err(down()) }
  async fn insert_role(&self, _: Uuid, _: Role) -> Result<bool, Self::Error> { Err(down()) }
  async fn create_match(&self, _: NewMatch) -> Result<Match, Self::Error> { Err(down()) }
  async fn get_match(&self, _: Uuid) -> Result<Option<Match>, Self::Error> { Err(down()) }
  async fn find_match(&self, _: Uuid, _: Uuid) -> Result<Option<Match>, Self::Error> { Err(down()) }

  async fn list_matches(&self, _: Uuid) -> Result<Vec<Match>, Self::Error> {
    self.matches.clone().ok_or_else(down)
  }

  async fn record_like(&self, _: Uuid, _: Uuid) -> Result<(), Self::Error> { Err(down()) }
  async fn has_like(&self, _: Uuid, _: Uuid) -> Result<bool, Self::Error> { Err(down()) }
  async fn insert_message(&self, _: NewMessage) -> Result<Message, Self::Error> { Err(down()) }
  async fn list_messages(&self, _: Uuid) -> Result<Vec<Message>, Self::Error> { Err(down()) }
  async fn count_unread(&self, _: Uuid, _: Uuid) -> Result<u32, Self::Error> { Err(down()) }
  async fn mark_read(&self, _: Uuid, _: Uuid) -> Result<Vec<Message>, Self::Error> { Err(down()) }

  fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> { broadcast::channel(1).1 }
}
