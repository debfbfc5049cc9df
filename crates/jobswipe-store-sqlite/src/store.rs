//! [`SqliteStore`], the SQLite implementation of [`SwipeStore`] and
//! [`AccountStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use uuid::Uuid;

use jobswipe_core::{
  account::{Account, NewAccount, Session},
  matching::{Match, Message, NewMatch, NewMessage},
  profile::{Profile, ProfileDraft, Role},
  realtime::ChangeEvent,
  store::{AccountStore, SwipeStore},
};

use crate::{
  Result,
  encode::{
    ACCOUNT_COLUMNS, MATCH_COLUMNS, MESSAGE_COLUMNS, PROFILE_COLUMNS, RawAccount, RawMatch,
    RawMessage, RawProfile, decode_dt, decode_role, decode_uuid, encode_dt, encode_role,
    encode_skills, encode_uuid, now,
  },
  schema::SCHEMA,
};

/// How many change events a slow subscriber may fall behind before it sees
/// `Lagged`.
const CHANGE_CAPACITY: usize = 256;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A JobSwipe store backed by a single SQLite file.
///
/// Clones share the connection and the change channel.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  changes:         broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn).await
  }

  /// Open an in-memory store, used by the tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn).await
  }

  async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
    let store = Self { conn, changes };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Send an event to current subscribers. Having none is not an error.
  fn publish(&self, event: ChangeEvent) {
    let _ = self.changes.send(event);
  }

  /// Insert a fully-built [`Message`] and publish it.
  pub(crate) async fn insert_message_row(&self, message: &Message) -> Result<()> {
    let id_str       = encode_uuid(message.message_id);
    let match_id_str = encode_uuid(message.match_id);
    let sender_str   = encode_uuid(message.sender_id);
    let content      = message.content.clone();
    let at_str       = encode_dt(message.created_at);
    let read         = message.read;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO messages (message_id, match_id, sender_id, content, created_at, read)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, match_id_str, sender_str, content, at_str, read],
        )?;
        Ok(())
      })
      .await?;

    self.publish(ChangeEvent::message_inserted(message.clone()));
    Ok(())
  }

  async fn query_profile(&self, sql: String, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawProfile::from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }
}

// ─── SwipeStore impl ─────────────────────────────────────────────────────────

impl SwipeStore for SqliteStore {
  type Error = crate::Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    self
      .query_profile(format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"), id)
      .await
  }

  async fn update_profile(&self, id: Uuid, draft: ProfileDraft) -> Result<Option<Profile>> {
    let id_str     = encode_uuid(id);
    let skills_str = encode_skills(&draft.skills)?;
    let at_str     = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE profiles SET
             full_name = ?2, bio = ?3, location = ?4, phone = ?5, linkedin_url = ?6,
             job_title = ?7, company = ?8, experience = ?9, education = ?10,
             salary_range = ?11, skills = ?12, company_logo_url = ?13, updated_at = ?14
           WHERE id = ?1",
          rusqlite::params![
            id_str,
            draft.full_name,
            draft.bio,
            draft.location,
            draft.phone,
            draft.linkedin_url,
            draft.job_title,
            draft.company,
            draft.experience,
            draft.education,
            draft.salary_range,
            skills_str,
            draft.company_logo_url,
            at_str,
          ],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_profile(id).await
  }

  async fn set_avatar_url(&self, id: Uuid, url: String) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET avatar_url = ?2, updated_at = ?3 WHERE id = ?1",
          rusqlite::params![id_str, url, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_profile(id).await
  }

  async fn list_profiles_by_role(&self, role: Role, exclude: Uuid) -> Result<Vec<Profile>> {
    let role_str    = encode_role(role).to_owned();
    let exclude_str = encode_uuid(exclude);

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        // Column names are unambiguous across the join.
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS}
           FROM profiles
           JOIN user_roles ON user_roles.user_id = profiles.id
           WHERE user_roles.role = ?1 AND profiles.id != ?2
           ORDER BY profiles.updated_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![role_str, exclude_str], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  // ── Roles ─────────────────────────────────────────────────────────────────

  async fn get_role(&self, id: Uuid) -> Result<Option<Role>> {
    let id_str = encode_uuid(id);

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT role FROM user_roles WHERE user_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.as_deref().map(decode_role).transpose()
  }

  async fn insert_role(&self, id: Uuid, role: Role) -> Result<bool> {
    let id_str   = encode_uuid(id);
    let role_str = encode_role(role).to_owned();
    let at_str   = encode_dt(now());

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO user_roles (user_id, role, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, role_str, at_str],
        )?)
      })
      .await?;

    Ok(inserted == 1)
  }

  // ── Matches ───────────────────────────────────────────────────────────────

  async fn create_match(&self, pair: NewMatch) -> Result<Match> {
    let record = Match {
      match_id:      Uuid::new_v4(),
      recruiter_id:  pair.recruiter_id,
      job_seeker_id: pair.job_seeker_id,
      created_at:    now(),
    };

    let id_str        = encode_uuid(record.match_id);
    let recruiter_str = encode_uuid(record.recruiter_id);
    let seeker_str    = encode_uuid(record.job_seeker_id);
    let at_str        = encode_dt(record.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO matches (match_id, recruiter_id, job_seeker_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, recruiter_str, seeker_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(ChangeEvent::match_inserted(record.clone()));
    Ok(record)
  }

  async fn get_match(&self, id: Uuid) -> Result<Option<Match>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMatch> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {MATCH_COLUMNS} FROM matches WHERE match_id = ?1"),
              rusqlite::params![id_str],
              RawMatch::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMatch::into_match).transpose()
  }

  async fn find_match(&self, recruiter_id: Uuid, job_seeker_id: Uuid) -> Result<Option<Match>> {
    let recruiter_str = encode_uuid(recruiter_id);
    let seeker_str    = encode_uuid(job_seeker_id);

    let raw: Option<RawMatch> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {MATCH_COLUMNS} FROM matches
                 WHERE recruiter_id = ?1 AND job_seeker_id = ?2
                 ORDER BY created_at ASC, rowid ASC
                 LIMIT 1"
              ),
              rusqlite::params![recruiter_str, seeker_str],
              RawMatch::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMatch::into_match).transpose()
  }

  async fn list_matches(&self, user_id: Uuid) -> Result<Vec<Match>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawMatch> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MATCH_COLUMNS} FROM matches
           WHERE recruiter_id = ?1 OR job_seeker_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawMatch::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMatch::into_match).collect()
  }

  async fn record_like(&self, swiper: Uuid, target: Uuid) -> Result<()> {
    let swiper_str = encode_uuid(swiper);
    let target_str = encode_uuid(target);
    let at_str     = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO likes (swiper_id, target_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![swiper_str, target_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn has_like(&self, swiper: Uuid, target: Uuid) -> Result<bool> {
    let swiper_str = encode_uuid(swiper);
    let target_str = encode_uuid(target);

    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM likes WHERE swiper_id = ?1 AND target_id = ?2",
              rusqlite::params![swiper_str, target_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn insert_message(&self, input: NewMessage) -> Result<Message> {
    let message = Message {
      message_id: Uuid::new_v4(),
      match_id:   input.match_id,
      sender_id:  input.sender_id,
      content:    input.content,
      created_at: now(),
      read:       false,
    };
    self.insert_message_row(&message).await?;
    Ok(message)
  }

  async fn list_messages(&self, match_id: Uuid) -> Result<Vec<Message>> {
    let id_str = encode_uuid(match_id);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE match_id = ?1
           ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  async fn count_unread(&self, match_id: Uuid, viewer: Uuid) -> Result<u32> {
    let match_str  = encode_uuid(match_id);
    let viewer_str = encode_uuid(viewer);

    let count: u32 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM messages
           WHERE match_id = ?1 AND read = 0 AND sender_id != ?2",
          rusqlite::params![match_str, viewer_str],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count)
  }

  async fn mark_read(&self, match_id: Uuid, viewer: Uuid) -> Result<Vec<Message>> {
    let match_str  = encode_uuid(match_id);
    let viewer_str = encode_uuid(viewer);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "UPDATE messages SET read = 1
           WHERE match_id = ?1 AND sender_id != ?2 AND read = 0
           RETURNING {MESSAGE_COLUMNS}"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![match_str, viewer_str], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let updated: Vec<Message> = raws
      .into_iter()
      .map(RawMessage::into_message)
      .collect::<Result<_>>()?;
    for m in &updated {
      self.publish(ChangeEvent::message_updated(m.clone()));
    }
    Ok(updated)
  }

  // ── Realtime ──────────────────────────────────────────────────────────────

  fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> { self.changes.subscribe() }
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  async fn create_account(&self, input: NewAccount) -> Result<Option<Account>> {
    let account = Account {
      user_id:       Uuid::new_v4(),
      email:         input.email,
      password_hash: input.password_hash,
      created_at:    now(),
    };

    let id_str    = encode_uuid(account.user_id);
    let email     = account.email.clone();
    let hash      = account.password_hash.clone();
    let at_str    = encode_dt(account.created_at);
    let full_name = input.full_name;

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          "INSERT INTO accounts (user_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email, hash, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            return Ok(false);
          }
          Err(e) => return Err(e.into()),
        }
        tx.execute(
          "INSERT INTO profiles (id, full_name, email, skills, updated_at)
           VALUES (?1, ?2, ?3, '[]', ?4)",
          rusqlite::params![id_str, full_name, email, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(created.then_some(account))
  }

  async fn find_account(&self, email: String) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
              rusqlite::params![email],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn get_account(&self, user_id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = ?1"),
              rusqlite::params![id_str],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn create_session(&self, user_id: Uuid, token_hash: String) -> Result<Session> {
    let session = Session { user_id, created_at: now() };

    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(session.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_hash, id_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn get_session(&self, token_hash: String) -> Result<Option<Session>> {
    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, created_at FROM sessions WHERE token_hash = ?1",
              rusqlite::params![token_hash],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(user_id, created_at)| -> Result<Session> {
        Ok(Session {
          user_id:    decode_uuid(&user_id)?,
          created_at: decode_dt(&created_at)?,
        })
      })
      .transpose()
  }

  async fn delete_session(&self, token_hash: String) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn put_pending_role(&self, token_hash: String, role: Role) -> Result<()> {
    let role_str = encode_role(role).to_owned();
    let at_str   = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pending_roles (token_hash, role, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_hash, role_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn take_pending_role(&self, token_hash: String) -> Result<Option<Role>> {
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let role: Option<String> = tx
          .query_row(
            "SELECT role FROM pending_roles WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |r| r.get(0),
          )
          .optional()?;
        if role.is_some() {
          tx.execute(
            "DELETE FROM pending_roles WHERE token_hash = ?1",
            rusqlite::params![token_hash],
          )?;
        }
        tx.commit()?;
        Ok(role)
      })
      .await?;

    raw.as_deref().map(decode_role).transpose()
  }
}
