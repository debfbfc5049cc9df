//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with a fixed microsecond precision so that string
//! order equals time order. Skills are a compact JSON array. UUIDs are
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use jobswipe_core::{
  account::Account,
  matching::{Match, Message},
  profile::{Profile, Role},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The current time, truncated to what [`encode_dt`] keeps, so a value
/// returned by a write compares equal to the same row read back.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  decode_dt(&encode_dt(now)).unwrap_or(now)
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::JobSeeker => "job_seeker",
    Role::Recruiter => "recruiter",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "job_seeker" => Ok(Role::JobSeeker),
    "recruiter" => Ok(Role::Recruiter),
    other => Err(Error::UnknownValue { column: "role", value: other.to_owned() }),
  }
}

// ─── Skills ──────────────────────────────────────────────────────────────────

pub fn encode_skills(skills: &[String]) -> Result<String> {
  Ok(serde_json::to_string(skills)?)
}

pub fn decode_skills(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawProfile::from_row`].
pub const PROFILE_COLUMNS: &str = "id, full_name, email, bio, location, phone, linkedin_url, \
   job_title, company, experience, education, salary_range, skills, avatar_url, \
   company_logo_url, updated_at";

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub id:               String,
  pub full_name:        Option<String>,
  pub email:            Option<String>,
  pub bio:              Option<String>,
  pub location:         Option<String>,
  pub phone:            Option<String>,
  pub linkedin_url:     Option<String>,
  pub job_title:        Option<String>,
  pub company:          Option<String>,
  pub experience:       Option<String>,
  pub education:        Option<String>,
  pub salary_range:     Option<String>,
  pub skills:           String,
  pub avatar_url:       Option<String>,
  pub company_logo_url: Option<String>,
  pub updated_at:       String,
}

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      full_name:        row.get(1)?,
      email:            row.get(2)?,
      bio:              row.get(3)?,
      location:         row.get(4)?,
      phone:            row.get(5)?,
      linkedin_url:     row.get(6)?,
      job_title:        row.get(7)?,
      company:          row.get(8)?,
      experience:       row.get(9)?,
      education:        row.get(10)?,
      salary_range:     row.get(11)?,
      skills:           row.get(12)?,
      avatar_url:       row.get(13)?,
      company_logo_url: row.get(14)?,
      updated_at:       row.get(15)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:               decode_uuid(&self.id)?,
      full_name:        self.full_name,
      email:            self.email,
      bio:              self.bio,
      location:         self.location,
      phone:            self.phone,
      linkedin_url:     self.linkedin_url,
      job_title:        self.job_title,
      company:          self.company,
      experience:       self.experience,
      education:        self.education,
      salary_range:     self.salary_range,
      skills:           decode_skills(&self.skills)?,
      avatar_url:       self.avatar_url,
      company_logo_url: self.company_logo_url,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

pub const MATCH_COLUMNS: &str = "match_id, recruiter_id, job_seeker_id, created_at";

/// Raw strings read directly from a `matches` row.
pub struct RawMatch {
  pub match_id:      String,
  pub recruiter_id:  String,
  pub job_seeker_id: String,
  pub created_at:    String,
}

impl RawMatch {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      match_id:      row.get(0)?,
      recruiter_id:  row.get(1)?,
      job_seeker_id: row.get(2)?,
      created_at:    row.get(3)?,
    })
  }

  pub fn into_match(self) -> Result<Match> {
    Ok(Match {
      match_id:      decode_uuid(&self.match_id)?,
      recruiter_id:  decode_uuid(&self.recruiter_id)?,
      job_seeker_id: decode_uuid(&self.job_seeker_id)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const MESSAGE_COLUMNS: &str = "message_id, match_id, sender_id, content, created_at, read";

/// Raw strings read directly from a `messages` row.
pub struct RawMessage {
  pub message_id: String,
  pub match_id:   String,
  pub sender_id:  String,
  pub content:    String,
  pub created_at: String,
  pub read:       bool,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id: row.get(0)?,
      match_id:   row.get(1)?,
      sender_id:  row.get(2)?,
      content:    row.get(3)?,
      created_at: row.get(4)?,
      read:       row.get(5)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id: decode_uuid(&self.message_id)?,
      match_id:   decode_uuid(&self.match_id)?,
      sender_id:  decode_uuid(&self.sender_id)?,
      content:    self.content,
      created_at: decode_dt(&self.created_at)?,
      read:       self.read,
    })
  }
}

pub const ACCOUNT_COLUMNS: &str = "user_id, email, password_hash, created_at";

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      password_hash: row.get(2)?,
      created_at:    row.get(3)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      user_id:       decode_uuid(&self.user_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
