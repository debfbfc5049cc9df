//! Swipe controller.
//!
//! A [`FeedSession`] walks its entries with a cursor that wraps back to the
//! start after the last entry. Rejecting only moves the cursor; accepting
//! moves it and persists a match according to [`MatchPolicy`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  feed::FeedEntry,
  matching::NewMatch,
  profile::Role,
  store::SwipeStore,
};

/// Contact email shown when a job seeker matches a job. The recruiter's real
/// address is not resolved at this layer.
pub const PLACEHOLDER_RECRUITER_EMAIL: &str = "recruiter@company.com";

// ─── Session ─────────────────────────────────────────────────────────────────

/// A viewer's feed plus the cursor into it.
///
/// Invariant: `cursor < entries.len()` whenever the feed is non-empty, and
/// `cursor == 0` when it is empty.
#[derive(Debug, Clone, Serialize)]
pub struct FeedSession {
  pub viewer_id: Uuid,
  pub role:      Role,
  entries:       Vec<FeedEntry>,
  cursor:        usize,
}

impl FeedSession {
  pub fn new(viewer_id: Uuid, role: Role, entries: Vec<FeedEntry>) -> Self {
    Self { viewer_id, role, entries, cursor: 0 }
  }

  pub fn entries(&self) -> &[FeedEntry] { &self.entries }

  pub fn cursor(&self) -> usize { self.cursor }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// The entry under the cursor, if the feed is non-empty.
  pub fn current(&self) -> Option<&FeedEntry> { self.entries.get(self.cursor) }

  /// Entries left before the cursor wraps.
  pub fn remaining(&self) -> usize { self.entries.len() - self.cursor }

  /// Take the entry under the cursor and move to the next one, wrapping to 0
  /// after the last. A no-op returning `None` on an empty feed.
  pub fn advance(&mut self) -> Option<FeedEntry> {
    let entry = self.entries.get(self.cursor)?.clone();
    self.cursor = (self.cursor + 1) % self.entries.len();
    Some(entry)
  }
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// How an accept turns into a match. Both flags off reproduces one-sided
/// matching where every accept inserts a new row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPolicy {
  /// Only create the match once the other side has accepted too.
  #[serde(default)]
  pub require_mutual_accept: bool,
  /// Reuse an existing match for the same pair instead of inserting another.
  #[serde(default)]
  pub enforce_unique_pair:   bool,
}

// ─── Notices ─────────────────────────────────────────────────────────────────

/// Display projection of the matched party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchNotice {
  pub match_id:      Uuid,
  pub name:          Option<String>,
  pub title:         Option<String>,
  pub company:       Option<String>,
  pub skills:        Vec<String>,
  pub contact_email: Option<String>,
}

impl MatchNotice {
  fn new(match_id: Uuid, entry: &FeedEntry) -> Self {
    match entry {
      FeedEntry::Job(job) => Self {
        match_id,
        name: job.company.clone(),
        title: job.title.clone(),
        company: job.company.clone(),
        skills: job.skills.clone(),
        contact_email: Some(PLACEHOLDER_RECRUITER_EMAIL.to_owned()),
      },
      FeedEntry::Candidate(c) => Self {
        match_id,
        name: c.name.clone(),
        title: c.title.clone(),
        company: None,
        skills: c.skills.clone(),
        contact_email: c.email.clone(),
      },
    }
  }
}

/// The transient notification raised by a swipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
  Passed { description: String },
  /// Accept recorded; waiting for the other side (mutual-accept policy only).
  Liked { target_id: Uuid },
  Matched(MatchNotice),
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Skip the current entry. `None` on an empty feed.
pub fn reject(session: &mut FeedSession) -> Option<Notice> {
  session.advance()?;
  let description = match session.role {
    Role::JobSeeker => "Job skipped",
    Role::Recruiter => "Candidate skipped",
  };
  Some(Notice::Passed { description: description.to_owned() })
}

/// Accept the current entry and persist the match.
///
/// The cursor moves even when persistence fails; the failure is logged and
/// swallowed, and the result is `None`. Also `None` on an empty feed.
pub async fn accept<S: SwipeStore>(
  store: &S,
  session: &mut FeedSession,
  policy: MatchPolicy,
) -> Option<Notice> {
  let entry = session.advance()?;
  match accept_entry(store, session.viewer_id, session.role, &entry, policy).await {
    Ok(notice) => Some(notice),
    Err(e) => {
      tracing::warn!(viewer_id = %session.viewer_id, error = %e, "failed to persist match");
      None
    }
  }
}

/// Persist an accept of `entry` by `viewer_id`, who has `role`.
///
/// The viewer goes into the slot of their role and the entry's identity into
/// the other one.
pub async fn accept_entry<S: SwipeStore>(
  store: &S,
  viewer_id: Uuid,
  role: Role,
  entry: &FeedEntry,
  policy: MatchPolicy,
) -> Result<Notice> {
  let target = entry.identity();
  let pair = match role {
    Role::Recruiter => NewMatch { recruiter_id: viewer_id, job_seeker_id: target },
    Role::JobSeeker => NewMatch { recruiter_id: target, job_seeker_id: viewer_id },
  };

  if policy.require_mutual_accept {
    store.record_like(viewer_id, target).await.map_err(Error::store)?;
    if !store.has_like(target, viewer_id).await.map_err(Error::store)? {
      return Ok(Notice::Liked { target_id: target });
    }
  }

  if policy.enforce_unique_pair
    && let Some(existing) = store
      .find_match(pair.recruiter_id, pair.job_seeker_id)
      .await
      .map_err(Error::store)?
  {
    return Ok(Notice::Matched(MatchNotice::new(existing.match_id, entry)));
  }

  let created = store.create_match(pair).await.map_err(Error::store)?;
  tracing::info!(match_id = %created.match_id, %viewer_id, %target, "match created");
  Ok(Notice::Matched(MatchNotice::new(created.match_id, entry)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{profile::Profile, testing::BrokenStore};

  fn session(n: usize) -> FeedSession {
    let entries = (0..n)
      .map(|_| FeedEntry::for_viewer(Role::Recruiter, Profile::empty(Uuid::new_v4())))
      .collect();
    FeedSession::new(Uuid::new_v4(), Role::Recruiter, entries)
  }

  #[test]
  fn cursor_wraps_after_last_entry() {
    let mut s = session(3);
    let first = s.current().unwrap().identity();
    for _ in 0..3 {
      s.advance();
    }
    assert_eq!(s.cursor(), 0);
    assert_eq!(s.current().unwrap().identity(), first);
  }

  #[test]
  fn cursor_stays_in_bounds() {
    let mut s = session(4);
    for _ in 0..17 {
      assert!(s.advance().is_some());
      assert!(s.cursor() < s.entries().len());
    }
  }

  #[test]
  fn advance_returns_the_swiped_entry() {
    let mut s = session(2);
    let expected = s.entries()[0].identity();
    assert_eq!(s.advance().unwrap().identity(), expected);
    assert_eq!(s.cursor(), 1);
    assert_eq!(s.remaining(), 1);
  }

  #[test]
  fn empty_feed_is_a_no_op() {
    let mut s = session(0);
    assert!(s.current().is_none());
    assert!(s.advance().is_none());
    assert!(reject(&mut s).is_none());
    assert_eq!(s.cursor(), 0);
    assert_eq!(s.remaining(), 0);
  }

  #[test]
  fn reject_describes_what_was_skipped() {
    let mut s = session(1);
    assert_eq!(
      reject(&mut s),
      Some(Notice::Passed { description: "Candidate skipped".into() })
    );

    let mut seeker = FeedSession::new(
      Uuid::new_v4(),
      Role::JobSeeker,
      vec![FeedEntry::for_viewer(Role::JobSeeker, Profile::empty(Uuid::new_v4()))],
    );
    assert_eq!(
      reject(&mut seeker),
      Some(Notice::Passed { description: "Job skipped".into() })
    );
  }

  #[test]
  fn job_match_notice_uses_placeholder_email() {
    let mut p = Profile::empty(Uuid::new_v4());
    p.company = Some("Acme".into());
    p.job_title = Some("SRE".into());
    let entry = FeedEntry::for_viewer(Role::JobSeeker, p);

    let notice = MatchNotice::new(Uuid::new_v4(), &entry);
    assert_eq!(notice.company.as_deref(), Some("Acme"));
    assert_eq!(notice.title.as_deref(), Some("SRE"));
    assert_eq!(notice.contact_email.as_deref(), Some(PLACEHOLDER_RECRUITER_EMAIL));
  }

  #[test]
  fn policy_defaults_to_one_sided() {
    let policy: MatchPolicy = serde_json::from_str("{}").unwrap();
    assert_eq!(policy, MatchPolicy::default());
    assert!(!policy.require_mutual_accept);
    assert!(!policy.enforce_unique_pair);
  }

  #[tokio::test]
  async fn failed_accept_still_advances() {
    let mut s = session(2);
    let second = s.entries()[1].identity();
    let store = BrokenStore::default();

    assert_eq!(accept(&store, &mut s, MatchPolicy::default()).await, None);
    assert_eq!(s.cursor(), 1);
    assert_eq!(s.current().unwrap().identity(), second);

    let mutual = MatchPolicy { require_mutual_accept: true, ..Default::default() };
    assert_eq!(accept(&store, &mut s, mutual).await, None);
    assert_eq!(s.cursor(), 0);
  }
}
