//! Feed builder.
//!
//! A feed is the list of opposite-role profiles a viewer swipes through. It is
//! a projection, never stored, and rebuilt whenever the viewer's session
//! starts or their own profile changes.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  profile::{Profile, Role},
  store::SwipeStore,
  swipe::FeedSession,
};

// ─── Entries ─────────────────────────────────────────────────────────────────

/// A recruiter's profile as seen by a job seeker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobView {
  pub recruiter_id:     Uuid,
  pub title:            Option<String>,
  pub company:          Option<String>,
  pub company_logo_url: Option<String>,
  pub location:         Option<String>,
  pub salary_range:     Option<String>,
  pub description:      Option<String>,
  pub skills:           Vec<String>,
  pub posted_at:        DateTime<Utc>,
}

/// A job seeker's profile as seen by a recruiter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateView {
  pub job_seeker_id: Uuid,
  pub name:          Option<String>,
  pub title:         Option<String>,
  pub location:      Option<String>,
  pub experience:    Option<String>,
  pub education:     Option<String>,
  pub email:         Option<String>,
  pub bio:           Option<String>,
  pub skills:        Vec<String>,
  pub avatar_url:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEntry {
  Job(JobView),
  Candidate(CandidateView),
}

impl FeedEntry {
  /// Project `profile` for a viewer with `viewer_role`.
  pub fn for_viewer(viewer_role: Role, profile: Profile) -> Self {
    match viewer_role {
      Role::JobSeeker => Self::Job(JobView {
        recruiter_id:     profile.id,
        title:            profile.job_title,
        company:          profile.company,
        company_logo_url: profile.company_logo_url,
        location:         profile.location,
        salary_range:     profile.salary_range,
        description:      profile.bio,
        skills:           profile.skills,
        posted_at:        profile.updated_at,
      }),
      Role::Recruiter => Self::Candidate(CandidateView {
        job_seeker_id: profile.id,
        name:          profile.full_name,
        title:         profile.job_title,
        location:      profile.location,
        experience:    profile.experience,
        education:     profile.education,
        email:         profile.email,
        bio:           profile.bio,
        skills:        profile.skills,
        avatar_url:    profile.avatar_url,
      }),
    }
  }

  /// The identity behind this entry.
  pub fn identity(&self) -> Uuid {
    match self {
      Self::Job(j) => j.recruiter_id,
      Self::Candidate(c) => c.job_seeker_id,
    }
  }

  pub fn skills(&self) -> &[String] {
    match self {
      Self::Job(j) => &j.skills,
      Self::Candidate(c) => &c.skills,
    }
  }
}

// ─── Computation ─────────────────────────────────────────────────────────────

/// Whether the two skill lists share at least one exact entry.
pub fn skills_overlap(a: &[String], b: &[String]) -> bool {
  let a: HashSet<&str> = a.iter().map(String::as_str).collect();
  b.iter().any(|s| a.contains(s.as_str()))
}

/// Build a feed from already-fetched candidate profiles.
///
/// Drops the viewer's own profile and every profile without skill overlap.
/// Input order is preserved. An empty result is a valid "no matches yet"
/// state, not an error.
pub fn compute_feed(
  viewer_id: Uuid,
  viewer_role: Role,
  viewer_skills: &[String],
  profiles: Vec<Profile>,
) -> Vec<FeedEntry> {
  profiles
    .into_iter()
    .filter(|p| p.id != viewer_id)
    .filter(|p| skills_overlap(viewer_skills, &p.skills))
    .map(|p| FeedEntry::for_viewer(viewer_role, p))
    .collect()
}

/// Fetch and compute a fresh feed session for the viewer.
///
/// Read failures degrade to an empty feed; they are logged, not returned.
pub async fn load_feed<S: SwipeStore>(
  store: &S,
  viewer_id: Uuid,
  role: Role,
) -> FeedSession {
  let viewer_skills = match store.get_profile(viewer_id).await {
    Ok(profile) => profile.map(|p| p.skills).unwrap_or_default(),
    Err(e) => {
      tracing::warn!(%viewer_id, error = %e, "failed to load viewer profile; feed is empty");
      return FeedSession::new(viewer_id, role, Vec::new());
    }
  };

  let profiles = match store.list_profiles_by_role(role.opposite(), viewer_id).await {
    Ok(profiles) => profiles,
    Err(e) => {
      tracing::warn!(%viewer_id, error = %e, "failed to load feed profiles; feed is empty");
      return FeedSession::new(viewer_id, role, Vec::new());
    }
  };

  let entries = compute_feed(viewer_id, role, &viewer_skills, profiles);
  tracing::debug!(%viewer_id, ?role, entries = entries.len(), "feed built");
  FeedSession::new(viewer_id, role, entries)
}
