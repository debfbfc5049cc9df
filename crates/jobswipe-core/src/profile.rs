//! Profiles, roles and the profile editor.
//!
//! A profile is the single row describing an identity. It is created with the
//! account and afterwards mutated only by its owner, through a
//! [`ProfileDraft`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  store::{AvatarStore, SwipeStore},
};

// ─── Role ────────────────────────────────────────────────────────────────────

/// Which side of the market an identity is on. Set at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  JobSeeker,
  Recruiter,
}

impl Role {
  /// The role whose profiles show up in this role's feed.
  pub fn opposite(self) -> Self {
    match self {
      Self::JobSeeker => Self::Recruiter,
      Self::Recruiter => Self::JobSeeker,
    }
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// One row per identity.
///
/// `experience` and `education` only mean something for job seekers;
/// `company`, `salary_range` and `company_logo_url` only for recruiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id:               Uuid,
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
  /// Order is kept for display; matching treats this as a set.
  pub skills:           Vec<String>,
  pub avatar_url:       Option<String>,
  pub company_logo_url: Option<String>,
  pub updated_at:       DateTime<Utc>,
}

impl Profile {
  /// The defaults shown for an identity whose row is missing.
  pub fn empty(id: Uuid) -> Self {
    Self {
      id,
      full_name: None,
      email: None,
      bio: None,
      location: None,
      phone: None,
      linkedin_url: None,
      job_title: None,
      company: None,
      experience: None,
      education: None,
      salary_range: None,
      skills: Vec::new(),
      avatar_url: None,
      company_logo_url: None,
      updated_at: DateTime::<Utc>::default(),
    }
  }

  /// Start editing the mutable subset of this profile.
  pub fn draft(&self) -> ProfileDraft {
    ProfileDraft {
      full_name:        self.full_name.clone(),
      bio:              self.bio.clone(),
      location:         self.location.clone(),
      phone:            self.phone.clone(),
      linkedin_url:     self.linkedin_url.clone(),
      job_title:        self.job_title.clone(),
      company:          self.company.clone(),
      experience:       self.experience.clone(),
      education:        self.education.clone(),
      salary_range:     self.salary_range.clone(),
      skills:           self.skills.clone(),
      company_logo_url: self.company_logo_url.clone(),
    }
  }
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// The fields a profile owner may change. `id`, `email` and `avatar_url` are
/// not here; they change through account creation and [`upload_avatar`].
///
/// Saving a draft replaces all of these fields. Build one with
/// [`Profile::draft`] and edit it, or apply a [`ProfilePatch`] to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileDraft {
  pub full_name:        Option<String>,
  pub bio:              Option<String>,
  pub location:         Option<String>,
  pub phone:            Option<String>,
  pub linkedin_url:     Option<String>,
  pub job_title:        Option<String>,
  pub company:          Option<String>,
  pub experience:       Option<String>,
  pub education:        Option<String>,
  pub salary_range:     Option<String>,
  pub skills:           Vec<String>,
  pub company_logo_url: Option<String>,
}

impl ProfileDraft {
  /// Append `candidate` after trimming it. Empty input and exact
  /// (case-sensitive) duplicates are ignored. Returns whether the skill was
  /// added.
  pub fn add_skill(&mut self, candidate: &str) -> bool {
    let skill = candidate.trim();
    if skill.is_empty() || self.skills.iter().any(|s| s == skill) {
      return false;
    }
    self.skills.push(skill.to_owned());
    true
  }

  /// Remove the first skill equal to `skill`. Returns whether one was found.
  pub fn remove_skill(&mut self, skill: &str) -> bool {
    match self.skills.iter().position(|s| s == skill) {
      Some(i) => {
        self.skills.remove(i);
        true
      }
      None => false,
    }
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A partial edit as sent by a client. A field left out keeps its stored
/// value; an explicit `null` clears it. `skills`, when present, replaces the
/// whole list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfilePatch {
  #[serde(default, deserialize_with = "present")]
  pub full_name:        Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub bio:              Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub location:         Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub phone:            Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub linkedin_url:     Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub job_title:        Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub company:          Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub experience:       Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub education:        Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub salary_range:     Option<Option<String>>,
  #[serde(default)]
  pub skills:           Option<Vec<String>>,
  #[serde(default, deserialize_with = "present")]
  pub company_logo_url: Option<Option<String>>,
}

/// Marks a field as present, so `null` is told apart from a missing key.
fn present<'de, D, T>(de: D) -> std::result::Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  T::deserialize(de).map(Some)
}

fn overwrite(slot: &mut Option<String>, value: Option<Option<String>>) {
  if let Some(value) = value {
    *slot = value;
  }
}

impl ProfilePatch {
  /// Write the fields this patch carries into `draft`.
  pub fn apply(self, draft: &mut ProfileDraft) {
    overwrite(&mut draft.full_name, self.full_name);
    overwrite(&mut draft.bio, self.bio);
    overwrite(&mut draft.location, self.location);
    overwrite(&mut draft.phone, self.phone);
    overwrite(&mut draft.linkedin_url, self.linkedin_url);
    overwrite(&mut draft.job_title, self.job_title);
    overwrite(&mut draft.company, self.company);
    overwrite(&mut draft.experience, self.experience);
    overwrite(&mut draft.education, self.education);
    overwrite(&mut draft.salary_range, self.salary_range);
    overwrite(&mut draft.company_logo_url, self.company_logo_url);
    if let Some(skills) = self.skills {
      draft.skills = skills;
    }
  }
}

// ─── Editor operations ───────────────────────────────────────────────────────

/// Load the stored profile, or [`Profile::empty`] if there is none.
pub async fn load_profile<S: SwipeStore>(store: &S, id: Uuid) -> Result<Profile> {
  let profile = store.get_profile(id).await.map_err(Error::store)?;
  Ok(profile.unwrap_or_else(|| Profile::empty(id)))
}

/// Persist `draft` as the new mutable state of `id`'s profile.
///
/// Callers that hold a feed for `id` must rebuild it afterwards; skill overlap
/// depends on the viewer's own skills.
pub async fn save_profile<S: SwipeStore>(
  store: &S,
  id: Uuid,
  draft: ProfileDraft,
) -> Result<Profile> {
  store
    .update_profile(id, draft)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ProfileNotFound(id))
}

/// Raster image types accepted for avatars. Anything else, SVG included, is
/// refused since avatars are served from the API origin.
pub const AVATAR_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Storage path for an avatar: `<id>/avatar.<ext>`, with the extension taken
/// from the uploaded file name and lowercased. The extension must be one of
/// [`AVATAR_EXTENSIONS`].
pub fn avatar_path(id: Uuid, file_name: &str) -> Result<String> {
  let ext = file_name
    .rsplit_once('.')
    .map(|(_, ext)| ext.to_ascii_lowercase())
    .filter(|ext| AVATAR_EXTENSIONS.contains(&ext.as_str()))
    .ok_or_else(|| {
      Error::Validation(format!(
        "file name {file_name:?} must end in one of {}",
        AVATAR_EXTENSIONS.join(", ")
      ))
    })?;
  Ok(format!("{id}/avatar.{ext}"))
}

/// Store the avatar bytes (overwriting any previous upload at the same path)
/// and point the profile at the resulting public URL.
pub async fn upload_avatar<S, B>(
  store: &S,
  avatars: &B,
  id: Uuid,
  file_name: &str,
  bytes: Vec<u8>,
) -> Result<Profile>
where
  S: SwipeStore,
  B: AvatarStore,
{
  let path = avatar_path(id, file_name)?;
  avatars.put(path.clone(), bytes).await.map_err(Error::store)?;
  let url = avatars.public_url(&path);

  tracing::info!(%id, %url, "avatar uploaded");

  store
    .set_avatar_url(id, url)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ProfileNotFound(id))
}
