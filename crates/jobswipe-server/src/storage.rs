//! Avatar bucket on the local filesystem.

use std::path::{Path, PathBuf};

use jobswipe_core::store::AvatarStore;
use uuid::Uuid;

/// Stores objects under `root`, served back at `{public_base_url}/avatars/`.
#[derive(Debug, Clone)]
pub struct FsAvatarStore {
  root:            PathBuf,
  public_base_url: String,
}

impl FsAvatarStore {
  pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
    Self {
      root:            root.into(),
      public_base_url: public_base_url.trim_end_matches('/').to_owned(),
    }
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Read back `<owner>/<file>`. `None` if it does not exist or `file` is not
  /// a plain file name.
  pub async fn read(&self, owner: Uuid, file: &str) -> std::io::Result<Option<Vec<u8>>> {
    if !is_plain_file_name(file) {
      return Ok(None);
    }
    match tokio::fs::read(self.root.join(owner.to_string()).join(file)).await {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e),
    }
  }
}

fn is_plain_file_name(name: &str) -> bool {
  !name.is_empty()
    && !name.starts_with('.')
    && name
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// `Content-Type` for a stored avatar, by extension. Only raster types are
/// named; anything else is served as opaque bytes.
pub fn content_type(file: &str) -> &'static str {
  let ext = file
    .rsplit_once('.')
    .map(|(_, ext)| ext.to_ascii_lowercase())
    .unwrap_or_default();
  match ext.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    _ => "application/octet-stream",
  }
}

impl AvatarStore for FsAvatarStore {
  type Error = std::io::Error;

  async fn put(&self, path: String, bytes: Vec<u8>) -> std::io::Result<()> {
    let target = self.root.join(&path);
    if let Some(dir) = target.parent() {
      tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&target, bytes).await
  }

  fn public_url(&self, path: &str) -> String {
    format!("{}/avatars/{path}", self.public_base_url)
  }
}
