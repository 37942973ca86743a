//! Reference photos on disk, one `{label}.jpg` per enrolled subject.

use std::{io, path::PathBuf};

use bytes::Bytes;
use rollcall_core::subject::validate_label;

/// Directory of enrollment photos, served read-only under `/images`.
#[derive(Debug, Clone)]
pub struct PhotoStore {
  dir: PathBuf,
}

impl PhotoStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

  pub fn dir(&self) -> &std::path::Path { &self.dir }

  /// File path of the photo for `label`.
  pub fn path_for(&self, label: &str) -> io::Result<PathBuf> {
    let label = validate_label(label)
      .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    Ok(self.dir.join(format!("{label}.jpg")))
  }

  /// Write (or overwrite) the photo for `label`.
  pub async fn save(&self, label: &str, photo: Bytes) -> io::Result<()> {
    let path = self.path_for(label)?;
    tokio::fs::create_dir_all(&self.dir).await?;
    tokio::fs::write(path, &photo).await
  }

  /// Remove the photo for `label`. Best-effort: failures are logged only.
  pub async fn remove(&self, label: &str) {
    let result = match self.path_for(label) {
      Ok(path) => tokio::fs::remove_file(path).await,
      Err(e) => Err(e),
    };
    match result {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => tracing::warn!(%label, error = %e, "failed to remove photo"),
    }
  }
}
