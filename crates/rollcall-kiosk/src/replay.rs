//! File-backed stand-ins for the camera and the enrollment recognizer.
//!
//! A frames file is JSON lines, one frame per line, each an array of
//! `{"descriptor": [..], "region": {"x", "y", "width", "height"}}`. A blank
//! line is a frame with nobody in view.
//!
//! A descriptors file is a JSON object mapping label to a list of
//! descriptors.

use std::path::{Path, PathBuf};

use tokio::{
  fs::File,
  io::{AsyncBufReadExt, BufReader, Lines},
};

use crate::{
  Error, Result,
  camera::{Camera, Detection, VideoDevice},
  matcher::DescriptorSet,
};

/// Opens a frames file as a camera feed.
#[derive(Debug, Clone)]
pub struct ReplayCamera {
  path: PathBuf,
}

impl ReplayCamera {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl Camera for ReplayCamera {
  type Device = ReplayDevice;

  async fn open(&self) -> Result<ReplayDevice> {
    let file = File::open(&self.path).await.map_err(|e| {
      Error::Camera(format!("cannot open {}: {e}", self.path.display()))
    })?;
    tracing::debug!(path = %self.path.display(), "replay feed opened");
    Ok(ReplayDevice { lines: BufReader::new(file).lines(), line: 0 })
  }
}

/// An open frames file.
pub struct ReplayDevice {
  lines: Lines<BufReader<File>>,
  line:  usize,
}

impl VideoDevice for ReplayDevice {
  async fn capture(&mut self) -> Result<Option<Vec<Detection>>> {
    let Some(text) = self.lines.next_line().await? else {
      return Ok(None);
    };
    self.line += 1;

    if text.trim().is_empty() {
      return Ok(Some(Vec::new()));
    }
    serde_json::from_str(&text)
      .map(Some)
      .map_err(|source| Error::Decode { line: self.line, source })
  }
}

/// Load a descriptors file.
pub async fn load_descriptors(path: &Path) -> Result<DescriptorSet> {
  let raw = tokio::fs::read(path).await?;
  Ok(serde_json::from_slice(&raw)?)
}
