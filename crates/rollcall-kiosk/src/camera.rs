//! Camera and face-detection seam.
//!
//! Face detection and descriptor extraction are external: a
//! [`VideoDevice`] yields, per captured frame, the faces it found as
//! [`Detection`]s. Identifying them is the matcher's job.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Bounding box of a face, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Region {
  pub x:      f32,
  pub y:      f32,
  pub width:  f32,
  pub height: f32,
}

/// A face found in a frame, before identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  pub descriptor: Vec<f32>,
  pub region:     Region,
}

/// An identified face. `label` is `"unknown"` when nothing matched.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
  pub label:      String,
  pub confidence: f32,
  pub region:     Region,
}

/// Everything recognised during one sampling tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
  pub seq:   u64,
  pub faces: Vec<Recognition>,
}

/// An open capture device. Dropping it releases the hardware.
pub trait VideoDevice: Send + 'static {
  /// Capture one frame and detect the faces in it.
  ///
  /// `Ok(None)` means the feed has ended for good.
  fn capture(&mut self) -> impl Future<Output = Result<Option<Vec<Detection>>>> + Send;
}

/// A source of [`VideoDevice`]s.
pub trait Camera: Send + Sync {
  type Device: VideoDevice;

  fn open(&self) -> impl Future<Output = Result<Self::Device>> + Send;
}
