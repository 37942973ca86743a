//! Fixed-rate recognition loop.
//!
//! The sampler owns the open [`VideoDevice`] inside its task. Whatever ends
//! the task (a stop request, the feed running dry, the receiver going away)
//! drops the device and so releases the camera. [`Sampler::stop`] waits for
//! that to happen before it returns.

use std::{sync::Arc, time::Duration};

use tokio::{
  sync::mpsc,
  task::JoinHandle,
  time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
  camera::{Frame, VideoDevice},
  matcher::FaceMatcher,
};

/// Default interval between two captures.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Result of one sampling tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
  Frame(Frame),
  /// Capture or detection failed for this tick; sampling goes on.
  Failed(String),
}

/// A running sampler. Not restartable: stop it and start a new one.
pub struct Sampler {
  cancel: CancellationToken,
  task:   JoinHandle<()>,
}

impl Sampler {
  /// Start sampling `device` every `tick`, sending results to `samples`.
  ///
  /// The channel closes when the sampler ends.
  pub fn start<D>(
    device: D,
    matcher: Arc<FaceMatcher>,
    tick: Duration,
    samples: mpsc::Sender<Sample>,
  ) -> Self
  where
    D: VideoDevice,
  {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(device, matcher, tick, samples, cancel.clone()));
    Self { cancel, task }
  }

  /// Whether the sampling task has ended on its own.
  pub fn is_finished(&self) -> bool { self.task.is_finished() }

  /// Cancel the loop and wait until the device has been released.
  pub async fn stop(self) {
    self.cancel.cancel();
    if let Err(e) = self.task.await {
      tracing::error!(error = %e, "sampler task failed");
    }
  }
}

async fn run<D: VideoDevice>(
  mut device: D,
  matcher: Arc<FaceMatcher>,
  tick: Duration,
  samples: mpsc::Sender<Sample>,
  cancel: CancellationToken,
) {
  let mut interval = time::interval(tick);
  interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
  let mut seq = 0u64;

  loop {
    tokio::select! {
      biased;
      () = cancel.cancelled() => break,
      _ = interval.tick() => {}
    }

    let captured = tokio::select! {
      biased;
      () = cancel.cancelled() => break,
      captured = device.capture() => captured,
    };

    let sample = match captured {
      Ok(Some(detections)) => {
        seq += 1;
        let faces = detections.iter().map(|d| matcher.recognise(d)).collect();
        Sample::Frame(Frame { seq, faces })
      }
      Ok(None) => {
        tracing::info!(frames = seq, "camera feed ended");
        break;
      }
      Err(e) => {
        tracing::warn!(error = %e, "recognition failed");
        Sample::Failed(e.to_string())
      }
    };

    let sent = tokio::select! {
      biased;
      () = cancel.cancelled() => break,
      sent = samples.send(sample) => sent,
    };
    if sent.is_err() {
      tracing::debug!("sample receiver dropped");
      break;
    }
  }

  drop(device);
  tracing::debug!("camera released");
}
