//! One kiosk: power state, mode, debouncer and in-flight reports.
//!
//! Sessions share nothing. Each holds the roster snapshot it was built
//! with; subjects enrolled afterwards are not recognised until a new session
//! is built from a fresh roster.

use std::{sync::Arc, time::Duration};

use rollcall_core::attendance::{AttendanceIntent, Direction};
use tokio::{sync::mpsc, task::JoinSet, time::Instant};
use uuid::Uuid;

use crate::{
  Error, Result,
  camera::{Camera, Frame},
  debounce::{DEFAULT_COOLDOWN, Debouncer},
  matcher::FaceMatcher,
  notify::{Notifier, Toast},
  report::{Outcome, Reporter},
  sampler::{DEFAULT_TICK, Sample, Sampler},
};

/// Frames buffered between the sampler and the session loop.
const SAMPLE_BUFFER: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
  pub tick:     Duration,
  pub cooldown: Duration,
  pub mode:     Direction,
}

impl SessionSettings {
  /// Reject settings the sampler cannot run with.
  pub fn validate(&self) -> Result<()> {
    if self.tick.is_zero() {
      return Err(Error::ZeroTick);
    }
    Ok(())
  }
}

impl Default for SessionSettings {
  fn default() -> Self {
    Self { tick: DEFAULT_TICK, cooldown: DEFAULT_COOLDOWN, mode: Direction::In }
  }
}

/// Operator input while the kiosk runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
  ToggleMode,
  PowerOff,
}

/// Why [`KioskSession::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stopped {
  PoweredOff,
  FeedEnded,
}

/// A report that has come back.
#[derive(Debug)]
struct Resolved {
  label:   String,
  outcome: Outcome,
}

pub struct KioskSession<C, R, N> {
  id:        Uuid,
  camera:    C,
  reporter:  Arc<R>,
  notifier:  N,
  matcher:   Arc<FaceMatcher>,
  tick:      Duration,
  mode:      Direction,
  debouncer: Debouncer,
  sampler:   Option<Sampler>,
  reports:   JoinSet<Resolved>,
}

impl<C, R, N> KioskSession<C, R, N>
where
  C: Camera,
  R: Reporter,
  N: Notifier,
{
  pub fn new(
    camera: C,
    reporter: R,
    notifier: N,
    matcher: FaceMatcher,
    settings: SessionSettings,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      camera,
      reporter: Arc::new(reporter),
      notifier,
      matcher: Arc::new(matcher),
      tick: settings.tick,
      mode: settings.mode,
      debouncer: Debouncer::new(settings.cooldown),
      sampler: None,
      reports: JoinSet::new(),
    }
  }

  pub fn id(&self) -> Uuid { self.id }

  pub fn mode(&self) -> Direction { self.mode }

  pub fn is_powered(&self) -> bool { self.sampler.is_some() }

  /// Switch between check-in and check-out mode.
  pub fn toggle_mode(&mut self) -> Direction {
    self.mode = self.mode.toggled();
    tracing::info!(session = %self.id, mode = self.mode.as_str(), "mode changed");
    self.mode
  }

  /// Open the camera and start sampling. Frames arrive on the returned
  /// receiver until the sampler ends.
  pub async fn power_on(&mut self) -> Result<mpsc::Receiver<Sample>> {
    if self.sampler.is_some() {
      return Err(Error::AlreadyOn);
    }
    if self.tick.is_zero() {
      return Err(Error::ZeroTick);
    }
    let device = self.camera.open().await?;
    let (tx, rx) = mpsc::channel(SAMPLE_BUFFER);
    self.sampler = Some(Sampler::start(device, Arc::clone(&self.matcher), self.tick, tx));
    tracing::info!(session = %self.id, mode = self.mode.as_str(), "kiosk powered on");
    Ok(rx)
  }

  /// Stop sampling and release the camera. Returns once the camera is closed.
  pub async fn power_off(&mut self) {
    if let Some(sampler) = self.sampler.take() {
      sampler.stop().await;
      tracing::info!(session = %self.id, "kiosk powered off");
    }
  }

  /// Power on and process frames until powered off or the feed ends.
  ///
  /// Reports still in flight when the feed ends are awaited so their
  /// outcomes are shown; powering off abandons them.
  #[tracing::instrument(name = "kiosk", skip_all, fields(session = %self.id))]
  pub async fn run(&mut self, mut controls: mpsc::Receiver<Control>) -> Result<Stopped> {
    let mut samples = self.power_on().await?;

    let stopped = loop {
      tokio::select! {
        Some(control) = controls.recv() => match control {
          Control::ToggleMode => {
            self.toggle_mode();
          }
          Control::PowerOff => break Stopped::PoweredOff,
        },
        Some(joined) = self.reports.join_next() => match joined {
          Ok(resolved) => self.on_resolved(resolved, Instant::now()),
          Err(e) => tracing::error!(error = %e, "report task failed"),
        },
        sample = samples.recv() => match sample {
          Some(Sample::Frame(frame)) => self.on_frame(&frame, Instant::now()),
          Some(Sample::Failed(message)) => {
            self.notifier.notify(Toast::Failure(format!("recognition error: {message}")));
          }
          None => break Stopped::FeedEnded,
        },
      }
    };

    self.power_off().await;

    match stopped {
      Stopped::FeedEnded => {
        while let Some(joined) = self.reports.join_next().await {
          match joined {
            Ok(resolved) => self.on_resolved(resolved, Instant::now()),
            Err(e) => tracing::error!(error = %e, "report task failed"),
          }
        }
      }
      Stopped::PoweredOff => self.reports.abort_all(),
    }

    Ok(stopped)
  }

  /// Send an intent for every recognised face the debouncer lets through.
  pub fn on_frame(&mut self, frame: &Frame, now: Instant) {
    tracing::trace!(seq = frame.seq, faces = frame.faces.len(), "frame");

    for face in &frame.faces {
      if !self.debouncer.try_begin(&face.label, now) {
        continue;
      }
      tracing::debug!(
        name = %face.label,
        confidence = face.confidence,
        direction = self.mode.as_str(),
        "reporting"
      );

      let intent = AttendanceIntent { label: face.label.clone(), direction: self.mode };
      let reporter = Arc::clone(&self.reporter);
      self.reports.spawn(async move {
        let label = intent.label.clone();
        let outcome = reporter.report(intent).await;
        Resolved { label, outcome }
      });
    }
  }

  fn on_resolved(&mut self, resolved: Resolved, now: Instant) {
    let Resolved { label, outcome } = resolved;
    match outcome {
      Outcome::Adjudicated(reply) => {
        self.debouncer.settle(&label, now);
        let toast = if reply.success {
          Toast::Success(reply.message)
        } else {
          Toast::Rejected(reply.message)
        };
        self.notifier.notify(toast);
      }
      Outcome::TransportFailed(reason) => {
        self.debouncer.fail(&label);
        self.notifier.notify(Toast::Failure(format!("could not reach server: {reason}")));
      }
    }
  }
}
