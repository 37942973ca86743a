//! Per-label gate between the recognition stream and the network.
//!
//! A label passes at most once until its report resolves. A transport
//! failure reopens the gate at once; an adjudicated reply, successful or
//! not, keeps it shut for the cooldown window.

use std::{collections::HashMap, time::Duration};

use rollcall_core::subject::UNKNOWN_LABEL;
use tokio::time::Instant;

/// Default cooldown after an adjudicated reply.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
  InFlight,
  CoolingDown { until: Instant },
}

#[derive(Debug)]
pub struct Debouncer {
  cooldown: Duration,
  gates:    HashMap<String, Gate>,
}

impl Debouncer {
  pub fn new(cooldown: Duration) -> Self { Self { cooldown, gates: HashMap::new() } }

  /// Returns `true` if an intent for `label` should be sent now, and marks
  /// the label in flight. `"unknown"` never passes.
  pub fn try_begin(&mut self, label: &str, now: Instant) -> bool {
    if label == UNKNOWN_LABEL {
      return false;
    }
    match self.gates.get(label) {
      Some(Gate::InFlight) => false,
      Some(Gate::CoolingDown { until }) if now < *until => false,
      _ => {
        self.gates.insert(label.to_string(), Gate::InFlight);
        true
      }
    }
  }

  /// The report for `label` never reached a verdict; allow an immediate retry.
  pub fn fail(&mut self, label: &str) { self.gates.remove(label); }

  /// The server adjudicated `label`'s report; hold it for the cooldown.
  pub fn settle(&mut self, label: &str, now: Instant) {
    self
      .gates
      .retain(|_, gate| !matches!(gate, Gate::CoolingDown { until } if *until <= now));
    self
      .gates
      .insert(label.to_string(), Gate::CoolingDown { until: now + self.cooldown });
  }
}

impl Default for Debouncer {
  fn default() -> Self { Self::new(DEFAULT_COOLDOWN) }
}
