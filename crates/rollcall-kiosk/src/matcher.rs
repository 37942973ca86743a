//! Descriptor matching against a roster snapshot.

use std::collections::HashMap;

use rollcall_core::subject::{RosterEntry, UNKNOWN_LABEL};

use crate::camera::{Detection, Recognition};

/// Reference descriptors per label, as produced by the external recognizer
/// from enrollment photos.
pub type DescriptorSet = HashMap<String, Vec<Vec<f32>>>;

/// Distance at or beyond which a face is reported as unknown.
pub const DEFAULT_THRESHOLD: f32 = 0.6;

/// One roster member's reference descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDescriptors {
  pub label:       String,
  pub descriptors: Vec<Vec<f32>>,
}

/// Best roster match for a single descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
  pub label:    String,
  pub distance: f32,
}

/// Nearest-neighbour matcher over a fixed roster snapshot.
///
/// A label's distance is the mean Euclidean distance to each of its
/// reference descriptors. Members without descriptors stay on the roster but
/// are never matched.
#[derive(Debug, Clone)]
pub struct FaceMatcher {
  subjects:  Vec<LabeledDescriptors>,
  threshold: f32,
}

impl FaceMatcher {
  pub fn new(subjects: Vec<LabeledDescriptors>, threshold: f32) -> Self {
    Self { subjects, threshold }
  }

  /// Build a snapshot of `roster`, taking descriptors from `descriptors`.
  ///
  /// Labels present in `descriptors` but absent from the roster are ignored.
  pub fn from_roster(
    roster: &[RosterEntry],
    descriptors: &DescriptorSet,
    threshold: f32,
  ) -> Self {
    let subjects = roster
      .iter()
      .map(|entry| LabeledDescriptors {
        label:       entry.username.clone(),
        descriptors: descriptors.get(&entry.username).cloned().unwrap_or_default(),
      })
      .collect();
    Self::new(subjects, threshold)
  }

  /// Number of roster members that can actually be recognised.
  pub fn recognisable(&self) -> usize {
    self.subjects.iter().filter(|s| !s.descriptors.is_empty()).count()
  }

  pub fn best_match(&self, descriptor: &[f32]) -> BestMatch {
    let best = self
      .subjects
      .iter()
      .filter_map(|s| mean_distance(&s.descriptors, descriptor).map(|d| (s, d)))
      .min_by(|(_, a), (_, b)| a.total_cmp(b));

    match best {
      Some((subject, distance)) if distance < self.threshold => BestMatch {
        label: subject.label.clone(),
        distance,
      },
      Some((_, distance)) => BestMatch { label: UNKNOWN_LABEL.to_string(), distance },
      None => BestMatch { label: UNKNOWN_LABEL.to_string(), distance: f32::INFINITY },
    }
  }

  pub fn recognise(&self, detection: &Detection) -> Recognition {
    let BestMatch { label, distance } = self.best_match(&detection.descriptor);
    Recognition {
      label,
      confidence: (1.0 - distance).clamp(0.0, 1.0),
      region: detection.region,
    }
  }
}

fn mean_distance(references: &[Vec<f32>], query: &[f32]) -> Option<f32> {
  let distances: Vec<f32> = references
    .iter()
    .filter(|r| r.len() == query.len())
    .map(|r| euclidean(r, query))
    .collect();
  if distances.is_empty() {
    None
  } else {
    Some(distances.iter().sum::<f32>() / distances.len() as f32)
  }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
  a.iter()
    .zip(b)
    .map(|(x, y)| (x - y) * (x - y))
    .sum::<f32>()
    .sqrt()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::camera::Region;

  fn matcher() -> FaceMatcher {
    FaceMatcher::new(
      vec![
        LabeledDescriptors { label: "Kim".into(), descriptors: vec![vec![0.0, 0.0]] },
        LabeledDescriptors { label: "Lee".into(), descriptors: vec![vec![1.0, 1.0]] },
        LabeledDescriptors { label: "Park".into(), descriptors: vec![] },
      ],
      DEFAULT_THRESHOLD,
    )
  }

  #[test]
  fn nearest_label_within_threshold() {
    let m = matcher().best_match(&[0.1, 0.0]);
    assert_eq!(m.label, "Kim");
    assert!((m.distance - 0.1).abs() < 1e-6);

    assert_eq!(matcher().best_match(&[0.9, 1.0]).label, "Lee");
  }

  #[test]
  fn beyond_threshold_is_unknown() {
    assert_eq!(matcher().best_match(&[0.5, 0.5]).label, UNKNOWN_LABEL);

    // Exactly at the threshold does not match.
    let strict = FaceMatcher::new(
      vec![LabeledDescriptors { label: "Kim".into(), descriptors: vec![vec![0.0, 0.0]] }],
      0.5,
    );
    assert_eq!(strict.best_match(&[0.5, 0.0]).label, UNKNOWN_LABEL);
  }

  #[test]
  fn empty_roster_matches_nothing() {
    let m = FaceMatcher::new(vec![], DEFAULT_THRESHOLD).best_match(&[0.0, 0.0]);
    assert_eq!(m.label, UNKNOWN_LABEL);
  }

  #[test]
  fn mean_over_several_references() {
    let m = FaceMatcher::new(
      vec![LabeledDescriptors {
        label:       "Kim".into(),
        descriptors: vec![vec![0.0, 0.0], vec![0.4, 0.0]],
      }],
      DEFAULT_THRESHOLD,
    );
    let best = m.best_match(&[0.0, 0.0]);
    assert_eq!(best.label, "Kim");
    assert!((best.distance - 0.2).abs() < 1e-6);
  }

  #[test]
  fn confidence_is_clamped() {
    let d = Detection { descriptor: vec![0.0, 0.0], region: Region::default() };
    let r = matcher().recognise(&d);
    assert_eq!(r.label, "Kim");
    assert_eq!(r.confidence, 1.0);

    let far = Detection { descriptor: vec![9.0, 9.0], region: Region::default() };
    assert_eq!(matcher().recognise(&far).confidence, 0.0);
  }

  #[test]
  fn roster_without_descriptors_is_not_recognisable() {
    let roster = vec![
      RosterEntry { id: 1, username: "Kim".into(), department: None },
      RosterEntry { id: 2, username: "Lee".into(), department: None },
    ];
    let mut set = DescriptorSet::new();
    set.insert("Kim".into(), vec![vec![0.0, 0.0]]);
    set.insert("Ghost".into(), vec![vec![0.5, 0.5]]);

    let m = FaceMatcher::from_roster(&roster, &set, DEFAULT_THRESHOLD);
    assert_eq!(m.recognisable(), 1);
    assert_eq!(m.best_match(&[0.5, 0.5]).label, UNKNOWN_LABEL);
  }
}
