use serde::{Deserialize, Serialize};
use tracing::warn;

use super::encodings::EncodingStore;
use crate::attendance::{Identity, Label};

/// Default Euclidean distance under which two encodings are the same person
pub const DEFAULT_TOLERANCE: f32 = 0.6;

/// Which stored encoding wins when several are within tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// First stored encoding within tolerance, in store order
    FirstMatch,
    /// Nearest stored encoding within tolerance
    #[default]
    ClosestMatch,
}

/// Result of comparing one probe encoding against the store
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMatch {
    pub label: Label,
    /// Distance to the chosen encoding, if any was within tolerance
    pub distance: Option<f32>,
}

/// Compares face encodings against an `EncodingStore`
#[derive(Debug, Clone)]
pub struct FaceMatcher {
    pub tolerance: f32,
    pub policy: MatchPolicy,
}

impl Default for FaceMatcher {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            policy: MatchPolicy::default(),
        }
    }
}

impl FaceMatcher {
    pub fn new(tolerance: f32, policy: MatchPolicy) -> Self {
        Self { tolerance, policy }
    }

    pub fn identify(&self, store: &EncodingStore, probe: &[f32]) -> FaceMatch {
        if let Some(dim) = store.dimension() {
            if dim != probe.len() {
                warn!(
                    "Probe encoding has {} values, store expects {}",
                    probe.len(),
                    dim
                );
                return FaceMatch {
                    label: Label::Unknown,
                    distance: None,
                };
            }
        }

        let mut candidates = store
            .iter()
            .map(|(name, encoding)| (name, euclidean_distance(encoding, probe)))
            .filter(|(_, distance)| *distance <= self.tolerance);

        let best = match self.policy {
            MatchPolicy::FirstMatch => candidates.next(),
            MatchPolicy::ClosestMatch => {
                candidates.min_by(|a, b| a.1.total_cmp(&b.1))
            }
        };

        match best {
            Some((name, distance)) => FaceMatch {
                label: Identity::new(name)
                    .map(Label::Known)
                    .unwrap_or(Label::Unknown),
                distance: Some(distance),
            },
            None => FaceMatch {
                label: Label::Unknown,
                distance: None,
            },
        }
    }
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> EncodingStore {
        // "far" is within tolerance but further than "near"
        EncodingStore::from_parts(
            vec!["far".into(), "near".into(), "other".into()],
            vec![vec![0.5, 0.0], vec![0.1, 0.0], vec![5.0, 5.0]],
        )
        .unwrap()
    }

    #[test]
    fn closest_match_picks_nearest() {
        let matcher = FaceMatcher::new(0.6, MatchPolicy::ClosestMatch);
        let result = matcher.identify(&store(), &[0.0, 0.0]);

        assert_eq!(result.label, Label::Known(Identity::new("near").unwrap()));
        assert!((result.distance.unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn first_match_picks_store_order() {
        let matcher = FaceMatcher::new(0.6, MatchPolicy::FirstMatch);
        let result = matcher.identify(&store(), &[0.0, 0.0]);

        assert_eq!(result.label, Label::Known(Identity::new("far").unwrap()));
    }

    #[test]
    fn nothing_within_tolerance_is_unknown() {
        let matcher = FaceMatcher::default();
        let result = matcher.identify(&store(), &[-3.0, -3.0]);

        assert_eq!(result.label, Label::Unknown);
        assert_eq!(result.distance, None);
    }

    #[test]
    fn dimension_mismatch_is_unknown() {
        let matcher = FaceMatcher::default();
        let result = matcher.identify(&store(), &[0.1, 0.0, 0.0]);

        assert_eq!(result.label, Label::Unknown);
    }
}
