//! Correspondence rejection strategies.
//!
//! The engine runs its rejectors in sequence on every iteration. The default
//! chain is:
//!
//! 1. [`DistanceRejector`]: drop pairs beyond a distance cutoff
//! 2. [`OverlapTrimRejector`]: keep the closest fraction of what remains
//! 3. [`OneToOneRejector`]: one source claim per target point

use std::collections::HashMap;

use super::{Correspondence, RegistrationConfig};

/// A single rejection step.
pub trait CorrespondenceRejector: Send + Sync {
    /// Filter a correspondence set.
    fn reject(&self, correspondences: Vec<Correspondence>) -> Vec<Correspondence>;

    /// Get the name of this rejector for diagnostics.
    fn name(&self) -> &'static str;
}

/// Drops correspondences farther apart than `max_distance`.
#[derive(Debug, Clone, Copy)]
pub struct DistanceRejector {
    max_distance: f64,
}

impl DistanceRejector {
    /// `max_distance <= 0` disables the cutoff.
    pub fn new(max_distance: f64) -> Self {
        Self { max_distance }
    }

    fn is_enabled(&self) -> bool {
        self.max_distance > 0.0
    }
}

impl CorrespondenceRejector for DistanceRejector {
    fn reject(&self, mut correspondences: Vec<Correspondence>) -> Vec<Correspondence> {
        if self.is_enabled() {
            let max_sq = self.max_distance * self.max_distance;
            correspondences.retain(|c| c.distance_sq <= max_sq);
        }
        correspondences
    }

    fn name(&self) -> &'static str {
        "DistanceRejector"
    }
}

/// Keeps the closest `floor(N * fraction)` correspondences.
///
/// Emulates a known partial overlap: the rest is treated as geometry with no
/// counterpart in the other cloud. Output is sorted by ascending distance.
#[derive(Debug, Clone, Copy)]
pub struct OverlapTrimRejector {
    fraction: f64,
}

impl OverlapTrimRejector {
    /// `fraction` is clamped to [0, 1].
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
        }
    }
}

impl CorrespondenceRejector for OverlapTrimRejector {
    fn reject(&self, mut correspondences: Vec<Correspondence>) -> Vec<Correspondence> {
        let keep = (correspondences.len() as f64 * self.fraction).floor() as usize;
        correspondences.sort_by(|a, b| a.distance_sq.total_cmp(&b.distance_sq));
        correspondences.truncate(keep);
        correspondences
    }

    fn name(&self) -> &'static str {
        "OverlapTrimRejector"
    }
}

/// Keeps only the closest claim on each target point.
///
/// Ties go to the earlier correspondence. Survivors keep their input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneToOneRejector;

impl CorrespondenceRejector for OneToOneRejector {
    fn reject(&self, correspondences: Vec<Correspondence>) -> Vec<Correspondence> {
        let mut best: HashMap<usize, usize> = HashMap::with_capacity(correspondences.len());
        for (pos, c) in correspondences.iter().enumerate() {
            best.entry(c.target_index)
                .and_modify(|winner| {
                    if c.distance_sq < correspondences[*winner].distance_sq {
                        *winner = pos;
                    }
                })
                .or_insert(pos);
        }

        correspondences
            .iter()
            .enumerate()
            .filter(|(pos, c)| best.get(&c.target_index) == Some(pos))
            .map(|(_, c)| *c)
            .collect()
    }

    fn name(&self) -> &'static str {
        "OneToOneRejector"
    }
}

/// Rejector chain for a configuration, in application order.
pub fn default_rejectors(config: &RegistrationConfig) -> Vec<Box<dyn CorrespondenceRejector>> {
    let mut chain: Vec<Box<dyn CorrespondenceRejector>> = Vec::with_capacity(3);
    if config.max_correspondence_distance > 0.0 {
        chain.push(Box::new(DistanceRejector::new(
            config.max_correspondence_distance,
        )));
    }
    if let Some(fraction) = config.overlap_fraction {
        chain.push(Box::new(OverlapTrimRejector::new(fraction)));
    }
    if config.one_to_one {
        chain.push(Box::new(OneToOneRejector));
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ladder(n: usize) -> Vec<Correspondence> {
        // Distances deliberately out of order
        (0..n)
            .map(|i| Correspondence::new(i, i, ((i * 7) % n) as f64))
            .collect()
    }

    #[test]
    fn test_distance_cutoff() {
        let rejector = DistanceRejector::new(2.0);
        let kept = rejector.reject(ladder(10));

        assert!(kept.iter().all(|c| c.distance_sq <= 4.0));
        assert_eq!(kept.len(), 5); // 0, 1, 2, 3, 4
    }

    #[test]
    fn test_distance_cutoff_disabled() {
        assert_eq!(DistanceRejector::new(0.0).reject(ladder(10)).len(), 10);
        assert_eq!(DistanceRejector::new(-1.0).reject(ladder(10)).len(), 10);
    }

    #[test]
    fn test_overlap_half_keeps_closest_half() {
        let kept = OverlapTrimRejector::new(0.5).reject(ladder(11));

        assert_eq!(kept.len(), 5);
        let distances: Vec<f64> = kept.iter().map(|c| c.distance_sq).collect();
        assert_eq!(distances, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_overlap_full_keeps_everything() {
        assert_eq!(OverlapTrimRejector::new(1.0).reject(ladder(9)).len(), 9);
        assert!(OverlapTrimRejector::new(0.5).reject(Vec::new()).is_empty());
    }

    #[test]
    fn test_one_to_one_unique_targets() {
        let correspondences = vec![
            Correspondence::new(0, 3, 4.0),
            Correspondence::new(1, 3, 1.0),
            Correspondence::new(2, 5, 2.0),
            Correspondence::new(3, 3, 9.0),
            Correspondence::new(4, 5, 2.0),
            Correspondence::new(5, 7, 0.5),
        ];
        let kept = OneToOneRejector.reject(correspondences);

        let targets: HashSet<usize> = kept.iter().map(|c| c.target_index).collect();
        assert_eq!(targets.len(), kept.len());
        assert_eq!(
            kept.iter().map(|c| c.source_index).collect::<Vec<_>>(),
            vec![1, 2, 5]
        );
    }

    #[test]
    fn test_default_chain_order() {
        let config = RegistrationConfig {
            max_correspondence_distance: 5.0,
            overlap_fraction: Some(0.8),
            one_to_one: true,
            ..Default::default()
        };
        let names: Vec<&str> = default_rejectors(&config).iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec!["DistanceRejector", "OverlapTrimRejector", "OneToOneRejector"]
        );

        let bare = RegistrationConfig {
            one_to_one: false,
            ..Default::default()
        };
        assert!(default_rejectors(&bare).is_empty());
    }
}
