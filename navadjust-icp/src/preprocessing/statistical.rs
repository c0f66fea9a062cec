//! Statistical outlier removal for bathymetry clouds.
//!
//! Removes isolated soundings (fish, bubbles, side-lobe returns) whose
//! neighbourhood is much sparser than the cloud average.

use serde::{Deserialize, Serialize};

use crate::core::spatial::NeighborIndex;
use crate::core::types::PointCloud;

/// Configuration for statistical outlier removal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalOutlierConfig {
    /// Apply the filter at all.
    ///
    /// Default: true
    pub enabled: bool,

    /// Number of nearest neighbours (excluding the point itself) averaged per point.
    ///
    /// Capped at `n - 1` for small clouds.
    /// Default: 20
    pub neighbor_count: usize,

    /// Points whose mean neighbour distance exceeds `mean + multiplier * std_dev`
    /// are removed.
    ///
    /// Default: 2.0
    pub std_dev_multiplier: f64,
}

impl Default for StatisticalOutlierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            neighbor_count: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

/// Statistical outlier filter.
///
/// For each point the mean Euclidean distance to its k nearest neighbours is
/// computed. Points above `μ + m·σ` of those means are dropped, where σ is the
/// sample standard deviation. Clouds with fewer than two points pass through
/// unchanged, as does everything when the filter is disabled.
#[derive(Debug, Clone)]
pub struct StatisticalOutlierFilter {
    config: StatisticalOutlierConfig,
}

impl StatisticalOutlierFilter {
    /// Create a new filter with the given configuration.
    pub fn new(config: StatisticalOutlierConfig) -> Self {
        Self { config }
    }

    /// Filter configuration.
    pub fn config(&self) -> &StatisticalOutlierConfig {
        &self.config
    }

    /// Mean distance from each point to its k nearest neighbours.
    fn mean_neighbor_distances(&self, cloud: &PointCloud, index: &NeighborIndex) -> Vec<f64> {
        let k = self.config.neighbor_count.min(cloud.len() - 1);

        cloud
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut sum = 0.0;
                let mut used = 0usize;
                for hit in index.nearest_n(p, k + 1) {
                    if hit.index == i || used == k {
                        continue;
                    }
                    sum += hit.distance_sq.sqrt();
                    used += 1;
                }
                if used == 0 { 0.0 } else { sum / used as f64 }
            })
            .collect()
    }

    /// Apply outlier removal, returning the surviving points in input order.
    pub fn apply(&self, cloud: &PointCloud) -> PointCloud {
        if !self.config.enabled || self.config.neighbor_count == 0 || cloud.len() < 2 {
            return cloud.clone();
        }
        let Some(index) = NeighborIndex::build(cloud) else {
            return cloud.clone();
        };

        let means = self.mean_neighbor_distances(cloud, &index);
        let n = means.len() as f64;
        let mu = means.iter().sum::<f64>() / n;
        let variance = means.iter().map(|d| (d - mu) * (d - mu)).sum::<f64>() / (n - 1.0);
        let threshold = mu + self.config.std_dev_multiplier * variance.sqrt();

        let points = cloud
            .iter()
            .zip(means.iter())
            .filter(|&(_, &d)| d <= threshold)
            .map(|(p, _)| *p)
            .collect();

        let filtered = PointCloud::from_points(points);
        log::trace!(
            "Outlier removal: {} -> {} points (threshold {:.3} m)",
            cloud.len(),
            filtered.len(),
            threshold
        );
        filtered
    }
}

impl Default for StatisticalOutlierFilter {
    fn default() -> Self {
        Self::new(StatisticalOutlierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn seafloor_patch(size: usize) -> PointCloud {
        let mut rng = StdRng::seed_from_u64(7);
        let mut cloud = PointCloud::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                cloud.push_xyz(
                    i as f64 + rng.random_range(-0.05..0.05),
                    j as f64 + rng.random_range(-0.05..0.05),
                    -40.0 + rng.random_range(-0.05..0.05),
                );
            }
        }
        cloud
    }

    #[test]
    fn test_removes_isolated_spike() {
        let mut cloud = seafloor_patch(20);
        cloud.push_xyz(10.0, 10.0, 0.0);
        let filter = StatisticalOutlierFilter::default();

        let result = filter.apply(&cloud);

        assert!(result.len() < cloud.len());
        assert!(result.iter().all(|p| p.z < -30.0));
    }

    #[test]
    fn test_keeps_most_of_uniform_patch() {
        let cloud = seafloor_patch(20);
        let result = StatisticalOutlierFilter::default().apply(&cloud);

        assert!(result.len() as f64 > 0.9 * cloud.len() as f64);
    }

    #[test]
    fn test_disabled_is_passthrough() {
        let mut cloud = seafloor_patch(5);
        cloud.push_xyz(2.0, 2.0, 100.0);
        let filter = StatisticalOutlierFilter::new(StatisticalOutlierConfig {
            enabled: false,
            ..Default::default()
        });

        assert_eq!(filter.apply(&cloud), cloud);
    }

    #[test]
    fn test_tiny_clouds_unchanged() {
        let filter = StatisticalOutlierFilter::default();
        assert!(filter.apply(&PointCloud::new()).is_empty());

        let mut single = PointCloud::new();
        single.push_xyz(1.0, 1.0, 1.0);
        assert_eq!(filter.apply(&single).len(), 1);
    }

    #[test]
    fn test_neighbor_count_capped_for_small_clouds() {
        // k = 20 on 4 points degrades to k = 3
        let mut cloud = PointCloud::new();
        cloud.push_xyz(0.0, 0.0, 0.0);
        cloud.push_xyz(1.0, 0.0, 0.0);
        cloud.push_xyz(0.0, 1.0, 0.0);
        cloud.push_xyz(1.0, 1.0, 0.0);

        let result = StatisticalOutlierFilter::default().apply(&cloud);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_filter_trait_name() {
        use crate::preprocessing::CloudFilter;
        let filter = StatisticalOutlierFilter::default();
        assert_eq!(filter.name(), "StatisticalOutlierFilter");
    }
}
