//! Nearest-neighbour index over a point cloud.
//!
//! Built once per cloud and dropped with it. Backed by an immutable k-d tree
//! over the distinct coordinates of the cloud. Exact duplicates (stacked
//! soundings from a stationary platform) share one tree entry and are
//! expanded back to their original indices at query time, since a bucket
//! cannot be split when more points than it holds are identical.

use std::collections::HashMap;

use kiddo::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use nalgebra::Point3;

use super::types::PointCloud;

const BUCKET_SIZE: usize = 256;

/// Nearest neighbour hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index into the indexed cloud
    pub index: usize,
    /// Squared Euclidean distance to the query
    pub distance_sq: f64,
}

/// K-d tree over the points of one cloud.
///
/// Indices returned by queries refer to positions in the cloud the index was
/// built from. The cloud must be finite; NaN coordinates corrupt the tree.
pub struct NeighborIndex {
    tree: ImmutableKdTree<f64, u64, 3, BUCKET_SIZE>,
    /// Original indices per distinct coordinate, in input order
    groups: Vec<Vec<usize>>,
    len: usize,
}

/// Bit pattern of a coordinate, with -0.0 folded onto 0.0.
fn coordinate_key(row: &[f64; 3]) -> [u64; 3] {
    row.map(|v| (v + 0.0).to_bits())
}

impl NeighborIndex {
    /// Build an index, or `None` for an empty cloud.
    pub fn build(cloud: &PointCloud) -> Option<Self> {
        if cloud.is_empty() {
            return None;
        }
        let rows = cloud.to_rows();

        let mut slots: HashMap<[u64; 3], usize> = HashMap::with_capacity(rows.len());
        let mut distinct: Vec<[f64; 3]> = Vec::with_capacity(rows.len());
        let mut groups: Vec<Vec<usize>> = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let slot = *slots.entry(coordinate_key(row)).or_insert_with(|| {
                distinct.push(*row);
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(i);
        }
        if distinct.len() < rows.len() {
            log::trace!(
                "Neighbour index: {} points, {} distinct",
                rows.len(),
                distinct.len()
            );
        }

        let tree: ImmutableKdTree<f64, u64, 3, BUCKET_SIZE> = (&*distinct).into();
        Some(Self {
            tree,
            groups,
            len: rows.len(),
        })
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; empty clouds are never indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct coordinates.
    pub fn distinct_len(&self) -> usize {
        self.groups.len()
    }

    /// Closest indexed point to `query`.
    ///
    /// Among identical points the first in input order wins.
    pub fn nearest(&self, query: &Point3<f64>) -> Neighbor {
        let hit = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[query.x, query.y, query.z]);
        Neighbor {
            index: self.groups[hit.item as usize][0],
            distance_sq: hit.distance,
        }
    }

    /// Up to `count` closest indexed points, nearest first.
    ///
    /// Identical points are all reported, each with its own index.
    pub fn nearest_n(&self, query: &Point3<f64>, count: usize) -> Vec<Neighbor> {
        if count == 0 {
            return Vec::new();
        }
        let slots = count.min(self.groups.len());
        let mut out = Vec::with_capacity(count);
        for hit in self
            .tree
            .nearest_n::<SquaredEuclidean>(&[query.x, query.y, query.z], slots)
        {
            for &index in &self.groups[hit.item as usize] {
                if out.len() == count {
                    return out;
                }
                out.push(Neighbor {
                    index,
                    distance_sq: hit.distance,
                });
            }
        }
        out
    }
}

impl std::fmt::Debug for NeighborIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeighborIndex")
            .field("len", &self.len)
            .field("distinct", &self.groups.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line_cloud() -> PointCloud {
        let mut cloud = PointCloud::new();
        for i in 0..10 {
            cloud.push_xyz(i as f64, 0.001 * (i % 3) as f64, 0.0);
        }
        cloud
    }

    #[test]
    fn test_empty_cloud_not_indexed() {
        assert!(NeighborIndex::build(&PointCloud::new()).is_none());
    }

    #[test]
    fn test_nearest() {
        let index = NeighborIndex::build(&line_cloud()).unwrap();
        assert_eq!(index.len(), 10);

        let hit = index.nearest(&Point3::new(4.2, 0.0, 0.0));
        assert_eq!(hit.index, 4);
        assert!(hit.distance_sq < 0.05);
    }

    #[test]
    fn test_nearest_n_sorted() {
        let index = NeighborIndex::build(&line_cloud()).unwrap();
        let hits = index.nearest_n(&Point3::new(5.0, 0.0, 0.0), 3);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].index, 5);
        assert!(hits[0].distance_sq <= hits[1].distance_sq);
        assert!(hits[1].distance_sq <= hits[2].distance_sq);
        assert_relative_eq!(hits[0].distance_sq, 4e-6, epsilon = 1e-12);
    }

    #[test]
    fn test_repeated_coordinates() {
        // Flat patch, every z identical
        let mut cloud = PointCloud::new();
        for i in 0..40 {
            for j in 0..40 {
                cloud.push_xyz(i as f64, j as f64, -50.0);
            }
        }
        let index = NeighborIndex::build(&cloud).unwrap();
        let hit = index.nearest(&Point3::new(10.1, 20.1, -50.0));
        assert_eq!(hit.index, 10 * 40 + 20);
    }

    #[test]
    fn test_stacked_duplicates() {
        // One sounding repeated well past a bucket, plus a small grid
        let mut cloud = PointCloud::new();
        for _ in 0..1000 {
            cloud.push_xyz(1.0, 2.0, -30.0);
        }
        for i in 0..50 {
            cloud.push_xyz(10.0 + i as f64, 5.0, -30.0);
        }
        let index = NeighborIndex::build(&cloud).unwrap();
        assert_eq!(index.len(), 1050);
        assert_eq!(index.distinct_len(), 51);

        let hit = index.nearest(&Point3::new(1.1, 2.0, -30.0));
        assert_eq!(hit.index, 0);
        assert_relative_eq!(hit.distance_sq, 0.01, epsilon = 1e-9);

        let hit = index.nearest(&Point3::new(20.0, 5.0, -30.0));
        assert_eq!(hit.index, 1010);
    }

    #[test]
    fn test_nearest_n_expands_duplicates() {
        let mut cloud = PointCloud::new();
        for _ in 0..300 {
            cloud.push_xyz(0.0, 0.0, -10.0);
        }
        cloud.push_xyz(5.0, 0.0, -10.0);
        let index = NeighborIndex::build(&cloud).unwrap();

        let hits = index.nearest_n(&Point3::new(0.0, 0.0, -10.0), 21);
        assert_eq!(hits.len(), 21);
        assert!(hits.iter().all(|h| h.distance_sq == 0.0));
        let mut indices: Vec<usize> = hits.iter().map(|h| h.index).collect();
        indices.dedup();
        assert_eq!(indices.len(), 21);

        // More than the stack: the remaining point comes last
        let hits = index.nearest_n(&Point3::new(0.0, 0.0, -10.0), 301);
        assert_eq!(hits.len(), 301);
        assert_eq!(hits[300].index, 300);
        assert_relative_eq!(hits[300].distance_sq, 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_signed_zero_is_one_coordinate() {
        let mut cloud = PointCloud::new();
        cloud.push_xyz(0.0, 0.0, 0.0);
        cloud.push_xyz(-0.0, 0.0, 0.0);
        let index = NeighborIndex::build(&cloud).unwrap();
        assert_eq!(index.distinct_len(), 1);
        assert_eq!(index.nearest_n(&Point3::origin(), 5).len(), 2);
    }
}
