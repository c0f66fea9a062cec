//! Point cloud preprocessing filters.
//!
//! Cleans sampled clouds before registration:
//!
//! - [`drop_invalid`]: Removes soundings whose beam flag is unset
//! - [`StatisticalOutlierFilter`]: Removes isolated points by neighbour distance statistics
//! - [`reject_non_finite`]: Refuses clouds carrying NaN or infinite coordinates
//!
//! # Pipeline order
//!
//! ```text
//! sampled points → drop_invalid → projection → reject_non_finite → outlier removal
//! ```

mod finite;
mod invalid;
mod statistical;

pub use finite::reject_non_finite;
pub use invalid::drop_invalid;
pub use statistical::{StatisticalOutlierConfig, StatisticalOutlierFilter};

use crate::core::types::PointCloud;

/// Trait for cloud filters.
pub trait CloudFilter: Send + Sync {
    /// Apply the filter, returning a new cloud.
    fn filter(&self, cloud: &PointCloud) -> PointCloud;

    /// Get the name of this filter for diagnostics.
    fn name(&self) -> &'static str;
}

impl CloudFilter for StatisticalOutlierFilter {
    fn filter(&self, cloud: &PointCloud) -> PointCloud {
        self.apply(cloud)
    }

    fn name(&self) -> &'static str {
        "StatisticalOutlierFilter"
    }
}
