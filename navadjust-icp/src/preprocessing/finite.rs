//! Non-finite coordinate screening.

use crate::core::types::{CloudSide, PointCloud};
use crate::error::{AlignError, Result};

/// Fail if any point in `cloud` has a NaN or infinite coordinate.
///
/// The error names `side` so target and source failures are distinguishable.
pub fn reject_non_finite(cloud: &PointCloud, side: CloudSide) -> Result<()> {
    let count = cloud.non_finite_count();
    if count > 0 {
        return Err(AlignError::NonFinite { side, count });
    }
    Ok(())
}
