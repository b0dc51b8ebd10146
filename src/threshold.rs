//! Binary masks from statistical maps.
//!
//! Both mask flavours compare absolute values, so strongly negative weights count as
//! part of a network just like strongly positive ones.

use ndarray::{Array, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::{GroupMapsError, Result};

/// Quantile that keeps the top 4% of voxels.
pub const TOP_FOUR_PERCENT: f64 = 0.96;

/// What the percentile threshold is ranked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PercentileRanking {
    /// Absolute values. A map and its negation share a threshold.
    Magnitude,
    /// Signed values, as in the published RABIES Dice method. On maps dominated by
    /// negative weights the threshold can fall far below the largest magnitudes.
    Signed,
}

impl Default for PercentileRanking {
    fn default() -> Self {
        PercentileRanking::Magnitude
    }
}

/// The magnitude at index `floor(quantile * n)` of the ascending sorted absolute values.
///
/// The index is clamped to the last element, so tiny inputs and `quantile >= 1` select
/// the largest magnitude. Sorting magnitudes makes a map and its negation share a threshold.
///
/// # Examples
///
/// ```
/// let values = ndarray::Array1::from((0..100).map(f64::from).collect::<Vec<f64>>());
/// let t = groupmaps::percentile_threshold(&values, groupmaps::TOP_FOUR_PERCENT).unwrap();
/// assert_eq!(t, 96.0);
/// ```
pub fn percentile_threshold<S, D>(values: &ArrayBase<S, D>, quantile: f64) -> Result<f64>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    ranked_percentile_threshold(values, quantile, PercentileRanking::Magnitude)
}

/// Like [`percentile_threshold`], ranking either magnitudes or signed values.
pub fn ranked_percentile_threshold<S, D>(values: &ArrayBase<S, D>, quantile: f64, ranking: PercentileRanking) -> Result<f64>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if values.is_empty() {
        return Err(GroupMapsError::EmptyVolume);
    }
    let mut sorted: Vec<f64> = match ranking {
        PercentileRanking::Magnitude => values.iter().map(|v| v.abs()).collect(),
        PercentileRanking::Signed => values.iter().copied().collect(),
    };
    sorted.sort_by(|a, b| a.total_cmp(b));

    let idx = ((quantile * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    Ok(sorted[idx])
}

/// `|x| >= threshold` for every element.
pub fn abs_threshold_mask<S, D>(values: &ArrayBase<S, D>, threshold: f64) -> Array<bool, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    values.mapv(|v| v.abs() >= threshold)
}

/// Mask of the voxels whose magnitude reaches the `quantile` threshold of `values`.
pub fn percentile_mask<S, D>(values: &ArrayBase<S, D>, quantile: f64, ranking: PercentileRanking) -> Result<Array<bool, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let threshold = ranked_percentile_threshold(values, quantile, ranking)?;
    Ok(abs_threshold_mask(values, threshold))
}
