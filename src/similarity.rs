//! Similarity between a group map and a prior network: Dice overlap and amplitude correlation.

use ndarray::{Array2, ArrayBase, Data, Dimension};
use ndarray_stats::CorrelationExt;

use crate::error::{GroupMapsError, Result};
use crate::threshold::{abs_threshold_mask, percentile_mask, PercentileRanking};

/// Fail with [`GroupMapsError::ShapeMismatch`] unless both shapes are identical.
pub fn ensure_same_shape(left: &[usize], right: &[usize]) -> Result<()> {
    if left != right {
        return Err(GroupMapsError::ShapeMismatch(left.to_vec(), right.to_vec()));
    }
    Ok(())
}

/// Dice coefficient `2 |A ∩ B| / (|A| + |B|)` of two binary masks of equal shape.
///
/// Two empty masks have no defined overlap and yield [`GroupMapsError::UndefinedScore`].
pub fn dice_coefficient<S1, S2, D>(mask1: &ArrayBase<S1, D>, mask2: &ArrayBase<S2, D>) -> Result<f64>
where
    S1: Data<Elem = bool>,
    S2: Data<Elem = bool>,
    D: Dimension,
{
    ensure_same_shape(mask1.shape(), mask2.shape())?;

    let overlap = mask1.iter().zip(mask2.iter()).filter(|&(&a, &b)| a && b).count();
    let total = mask1.iter().filter(|&&m| m).count() + mask2.iter().filter(|&&m| m).count();
    if total == 0 {
        return Err(GroupMapsError::UndefinedScore("Dice coefficient", "both masks are empty"));
    }
    Ok(2.0 * overlap as f64 / total as f64)
}

/// Dice overlap of the top 4% style masks of both maps, each thresholded at its own
/// `quantile`.
pub fn dice_top_percent<S1, S2, D>(
    prior: &ArrayBase<S1, D>,
    group: &ArrayBase<S2, D>,
    quantile: f64,
    ranking: PercentileRanking,
) -> Result<f64>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    ensure_same_shape(prior.shape(), group.shape())?;
    let mask1 = percentile_mask(prior, quantile, ranking)?;
    let mask2 = percentile_mask(group, quantile, ranking)?;
    dice_coefficient(&mask1, &mask2)
}

/// Dice overlap of fixed z-value masks, with separate thresholds for prior and group map.
pub fn dice_z_threshold<S1, S2, D>(
    prior: &ArrayBase<S1, D>,
    group: &ArrayBase<S2, D>,
    z_prior: f64,
    z_group: f64,
) -> Result<f64>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    ensure_same_shape(prior.shape(), group.shape())?;
    let mask1 = abs_threshold_mask(prior, z_prior);
    let mask2 = abs_threshold_mask(group, z_group);
    dice_coefficient(&mask1, &mask2)
}

/// Pearson product-moment correlation of two flattened maps of equal shape.
///
/// # Examples
///
/// ```
/// let a = ndarray::array![1.0, 2.0, 4.0, 8.0];
/// let r = groupmaps::pearson_correlation(&a, &a.mapv(|v| -v)).unwrap();
/// assert!((r + 1.0).abs() < 1e-12);
/// ```
pub fn pearson_correlation<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>) -> Result<f64>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    ensure_same_shape(a.shape(), b.shape())?;
    pearson_of_samples(a.iter().copied().collect(), b.iter().copied().collect())
}

/// Pearson correlation restricted to the voxels where `|prior| >= z_prior`.
///
/// The voxel set is derived from the prior alone and applied to both maps.
pub fn masked_pearson_correlation<S1, S2, D>(
    prior: &ArrayBase<S1, D>,
    group: &ArrayBase<S2, D>,
    z_prior: f64,
) -> Result<f64>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    ensure_same_shape(prior.shape(), group.shape())?;
    let (x, y): (Vec<f64>, Vec<f64>) = prior
        .iter()
        .zip(group.iter())
        .filter(|(p, _)| p.abs() >= z_prior)
        .map(|(&p, &g)| (p, g))
        .unzip();
    pearson_of_samples(x, y)
}

fn pearson_of_samples(x: Vec<f64>, y: Vec<f64>) -> Result<f64> {
    let n = x.len();
    if n < 2 {
        return Err(GroupMapsError::UndefinedScore("Pearson correlation", "fewer than two samples"));
    }

    let mut data = x;
    data.extend(y);
    let observations = Array2::from_shape_vec((2, n), data)?;
    let corr = observations
        .pearson_correlation()
        .map_err(|_| GroupMapsError::UndefinedScore("Pearson correlation", "no observations"))?;

    let r = corr[[0, 1]];
    if !r.is_finite() {
        return Err(GroupMapsError::UndefinedScore("Pearson correlation", "an input is constant"));
    }
    Ok(r.max(-1.0).min(1.0))
}
