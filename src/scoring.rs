//! Batch scoring of group maps against a prior network.
//!
//! Every configured directory is searched for group maps. Each map gets one row in a
//! result log inside that directory. A map that cannot be scored is logged and skipped;
//! a prior that cannot be read aborts the batch.

use std::path::{Path, PathBuf};

use ndarray::ArrayD;
use tracing::{error, info};

use crate::config::ScoringConfig;
use crate::error::{GroupMapsError, Result};
use crate::results::{CorrelationRow, DiceRow, ResultLog};
use crate::similarity::{dice_top_percent, dice_z_threshold, masked_pearson_correlation, pearson_correlation};
use crate::util::{find_files, parent_dir_name};
use crate::volume::read_volume;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreReport {
    pub scored: usize,
    /// Skipped maps and the reason.
    pub failed: Vec<(PathBuf, String)>,
}

fn load_prior(cfg: &ScoringConfig) -> Result<ArrayD<f64>> {
    let prior = cfg
        .prior
        .as_ref()
        .ok_or_else(|| GroupMapsError::InvalidConfig(String::from("no prior network given")))?;
    read_volume(prior)
}

fn score_dirs<R, F>(cfg: &ScoringConfig, log_name: &str, mut score: F) -> Result<ScoreReport>
where
    R: serde::Serialize,
    F: FnMut(&Path) -> Result<R>,
{
    let mut report = ScoreReport::default();
    for dir in &cfg.dirs {
        let log = ResultLog::new(dir.join(log_name));
        let files = find_files(dir, &cfg.group_map_suffix)?;
        info!("Scoring {} group maps in {}", files.len(), dir.display());

        for file in files {
            match score(&file) {
                Ok(row) => {
                    log.append(&row)?;
                    report.scored += 1;
                }
                Err(e) => {
                    error!("Skipping {}: {}", file.display(), e);
                    report.failed.push((file, e.to_string()));
                }
            }
        }
    }
    Ok(report)
}

/// Dice overlap with the prior, both for the top 4% masks and for fixed z thresholds.
pub fn score_dice(cfg: &ScoringConfig) -> Result<ScoreReport> {
    let prior = load_prior(cfg)?;
    score_dirs(cfg, &cfg.dice_log_name, |file| {
        let group_map = read_volume(file)?;
        let row = DiceRow {
            group: parent_dir_name(file),
            file: file.display().to_string(),
            dice_top_percent: dice_top_percent(&prior, &group_map, cfg.top_quantile, cfg.percentile_ranking)?,
            z_threshold: cfg.z_group,
            dice_z_threshold: dice_z_threshold(&prior, &group_map, cfg.z_prior, cfg.z_group)?,
        };
        info!(
            "{}: top percent Dice {:.4}, z >= {} Dice {:.4}",
            row.file, row.dice_top_percent, cfg.z_group, row.dice_z_threshold
        );
        Ok(row)
    })
}

/// Amplitude correlation with the prior, inside the prior's z mask and over all voxels.
pub fn score_correlation(cfg: &ScoringConfig) -> Result<ScoreReport> {
    let prior = load_prior(cfg)?;
    score_dirs(cfg, &cfg.correlation_log_name, |file| {
        let group_map = read_volume(file)?;
        let row = CorrelationRow {
            folder: parent_dir_name(file),
            file: file.display().to_string(),
            z_threshold: cfg.z_prior,
            masked_amplitude_correlation: masked_pearson_correlation(&prior, &group_map, cfg.z_prior)?,
            amplitude_correlation: pearson_correlation(&prior, &group_map)?,
        };
        info!(
            "{}: masked amplitude correlation {:.4}, whole brain {:.4}",
            row.file, row.masked_amplitude_correlation, row.amplitude_correlation
        );
        Ok(row)
    })
}
