//! Group-level analysis of resting-state fMRI network maps.
//!
//! Per-run dual regression maps are cataloged by subject, session and run, replicated into
//! bootstrap groups, merged and averaged with FSL, and tested with PALM. The resulting group
//! maps are scored against a prior network by Dice overlap and amplitude correlation.

pub mod assignment;
pub mod bids;
pub mod catalog;
pub mod config;
pub mod error;
pub mod grouper;
pub mod job;
pub mod merge_list;
pub mod pipeline;
pub mod results;
pub mod scoring;
pub mod similarity;
pub mod threshold;
pub mod tools;
pub mod traits;
pub mod util;
pub mod volume;

pub use assignment::{AssignmentTable, GroupAssignment};
pub use bids::RunKey;
pub use catalog::{Catalog, CatalogMiss};
pub use config::{Config, GroupMapConfig, ReplicationConfig, ScoringConfig};
pub use error::{GroupMapsError, Result};
pub use grouper::{replicate, replicated_name, ReplicationReport, ARCHIVE_EXTENSION};
pub use job::{run_argument, run_job, JobArgument, JobReport, JobSpec};
pub use merge_list::{merge_from_list, read_file_list};
pub use pipeline::{build_group_map, GroupMapOutcome, GroupMapPaths, Step, StepStatus};
pub use results::{CorrelationRow, DiceRow, ResultLog};
pub use scoring::{score_correlation, score_dice, ScoreReport};
pub use similarity::{
    dice_coefficient, dice_top_percent, dice_z_threshold, masked_pearson_correlation, pearson_correlation,
};
pub use threshold::{
    abs_threshold_mask, percentile_mask, percentile_threshold, ranked_percentile_threshold, PercentileRanking,
    TOP_FOUR_PERCENT,
};
pub use tools::{DryRunRunner, MergeAxis, ProcessRunner, ToolCommand};
pub use traits::ToolRunner;
pub use volume::{read_volume, write_volume};
