//! Run configuration, read from a JSON file.
//!
//! Every field has a default, so a file only needs to name what differs for a study.
//! Thresholds, the ICA component and the names of the external tools are all set here.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GroupMapsError, Result};
use crate::grouper::ARCHIVE_EXTENSION;
use crate::threshold::{PercentileRanking, TOP_FOUR_PERCENT};
use crate::tools::MergeAxis;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub group_map: GroupMapConfig,
    #[serde(default)]
    pub replication: ReplicationConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(GroupMapsError::MissingInput(path.to_path_buf()));
        }
        let config: Config = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let q = self.scoring.top_quantile;
        if !(0.0..=1.0).contains(&q) {
            return Err(GroupMapsError::InvalidConfig(format!(
                "scoring.top_quantile must be within [0, 1], got {}",
                q
            )));
        }
        if self.group_map.permutations == 0 {
            return Err(GroupMapsError::InvalidConfig(String::from(
                "group_map.permutations must be positive",
            )));
        }
        if self.replication.archive_extension.is_empty() {
            return Err(GroupMapsError::InvalidConfig(String::from(
                "replication.archive_extension must not be empty",
            )));
        }
        Ok(())
    }
}

/// Settings for the Dice and amplitude correlation scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Prior network, in the same space as the group maps.
    #[serde(default)]
    pub prior: Option<PathBuf>,
    /// Directories searched recursively for group maps.
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
    #[serde(default = "ScoringConfig::default_group_map_suffix")]
    pub group_map_suffix: String,
    #[serde(default = "ScoringConfig::default_z_prior")]
    pub z_prior: f64,
    #[serde(default = "ScoringConfig::default_z_group")]
    pub z_group: f64,
    #[serde(default = "ScoringConfig::default_top_quantile")]
    pub top_quantile: f64,
    /// `signed` reproduces published top 4% Dice values.
    #[serde(default)]
    pub percentile_ranking: PercentileRanking,
    #[serde(default = "ScoringConfig::default_dice_log_name")]
    pub dice_log_name: String,
    #[serde(default = "ScoringConfig::default_correlation_log_name")]
    pub correlation_log_name: String,
}

impl ScoringConfig {
    fn default_group_map_suffix() -> String {
        String::from("_ztstat_c1.nii")
    }
    fn default_z_prior() -> f64 {
        3.1
    }
    fn default_z_group() -> f64 {
        3.0
    }
    fn default_top_quantile() -> f64 {
        TOP_FOUR_PERCENT
    }
    fn default_dice_log_name() -> String {
        String::from("DSC_results.csv")
    }
    fn default_correlation_log_name() -> String {
        String::from("AmpCorr_results.csv")
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            prior: None,
            dirs: Vec::new(),
            group_map_suffix: Self::default_group_map_suffix(),
            z_prior: Self::default_z_prior(),
            z_group: Self::default_z_group(),
            top_quantile: Self::default_top_quantile(),
            percentile_ranking: PercentileRanking::default(),
            dice_log_name: Self::default_dice_log_name(),
            correlation_log_name: Self::default_correlation_log_name(),
        }
    }
}

/// Settings for the merge, average and group statistic steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMapConfig {
    /// ICA component taken from every dual regression output, e.g. 5 (somatomotor),
    /// 12 (visual) or 19 (default mode).
    #[serde(default = "GroupMapConfig::default_component")]
    pub component: u32,
    #[serde(default)]
    pub merge_axis: MergeAxis,
    #[serde(default = "GroupMapConfig::default_permutations")]
    pub permutations: u32,
    /// Files in a group directory with this suffix are merged.
    #[serde(default = "GroupMapConfig::default_input_suffix")]
    pub input_suffix: String,
    #[serde(default = "GroupMapConfig::default_merged_prefix")]
    pub merged_prefix: String,
    /// Suffix PALM appends to the output prefix for the z-scored map.
    #[serde(default = "GroupMapConfig::default_zmap_suffix")]
    pub zmap_suffix: String,
    #[serde(default = "GroupMapConfig::default_merge_tool")]
    pub merge_tool: String,
    #[serde(default = "GroupMapConfig::default_maths_tool")]
    pub maths_tool: String,
    #[serde(default = "GroupMapConfig::default_palm_tool")]
    pub palm_tool: String,
    /// Accept outputs that exist without a completion marker.
    #[serde(default)]
    pub trust_existing_outputs: bool,
}

impl GroupMapConfig {
    fn default_component() -> u32 {
        5
    }
    fn default_permutations() -> u32 {
        5000
    }
    fn default_input_suffix() -> String {
        String::from("repeats.nii.gz")
    }
    fn default_merged_prefix() -> String {
        String::from("merged_")
    }
    fn default_zmap_suffix() -> String {
        String::from("_vox_p_tstat1_ptoz")
    }
    fn default_merge_tool() -> String {
        String::from("fslmerge")
    }
    fn default_maths_tool() -> String {
        String::from("fslmaths")
    }
    fn default_palm_tool() -> String {
        String::from("palm")
    }
}

impl Default for GroupMapConfig {
    fn default() -> Self {
        Self {
            component: Self::default_component(),
            merge_axis: MergeAxis::default(),
            permutations: Self::default_permutations(),
            input_suffix: Self::default_input_suffix(),
            merged_prefix: Self::default_merged_prefix(),
            zmap_suffix: Self::default_zmap_suffix(),
            merge_tool: Self::default_merge_tool(),
            maths_tool: Self::default_maths_tool(),
            palm_tool: Self::default_palm_tool(),
            trust_existing_outputs: false,
        }
    }
}

/// Settings for cataloging and replicating per-run maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Root of the dual regression outputs. A cluster job may override it.
    #[serde(default)]
    pub catalog_dir: Option<PathBuf>,
    #[serde(default = "ReplicationConfig::default_catalog_suffix")]
    pub catalog_suffix: String,
    #[serde(default = "ReplicationConfig::default_archive_extension")]
    pub archive_extension: String,
}

impl ReplicationConfig {
    fn default_catalog_suffix() -> String {
        String::from("maps.nii.gz")
    }
    fn default_archive_extension() -> String {
        String::from(ARCHIVE_EXTENSION)
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            catalog_dir: None,
            catalog_suffix: Self::default_catalog_suffix(),
            archive_extension: Self::default_archive_extension(),
        }
    }
}
