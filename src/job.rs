//! Cluster job entry point: one bootstrap group/time combination per process.
//!
//! A batch scheduler starts one process per job and passes either a JSON object
//!
//! ```text
//! {"analysis_dir": "/study/bootstrap", "group": "young", "time": "10min"}
//! ```
//!
//! or the path of a single directory that is already populated with replicated maps.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assignment::AssignmentTable;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{GroupMapsError, Result};
use crate::grouper::{replicate, ReplicationReport};
use crate::pipeline::{build_group_map, GroupMapOutcome};
use crate::traits::ToolRunner;
use crate::util::find_files;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub analysis_dir: PathBuf,
    pub group: String,
    pub time: String,
    /// Overrides `replication.catalog_dir` from the configuration.
    #[serde(default)]
    pub catalog_dir: Option<PathBuf>,
}

impl JobSpec {
    /// `<analysis_dir>/<group>/<time>/rand_samples_<group>_<time>.csv`
    pub fn sorting_file(&self) -> PathBuf {
        self.analysis_dir
            .join(&self.group)
            .join(&self.time)
            .join(format!("rand_samples_{}_{}.csv", self.group, self.time))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobArgument {
    Job(JobSpec),
    Directory(PathBuf),
}

impl JobArgument {
    pub fn parse(arg: &str) -> Result<JobArgument> {
        let arg = arg.trim();
        if arg.starts_with('{') {
            return Ok(JobArgument::Job(serde_json::from_str(arg)?));
        }
        let dir = PathBuf::from(arg);
        if dir.is_dir() {
            Ok(JobArgument::Directory(dir))
        } else {
            Err(GroupMapsError::InvalidJob(format!(
                "'{}' is neither a JSON object nor an existing directory",
                arg
            )))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobReport {
    pub replication: Option<ReplicationReport>,
    pub group_maps: Vec<GroupMapOutcome>,
}

/// Directories below `root` holding at least one file ending in `suffix`.
pub fn group_map_dirs(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let dirs: BTreeSet<PathBuf> = find_files(root, suffix)?
        .into_iter()
        .filter_map(|f| f.parent().map(Path::to_path_buf))
        .collect();
    Ok(dirs.into_iter().collect())
}

/// Catalog the dual regression outputs, replicate them into the groups of the job's
/// resampling table and build a group map for every resulting directory.
pub fn run_job<R>(spec: &JobSpec, cfg: &Config, runner: &mut R) -> Result<JobReport>
where
    R: ToolRunner + ?Sized,
{
    let catalog_dir = spec
        .catalog_dir
        .as_ref()
        .or_else(|| cfg.replication.catalog_dir.as_ref())
        .ok_or_else(|| {
            GroupMapsError::InvalidJob(String::from(
                "no catalog_dir in the job or in replication.catalog_dir",
            ))
        })?;
    let catalog = Catalog::scan(catalog_dir, &cfg.replication.catalog_suffix)?;

    let sorting_file = spec.sorting_file();
    let table = AssignmentTable::from_path(&sorting_file)?;
    let out_dir = sorting_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let replication = replicate(&catalog, &table, &out_dir, &cfg.replication.archive_extension)?;

    let mut group_maps = Vec::new();
    let dirs = group_map_dirs(&out_dir, &cfg.group_map.input_suffix)?;
    for (idx, dir) in dirs.iter().enumerate() {
        info!("Group map {} of {}: {}", idx + 1, dirs.len(), dir.display());
        group_maps.push(build_group_map(dir, &cfg.group_map, runner)?);
    }

    Ok(JobReport {
        replication: Some(replication),
        group_maps,
    })
}

/// Dispatch on the form of the job argument.
pub fn run_argument<R>(arg: &JobArgument, cfg: &Config, runner: &mut R) -> Result<JobReport>
where
    R: ToolRunner + ?Sized,
{
    match arg {
        JobArgument::Job(spec) => run_job(spec, cfg, runner),
        JobArgument::Directory(dir) => Ok(JobReport {
            replication: None,
            group_maps: vec![build_group_map(dir, &cfg.group_map, runner)?],
        }),
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn json_arguments_become_jobs() {
        let arg = JobArgument::parse(r#" {"analysis_dir": "/study/boot", "group": "young", "time": "10min"} "#).unwrap();
        match arg {
            JobArgument::Job(spec) => {
                assert_eq!(
                    PathBuf::from("/study/boot/young/10min/rand_samples_young_10min.csv"),
                    spec.sorting_file()
                );
                assert_eq!(None, spec.catalog_dir);
            }
            other => panic!("expected a job, got {:?}", other),
        }
    }

    #[test]
    fn directory_arguments_must_exist() {
        let dir = tempdir().unwrap();
        let arg = JobArgument::parse(&dir.path().display().to_string()).unwrap();
        assert_eq!(JobArgument::Directory(dir.path().to_path_buf()), arg);

        let missing = dir.path().join("nope");
        assert!(matches!(
            JobArgument::parse(&missing.display().to_string()),
            Err(GroupMapsError::InvalidJob(_))
        ));
    }

    #[test]
    fn incomplete_json_is_rejected() {
        assert!(matches!(
            JobArgument::parse(r#"{"group": "young"}"#),
            Err(GroupMapsError::Json(_))
        ));
    }
}
