//! Merge, average and group statistic for one directory of replicated maps.
//!
//! Each step is skipped when it already completed. Completion is recorded by a marker
//! file next to the step's output (`<output>.done`), written only after the tool
//! succeeded and the output exists. An output without a marker is assumed to be a
//! leftover of an interrupted run and is recomputed. A lock file keeps two processes
//! from working on the same directory at once.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::GroupMapConfig;
use crate::error::{GroupMapsError, Result};
use crate::tools::{mean_command, merge_command, one_sample_command};
use crate::traits::ToolRunner;
use crate::util::{file_name_string, find_files, gunzip_file};

pub const LOCK_FILE_NAME: &str = ".groupmaps.lock";
pub const MARKER_EXTENSION: &str = "done";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Merge,
    Average,
    Statistic,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Step::Merge => "merge",
            Step::Average => "average",
            Step::Statistic => "group statistic",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Ran,
    Skipped,
}

/// What [`build_group_map`] did for one directory.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMapOutcome {
    pub dir: PathBuf,
    pub paths: GroupMapPaths,
    pub steps: Vec<(Step, StepStatus)>,
}

impl GroupMapOutcome {
    pub fn status(&self, step: Step) -> Option<StepStatus> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, status)| *status)
    }

    pub fn ran_any(&self) -> bool {
        self.steps.iter().any(|(_, status)| *status == StepStatus::Ran)
    }
}

/// Output locations for one group directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMapPaths {
    /// All inputs concatenated, uncompressed.
    pub merged: PathBuf,
    /// Voxel-wise mean of `merged`.
    pub mean: PathBuf,
    /// Output prefix handed to PALM.
    pub palm_prefix: PathBuf,
    /// The z-scored group map PALM writes.
    pub zmap: PathBuf,
}

impl GroupMapPaths {
    /// Names are derived from the directory's own name, e.g. for `/out/boot_3` and
    /// component 5: `/out/boot_3/merged_c5_boot_3.nii`.
    pub fn for_dir(dir: &Path, cfg: &GroupMapConfig) -> Result<GroupMapPaths> {
        let dir_name = match dir.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => file_name_string(dir.canonicalize()?)?,
        };
        let merged_name = format!("{}c{}_{}", cfg.merged_prefix, cfg.component, dir_name);
        let stats_name = format!("{}_1sampleGroupMean", merged_name);

        Ok(GroupMapPaths {
            merged: dir.join(format!("{}.nii", merged_name)),
            mean: dir.join(format!("{}_Tmean.nii.gz", merged_name)),
            zmap: dir.join(format!("{}{}.nii", stats_name, cfg.zmap_suffix)),
            palm_prefix: dir.join(stats_name),
        })
    }
}

/// Completion marker of the step that produces `output`.
pub fn marker_path(output: &Path) -> PathBuf {
    let mut marker = output.as_os_str().to_owned();
    marker.push(".");
    marker.push(MARKER_EXTENSION);
    PathBuf::from(marker)
}

/// Exclusive claim on a directory, released on drop.
#[derive(Debug)]
struct DirLock {
    path: PathBuf,
}

impl DirLock {
    fn acquire(dir: &Path) -> Result<DirLock> {
        let path = dir.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let lock = DirLock { path };
                writeln!(file, "{}", std::process::id())?;
                Ok(lock)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(GroupMapsError::Locked(path)),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Could not release lock {}: {}", self.path.display(), e);
        }
    }
}

fn write_marker(marker: &Path, step: Step) -> Result<()> {
    let mut tmp = marker.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, format!("{}\n", step))?;
    fs::rename(&tmp, marker)?;
    Ok(())
}

/// Run `body` unless `output` is complete. With `upstream_ran` set, the step's input was
/// just rebuilt, so any existing output is outdated and is always recomputed.
fn run_step<R, F>(
    step: Step,
    output: &Path,
    trust_existing: bool,
    upstream_ran: bool,
    runner: &mut R,
    body: F,
) -> Result<StepStatus>
where
    R: ToolRunner + ?Sized,
    F: FnOnce(&mut R) -> Result<()>,
{
    let marker = marker_path(output);
    if upstream_ran {
        if marker.exists() {
            fs::remove_file(&marker)?;
        }
        if output.exists() {
            info!("Recomputing {}: its input was rebuilt", step);
            fs::remove_file(output)?;
        }
    } else if output.exists() {
        if marker.exists() {
            info!("Skipping {}: {} is complete", step, output.display());
            return Ok(StepStatus::Skipped);
        }
        if trust_existing {
            info!("Skipping {}: {} exists (trusted without marker)", step, output.display());
            return Ok(StepStatus::Skipped);
        }
        warn!("{} has no completion marker, recomputing {}", output.display(), step);
        fs::remove_file(output)?;
    } else if marker.exists() {
        fs::remove_file(&marker)?;
    }

    body(runner)?;

    if runner.executes() {
        if !output.exists() {
            return Err(GroupMapsError::MissingOutput(output.to_path_buf()));
        }
        write_marker(&marker, step)?;
    }
    Ok(StepStatus::Ran)
}

/// FSL may write `merged.nii.gz` although `merged.nii` was requested.
fn restore_uncompressed(merged: &Path) -> Result<()> {
    let mut gz = merged.as_os_str().to_owned();
    gz.push(".gz");
    let gz = PathBuf::from(gz);
    if !merged.exists() && gz.exists() {
        gunzip_file(&gz, merged)?;
    }
    Ok(())
}

/// Run merge, average and group statistic for the inputs in `dir`.
///
/// Tool failures abort immediately and leave no marker for the failed step, so the next
/// invocation starts over from that step.
pub fn build_group_map<R>(dir: &Path, cfg: &GroupMapConfig, runner: &mut R) -> Result<GroupMapOutcome>
where
    R: ToolRunner + ?Sized,
{
    if !dir.is_dir() {
        return Err(GroupMapsError::MissingInput(dir.to_path_buf()));
    }
    let _lock = DirLock::acquire(dir)?;
    let paths = GroupMapPaths::for_dir(dir, cfg)?;
    let trust = cfg.trust_existing_outputs;
    let mut steps = Vec::with_capacity(3);

    let status = run_step(Step::Merge, &paths.merged, trust, false, runner, |runner| {
        let inputs = find_files(dir, &cfg.input_suffix)?;
        if inputs.is_empty() {
            return Err(GroupMapsError::MissingInput(dir.join(format!("*{}", cfg.input_suffix))));
        }
        info!("Merging {} maps in {}", inputs.len(), dir.display());
        runner.run(&merge_command(&cfg.merge_tool, cfg.merge_axis, cfg.component, &paths.merged, &inputs))?;
        if runner.executes() {
            restore_uncompressed(&paths.merged)?;
        }
        Ok(())
    })?;
    steps.push((Step::Merge, status));

    let merge_ran = status == StepStatus::Ran;
    let status = run_step(Step::Average, &paths.mean, trust, merge_ran, runner, |runner| {
        runner.run(&mean_command(&cfg.maths_tool, &paths.merged, &paths.mean))
    })?;
    steps.push((Step::Average, status));

    let status = run_step(Step::Statistic, &paths.zmap, trust, merge_ran, runner, |runner| {
        runner.run(&one_sample_command(&cfg.palm_tool, &paths.merged, &paths.palm_prefix, cfg.permutations))
    })?;
    steps.push((Step::Statistic, status));

    Ok(GroupMapOutcome {
        dir: dir.to_path_buf(),
        paths,
        steps,
    })
}


#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn paths_are_named_after_the_directory_and_component() {
        let cfg = GroupMapConfig::default();
        let paths = GroupMapPaths::for_dir(Path::new("/out/boot_3"), &cfg).unwrap();
        assert_eq!(Path::new("/out/boot_3/merged_c5_boot_3.nii"), paths.merged);
        assert_eq!(Path::new("/out/boot_3/merged_c5_boot_3_Tmean.nii.gz"), paths.mean);
        assert_eq!(Path::new("/out/boot_3/merged_c5_boot_3_1sampleGroupMean"), paths.palm_prefix);
        assert_eq!(
            Path::new("/out/boot_3/merged_c5_boot_3_1sampleGroupMean_vox_p_tstat1_ptoz.nii"),
            paths.zmap
        );
    }

    #[test]
    fn markers_sit_next_to_their_output() {
        assert_eq!(Path::new("/g/m.nii.done"), marker_path(Path::new("/g/m.nii")));
    }

    #[test]
    fn a_held_lock_refuses_a_second_claim() {
        let dir = tempdir().unwrap();
        let first = DirLock::acquire(dir.path()).unwrap();
        let pid = fs::read_to_string(dir.path().join(LOCK_FILE_NAME)).unwrap();
        assert_eq!(std::process::id().to_string(), pid.trim());
        assert!(matches!(DirLock::acquire(dir.path()), Err(GroupMapsError::Locked(_))));
        drop(first);
        assert!(DirLock::acquire(dir.path()).is_ok());
    }

    #[test]
    fn merged_archives_are_decompressed_in_place() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempdir().unwrap();
        let merged = dir.path().join("merged.nii");
        let mut enc = GzEncoder::new(fs::File::create(dir.path().join("merged.nii.gz")).unwrap(), Compression::fast());
        enc.write_all(b"abc").unwrap();
        enc.finish().unwrap();

        restore_uncompressed(&merged).unwrap();
        assert_eq!(b"abc".to_vec(), fs::read(&merged).unwrap());
    }
}
