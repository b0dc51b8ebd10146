mod common;

use std::fs;
use std::path::Path;

use groupmaps::pipeline::marker_path;
use groupmaps::{
    build_group_map, run_job, Config, DryRunRunner, GroupMapConfig, GroupMapsError, JobSpec, Step, StepStatus,
};
use tempfile::tempdir;

use common::{write_catalog_dir, FakeTools, RUN_NAMES};

fn populated_group_dir(root: &Path) -> std::path::PathBuf {
    let dir = root.join("boot_1");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("sub-01_ses-1_task-rest_run-1_maps_1repeats.nii.gz"), b"").unwrap();
    fs::write(dir.join("sub-01_ses-1_task-rest_run-1_maps_2repeats.nii.gz"), b"").unwrap();
    dir
}

#[test]
fn a_complete_directory_is_not_rebuilt() {
    let root = tempdir().unwrap();
    let dir = populated_group_dir(root.path());
    let cfg = GroupMapConfig::default();

    let mut tools = FakeTools::new(&cfg.zmap_suffix);
    let outcome = build_group_map(&dir, &cfg, &mut tools).unwrap();
    assert_eq!(vec!["fslmerge", "fslmaths", "palm"], tools.programs());
    assert_eq!(Some(StepStatus::Ran), outcome.status(Step::Statistic));
    assert!(outcome.paths.zmap.is_file());
    assert!(marker_path(&outcome.paths.zmap).is_file());

    let mut again = FakeTools::new(&cfg.zmap_suffix);
    let outcome = build_group_map(&dir, &cfg, &mut again).unwrap();
    assert!(again.calls.is_empty());
    assert!(!outcome.ran_any());
    assert!(!dir.join(groupmaps::pipeline::LOCK_FILE_NAME).exists());
}

#[test]
fn outputs_without_markers_are_recomputed() {
    let root = tempdir().unwrap();
    let dir = populated_group_dir(root.path());
    let cfg = GroupMapConfig::default();

    let mut tools = FakeTools::new(&cfg.zmap_suffix);
    let outcome = build_group_map(&dir, &cfg, &mut tools).unwrap();
    fs::remove_file(marker_path(&outcome.paths.mean)).unwrap();

    let mut again = FakeTools::new(&cfg.zmap_suffix);
    let outcome = build_group_map(&dir, &cfg, &mut again).unwrap();
    assert_eq!(vec!["fslmaths"], again.programs());
    assert_eq!(Some(StepStatus::Skipped), outcome.status(Step::Merge));
    assert_eq!(Some(StepStatus::Ran), outcome.status(Step::Average));
    assert_eq!(Some(StepStatus::Skipped), outcome.status(Step::Statistic));
}

#[test]
fn a_rebuilt_merge_invalidates_the_mean_and_the_statistic() {
    let root = tempdir().unwrap();
    let dir = populated_group_dir(root.path());
    let cfg = GroupMapConfig::default();

    let mut tools = FakeTools::new(&cfg.zmap_suffix);
    let outcome = build_group_map(&dir, &cfg, &mut tools).unwrap();
    fs::remove_file(&outcome.paths.merged).unwrap();
    fs::write(dir.join("sub-02_ses-1_task-rest_run-1_maps_1repeats.nii.gz"), b"").unwrap();

    let mut again = FakeTools::new(&cfg.zmap_suffix);
    let outcome = build_group_map(&dir, &cfg, &mut again).unwrap();
    assert_eq!(vec!["fslmerge", "fslmaths", "palm"], again.programs());
    assert_eq!(Some(StepStatus::Ran), outcome.status(Step::Merge));
    assert_eq!(Some(StepStatus::Ran), outcome.status(Step::Average));
    assert_eq!(Some(StepStatus::Ran), outcome.status(Step::Statistic));
    assert_eq!(6, again.calls[0].get_args().len());
    assert!(marker_path(&outcome.paths.mean).is_file());
    assert!(marker_path(&outcome.paths.zmap).is_file());
}

#[test]
fn a_merge_without_marker_is_rebuilt_with_everything_after_it() {
    let root = tempdir().unwrap();
    let dir = populated_group_dir(root.path());
    let cfg = GroupMapConfig::default();

    let mut tools = FakeTools::new(&cfg.zmap_suffix);
    let outcome = build_group_map(&dir, &cfg, &mut tools).unwrap();
    fs::remove_file(marker_path(&outcome.paths.merged)).unwrap();

    let mut again = FakeTools::new(&cfg.zmap_suffix);
    let outcome = build_group_map(&dir, &cfg, &mut again).unwrap();
    assert_eq!(vec!["fslmerge", "fslmaths", "palm"], again.programs());
    assert!(outcome.steps.iter().all(|(_, status)| *status == StepStatus::Ran));
}

#[test]
fn trusted_outputs_are_kept_without_markers() {
    let root = tempdir().unwrap();
    let dir = populated_group_dir(root.path());
    let mut cfg = GroupMapConfig::default();
    cfg.trust_existing_outputs = true;
    let paths = groupmaps::GroupMapPaths::for_dir(&dir, &cfg).unwrap();
    fs::write(&paths.merged, b"old").unwrap();

    let mut tools = FakeTools::new(&cfg.zmap_suffix);
    let outcome = build_group_map(&dir, &cfg, &mut tools).unwrap();
    assert_eq!(vec!["fslmaths", "palm"], tools.programs());
    assert_eq!(Some(StepStatus::Skipped), outcome.status(Step::Merge));
    assert_eq!(b"old".to_vec(), fs::read(&paths.merged).unwrap());
}

#[test]
fn a_failing_tool_stops_the_directory_and_leaves_no_marker() {
    let root = tempdir().unwrap();
    let dir = populated_group_dir(root.path());
    let cfg = GroupMapConfig::default();

    let mut tools = FakeTools::new(&cfg.zmap_suffix);
    tools.failing = Some(String::from("fslmaths"));
    let err = build_group_map(&dir, &cfg, &mut tools).unwrap_err();
    assert!(matches!(err, GroupMapsError::ExternalTool(ref p, _) if p == "fslmaths"));
    assert_eq!(vec!["fslmerge", "fslmaths"], tools.programs());

    let paths = groupmaps::GroupMapPaths::for_dir(&dir, &cfg).unwrap();
    assert!(marker_path(&paths.merged).is_file());
    assert!(!marker_path(&paths.mean).exists());
    assert!(!dir.join(groupmaps::pipeline::LOCK_FILE_NAME).exists());
}

#[test]
fn a_locked_directory_is_refused() {
    let root = tempdir().unwrap();
    let dir = populated_group_dir(root.path());
    fs::write(dir.join(groupmaps::pipeline::LOCK_FILE_NAME), b"1234\n").unwrap();

    let mut tools = FakeTools::new("_z");
    let err = build_group_map(&dir, &GroupMapConfig::default(), &mut tools).unwrap_err();
    assert!(matches!(err, GroupMapsError::Locked(_)));
    assert!(tools.calls.is_empty());
}

#[test]
fn dry_runs_write_nothing() {
    let root = tempdir().unwrap();
    let dir = populated_group_dir(root.path());
    let cfg = GroupMapConfig::default();

    let mut runner = DryRunRunner::default();
    let outcome = build_group_map(&dir, &cfg, &mut runner).unwrap();
    assert_eq!(3, runner.commands.len());
    assert!(!outcome.paths.merged.exists());
    assert!(!marker_path(&outcome.paths.merged).exists());
}

#[test]
fn a_job_replicates_and_builds_every_group() {
    let root = tempdir().unwrap();
    let catalog_dir = write_catalog_dir(root.path());
    let analysis = root.path().join("bootstrap");
    let spec = JobSpec {
        analysis_dir: analysis.clone(),
        group: String::from("young"),
        time: String::from("10min"),
        catalog_dir: Some(catalog_dir),
    };
    let sorting = spec.sorting_file();
    fs::create_dir_all(sorting.parent().unwrap()).unwrap();
    fs::write(
        &sorting,
        format!("boot_1,boot_2\n{},{}\n{},\n", RUN_NAMES[0], RUN_NAMES[2], RUN_NAMES[1]),
    )
    .unwrap();

    let cfg = Config::default();
    let mut tools = FakeTools::new(&cfg.group_map.zmap_suffix);
    let report = run_job(&spec, &cfg, &mut tools).unwrap();

    assert_eq!(3, report.replication.as_ref().unwrap().copied.len());
    assert_eq!(2, report.group_maps.len());
    assert_eq!(6, tools.calls.len());
    let job_dir = analysis.join("young").join("10min");
    assert_eq!(job_dir.join("boot_1"), report.group_maps[0].dir);
    assert_eq!(job_dir.join("boot_2"), report.group_maps[1].dir);
}

#[test]
fn a_job_without_catalog_is_invalid() {
    let root = tempdir().unwrap();
    let spec = JobSpec {
        analysis_dir: root.path().to_path_buf(),
        group: String::from("g"),
        time: String::from("t"),
        catalog_dir: None,
    };
    let mut runner = DryRunRunner::default();
    let err = run_job(&spec, &Config::default(), &mut runner).unwrap_err();
    assert!(matches!(err, GroupMapsError::InvalidJob(_)));
}
