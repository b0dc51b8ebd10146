mod common;

use std::fs;

use groupmaps::{replicate, AssignmentTable, Catalog, RunKey, ARCHIVE_EXTENSION};
use tempfile::tempdir;

use common::{write_catalog_dir, RUN_NAMES};

#[test]
fn drawn_runs_are_copied_once_per_draw() {
    let root = tempdir().unwrap();
    let catalog = Catalog::scan(write_catalog_dir(root.path()), "maps.nii.gz").unwrap();
    assert_eq!(3, catalog.len());

    let table = AssignmentTable::from_reader(
        format!(
            "boot_1,boot_2\n{a},{c}\n{a},\n{b},\n",
            a = RUN_NAMES[0],
            b = RUN_NAMES[1],
            c = RUN_NAMES[2]
        )
        .as_bytes(),
    )
    .unwrap();

    let out = root.path().join("groups");
    let report = replicate(&catalog, &table, &out, ARCHIVE_EXTENSION).unwrap();

    assert_eq!(vec![out.join("boot_1"), out.join("boot_2")], report.group_dirs);
    assert_eq!(4, report.copied.len());
    assert!(report.missing.is_empty());

    let boot_1 = out.join("boot_1");
    assert_eq!(b"run 1".to_vec(), fs::read(boot_1.join("sub-01_ses-1_task-rest_run-1_maps_1repeats.nii.gz")).unwrap());
    assert_eq!(b"run 1".to_vec(), fs::read(boot_1.join("sub-01_ses-1_task-rest_run-1_maps_2repeats.nii.gz")).unwrap());
    assert!(boot_1.join("sub-01_ses-1_task-rest_run-2_maps_1repeats.nii.gz").is_file());
    assert!(!boot_1.join("sub-01_ses-1_task-rest_run-2_maps_2repeats.nii.gz").exists());
    assert!(out.join("boot_2").join("sub-02_ses-1_task-rest_run-1_maps_1repeats.nii.gz").is_file());
}

#[test]
fn draws_missing_from_the_catalog_are_skipped() {
    let root = tempdir().unwrap();
    let catalog = Catalog::scan(write_catalog_dir(root.path()), "maps.nii.gz").unwrap();
    let table = AssignmentTable::from_reader(
        format!("g\n{}\nsub-07_ses-1_task-rest_run-1_maps.nii.gz\n", RUN_NAMES[0]).as_bytes(),
    )
    .unwrap();

    let report = replicate(&catalog, &table, root.path().join("out"), ARCHIVE_EXTENSION).unwrap();
    assert_eq!(1, report.copied.len());
    assert_eq!(vec![(String::from("g"), RunKey::new("sub-07", "ses-1", "run-1"))], report.missing);
}

#[test]
fn uncompressed_sources_abort_replication() {
    let root = tempdir().unwrap();
    let dr = root.path().join("dr");
    fs::create_dir_all(&dr).unwrap();
    fs::write(dr.join("sub-01_ses-1_task-rest_run-1_maps.nii"), b"").unwrap();
    let catalog = Catalog::scan(&dr, "maps.nii").unwrap();
    let table = AssignmentTable::from_reader("g\nsub-01_ses-1_task-rest_run-1_maps.nii\n".as_bytes()).unwrap();

    let err = replicate(&catalog, &table, root.path().join("out"), ARCHIVE_EXTENSION).unwrap_err();
    assert!(matches!(err, groupmaps::GroupMapsError::UnexpectedExtension(_, _)));
}

#[test]
fn malformed_file_names_abort_the_catalog() {
    let root = tempdir().unwrap();
    fs::write(root.path().join("badname_maps.nii.gz"), b"").unwrap();
    assert!(Catalog::scan(root.path(), "maps.nii.gz").is_err());
}
