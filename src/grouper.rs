//! Copy cataloged runs into per-group directories, one copy per bootstrap draw.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::assignment::AssignmentTable;
use crate::bids::RunKey;
use crate::catalog::Catalog;
use crate::error::{GroupMapsError, Result};
use crate::util::file_name_string;

/// The double extension of gzipped NIfTI files. Replicated files must carry it.
pub const ARCHIVE_EXTENSION: &str = ".nii.gz";

/// Marks replicated files, e.g. `sub-01_ses-1_task-rest_run-1_maps_2repeats.nii.gz`.
pub const REPEAT_SUFFIX: &str = "repeats";

/// What [`replicate`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplicationReport {
    /// One directory per group, in table order.
    pub group_dirs: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
    /// Group label and key of every draw that has no file in the catalog.
    pub missing: Vec<(String, RunKey)>,
}

/// Name of the `index`-th copy (1-based) of `basename`, or `None` if `basename` does
/// not end with `extension`.
///
/// # Examples
///
/// ```
/// let name = groupmaps::replicated_name("sub-01_ses-1_task-rest_run-1_maps.nii.gz", 2, ".nii.gz");
/// assert_eq!(name.as_deref(), Some("sub-01_ses-1_task-rest_run-1_maps_2repeats.nii.gz"));
/// ```
pub fn replicated_name(basename: &str, index: u32, extension: &str) -> Option<String> {
    basename
        .strip_suffix(extension)
        .map(|stem| format!("{}_{}{}{}", stem, index, REPEAT_SUFFIX, extension))
}

/// Copy every run drawn in `table` from `catalog` into `<out_root>/<group>/`.
///
/// A draw whose subject, session or run is not cataloged is logged and skipped. A
/// cataloged file without the `extension` suffix aborts the whole run, since its copies
/// could not be told apart from each other.
pub fn replicate<P: AsRef<Path>>(
    catalog: &Catalog,
    table: &AssignmentTable,
    out_root: P,
    extension: &str,
) -> Result<ReplicationReport> {
    let out_root = out_root.as_ref();
    let mut report = ReplicationReport::default();

    for group in table.groups() {
        let group_dir = out_root.join(&group.label);
        fs::create_dir_all(&group_dir)?;

        for (key, &repeats) in group.counts.iter() {
            let source = match catalog.lookup(key) {
                Ok(source) => source,
                Err(miss) => {
                    warn!("Group {}: {} ({})", group.label, miss, key);
                    report.missing.push((group.label.clone(), key.clone()));
                    continue;
                }
            };

            let basename = file_name_string(source)?;
            for index in 1..=repeats {
                let name = replicated_name(&basename, index, extension).ok_or_else(|| {
                    GroupMapsError::UnexpectedExtension(source.to_path_buf(), extension.to_string())
                })?;
                let target = group_dir.join(name);
                fs::copy(source, &target)?;
                debug!("Copied {} to {}", source.display(), target.display());
                report.copied.push(target);
            }
        }
        report.group_dirs.push(group_dir);
    }

    info!(
        "Copied {} files into {} groups in {} ({} draws not in catalog)",
        report.copied.len(),
        report.group_dirs.len(),
        out_root.display(),
        report.missing.len()
    );
    Ok(report)
}
