//! Merge an explicit list of maps, given as a CSV file with one path per row.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::{error, info};

use crate::config::GroupMapConfig;
use crate::error::{GroupMapsError, Result};
use crate::tools::merge_command;
use crate::traits::ToolRunner;

/// Paths from the first column of every row. There is no header row; blank rows are skipped.
pub fn read_file_list<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(GroupMapsError::MissingInput(path.to_path_buf()));
    }
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(File::open(path)?));

    let mut files = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(first) = record.get(0).map(str::trim).filter(|s| !s.is_empty()) {
            files.push(PathBuf::from(first));
        }
    }
    Ok(files)
}

/// Merge every file listed in `list` into `output` with a single merge tool call.
///
/// Nothing runs unless all listed files exist; every missing one is logged.
pub fn merge_from_list<P, Q, R>(list: P, output: Q, cfg: &GroupMapConfig, runner: &mut R) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: ToolRunner + ?Sized,
{
    let list = list.as_ref();
    let files = read_file_list(list)?;
    if files.is_empty() {
        return Err(GroupMapsError::MalformedTable(format!("{} lists no files", list.display())));
    }

    let missing: Vec<PathBuf> = files.iter().filter(|f| !f.exists()).cloned().collect();
    if !missing.is_empty() {
        for f in &missing {
            error!("Listed file is missing: {}", f.display());
        }
        return Err(GroupMapsError::MissingInputs(missing));
    }

    let output = output.as_ref();
    runner.run(&merge_command(&cfg.merge_tool, cfg.merge_axis, cfg.component, output, &files))?;
    info!("Merged {} files into {}", files.len(), output.display());
    Ok(())
}
