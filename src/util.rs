//! Utility functions used in all other groupmaps modules.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use walkdir::WalkDir;

use crate::error::{GroupMapsError, Result};

/// Check whether the file extension ends with ".gz".
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}

/// Recursively find all regular files below `dir` whose file name ends with `suffix`.
///
/// The result is sorted so that repeated runs see the files in the same order.
/// An empty `suffix` matches every file.
pub fn find_files<P>(dir: P, suffix: &str) -> Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
{
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(GroupMapsError::MissingInput(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(suffix) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// The final component of `path` as an owned string.
pub fn file_name_string<P>(path: P) -> Result<String>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| GroupMapsError::MalformedFilename(path.display().to_string(), "path has no file name"))
}

/// Name of the directory that contains `path`, or an empty string at the filesystem root.
pub fn parent_dir_name<P>(path: P) -> String
where
    P: AsRef<Path>,
{
    path.as_ref()
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Decompress the gzip file `src` into `dst` and remove `src` afterwards, like `gunzip` does.
pub fn gunzip_file<P, Q>(src: P, dst: Q) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let src = src.as_ref();
    let mut decoder = GzDecoder::new(BufReader::new(File::open(src)?));
    let mut out = BufWriter::new(File::create(dst.as_ref())?);
    io::copy(&mut decoder, &mut out)?;
    out.flush()?;
    fs::remove_file(src)?;
    Ok(())
}
