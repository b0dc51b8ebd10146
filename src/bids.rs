//! Subject, session and run identifiers parsed from BIDS-style file names.
//!
//! Dual regression outputs are named like `sub-01_ses-1_task-rest_run-1_maps.nii.gz`.
//! The underscore-delimited fields at positions 0, 1 and 3 identify the acquisition.

use std::fmt;
use std::path::Path;

use crate::error::{GroupMapsError, Result};
use crate::util::file_name_string;

pub const FIELD_DELIMITER: char = '_';

const SUBJECT_FIELD: usize = 0;
const SESSION_FIELD: usize = 1;
const RUN_FIELD: usize = 3;

/// Composite key identifying one run of one session of one subject.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunKey {
    pub subject: String,
    pub session: String,
    pub run: String,
}

impl RunKey {
    pub fn new<S, T, U>(subject: S, session: T, run: U) -> RunKey
    where
        S: Into<String>,
        T: Into<String>,
        U: Into<String>,
    {
        RunKey {
            subject: subject.into(),
            session: session.into(),
            run: run.into(),
        }
    }

    /// Parse a bare file name. The name must have at least four underscore-delimited fields,
    /// and the subject, session and run fields must not be empty.
    ///
    /// # Examples
    ///
    /// ```
    /// let key = groupmaps::RunKey::from_filename("sub-01_ses-1_task-rest_run-2_maps.nii.gz").unwrap();
    /// assert_eq!(key.subject, "sub-01");
    /// assert_eq!(key.run, "run-2");
    /// ```
    pub fn from_filename(name: &str) -> Result<RunKey> {
        let fields: Vec<&str> = name.split(FIELD_DELIMITER).collect();
        if fields.len() <= RUN_FIELD {
            return Err(GroupMapsError::MalformedFilename(
                name.to_string(),
                "expected at least four underscore-delimited fields",
            ));
        }
        if [SUBJECT_FIELD, SESSION_FIELD, RUN_FIELD]
            .iter()
            .any(|&idx| fields[idx].is_empty())
        {
            return Err(GroupMapsError::MalformedFilename(
                name.to_string(),
                "empty subject, session or run field",
            ));
        }

        Ok(RunKey::new(fields[SUBJECT_FIELD], fields[SESSION_FIELD], fields[RUN_FIELD]))
    }

    /// Parse the basename of a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RunKey> {
        RunKey::from_filename(&file_name_string(path)?)
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}, {}", self.subject, self.session, self.run)
    }
}
