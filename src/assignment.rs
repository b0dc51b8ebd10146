//! Bootstrap resampling tables: which runs go into which group, and how often.
//!
//! The table is plain CSV. The first row holds the group labels, one per column. Every
//! other cell is a file path whose basename identifies a run. A run listed several times
//! in the same column was drawn several times (sampling with replacement).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::bids::RunKey;
use crate::error::{GroupMapsError, Result};

/// The runs drawn for one group, with their repeat counts (always at least 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAssignment {
    pub label: String,
    pub counts: BTreeMap<RunKey, u32>,
}

impl GroupAssignment {
    pub fn new<S: Into<String>>(label: S) -> GroupAssignment {
        GroupAssignment {
            label: label.into(),
            counts: BTreeMap::new(),
        }
    }

    /// Count one more draw of `key` and return the new repeat count.
    pub fn record(&mut self, key: RunKey) -> u32 {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    /// How often `key` was drawn, 0 if never.
    pub fn repeat_count(&self, key: &RunKey) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of files this group expands to after replication.
    pub fn total_copies(&self) -> u32 {
        self.counts.values().sum()
    }
}

/// All groups of a resampling table, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentTable {
    groups: Vec<GroupAssignment>,
}

/// Labels become directory names below the output root, so each must be one plain
/// path component.
fn check_label(label: &str, col: usize) -> Result<()> {
    let reason = if label.is_empty() {
        "is empty"
    } else if label == "." || label == ".." {
        "is a relative directory reference"
    } else if label.contains(|c: char| c == '/' || c == '\\') {
        "contains a path separator"
    } else {
        return Ok(());
    };
    Err(GroupMapsError::MalformedTable(format!(
        "group label '{}' in column {} {}",
        label,
        col + 1,
        reason
    )))
}

impl AssignmentTable {
    /// Read a resampling table from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<AssignmentTable> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(GroupMapsError::MissingInput(path.to_path_buf()));
        }
        let table = AssignmentTable::from_reader(BufReader::new(File::open(path)?))?;
        debug!(
            "Read {} groups with {} copies in total from {}",
            table.groups.len(),
            table.total_copies(),
            path.display()
        );
        Ok(table)
    }

    /// Read a resampling table from CSV text. Columns may differ in length; blank cells
    /// are skipped. Columns sharing a label are pooled into one group.
    pub fn from_reader<R: Read>(input: R) -> Result<AssignmentTable> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        let mut records = rdr.records();

        let header = match records.next() {
            Some(record) => record?,
            None => return Ok(AssignmentTable::default()),
        };

        let mut table = AssignmentTable::default();
        let mut column_groups: Vec<usize> = Vec::with_capacity(header.len());
        for (col, label) in header.iter().enumerate() {
            let label = label.trim();
            check_label(label, col)?;
            let idx = match table.groups.iter().position(|g| g.label == label) {
                Some(idx) => idx,
                None => {
                    table.groups.push(GroupAssignment::new(label));
                    table.groups.len() - 1
                }
            };
            column_groups.push(idx);
        }

        for (row, record) in records.enumerate() {
            let record = record?;
            for (col, cell) in record.iter().enumerate() {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let group_idx = *column_groups.get(col).ok_or_else(|| {
                    GroupMapsError::MalformedTable(format!(
                        "row {} has a value in column {} but there are only {} group labels",
                        row + 2,
                        col + 1,
                        column_groups.len()
                    ))
                })?;
                table.groups[group_idx].record(RunKey::from_path(cell)?);
            }
        }

        Ok(table)
    }

    pub fn groups(&self) -> &[GroupAssignment] {
        &self.groups
    }

    pub fn group(&self, label: &str) -> Option<&GroupAssignment> {
        self.groups.iter().find(|g| g.label == label)
    }

    /// Repeat count of `key` in group `label`, 0 if the group or run is absent.
    pub fn repeat_count(&self, label: &str, key: &RunKey) -> u32 {
        self.group(label).map(|g| g.repeat_count(key)).unwrap_or(0)
    }

    pub fn total_copies(&self) -> u32 {
        self.groups.iter().map(GroupAssignment::total_copies).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
