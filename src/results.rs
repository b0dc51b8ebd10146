//! Append-only CSV result logs.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;

use crate::error::Result;

/// One Dice scoring result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiceRow {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "File")]
    pub file: String,
    #[serde(rename = "DICE_4perc")]
    pub dice_top_percent: f64,
    #[serde(rename = "zThresh")]
    pub z_threshold: f64,
    #[serde(rename = "DICE_zThresh")]
    pub dice_z_threshold: f64,
}

/// One amplitude correlation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationRow {
    #[serde(rename = "Folder")]
    pub folder: String,
    #[serde(rename = "File")]
    pub file: String,
    #[serde(rename = "zThresh")]
    pub z_threshold: f64,
    #[serde(rename = "Masked_Amp_Corr_zThresh")]
    pub masked_amplitude_correlation: f64,
    #[serde(rename = "Amp_Corr")]
    pub amplitude_correlation: f64,
}

/// A CSV file that only ever grows. The header is written by whoever creates the file.
#[derive(Debug, Clone)]
pub struct ResultLog<R> {
    path: PathBuf,
    _row: PhantomData<R>,
}

impl<R: Serialize> ResultLog<R> {
    pub fn new<P: Into<PathBuf>>(path: P) -> ResultLog<R> {
        ResultLog {
            path: path.into(),
            _row: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `row`, writing the header first if this call created the file.
    pub fn append(&self, row: &R) -> Result<()> {
        let (file, created) = self.open()?;
        let mut writer = WriterBuilder::new().has_headers(created).from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }

    fn open(&self) -> Result<(File, bool)> {
        match OpenOptions::new().append(true).create_new(true).open(&self.path) {
            Ok(file) => Ok((file, true)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Ok((OpenOptions::new().append(true).open(&self.path)?, false))
            }
            Err(e) => Err(e.into()),
        }
    }
}
