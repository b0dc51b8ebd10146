//! Reading and writing statistical maps stored as NIfTI-1 volumes (`.nii` or `.nii.gz`).

use std::path::Path;

use ndarray::{ArrayBase, ArrayD, Data, Dimension, RemoveAxis};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use tracing::debug;

use crate::error::{GroupMapsError, Result};
use crate::util::is_gz_file;

/// Read a NIfTI volume into a dynamic-dimensional `f64` array.
///
/// Scaling (`scl_slope`, `scl_inter`) from the header is applied by the reader.
pub fn read_volume<P: AsRef<Path>>(path: P) -> Result<ArrayD<f64>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(GroupMapsError::MissingInput(path.to_path_buf()));
    }
    let obj = ReaderOptions::new().read_file(path)?;
    let data = obj.into_volume().into_ndarray::<f64>()?;
    debug!("Loaded {} with shape {:?}", path.display(), data.shape());
    Ok(data)
}

/// Write `data` as a NIfTI volume. A `.gz` file name produces a compressed file.
pub fn write_volume<P, S, D>(path: P, data: &ArrayBase<S, D>) -> Result<()>
where
    P: AsRef<Path>,
    S: Data<Elem = f64>,
    D: Dimension + RemoveAxis,
{
    let path = path.as_ref();
    WriterOptions::new(path).write_nifti(data)?;
    debug!(
        "Wrote {} volume {} with shape {:?}",
        if is_gz_file(path) { "compressed" } else { "uncompressed" },
        path.display(),
        data.shape()
    );
    Ok(())
}
