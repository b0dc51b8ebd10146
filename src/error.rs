use quick_error::quick_error;
use std::io::Error as IOError;
use std::path::PathBuf;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum GroupMapsError {
        /// A required input file or directory does not exist.
        MissingInput(path: PathBuf) {
            display("Missing input: {}", path.display())
        }

        /// Several listed inputs do not exist. All of them are reported at once.
        MissingInputs(paths: Vec<PathBuf>) {
            display("{} listed input files are missing", paths.len())
        }

        /// An external tool returned successfully but its expected output is not there.
        MissingOutput(path: PathBuf) {
            display("Expected output was not produced: {}", path.display())
        }

        /// The basename does not follow the sub_ses_task_run naming convention.
        MalformedFilename(name: String, reason: &'static str) {
            display("Malformed filename '{}': {}", name, reason)
        }

        /// A resampling table row has more cells than there are group labels.
        MalformedTable(reason: String) {
            display("Malformed assignment table: {}", reason)
        }

        /// A file selected for replication does not carry the archive extension.
        UnexpectedExtension(path: PathBuf, expected: String) {
            display("Unanticipated extension for '{}', expected '{}'", path.display(), expected)
        }

        /// An external tool exited with a non-zero status.
        ExternalTool(program: String, status: String) {
            display("External tool '{}' failed: {}", program, status)
        }

        /// An external tool could not be started at all.
        ToolLaunch(program: String, err: IOError) {
            display("Could not launch '{}': {}", program, err)
            source(err)
        }

        /// Two volumes that must be compared voxel by voxel differ in shape.
        ShapeMismatch(left: Vec<usize>, right: Vec<usize>) {
            display("Shape mismatch: {:?} vs {:?}", left, right)
        }

        /// A threshold was requested on an array without elements.
        EmptyVolume {
            display("Cannot threshold an empty volume")
        }

        /// The similarity metric has no defined value for the given input.
        UndefinedScore(metric: &'static str, reason: &'static str) {
            display("{} is undefined: {}", metric, reason)
        }

        /// Another process is working on the same directory.
        Locked(path: PathBuf) {
            display("Directory is locked by another process (remove '{}' if stale)", path.display())
        }

        /// The cluster job argument could not be interpreted.
        InvalidJob(reason: String) {
            display("Invalid job argument: {}", reason)
        }

        /// A configuration value is missing or out of range.
        InvalidConfig(reason: String) {
            display("Invalid configuration: {}", reason)
        }

        /// NIfTI reading or writing failed.
        Nifti(err: nifti::NiftiError) {
            from()
            display("NIfTI error: {}", err)
            source(err)
        }

        Csv(err: csv::Error) {
            from()
            display("CSV error: {}", err)
            source(err)
        }

        Json(err: serde_json::Error) {
            from()
            display("JSON error: {}", err)
            source(err)
        }

        Shape(err: ndarray::ShapeError) {
            from()
            display("Array shape error: {}", err)
            source(err)
        }

        /// I/O Error
        Io(err: IOError) {
            from()
            display("I/O error: {}", err)
            source(err)
        }
    }
}

impl From<walkdir::Error> for GroupMapsError {
    fn from(err: walkdir::Error) -> GroupMapsError {
        GroupMapsError::Io(err.into())
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, GroupMapsError>;
