//! Catalog of available per-run maps, keyed by subject, session and run.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::bids::RunKey;
use crate::error::Result;
use crate::util::find_files;

/// The level at which a catalog lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogMiss {
    Subject,
    Session,
    Run,
}

impl fmt::Display for CatalogMiss {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level = match self {
            CatalogMiss::Subject => "subject",
            CatalogMiss::Session => "session",
            CatalogMiss::Run => "run",
        };
        write!(f, "{} not in catalog", level)
    }
}

/// Maps every (subject, session, run) to exactly one file. The first file seen for a key wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: BTreeMap<RunKey, PathBuf>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog::default()
    }

    /// Scan `root` recursively for files ending in `suffix` and parse each basename.
    ///
    /// Fails on the first file name that does not follow the naming convention.
    pub fn scan<P: AsRef<Path>>(root: P, suffix: &str) -> Result<Catalog> {
        let root = root.as_ref();
        let files = find_files(root, suffix)?;
        debug!("Found {} files ending in '{}' below {}", files.len(), suffix, root.display());
        let catalog = Catalog::from_paths(files)?;
        info!(
            "Catalog of {} runs from {} subjects built from {}",
            catalog.len(),
            catalog.subjects().len(),
            root.display()
        );
        Ok(catalog)
    }

    pub fn from_paths<I, P>(paths: I) -> Result<Catalog>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut catalog = Catalog::new();
        for path in paths {
            catalog.insert(path.into())?;
        }
        Ok(catalog)
    }

    /// Add a file. Returns `false` if its key was already present, in which case the
    /// catalog is left unchanged.
    pub fn insert(&mut self, path: PathBuf) -> Result<bool> {
        let key = RunKey::from_path(&path)?;
        match self.entries.entry(key) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(path);
                Ok(true)
            }
            btree_map::Entry::Occupied(slot) => {
                warn!(
                    "Ignoring {}: ({}) is already cataloged as {}",
                    path.display(),
                    slot.key(),
                    slot.get().display()
                );
                Ok(false)
            }
        }
    }

    pub fn get(&self, key: &RunKey) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    /// Like [`Catalog::get`], but reports which level of the key is unknown.
    pub fn lookup(&self, key: &RunKey) -> std::result::Result<&Path, CatalogMiss> {
        if let Some(path) = self.get(key) {
            return Ok(path);
        }
        if !self.entries.keys().any(|k| k.subject == key.subject) {
            Err(CatalogMiss::Subject)
        } else if !self
            .entries
            .keys()
            .any(|k| k.subject == key.subject && k.session == key.session)
        {
            Err(CatalogMiss::Session)
        } else {
            Err(CatalogMiss::Run)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RunKey, &Path)> {
        self.entries.iter().map(|(k, p)| (k, p.as_path()))
    }

    /// Distinct subjects, sorted.
    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = self.entries.keys().map(|k| k.subject.as_str()).collect();
        subjects.dedup();
        subjects
    }

    /// Distinct sessions of `subject`, sorted.
    pub fn sessions(&self, subject: &str) -> Vec<&str> {
        let mut sessions: Vec<&str> = self
            .entries
            .keys()
            .filter(|k| k.subject == subject)
            .map(|k| k.session.as_str())
            .collect();
        sessions.dedup();
        sessions
    }

    /// Runs recorded for `subject` and `session`, sorted.
    pub fn runs(&self, subject: &str, session: &str) -> Vec<&str> {
        self.entries
            .keys()
            .filter(|k| k.subject == subject && k.session == session)
            .map(|k| k.run.as_str())
            .collect()
    }
}
