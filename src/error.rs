//src/error.rs

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Every failure the reconciliation engine can report.
///
/// Variants fall into three groups: I/O (a file could not be opened or
/// written), parse (a line violates its format), and integrity (a
/// cross-reference is missing or a uniqueness rule is broken).
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("cannot read file \"{}\": {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write file \"{}\": {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error parsing line {line_no} '{line}' of file \"{}\": {reason}", path.display())]
    Parse {
        path: PathBuf,
        line_no: usize,
        line: String,
        reason: String,
    },

    #[error("cannot convert entry IDs ({}) to int on line {line_no} of \"{}\"", fields.join(", "), path.display())]
    Value {
        path: PathBuf,
        line_no: usize,
        fields: Vec<String>,
    },

    #[error("invalid support tuple '{value}': expected two ';'-joined numbers")]
    InvalidSupport { value: String },

    #[error("{what} has {found} ranks, expected {expected}")]
    LineageShape {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("accession '{accession}' ({namespace}) of clade '{clade}' has no taxonomy ID")]
    MissingAccession {
        clade: String,
        namespace: String,
        accession: String,
    },

    #[error("duplicate taxa at level '{code}': {}", names.join(", "))]
    DuplicateTaxa { code: String, names: Vec<String> },

    #[error("sample '{name}' given more than once")]
    DuplicateSample { name: String },

    #[error("feature '{feature}' listed twice in \"{}\"", path.display())]
    DuplicateFeature { path: PathBuf, feature: String },

    #[error("invalid BIOM document \"{}\": {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error on \"{}\": {source}", path.display())]
    Hdf5 {
        path: PathBuf,
        #[source]
        source: hdf5::Error,
    },
}

pub type Result<T> = std::result::Result<T, ProfileError>;

impl ProfileError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        ProfileError::Read { path: path.to_path_buf(), source }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        ProfileError::Write { path: path.to_path_buf(), source }
    }

    pub(crate) fn parse(path: &Path, line_no: usize, line: &str, reason: impl Into<String>) -> Self {
        ProfileError::Parse {
            path: path.to_path_buf(),
            line_no,
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}
