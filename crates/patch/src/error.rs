use std::path::PathBuf;
use thiserror::Error;

/// Patch-subsystem errors
///
/// Everything here is raised during boot; a failure aborts startup rather
/// than degrading into serving unverified patch data.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Error opening patch {path}: {source}")]
    PatchUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error reading survey data {path}: {source}")]
    SurveyUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Patch store error: {0}")]
    Dao(String),
}

pub type Result<T> = std::result::Result<T, PatchError>;
