use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TaxError {
    #[error("invalid TaxID: {0:?}")]
    InvalidTaxId(String),

    #[error("input file {0} not found")]
    InputNotFound(PathBuf),

    #[error("input file {0} is empty")]
    InputEmpty(PathBuf),

    #[error("error reading input file {path}: {message}")]
    InputRead { path: PathBuf, message: String },

    #[error("\"TaxID\" column not found in the input file")]
    #[diagnostic(help("the input must be tab-separated with a header row containing TaxID"))]
    MissingTaxIdColumn,

    #[error("no valid TaxIDs found in the input file")]
    NoTaxIds,

    #[error("error writing to output file {path}: {message}")]
    OutputWrite { path: PathBuf, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("required tool not found: {0}")]
    #[diagnostic(help("install NCBI datasets or pass --datasets-bin"))]
    MissingTool(String),

    #[error("failed to run taxonomy lookup for TaxID {taxid}: {message}")]
    ToolSpawn { taxid: String, message: String },

    #[error("taxonomy lookup for TaxID {taxid} exited with status {status}: {stderr}")]
    ToolStatus {
        taxid: String,
        status: String,
        stderr: String,
    },

    #[error("JSON parsing error for TaxID {taxid}: {message}")]
    InvalidJson { taxid: String, message: String },

    #[error("unexpected taxonomy response for TaxID {taxid}: {message}")]
    MalformedResponse { taxid: String, message: String },
}

impl TaxError {
    /// Whether a lookup failure could plausibly succeed on a later attempt.
    /// Only used to annotate logs; every lookup failure is retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, TaxError::ToolSpawn { .. } | TaxError::ToolStatus { .. })
    }
}
