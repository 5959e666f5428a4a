use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for logkpi.
///
/// Malformed JSON lines are not errors: the reader recovers from them and
/// records a [`crate::reader::MalformedLine`] diagnostic instead.
#[derive(Error, Debug)]
pub enum KpiError {
    #[error("Input not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Schema error at line {line}: field `{field}` {reason}")]
    Schema {
        line: usize,
        field: &'static str,
        reason: String,
    },

    #[error("Too many malformed lines: {malformed} of {total}")]
    TooManyMalformed { malformed: usize, total: usize },

    #[error("Read failed after line {line}: {source}")]
    ReaderIo {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl KpiError {
    /// Map to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            KpiError::NotFound(_) => 2,
            KpiError::Schema { .. } => 3,
            KpiError::TooManyMalformed { .. } => 4,
            _ => 1,
        }
    }
}

impl From<figment::Error> for KpiError {
    fn from(e: figment::Error) -> Self {
        KpiError::Config(e.to_string())
    }
}
