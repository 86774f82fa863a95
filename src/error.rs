//! Error types for blockpatch

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the tool facades.
///
/// `Argument` and `Budget` abort before any side effect; `NotFound` and
/// `CacheInvalid` abort the affected file's operation; `Write` aborts the
/// whole edit call after rollback.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(
        "no valid cached read for {}: the file is unread or was modified externally. \
         Please use read_code to (re)read the file before editing.",
        path.display()
    )]
    CacheInvalid { path: PathBuf },

    #[error(
        "token budget exceeded for {}: estimated {estimated} tokens, cap is {cap}",
        path.display()
    )]
    Budget {
        path: PathBuf,
        estimated: usize,
        cap: usize,
    },

    #[error("write failed: {0}")]
    Write(#[from] crate::mutator::WriteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ToolError
pub type ToolResult<T> = Result<T, ToolError>;

/// Convert ToolError to String for the response envelope
impl From<ToolError> for String {
    fn from(error: ToolError) -> Self {
        error.to_string()
    }
}
