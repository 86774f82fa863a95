//! Tool facades for the agent orchestrator.
//!
//! Both tools accept a JSON-shaped argument object and return the uniform
//! `{success, stdout, stderr}` envelope. The caller supplies its session's
//! [`crate::cache::ReadCache`] explicitly; nothing here is shared between
//! sessions.

pub mod edit;
pub mod read;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use edit::EditTool;
pub use read::ReadTool;

/// Uniform tool result envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolResponse {
    pub fn ok(stdout: impl Into<String>) -> Self {
        ToolResponse {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn err(stderr: impl Into<String>) -> Self {
        ToolResponse {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Arguments accepted by [`ReadTool`].
#[derive(Debug, Deserialize)]
pub struct ReadArgs {
    pub files: Vec<FileSpec>,
}

/// One file request: path plus an optional 1-based line range (negative
/// values count from the end) and raw-span rendering.
#[derive(Debug, Deserialize)]
pub struct FileSpec {
    pub path: String,
    #[serde(default)]
    pub start_line: Option<i64>,
    #[serde(default)]
    pub end_line: Option<i64>,
    #[serde(default)]
    pub raw_mode: bool,
}

/// Resolve a caller-supplied path to an absolute one against the process
/// working directory. Nonexistent paths resolve too; existence is checked
/// by the caller.
pub(crate) fn resolve_path(raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
