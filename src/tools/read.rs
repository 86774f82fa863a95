//! The `read_code` facade.
//!
//! Reads one or more files, decomposes each into blocks, populates the
//! session cache, and renders the blocks with their ids so later edits can
//! address them. Per-file failures (missing path, blown token budget) do not
//! stop the remaining files; the call as a whole succeeds only if every file
//! did.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::blockstore::decomposer::{decompose, Decomposition};
use crate::cache::ReadCache;
use crate::config;
use crate::error::{ToolError, ToolResult};
use crate::tools::{resolve_path, FileSpec, ReadArgs, ToolResponse};

pub struct ReadTool;

impl ReadTool {
    pub const NAME: &'static str = "read_code";

    /// Execute a read request against the session cache.
    pub fn execute(args: &serde_json::Value, cache: &mut ReadCache) -> ToolResponse {
        let parsed: ReadArgs = match serde_json::from_value(args.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                return ToolResponse::err(String::from(ToolError::Argument(format!(
                    "malformed read_code arguments: {e}"
                ))))
            }
        };
        if parsed.files.is_empty() {
            return ToolResponse::err(String::from(ToolError::Argument(
                "files must be a non-empty list".to_string(),
            )));
        }

        let cap = config::max_read_tokens();
        let mut sections = Vec::new();
        let mut errors = Vec::new();

        for spec in &parsed.files {
            match read_one(spec, cap, cache) {
                Ok(rendered) => sections.push(rendered),
                Err(e) => {
                    warn!("[WARN] [read_code] {e}");
                    errors.push(e.to_string());
                }
            }
        }

        ToolResponse {
            success: errors.is_empty(),
            stdout: sections.join("\n\n"),
            stderr: errors.join("\n"),
        }
    }
}

fn read_one(spec: &FileSpec, cap: usize, cache: &mut ReadCache) -> ToolResult<String> {
    let path = resolve_path(&spec.path);
    if !path.is_file() {
        return Err(ToolError::NotFound(format!(
            "file does not exist: {}",
            path.display()
        )));
    }

    let text = fs::read_to_string(&path)?;

    let estimated = config::estimate_tokens(&text);
    if estimated > cap {
        return Err(ToolError::Budget {
            path,
            estimated,
            cap,
        });
    }

    let deco = decompose(&path, &text);
    info!(
        "[INFO] [read_code] Read {} ({} lines, {} blocks)",
        path.display(),
        deco.store.total_lines,
        deco.store.len()
    );

    if deco.store.is_empty() {
        cache.put(&path, deco.store);
        return Ok(format!("{} is an empty file", path.display()));
    }

    let (lo, hi) = resolve_range(spec.start_line, spec.end_line, deco.store.total_lines);
    let rendered = if spec.raw_mode {
        render_raw(&path, &text, lo, hi)
    } else {
        render_blocks(&path, &deco, lo, hi)
    };

    // The cache always holds the full decomposition; ranges and raw mode
    // only shape the returned display.
    cache.put(&path, deco.store);
    Ok(rendered)
}

/// Resolve an optional 1-based range against `total` lines: negatives count
/// from the end (`-1` is the last line), values clamp to `[1, total]`, and
/// an inverted range is corrected by swapping.
fn resolve_range(start: Option<i64>, end: Option<i64>, total: usize) -> (usize, usize) {
    let total_i = total as i64;
    let normalize = |v: i64| -> i64 {
        if v < 0 {
            total_i + 1 + v
        } else {
            v
        }
    };
    let mut lo = start.map(normalize).unwrap_or(1).clamp(1, total_i);
    let mut hi = end.map(normalize).unwrap_or(total_i).clamp(1, total_i);
    if lo > hi {
        std::mem::swap(&mut lo, &mut hi);
    }
    (lo as usize, hi as usize)
}

fn header(path: &Path, deco: &Decomposition) -> String {
    format!(
        "{} | {} lines | {} blocks",
        path.display(),
        deco.store.total_lines,
        deco.store.len()
    )
}

/// Blocks intersecting `[lo, hi]`, each introduced by its id marker.
fn render_blocks(path: &Path, deco: &Decomposition, lo: usize, hi: usize) -> String {
    let mut out = header(path, deco);
    for (idx, id) in deco.store.id_list.iter().enumerate() {
        let (block_lo, block_hi) = deco.line_ranges[idx];
        if block_hi < lo || block_lo > hi {
            continue;
        }
        out.push_str(&format!("\n[{id}] lines {block_lo}-{block_hi}\n"));
        out.push_str(&deco.store.blocks[id].content);
    }
    out
}

/// The raw line span, without block markers.
fn render_raw(path: &Path, text: &str, lo: usize, hi: usize) -> String {
    let span: Vec<&str> = text
        .lines()
        .skip(lo - 1)
        .take(hi - lo + 1)
        .collect();
    format!("{}\n{}", path.display(), span.join("\n"))
}
