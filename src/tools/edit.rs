//! The `edit_file` facade.
//!
//! Validates a batch of block-addressed diffs, refuses to run without a
//! valid cached read of the target, applies the batch on a clone through the
//! edit engine, and commits the reconstruction through the file mutator.
//! Outcomes map to three cases: full success (file written, cache replaced),
//! partial success (file written, failures reported), and total failure
//! (nothing written, file and cache byte-identical to before the call).

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::cache::ReadCache;
use crate::engine::{apply_patches, Patch, PatchAction};
use crate::error::ToolError;
use crate::mutator;
use crate::tools::{resolve_path, ToolResponse};

pub struct EditTool;

/// A diff that failed validation or application, tagged with its 1-based
/// position in the `diffs` list.
struct DiffFailure {
    index: usize,
    description: String,
    error: String,
}

impl EditTool {
    pub const NAME: &'static str = "edit_file";

    /// Execute an edit request against the session cache.
    pub fn execute(args: &Value, cache: &mut ReadCache) -> ToolResponse {
        let (file_path, diffs) = match parse_top_level(args) {
            Ok(parts) => parts,
            Err(e) => return ToolResponse::err(String::from(e)),
        };
        let path = resolve_path(&file_path);

        // Per-diff problems become aggregated patch failures rather than
        // aborting the batch; the valid diffs still apply.
        let mut valid: Vec<(usize, Patch)> = Vec::new();
        let mut failures: Vec<DiffFailure> = Vec::new();
        for (idx, diff) in diffs.iter().enumerate() {
            let index = idx + 1;
            match parse_diff(diff, index) {
                Ok(patch) => valid.push((index, patch)),
                Err(error) => failures.push(DiffFailure {
                    index,
                    description: "invalid diff".to_string(),
                    error,
                }),
            }
        }

        let Some(store) = cache.get(&path) else {
            return ToolResponse::err(String::from(ToolError::CacheInvalid { path }));
        };

        let patches: Vec<Patch> = valid.iter().map(|(_, p)| p.clone()).collect();
        let outcome = apply_patches(store, &patches);
        for failure in &outcome.failures {
            failures.push(DiffFailure {
                index: valid[failure.index].0,
                description: failure.description.clone(),
                error: failure.error.to_string(),
            });
        }
        failures.sort_by_key(|f| f.index);

        let total = diffs.len();
        if outcome.applied == 0 && !failures.is_empty() {
            return ToolResponse::err(summary(&path, &failures, total, 0));
        }

        let new_store = match outcome.store {
            Some(store) => store,
            // Unreachable in practice: an absent store implies zero applied
            // patches with failures, handled above.
            None => return ToolResponse::err(summary(&path, &failures, total, 0)),
        };
        let content = new_store.reconstruct();
        if let Err(e) = mutator::commit(&path, &content) {
            return ToolResponse::err(String::from(ToolError::Write(e)));
        }
        // Replacing the entry also refreshes read_time and file_mtime, so
        // our own write does not invalidate the cache.
        cache.put(&path, new_store);

        info!(
            "[INFO] [edit_file] {}: {}/{} patches applied",
            path.display(),
            outcome.applied,
            total
        );

        if failures.is_empty() {
            ToolResponse::ok(format!(
                "{} modified successfully ({} patches applied)",
                path.display(),
                outcome.applied
            ))
        } else {
            ToolResponse::err(summary(&path, &failures, total, outcome.applied))
        }
    }
}

// ── Argument validation ────────────────────────────────────────────────────────

fn parse_top_level(args: &Value) -> Result<(String, Vec<Value>), ToolError> {
    let obj = args
        .as_object()
        .ok_or_else(|| ToolError::Argument("edit_file arguments must be an object".to_string()))?;

    let file_path = match obj.get("file_path") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => {
            return Err(ToolError::Argument("file_path must not be empty".to_string()))
        }
        Some(_) => return Err(ToolError::Argument("file_path must be a string".to_string())),
        None => return Err(ToolError::Argument("missing required parameter: file_path".to_string())),
    };

    let diffs = match obj.get("diffs") {
        Some(Value::Array(items)) if !items.is_empty() => items.clone(),
        Some(Value::Array(_)) => {
            return Err(ToolError::Argument("diffs must be a non-empty list".to_string()))
        }
        Some(_) => return Err(ToolError::Argument("diffs must be a list".to_string())),
        None => return Err(ToolError::Argument("missing required parameter: diffs".to_string())),
    };

    Ok((file_path, diffs))
}

/// Validate one diff object and convert it to a [`Patch`]. Errors name the
/// offending field; the caller tags them with the diff index.
fn parse_diff(diff: &Value, index: usize) -> Result<Patch, String> {
    let obj = diff
        .as_object()
        .ok_or_else(|| format!("diff {index} must be an object"))?;

    let block_id = require_string(obj, "block_id", index)?;
    if block_id.trim().is_empty() {
        return Err(format!("diff {index}: block_id must not be empty"));
    }
    let action = require_string(obj, "action", index)?;

    let action = match action.as_str() {
        "delete" => PatchAction::Delete,
        "insert_before" => PatchAction::InsertBefore {
            content: require_string(obj, "content", index)?,
        },
        "insert_after" => PatchAction::InsertAfter {
            content: require_string(obj, "content", index)?,
        },
        "replace" => PatchAction::Replace {
            content: require_string(obj, "content", index)?,
        },
        "edit" => PatchAction::Edit {
            search: require_string(obj, "search", index)?,
            replace: require_string(obj, "replace", index)?,
        },
        other => {
            return Err(format!(
                "diff {index}: unknown action `{other}` (expected delete, insert_before, \
                 insert_after, replace or edit)"
            ))
        }
    };

    Ok(Patch { block_id, action })
}

fn require_string(
    obj: &serde_json::Map<String, Value>,
    field: &str,
    index: usize,
) -> Result<String, String> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(format!("diff {index}: missing required parameter `{field}`")),
        Some(_) => Err(format!("diff {index}: `{field}` must be a string")),
    }
}

// ── Failure summaries ──────────────────────────────────────────────────────────

fn summary(path: &Path, failures: &[DiffFailure], total: usize, applied: usize) -> String {
    let details: Vec<String> = failures
        .iter()
        .map(|f| format!("  - diff {} ({}): {}", f.index, f.description, f.error))
        .collect();
    if applied == 0 {
        format!(
            "{}: edit failed, all {} patches rejected; the file was not modified.\n{}",
            path.display(),
            total,
            details.join("\n")
        )
    } else {
        format!(
            "{}: partially modified: {}/{} patches applied and written, {} failed.\n{}",
            path.display(),
            applied,
            total,
            failures.len(),
            details.join("\n")
        )
    }
}
