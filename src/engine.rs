//! Block-addressed patch application.
//!
//! Applies an ordered batch of patches to a deep clone of a [`BlockStore`],
//! never to the caller's copy. Patches are applied in the given order with no
//! sorting or deduplication; a patch targeting the same block as an earlier
//! one sees the earlier patch's effect. Failures are collected per patch and
//! the rest of the batch continues.

use thiserror::Error;
use tracing::{debug, warn};

use crate::blockstore::BlockStore;

/// Characters of `search` shown back in a miss report.
const SEARCH_PREVIEW_CHARS: usize = 100;

// ── Patch model ────────────────────────────────────────────────────────────────

/// The closed set of block edit operations, with their payloads enforced
/// structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchAction {
    /// Empty the block's content. The id stays in the id list so later
    /// patches in the batch keep their addressing, and the emptied block
    /// still contributes its separator newline on reconstruction.
    Delete,
    InsertBefore { content: String },
    InsertAfter { content: String },
    Replace { content: String },
    Edit { search: String, replace: String },
}

impl PatchAction {
    pub fn name(&self) -> &'static str {
        match self {
            PatchAction::Delete => "delete",
            PatchAction::InsertBefore { .. } => "insert_before",
            PatchAction::InsertAfter { .. } => "insert_after",
            PatchAction::Replace { .. } => "replace",
            PatchAction::Edit { .. } => "edit",
        }
    }
}

/// One block-addressed edit instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub block_id: String,
    pub action: PatchAction,
}

impl Patch {
    /// Human-oriented one-line description for failure summaries.
    pub fn describe(&self) -> String {
        match &self.action {
            PatchAction::Edit { search, replace } => format!(
                "block_id={}, action=edit, search={}, replace={}",
                self.block_id,
                preview(search),
                preview(replace)
            ),
            PatchAction::Delete => format!("block_id={}, action=delete", self.block_id),
            PatchAction::InsertBefore { content }
            | PatchAction::InsertAfter { content }
            | PatchAction::Replace { content } => format!(
                "block_id={}, action={}, content={}",
                self.block_id,
                self.action.name(),
                preview(content)
            ),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("block id not found: {0}. Use read_code to list the file's current block ids.")]
    BlockNotFound(String),

    #[error("search text not found in block {block_id}: {preview}")]
    SearchNotFound { block_id: String, preview: String },
}

/// A patch that did not apply, with its position in the batch (0-based).
#[derive(Debug, Clone)]
pub struct PatchFailure {
    pub index: usize,
    pub description: String,
    pub error: PatchError,
}

/// Result of applying a batch: the mutated clone (absent when nothing
/// applied), the number of successful patches, and the per-patch failures.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub store: Option<BlockStore>,
    pub applied: usize,
    pub failures: Vec<PatchFailure>,
}

impl ApplyOutcome {
    pub fn all_applied(&self) -> bool {
        self.failures.is_empty()
    }
}

// ── Application ────────────────────────────────────────────────────────────────

/// Apply `patches` in order to a clone of `store`.
///
/// A pure function of its inputs: the caller's store is untouched, and
/// repeated application with the same inputs yields identical outcomes. An
/// empty batch returns an unchanged clone.
pub fn apply_patches(store: &BlockStore, patches: &[Patch]) -> ApplyOutcome {
    let mut working = store.clone();
    let mut applied = 0;
    let mut failures = Vec::new();

    for (index, patch) in patches.iter().enumerate() {
        match apply_one(&mut working, patch) {
            Ok(()) => {
                applied += 1;
                debug!(
                    "[DEBUG] [engine] Applied patch {} ({})",
                    index + 1,
                    patch.action.name()
                );
            }
            Err(error) => {
                warn!(
                    "[WARN] [engine] Patch {} failed: {}",
                    index + 1,
                    error
                );
                failures.push(PatchFailure {
                    index,
                    description: patch.describe(),
                    error,
                });
            }
        }
    }

    let store = if applied == 0 && !failures.is_empty() {
        None
    } else {
        Some(working)
    };
    ApplyOutcome {
        store,
        applied,
        failures,
    }
}

fn apply_one(store: &mut BlockStore, patch: &Patch) -> Result<(), PatchError> {
    let block = store
        .blocks
        .get_mut(&patch.block_id)
        .ok_or_else(|| PatchError::BlockNotFound(patch.block_id.clone()))?;

    match &patch.action {
        PatchAction::Delete => {
            block.content.clear();
        }
        PatchAction::InsertBefore { content } => {
            let mut inserted = content.clone();
            if !inserted.is_empty() && !inserted.ends_with('\n') {
                inserted.push('\n');
            }
            inserted.push_str(&block.content);
            block.content = inserted;
        }
        PatchAction::InsertAfter { content } => {
            let mut inserted = content.clone();
            // Guarantee a separator between the block tail and the insert
            // without doubling one that is already there.
            if !inserted.is_empty()
                && !inserted.starts_with('\n')
                && !block.content.ends_with('\n')
            {
                inserted.insert(0, '\n');
            }
            block.content.push_str(&inserted);
        }
        PatchAction::Replace { content } => {
            block.content = content.clone();
        }
        PatchAction::Edit { search, replace } => {
            if !block.content.contains(search.as_str()) {
                return Err(PatchError::SearchNotFound {
                    block_id: patch.block_id.clone(),
                    preview: preview(search),
                });
            }
            block.content = block.content.replacen(search.as_str(), replace, 1);
        }
    }
    Ok(())
}

/// First [`SEARCH_PREVIEW_CHARS`] characters, with an ellipsis when truncated.
fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(SEARCH_PREVIEW_CHARS).collect();
    if text.chars().count() > SEARCH_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}
