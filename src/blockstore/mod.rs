//! In-memory representation of a decomposed source file.
//!
//! A [`BlockStore`] holds the ordered block ids, the id → [`Block`] map, and
//! the file metadata needed to validate and reconstruct the original bytes.
//! Stores are created by the decomposer, mutated only on clones inside the
//! edit engine, and dropped when the owning cache evicts the path.

pub mod clike;
pub mod decomposer;
pub mod python;

use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

// ── Block ──────────────────────────────────────────────────────────────────────

/// A contiguous region of the source file.
///
/// `content` is the exact substring the block covers, lines joined with `\n`
/// and without the separator newline between adjacent blocks. Line numbers are
/// not persisted; they exist only transiently during decomposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub content: String,
}

impl Block {
    pub fn new(content: impl Into<String>) -> Self {
        Block {
            content: content.into(),
        }
    }
}

/// Format the id for the `index`-th block (1-based): `block-N`.
pub fn block_id(index: usize) -> String {
    format!("block-{index}")
}

// ── BlockStore ─────────────────────────────────────────────────────────────────

/// The full decomposition of one file.
///
/// Invariants: `id_list` is `["block-1", ..., "block-N"]` in scan order,
/// `blocks` has exactly the same key set, and [`BlockStore::reconstruct`]
/// reproduces the decomposed file byte-for-byte as long as no block was
/// mutated. Iteration order is dictated by `id_list`, never by map order.
#[derive(Debug, Clone)]
pub struct BlockStore {
    pub id_list: Vec<String>,
    pub blocks: HashMap<String, Block>,
    pub total_lines: usize,
    pub file_ends_with_newline: bool,
    pub read_time: SystemTime,
    pub file_mtime: SystemTime,
}

impl BlockStore {
    /// An empty store (empty file): no blocks, zero lines, no trailing newline.
    pub fn empty() -> Self {
        BlockStore {
            id_list: Vec::new(),
            blocks: HashMap::new(),
            total_lines: 0,
            file_ends_with_newline: false,
            read_time: SystemTime::now(),
            file_mtime: SystemTime::UNIX_EPOCH,
        }
    }

    /// Build a store from blocks in scan order, assigning dense `block-N` ids.
    pub fn from_blocks(
        contents: Vec<String>,
        total_lines: usize,
        file_ends_with_newline: bool,
    ) -> Self {
        let mut id_list = Vec::with_capacity(contents.len());
        let mut blocks = HashMap::with_capacity(contents.len());
        for (i, content) in contents.into_iter().enumerate() {
            let id = block_id(i + 1);
            id_list.push(id.clone());
            blocks.insert(id, Block::new(content));
        }
        BlockStore {
            id_list,
            blocks,
            total_lines,
            file_ends_with_newline,
            read_time: SystemTime::now(),
            file_mtime: SystemTime::UNIX_EPOCH,
        }
    }

    pub fn len(&self) -> usize {
        self.id_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_list.is_empty()
    }

    /// Structural consistency: ids are dense `block-1..block-N` with no
    /// duplicates, and `blocks` holds exactly the same key set.
    pub fn is_consistent(&self) -> bool {
        if self.id_list.len() != self.blocks.len() {
            return false;
        }
        for (i, id) in self.id_list.iter().enumerate() {
            if *id != block_id(i + 1) || !self.blocks.contains_key(id) {
                return false;
            }
        }
        true
    }

    /// Inverse of decomposition: emit each block's content in `id_list`
    /// order with a single `\n` between adjacent ids, then a final `\n` iff
    /// the original file ended with one.
    ///
    /// Every id contributes its separator even when its content is empty, so
    /// a deleted block leaves a blank line and batch-later patches keep their
    /// addressing.
    pub fn reconstruct(&self) -> String {
        let mut out = String::new();
        for (idx, id) in self.id_list.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            if let Some(block) = self.blocks.get(id) {
                out.push_str(&block.content);
            }
        }
        if self.file_ends_with_newline {
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(contents: &[&str], ends_with_newline: bool) -> BlockStore {
        BlockStore::from_blocks(
            contents.iter().map(|s| s.to_string()).collect(),
            0,
            ends_with_newline,
        )
    }

    #[test]
    fn test_block_id_format() {
        assert_eq!(block_id(1), "block-1");
        assert_eq!(block_id(42), "block-42");
    }

    #[test]
    fn test_from_blocks_assigns_dense_ids() {
        let s = store(&["a", "b", "c"], true);
        assert_eq!(s.id_list, vec!["block-1", "block-2", "block-3"]);
        assert!(s.is_consistent());
        assert_eq!(s.blocks["block-2"].content, "b");
    }

    #[test]
    fn test_reconstruct_joins_with_single_newline() {
        let s = store(&["line1", "line2\nline3", "line4"], true);
        assert_eq!(s.reconstruct(), "line1\nline2\nline3\nline4\n");
    }

    #[test]
    fn test_reconstruct_without_trailing_newline() {
        let s = store(&["a", "b"], false);
        assert_eq!(s.reconstruct(), "a\nb");
    }

    #[test]
    fn test_reconstruct_empty_store() {
        assert_eq!(BlockStore::empty().reconstruct(), "");
    }

    #[test]
    fn test_emptied_block_still_contributes_separator() {
        let mut s = store(&["fn a() {}", "fn b() {}"], true);
        s.blocks.get_mut("block-2").unwrap().content.clear();
        assert_eq!(s.reconstruct(), "fn a() {}\n\n");
    }

    #[test]
    fn test_consistency_detects_sparse_ids() {
        let mut s = store(&["a", "b"], true);
        s.id_list[1] = "block-9".to_string();
        let b = s.blocks.remove("block-2").unwrap();
        s.blocks.insert("block-9".to_string(), b);
        assert!(!s.is_consistent());
    }

    #[test]
    fn test_clone_is_deep() {
        let s = store(&["a"], true);
        let mut c = s.clone();
        c.blocks.get_mut("block-1").unwrap().content = "changed".to_string();
        assert_eq!(s.blocks["block-1"].content, "a");
    }
}
