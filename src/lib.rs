//! blockpatch - structured block-addressed code reading and editing
//!
//! The read/edit core of an AI coding assistant: source files are decomposed
//! into ordered, stably-identified blocks, the decomposition is cached per
//! session keyed by absolute path with mtime validation, and block-addressed
//! patch batches are applied as atomic, rollback-safe file mutations.
//!
//! The crate exposes two facades, [`ReadTool`] and [`EditTool`], that accept
//! JSON-shaped argument objects and return a `{success, stdout, stderr}`
//! envelope. Everything underneath is a plain synchronous library: the
//! decomposer never fails on non-empty text, the engine mutates only clones,
//! and the mutator either commits the whole reconstruction or leaves the
//! file byte-identical to its prior state.

pub mod blockstore;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod mutator;
pub mod tools;

pub use blockstore::decomposer::{decompose, Decomposition, Language};
pub use blockstore::{Block, BlockStore};
pub use cache::{ReadCache, MTIME_TOLERANCE};
pub use engine::{apply_patches, ApplyOutcome, Patch, PatchAction, PatchError};
pub use error::{ToolError, ToolResult};
pub use tools::{EditTool, ReadTool, ToolResponse};
