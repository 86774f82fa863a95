//! Language-aware block decomposition.
//!
//! Splits file text into ordered top-level blocks whose concatenation (with
//! single `\n` separators and the optional final newline) reproduces the
//! input byte-for-byte. Language modes are keyed off the file extension;
//! anything unrecognized falls back to blank-line grouping. Decomposition
//! never fails on non-empty text.

use std::path::Path;

use tracing::debug;

use super::{clike, python, BlockStore};

// ── Language dispatch ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    C,
    Cpp,
    Java,
    Rust,
    Go,
    JavaScript,
    Generic,
}

impl Language {
    /// Extension-keyed mode selection; unknown extensions take Generic.
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "py" => Language::Python,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" => Language::Cpp,
            "java" => Language::Java,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            _ => Language::Generic,
        }
    }
}

/// A decomposed file: the store plus the per-block line ranges (1-based,
/// inclusive) that exist only for display purposes and are never persisted.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub store: BlockStore,
    pub line_ranges: Vec<(usize, usize)>,
}

// ── Decomposition ──────────────────────────────────────────────────────────────

/// Decompose `text` (read from `path`, which selects the language mode) into
/// a [`BlockStore`]. Empty text yields an empty store.
pub fn decompose(path: &Path, text: &str) -> Decomposition {
    let lang = Language::from_path(path);
    let (lines, file_ends_with_newline) = split_lines(text);
    let total_lines = lines.len();

    if lines.is_empty() {
        return Decomposition {
            store: BlockStore::empty(),
            line_ranges: Vec::new(),
        };
    }

    let ranges = match lang {
        Language::Generic => generic_ranges(&lines),
        Language::Python => attach_gaps(python::scan(&lines), total_lines),
        _ => attach_gaps(clike::scan(&lines, lang), total_lines),
    };
    debug_assert!(covers_all_lines(&ranges, total_lines));

    debug!(
        "[DEBUG] [decomposer] {} ({:?}): {} lines -> {} blocks",
        path.display(),
        lang,
        total_lines,
        ranges.len()
    );

    let contents = ranges
        .iter()
        .map(|&(start, end)| lines[start..end].join("\n"))
        .collect();
    let store = BlockStore::from_blocks(contents, total_lines, file_ends_with_newline);
    let line_ranges = ranges.iter().map(|&(start, end)| (start + 1, end)).collect();

    Decomposition { store, line_ranges }
}

/// Split `text` into lines without their terminating `\n`, reporting whether
/// the final byte was a newline. `"\n"` is one empty line.
pub(crate) fn split_lines(text: &str) -> (Vec<&str>, bool) {
    if text.is_empty() {
        return (Vec::new(), false);
    }
    let ends_with_newline = text.ends_with('\n');
    let body = if ends_with_newline {
        &text[..text.len() - 1]
    } else {
        text
    };
    (body.split('\n').collect(), ends_with_newline)
}

pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Turn item core ranges into a contiguous cover of all lines: the gap before
/// each core (blank lines between items) attaches to that core's block, and
/// trailing blanks attach to the last block. With no cores at all the whole
/// file is one block.
fn attach_gaps(cores: Vec<(usize, usize)>, total: usize) -> Vec<(usize, usize)> {
    if cores.is_empty() {
        return vec![(0, total)];
    }
    let mut ranges = Vec::with_capacity(cores.len());
    let mut prev_end = 0;
    let last = cores.len() - 1;
    for (idx, &(_, core_end)) in cores.iter().enumerate() {
        let end = if idx == last { total } else { core_end };
        ranges.push((prev_end, end));
        prev_end = end;
    }
    ranges
}

/// Generic mode: maximal runs of non-blank lines. A single blank line after a
/// run attaches to the preceding block; runs of two or more blank lines form
/// their own separator block. Blanks at the start of the file attach to the
/// first block, blanks at the end to the last.
fn generic_ranges(lines: &[&str]) -> Vec<(usize, usize)> {
    let n = lines.len();
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut pending_start: Option<usize> = None;
    let mut i = 0;

    while i < n {
        if is_blank(lines[i]) {
            let run_start = i;
            while i < n && is_blank(lines[i]) {
                i += 1;
            }
            let run_len = i - run_start;
            if i == n {
                // Trailing blanks.
                match ranges.last_mut() {
                    Some(last) => last.1 = n,
                    None => ranges.push((pending_start.unwrap_or(run_start), n)),
                }
            } else if ranges.is_empty() {
                // Leading blanks fuse into the first block.
                pending_start = Some(run_start);
            } else if run_len == 1 {
                if let Some(last) = ranges.last_mut() {
                    last.1 = i;
                }
            } else {
                ranges.push((run_start, i));
            }
        } else {
            let run_start = pending_start.take().unwrap_or(i);
            while i < n && !is_blank(lines[i]) {
                i += 1;
            }
            ranges.push((run_start, i));
        }
    }

    ranges
}

fn covers_all_lines(ranges: &[(usize, usize)], total: usize) -> bool {
    let mut expected = 0;
    for &(start, end) in ranges {
        if start != expected || end < start {
            return false;
        }
        expected = end;
    }
    expected == total
}
