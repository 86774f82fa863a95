//! Delimiter-depth block scanner for brace-structured languages.
//!
//! Covers C, C++, Java, Rust, Go and JavaScript with one state machine:
//! directive runs (preprocessor, import/use/package) group into single items,
//! and everything else is an item that extends until brace/paren/bracket
//! depth returns to zero at a line that closes it. The scanner is aware of
//! line comments, block comments, and string/char literals so delimiters
//! inside them are not counted. Comment and attribute lines attach to the
//! item that follows them.

use super::decomposer::{is_blank, Language};

/// Scan `lines` and return the `[start, end)` line ranges of top-level items,
/// in order. Blank lines between items are left unassigned; the caller
/// attaches them to the following item.
pub fn scan(lines: &[&str], lang: Language) -> Vec<(usize, usize)> {
    let n = lines.len();
    let mut cores = Vec::new();
    let mut i = 0;

    while i < n {
        if is_blank(lines[i]) {
            i += 1;
            continue;
        }

        let start = i;

        if let Some(end) = scan_directive_run(lines, i, lang) {
            cores.push((start, end));
            i = end;
            continue;
        }

        // General item: track delimiter depth until a line closes it.
        let mut state = ScanState::new(lang);
        loop {
            let info = state.feed_line(lines[i]);
            i += 1;
            if state.at_top_level() && line_terminates_item(lang, &info) {
                break;
            }
            if i >= n {
                break;
            }
            // An unterminated fragment at depth zero ends at a blank line,
            // so malformed text degrades to chunk grouping.
            if state.at_top_level() && is_blank(lines[i]) {
                break;
            }
        }
        cores.push((start, i));
    }

    cores
}

/// Whether the line that just ended completes the current item.
fn line_terminates_item(lang: Language, info: &LineInfo) -> bool {
    match lang {
        // Go has no statement semicolons: any line that returns to depth
        // zero with real code on it ends the item.
        Language::Go => info.last_code_char.is_some(),
        _ => matches!(info.last_code_char, Some('}') | Some(';')),
    }
}

// ── Directive runs ─────────────────────────────────────────────────────────────

/// If `lines[i]` opens a directive run for `lang` (preprocessor group,
/// import/use run, package line), consume the maximal run and return the
/// index one past it.
fn scan_directive_run(lines: &[&str], i: usize, lang: Language) -> Option<usize> {
    match lang {
        Language::C | Language::Cpp => scan_preprocessor_run(lines, i),
        Language::Java => scan_statement_run(lines, i, lang, is_java_import),
        Language::Rust => scan_statement_run(lines, i, lang, is_rust_use),
        Language::Go => {
            let trimmed = lines[i].trim_start();
            if trimmed.starts_with("package ") {
                Some(i + 1)
            } else {
                scan_statement_run(lines, i, lang, is_go_import)
            }
        }
        Language::JavaScript => scan_statement_run(lines, i, lang, is_js_import),
        Language::Python | Language::Generic => None,
    }
}

/// Consecutive `#` lines, honoring trailing-backslash continuations.
fn scan_preprocessor_run(lines: &[&str], start: usize) -> Option<usize> {
    if !lines[start].trim_start().starts_with('#') {
        return None;
    }
    let mut i = start;
    let mut continued = false;
    while i < lines.len() && !is_blank(lines[i]) {
        if !continued && !lines[i].trim_start().starts_with('#') {
            break;
        }
        continued = lines[i].trim_end().ends_with('\\');
        i += 1;
    }
    Some(i)
}

/// A run of statements matched by `predicate`, each consumed through its
/// closing delimiter (multi-line imports and grouped `use` trees included).
fn scan_statement_run(
    lines: &[&str],
    start: usize,
    lang: Language,
    predicate: fn(&str) -> bool,
) -> Option<usize> {
    if !predicate(lines[start]) {
        return None;
    }
    let mut i = start;
    while i < lines.len() && !is_blank(lines[i]) && predicate(lines[i]) {
        let mut state = ScanState::new(lang);
        loop {
            let info = state.feed_line(lines[i]);
            i += 1;
            if state.at_top_level() && line_terminates_item(lang, &info) {
                break;
            }
            if i >= lines.len() || (state.at_top_level() && is_blank(lines[i])) {
                break;
            }
        }
    }
    Some(i)
}

fn is_java_import(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("import ") || t.starts_with("import static ")
}

fn is_rust_use(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("use ") || t.starts_with("pub use ") || t.starts_with("pub(crate) use ")
}

fn is_go_import(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("import ") || t.starts_with("import(")
}

fn is_js_import(line: &str) -> bool {
    let t = line.trim_start();
    if t.starts_with("import ") || t.starts_with("import{") {
        return true;
    }
    (t.starts_with("const ") || t.starts_with("let ") || t.starts_with("var "))
        && t.contains("require(")
}

// ── Line-level scan state ──────────────────────────────────────────────────────

struct LineInfo {
    /// Last non-whitespace character outside comments, if any.
    last_code_char: Option<char>,
}

struct ScanState {
    lang: Language,
    depth: i32,
    in_block_comment: bool,
    /// Delimiter of a string literal that spans lines (Rust `"`,
    /// Go and JavaScript backticks).
    open_string: Option<char>,
}

impl ScanState {
    fn new(lang: Language) -> Self {
        ScanState {
            lang,
            depth: 0,
            in_block_comment: false,
            open_string: None,
        }
    }

    fn at_top_level(&self) -> bool {
        self.depth == 0 && !self.in_block_comment && self.open_string.is_none()
    }

    /// Advance the state over one line and report what it saw.
    fn feed_line(&mut self, line: &str) -> LineInfo {
        let mut chars = line.chars().peekable();
        let mut last_code_char = None;
        let mut in_string: Option<char> = self.open_string.take();

        while let Some(c) = chars.next() {
            if self.in_block_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.in_block_comment = false;
                }
                continue;
            }
            if let Some(quote) = in_string {
                if !c.is_whitespace() {
                    last_code_char = Some(c);
                }
                if c == '\\' && quote != '`' {
                    chars.next();
                } else if c == quote {
                    in_string = None;
                }
                continue;
            }
            match c {
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    self.in_block_comment = true;
                    continue;
                }
                '"' => in_string = Some('"'),
                '`' if matches!(self.lang, Language::Go | Language::JavaScript) => {
                    in_string = Some('`')
                }
                '\'' => {
                    if self.lang == Language::Rust {
                        // Only a real char literal opens a quote; a lifetime
                        // (`'a`) is a bare tick.
                        if starts_char_literal(&chars) {
                            in_string = Some('\'');
                        }
                    } else {
                        in_string = Some('\'');
                    }
                }
                '{' | '(' | '[' => self.depth += 1,
                '}' | ')' | ']' => self.depth = (self.depth - 1).max(0),
                _ => {}
            }
            if !c.is_whitespace() {
                last_code_char = Some(c);
            }
        }

        // Only multi-line-capable literals survive past the end of the line.
        self.open_string = match in_string {
            Some('`') => Some('`'),
            Some('"') if self.lang == Language::Rust => Some('"'),
            _ => None,
        };

        LineInfo { last_code_char }
    }
}

/// Peek whether a `'` begins a char literal (escape or single char followed
/// by a closing `'`) rather than a lifetime.
fn starts_char_literal(chars: &std::iter::Peekable<std::str::Chars<'_>>) -> bool {
    let mut ahead = chars.clone();
    match ahead.next() {
        Some('\\') => true,
        Some(_) => ahead.next() == Some('\''),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_c_preprocessor_group_and_functions() {
        let src = lines(
            "#include <stdio.h>\n#include <stdlib.h>\n\nvoid hello() {\n    printf(\"hi\\n\");\n}\n\nint add(int a, int b) {\n    return a + b;\n}",
        );
        let cores = scan(&src, Language::C);
        assert_eq!(cores, vec![(0, 2), (3, 6), (7, 10)]);
    }

    #[test]
    fn test_c_struct_with_trailing_semicolon() {
        let src = lines("struct Point {\n    int x;\n    int y;\n};\n\nint main() {\n    return 0;\n}");
        let cores = scan(&src, Language::C);
        assert_eq!(cores, vec![(0, 4), (5, 8)]);
    }

    #[test]
    fn test_java_package_import_class() {
        let src = lines(
            "package com.example;\n\nimport java.util.List;\nimport java.util.Map;\n\npublic class Main {\n    void run() {\n    }\n}",
        );
        let cores = scan(&src, Language::Java);
        assert_eq!(cores, vec![(0, 1), (2, 4), (5, 9)]);
    }

    #[test]
    fn test_rust_use_run_and_items() {
        let src = lines(
            "use std::collections::HashMap;\nuse std::fs;\n\n#[derive(Debug)]\nstruct Point {\n    x: i32,\n}\n\nimpl Point {\n    fn new() -> Self {\n        Point { x: 0 }\n    }\n}",
        );
        let cores = scan(&src, Language::Rust);
        assert_eq!(cores, vec![(0, 2), (3, 7), (8, 13)]);
    }

    #[test]
    fn test_rust_lifetimes_do_not_open_literals() {
        let src = lines("fn get<'a>(s: &'a str) -> &'a str {\n    s\n}\n\nconst ANSWER: i32 = 42;");
        let cores = scan(&src, Language::Rust);
        assert_eq!(cores, vec![(0, 3), (4, 5)]);
    }

    #[test]
    fn test_go_package_import_group_func() {
        let src = lines(
            "package main\n\nimport (\n    \"fmt\"\n    \"os\"\n)\n\nfunc main() {\n    fmt.Println(\"hi\")\n}\n\nvar count = 0",
        );
        let cores = scan(&src, Language::Go);
        assert_eq!(cores, vec![(0, 1), (2, 6), (7, 10), (11, 12)]);
    }

    #[test]
    fn test_js_import_run_and_arrow_const() {
        let src = lines(
            "import fs from \"fs\";\nconst path = require(\"path\");\n\nconst arrow = () => {\n    return 42;\n};\n\nfunction hello() {\n    console.log(\"hi\");\n}",
        );
        let cores = scan(&src, Language::JavaScript);
        assert_eq!(cores, vec![(0, 2), (3, 6), (7, 10)]);
    }

    #[test]
    fn test_doc_comments_attach_to_following_item() {
        let src = lines("/// Adds two numbers.\nfn add(a: i32, b: i32) -> i32 {\n    a + b\n}");
        let cores = scan(&src, Language::Rust);
        assert_eq!(cores, vec![(0, 4)]);
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let src = lines("char *s = \"{ not a brace\";\n\nint x = 1;");
        let cores = scan(&src, Language::C);
        assert_eq!(cores, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn test_block_comment_spanning_lines() {
        let src = lines("/* a comment\n   spanning lines */\nint x = 1;");
        let cores = scan(&src, Language::C);
        assert_eq!(cores, vec![(0, 3)]);
    }
}
