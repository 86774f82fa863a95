//! Python block scanner.
//!
//! Produces the line ranges of top-level items: import runs, decorated
//! function/class definitions (bodies tracked by indentation), and plain
//! statement chunks delimited by blank lines. Nested defs and classes stay
//! inside their enclosing top-level item.

use super::decomposer::is_blank;

/// Scan `lines` and return the `[start, end)` line ranges of top-level items,
/// in order. Blank lines between items are left unassigned; the caller
/// attaches them to the following item.
pub fn scan(lines: &[&str]) -> Vec<(usize, usize)> {
    let n = lines.len();
    let mut cores = Vec::new();
    let mut i = 0;

    while i < n {
        if is_blank(lines[i]) {
            i += 1;
            continue;
        }

        let start = i;

        if is_indented(lines[i]) {
            // Stray continuation at top level; group until the next blank.
            while i < n && !is_blank(lines[i]) {
                i += 1;
            }
            cores.push((start, i));
            continue;
        }

        if is_import_start(lines[i]) {
            while i < n && !is_blank(lines[i]) && is_import_start(lines[i]) {
                i = consume_statement(lines, i);
            }
            cores.push((start, i));
            continue;
        }

        if is_decorator(lines[i]) || is_def_start(lines[i]) {
            while i < n && is_decorator(lines[i]) {
                i = consume_statement(lines, i);
            }
            if i < n && is_def_start(lines[i]) {
                i += 1;
                // The body runs while lines are blank or indented.
                while i < n && (is_blank(lines[i]) || is_indented(lines[i])) {
                    i += 1;
                }
            }
            // Trailing blanks belong to the gap, not the item.
            let mut end = i;
            while end > start && is_blank(lines[end - 1]) {
                end -= 1;
            }
            cores.push((start, end));
            continue;
        }

        // Plain top-level chunk: runs until a blank line or a recognized item.
        i += 1;
        while i < n
            && !is_blank(lines[i])
            && !(is_top_level(lines[i]) && is_item_start(lines[i]))
        {
            i += 1;
        }
        cores.push((start, i));
    }

    cores
}

fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

fn is_top_level(line: &str) -> bool {
    !is_blank(line) && !is_indented(line)
}

fn is_import_start(line: &str) -> bool {
    if is_indented(line) {
        return false;
    }
    line.starts_with("import ") || line.starts_with("from ")
}

fn is_def_start(line: &str) -> bool {
    if is_indented(line) {
        return false;
    }
    line.starts_with("def ") || line.starts_with("async def ") || line.starts_with("class ")
}

fn is_decorator(line: &str) -> bool {
    !is_indented(line) && line.starts_with('@')
}

fn is_item_start(line: &str) -> bool {
    is_import_start(line) || is_def_start(line) || is_decorator(line)
}

/// Consume one logical statement starting at `i`: the line plus any
/// continuation lines held open by unbalanced brackets or a trailing
/// backslash. Returns the index one past the statement.
fn consume_statement(lines: &[&str], mut i: usize) -> usize {
    let mut balance = bracket_balance(lines[i]);
    let mut continued = lines[i].trim_end().ends_with('\\');
    i += 1;
    while i < lines.len() && (balance > 0 || continued) {
        balance += bracket_balance(lines[i]);
        continued = lines[i].trim_end().ends_with('\\');
        i += 1;
    }
    i
}

/// Net bracket balance of a line, ignoring everything after a `#` comment.
fn bracket_balance(line: &str) -> i32 {
    let code = line.split('#').next().unwrap_or(line);
    let mut balance = 0;
    for c in code.chars() {
        match c {
            '(' | '[' | '{' => balance += 1,
            ')' | ']' | '}' => balance -= 1,
            _ => {}
        }
    }
    balance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_imports_group_into_one_run() {
        let src = lines("import os\nimport sys\nfrom typing import List\n\nx = 1");
        let cores = scan(&src);
        assert_eq!(cores, vec![(0, 3), (4, 5)]);
    }

    #[test]
    fn test_def_body_tracked_by_indentation() {
        let src = lines("def hello():\n    print(\"hi\")\n\ndef add(a, b):\n    return a + b");
        let cores = scan(&src);
        assert_eq!(cores, vec![(0, 2), (3, 5)]);
    }

    #[test]
    fn test_nested_class_stays_in_enclosing_item() {
        let src = lines(
            "class Outer:\n    def __init__(self):\n        pass\n\n    class Inner:\n        def method(self):\n            pass\n\ndef standalone():\n    pass",
        );
        let cores = scan(&src);
        assert_eq!(cores, vec![(0, 7), (8, 10)]);
    }

    #[test]
    fn test_decorator_attaches_to_following_def() {
        let src = lines("@decorator\ndef f():\n    pass");
        let cores = scan(&src);
        assert_eq!(cores, vec![(0, 3)]);
    }

    #[test]
    fn test_interleaved_import_is_its_own_run() {
        let src = lines("def f():\n    pass\n\nimport json\n\ndef g():\n    pass");
        let cores = scan(&src);
        assert_eq!(cores, vec![(0, 2), (3, 4), (5, 7)]);
    }

    #[test]
    fn test_multiline_import_with_parens() {
        let src = lines("from typing import (\n    List,\n    Dict,\n)\nimport os\n\nx = 1");
        let cores = scan(&src);
        assert_eq!(cores, vec![(0, 5), (6, 7)]);
    }

    #[test]
    fn test_plain_chunk_splits_at_item_start() {
        let src = lines("# header comment\nimport os");
        let cores = scan(&src);
        assert_eq!(cores, vec![(0, 1), (1, 2)]);
    }
}
