//! Diff rendering for regenerated corpus files.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// How a regenerated file relates to the one it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChange {
    New,
    Unchanged,
    Changed,
}

#[must_use]
pub fn classify_change(previous: Option<&str>, current: &str) -> FileChange {
    match previous {
        None => FileChange::New,
        Some(prev) if prev == current => FileChange::Unchanged,
        Some(_) => FileChange::Changed,
    }
}

/// Render a line diff between the previous and regenerated text.
#[must_use]
pub fn render_diff(expected: &str, actual: &str) -> String {
    if expected == actual {
        return String::from("[identical]");
    }

    let mut out = String::new();
    out.push_str("--- previous\n");
    out.push_str("+++ regenerated\n");
    let old: Vec<&str> = expected.lines().collect();
    let new: Vec<&str> = actual.lines().collect();
    for i in 0..old.len().max(new.len()) {
        let (e, a) = (old.get(i), new.get(i));
        if e == a {
            continue;
        }
        writeln!(out, "@@ line {} @@", i + 1).ok();
        if let Some(e) = e {
            writeln!(out, "-{e}").ok();
        }
        if let Some(a) = a {
            writeln!(out, "+{a}").ok();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_is_marked() {
        assert_eq!(render_diff("0\t0\n", "0\t0\n"), "[identical]");
        assert_eq!(classify_change(Some("x"), "x"), FileChange::Unchanged);
        assert_eq!(classify_change(None, "x"), FileChange::New);
    }

    #[test]
    fn length_changes_show_dropped_and_added_lines() {
        let diff = render_diff("0\t1\t97\t97\t0\n1\t0\n", "0\t0\n");
        assert_eq!(
            diff,
            "--- previous\n+++ regenerated\n@@ line 1 @@\n-0\t1\t97\t97\t0\n+0\t0\n@@ line 2 @@\n-1\t0\n"
        );
    }
}
