//! Header-based unified-diff scanning.
//!
//! Only file headers matter here (hunk contents are the apply tool's
//! problem). The scanner:
//! - accepts `diff --git a/.. b/..` as well as bare `---`/`+++` pairs,
//! - treats `/dev/null` on either side as create/delete,
//! - tolerates CRLF and mixed line endings,
//! - preserves first-seen order and drops duplicates.

/// Extracts the relative paths a unified diff touches, in order of
/// appearance. An empty or headerless blob yields an empty list.
pub fn affected_files(diff: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |path: Option<String>| {
        if let Some(p) = path {
            if !p.is_empty() && !out.contains(&p) {
                out.push(p);
            }
        }
    };

    let mut pending_old: Option<String> = None;

    for raw in diff.lines() {
        let line = raw.trim_end_matches('\r');

        if let Some(rest) = line.strip_prefix("diff --git ") {
            // "diff --git a/path b/path": take the b-side; the a-side only
            // matters for deletes, which the ---/+++ pair below still covers.
            if let Some(b) = rest.split_whitespace().last() {
                push(strip_prefix_marker(b));
            }
            pending_old = None;
        } else if let Some(rest) = line.strip_prefix("--- ") {
            pending_old = strip_prefix_marker(header_path(rest));
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            let new_side = strip_prefix_marker(header_path(rest));
            match new_side {
                Some(p) => push(Some(p)),
                // +++ /dev/null: a deletion; the old side names the file.
                None => push(pending_old.take()),
            }
            pending_old = None;
        }
    }

    out
}

/// Cuts a header payload at the first tab (git appends timestamps after one).
fn header_path(rest: &str) -> &str {
    rest.split('\t').next().unwrap_or(rest).trim()
}

/// Drops the `a/`/`b/` prefix; maps `/dev/null` to `None`.
fn strip_prefix_marker(path: &str) -> Option<String> {
    let path = path.trim();
    if path == "/dev/null" {
        return None;
    }
    let stripped = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path);
    Some(stripped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FILE_DIFF: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,2 +1,2 @@
-old
+new
 ctx
diff --git a/README.md b/README.md
--- a/README.md
+++ b/README.md
@@ -1 +1 @@
-a
+b
";

    #[test]
    fn extracts_in_order_of_appearance() {
        assert_eq!(affected_files(TWO_FILE_DIFF), vec!["src/lib.rs", "README.md"]);
    }

    #[test]
    fn create_and_delete_via_dev_null() {
        let diff = "\
--- /dev/null
+++ b/new_file.txt
@@ -0,0 +1 @@
+hello
--- a/gone.txt
+++ /dev/null
@@ -1 +0,0 @@
-bye
";
        assert_eq!(affected_files(diff), vec!["new_file.txt", "gone.txt"]);
    }

    #[test]
    fn tolerates_crlf_and_dedupes() {
        let diff = "--- a/x.rs\r\n+++ b/x.rs\r\n@@ -1 +1 @@\r\n-1\r\n+2\r\n\
--- a/x.rs\n+++ b/x.rs\n@@ -3 +3 @@\n-3\n+4\n";
        assert_eq!(affected_files(diff), vec!["x.rs"]);
    }

    #[test]
    fn empty_diff_is_empty() {
        assert!(affected_files("").is_empty());
        assert!(affected_files("no headers at all\njust text\n").is_empty());
    }

    #[test]
    fn header_timestamps_are_cut() {
        let diff = "--- a/f.txt\t2026-01-01 00:00:00\n+++ b/f.txt\t2026-01-02 00:00:00\n";
        assert_eq!(affected_files(diff), vec!["f.txt"]);
    }
}
