//! Content cleanup for section bodies.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::MAX_DIVIDER_LENGTH;

/// `hostname = ...` line inside a `[MITM]` section.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HOSTNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*hostname\s*=\s*(.*)$").expect("valid regex"));

/// Surge list operators that merge with, rather than replace, the existing list.
const HOSTNAME_OPERATORS: [&str; 2] = ["%APPEND%", "%INSERT%"];

fn is_comment(line: &str) -> bool {
    line.trim().starts_with('#')
}

/// Non-blank, non-comment lines of a section body.
///
/// Surviving lines are returned verbatim (only a trailing `\r` is dropped).
pub fn content_lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines()
        .filter(|line| !line.trim().is_empty() && !is_comment(line))
}

/// Remove blank and comment lines from a section body.
///
/// # Examples
/// ```
/// use sgmodule_merger::clean::strip_comments;
///
/// let body = "# ads\n\n^https://ad.com - reject\n  # note\n";
/// assert_eq!(strip_comments(body), "^https://ad.com - reject");
/// ```
pub fn strip_comments(body: &str) -> String {
    content_lines(body).collect::<Vec<_>>().join("\n")
}

/// Comment line announcing which source a block came from.
///
/// The header is centered in [`MAX_DIVIDER_LENGTH`] dashes; headers longer than
/// that get no dashes at all.
///
/// # Examples
/// ```
/// use sgmodule_merger::clean::divider;
///
/// assert_eq!(divider("Ads"), "# ------------- Ads --------------");
/// ```
pub fn divider(header: &str) -> String {
    let len = header.chars().count();
    let left = MAX_DIVIDER_LENGTH.saturating_sub(len) / 2;
    let right = MAX_DIVIDER_LENGTH.saturating_sub(len).saturating_sub(left);
    format!("# {} {} {}", "-".repeat(left), header, "-".repeat(right))
}

/// Hostnames listed in a `[MITM]` section body.
///
/// Only the first non-comment `hostname =` line is read. List operators are
/// removed and entries are trimmed; empty entries are dropped.
pub fn extract_hostnames(body: &str) -> Vec<String> {
    let Some(value) = content_lines(body).find_map(|line| {
        HOSTNAME_PATTERN
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }) else {
        return Vec::new();
    };

    let mut value = value.to_string();
    for operator in HOSTNAME_OPERATORS {
        value = value.replace(operator, "");
    }

    value
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}
