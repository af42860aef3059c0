//! Extraction of bracketed `[Section]` blocks from module text.

use std::sync::LazyLock;

use regex::Regex;

/// A full header line: `[name]` with optional trailing whitespace.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.*)\]\s*$").expect("valid regex"));

/// A named section and its raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub name: String,
    /// Lines between the header and the next bracketed line, joined by `\n`.
    pub body: String,
}

/// Split module text into its sections, in document order.
///
/// Any line starting with `[` ends the current section. Only well-formed
/// header lines open a new one; text before the first header and after a
/// malformed bracket line belongs to no section. A leading byte order mark is
/// ignored.
///
/// # Examples
/// ```
/// use sgmodule_merger::sections::extract_sections;
///
/// let text = "#!name=Demo\n[Script]\nfoo = type=http-response\n[MITM]\nhostname = a.com\n";
/// let sections = extract_sections(text);
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[0].name, "Script");
/// assert_eq!(sections[1].body, "hostname = a.com");
/// ```
pub fn extract_sections(text: &str) -> Vec<RawSection> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in text.lines() {
        if line.starts_with('[') {
            if let Some((name, body)) = current.take() {
                sections.push(RawSection {
                    name,
                    body: body.join("\n"),
                });
            }
            match HEADER_PATTERN.captures(line) {
                Some(caps) => current = Some((caps[1].to_string(), Vec::new())),
                None => tracing::debug!(line, "Skipping malformed section header"),
            }
            continue;
        }

        if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((name, body)) = current {
        sections.push(RawSection {
            name,
            body: body.join("\n"),
        });
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(sections: &[RawSection]) -> Vec<&str> {
        sections.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_ignores_preamble() {
        let text = "#!name=Ads\n#!desc=Block [all] ads\n\n[URL Rewrite]\n^https://ad.com - reject\n";
        let sections = extract_sections(text);
        assert_eq!(names(&sections), ["URL Rewrite"]);
        assert_eq!(sections[0].body, "^https://ad.com - reject");
    }

    #[test]
    fn test_multiple_sections_in_order() {
        let text = "[Rule]\nDOMAIN,a.com,REJECT\n\n[Script]\ns = type=cron\n[MITM]\nhostname = %APPEND% a.com";
        let sections = extract_sections(text);
        assert_eq!(names(&sections), ["Rule", "Script", "MITM"]);
        assert_eq!(sections[0].body, "DOMAIN,a.com,REJECT\n");
        assert_eq!(sections[2].body, "hostname = %APPEND% a.com");
    }

    #[test]
    fn test_empty_section_does_not_swallow_next() {
        let text = "[Map Local]\n[Script]\nfoo\n";
        let sections = extract_sections(text);
        assert_eq!(names(&sections), ["Map Local", "Script"]);
        assert_eq!(sections[0].body, "");
        assert_eq!(sections[1].body, "foo");
    }

    #[test]
    fn test_crlf_and_trailing_whitespace() {
        let text = "[Rule]  \r\nDOMAIN,a.com,REJECT\r\n[MITM]\r\nhostname = a.com\r\n";
        let sections = extract_sections(text);
        assert_eq!(names(&sections), ["Rule", "MITM"]);
        assert_eq!(sections[0].body, "DOMAIN,a.com,REJECT");
    }

    #[test]
    fn test_malformed_bracket_line_ends_section() {
        let text = "[Script]\nfoo\n[broken\nbar\n[Rule]\nDOMAIN,a.com,REJECT";
        let sections = extract_sections(text);
        assert_eq!(names(&sections), ["Script", "Rule"]);
        assert_eq!(sections[0].body, "foo");
    }

    #[test]
    fn test_indented_bracket_stays_in_body() {
        let text = "[URL Rewrite]\n  [not a header]\n^https://a.com - reject";
        let sections = extract_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].body, "  [not a header]\n^https://a.com - reject");
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let text = "\u{feff}[Script]\nfoo = type=cron\n[MITM]\nhostname = a.com\n";
        let sections = extract_sections(text);
        assert_eq!(names(&sections), ["Script", "MITM"]);
        assert_eq!(sections[0].body, "foo = type=cron");
    }

    #[test]
    fn test_no_sections() {
        assert!(extract_sections("").is_empty());
        assert!(extract_sections("#!name=Nothing\n").is_empty());
    }
}
