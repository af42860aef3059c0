//! Placeholder substitution for the module template.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::DATE_FORMAT;
use crate::types::{Category, SectionMap};

/// Placeholder for the merged source headers.
pub const HEADERS_PLACEHOLDER: &str = "{headers}";

/// Placeholder for the deduplicated MITM hostnames.
pub const HOSTNAMES_PLACEHOLDER: &str = "{hostname_append}";

/// Placeholder for the build date.
pub const DATE_PLACEHOLDER: &str = "{{currentDate}}";

/// Every known placeholder, matched in one pass.
#[allow(clippy::expect_used)] // Pattern is built from fixed, escaped placeholders
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let tokens: Vec<String> = [DATE_PLACEHOLDER, HEADERS_PLACEHOLDER, HOSTNAMES_PLACEHOLDER]
        .into_iter()
        .map(str::to_string)
        .chain(Category::ALL.iter().map(Category::placeholder))
        .map(|token| regex::escape(&token))
        .collect();
    Regex::new(&tokens.join("|")).expect("valid regex")
});

/// Values substituted into the template.
#[derive(Debug, Clone)]
pub struct TemplateContext<'a> {
    pub sections: &'a SectionMap,
    /// Headers of the sources that were merged, in order.
    pub headers: &'a [String],
    /// Pre-formatted date for `{{currentDate}}`.
    pub date: String,
}

impl<'a> TemplateContext<'a> {
    /// Context dated today, local time.
    pub fn today(sections: &'a SectionMap, headers: &'a [String]) -> Self {
        Self {
            sections,
            headers,
            date: chrono::Local::now().format(DATE_FORMAT).to_string(),
        }
    }

    fn value(&self, token: &str) -> String {
        match token {
            DATE_PLACEHOLDER => self.date.clone(),
            HEADERS_PLACEHOLDER => self.headers.join(", "),
            HOSTNAMES_PLACEHOLDER => self.sections.hostnames().joined(),
            other => Category::ALL
                .into_iter()
                .find(|category| category.placeholder() == other)
                .map(|category| self.sections.joined(category))
                .unwrap_or_default(),
        }
    }
}

/// Substitute all placeholders in a single left-to-right pass.
///
/// Substituted text is never rescanned, so source content that happens to
/// contain a placeholder is written as-is. Unknown `{...}` tokens are left
/// untouched.
pub fn render(template: &str, context: &TemplateContext<'_>) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(template, |caps: &Captures<'_>| context.value(&caps[0]))
        .into_owned()
}
