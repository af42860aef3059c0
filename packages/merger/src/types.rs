//! Core data types for the merger.

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

/// One remote module to merge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceDescriptor {
    /// Direct URL of the `.sgmodule` file.
    pub url: String,

    /// Label used in dividers, the headers list and log output.
    pub header: String,
}

impl SourceDescriptor {
    pub fn new(url: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            header: header.into(),
        }
    }
}

/// Module sections that are merged. Anything else in a source is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    UrlRewrite,
    MapLocal,
    Script,
    Mitm,
    Rule,
}

impl Category {
    /// All categories, in template order.
    pub const ALL: [Category; 5] = [
        Category::UrlRewrite,
        Category::MapLocal,
        Category::Script,
        Category::Mitm,
        Category::Rule,
    ];

    /// Section name as it appears between brackets.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrlRewrite => "URL Rewrite",
            Self::MapLocal => "Map Local",
            Self::Script => "Script",
            Self::Mitm => "MITM",
            Self::Rule => "Rule",
        }
    }

    /// Match a section name exactly (case-sensitive).
    #[must_use]
    pub fn from_section_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Template placeholder for this category, e.g. `{Script}`.
    #[must_use]
    pub fn placeholder(&self) -> String {
        format!("{{{}}}", self.as_str())
    }
}

/// Action keyword of a rule line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// `REJECT` or one of its variants (`REJECT-DROP`, `REJECT-TINYGIF`, ...).
    Reject(String),
    Direct,
}

impl Policy {
    #[must_use]
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct)
    }
}

/// A rule with its policy keyword split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLine {
    /// Rule text without the policy field.
    pub rule: String,
    pub policy: Option<Policy>,
}

/// Rules contributed by one `[Rule]` section of one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBlock {
    pub header: String,
    pub rules: Vec<RuleLine>,
}

impl RuleBlock {
    /// Block text as rendered into the module: one policy-free rule per line.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.rules
            .iter()
            .map(|r| r.rule.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Order-preserving set of MITM hostnames. The first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostnameSet {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl HostnameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a hostname; returns `false` if it was already present.
    pub fn insert(&mut self, hostname: impl Into<String>) -> bool {
        let hostname = hostname.into();
        if self.seen.contains(&hostname) {
            return false;
        }
        self.seen.insert(hostname.clone());
        self.ordered.push(hostname);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Hostnames joined with `", "`, as Surge expects in a `hostname =` line.
    #[must_use]
    pub fn joined(&self) -> String {
        self.ordered.join(", ")
    }
}

impl<S: Into<String>> Extend<S> for HostnameSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for hostname in iter {
            self.insert(hostname);
        }
    }
}

/// Accumulated content per category, in source-iteration order.
#[derive(Debug, Clone, Default)]
pub struct SectionMap {
    text_blocks: BTreeMap<Category, Vec<String>>,
    rule_blocks: Vec<RuleBlock>,
    hostnames: HostnameSet,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cleaned text block for `URL Rewrite`, `Map Local` or `Script`.
    pub fn push_block(&mut self, category: Category, block: String) {
        debug_assert!(
            !matches!(category, Category::Rule | Category::Mitm),
            "rule and MITM content have dedicated accumulators"
        );
        self.text_blocks.entry(category).or_default().push(block);
    }

    pub fn push_rules(&mut self, block: RuleBlock) {
        self.rule_blocks.push(block);
    }

    pub fn extend_hostnames<I, S>(&mut self, hostnames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hostnames.extend(hostnames);
    }

    /// Text blocks of a category. Empty for `Rule` and `MITM`.
    pub fn blocks(&self, category: Category) -> &[String] {
        self.text_blocks
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn rule_blocks(&self) -> &[RuleBlock] {
        &self.rule_blocks
    }

    pub fn hostnames(&self) -> &HostnameSet {
        &self.hostnames
    }

    /// Number of entries held for a category (hostnames for `MITM`).
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Rule => self.rule_blocks.len(),
            Category::Mitm => self.hostnames.len(),
            other => self.blocks(other).len(),
        }
    }

    pub fn has_rules(&self) -> bool {
        self.rule_blocks.iter().any(|b| !b.rules.is_empty())
    }

    /// The content substituted for a category's placeholder.
    #[must_use]
    pub fn joined(&self, category: Category) -> String {
        match category {
            Category::Mitm => self.hostnames.joined(),
            Category::Rule => self
                .rule_blocks
                .iter()
                .map(RuleBlock::to_text)
                .collect::<Vec<_>>()
                .join("\n\n"),
            other => self.blocks(other).join("\n\n"),
        }
    }
}
