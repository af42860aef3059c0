//! `[Rule]` handling: policy stripping, rule list assembly and statistics.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::clean::content_lines;
use crate::types::{Policy, RuleBlock, RuleLine};

/// Prefix of the comment that introduces a source's group in a rule list.
pub const GROUP_HEADER_PREFIX: &str = "# >> ";

/// Rule types counted by [`RuleStats`]. Everything else is counted as `OTHER`.
const RULE_TYPES: [&str; 10] = [
    "DOMAIN",
    "DOMAIN-SUFFIX",
    "DOMAIN-KEYWORD",
    "IP-CIDR",
    "IP-CIDR6",
    "IP-ASN",
    "USER-AGENT",
    "URL-REGEX",
    "PROCESS-NAME",
    "GEOIP",
];

fn parse_policy(field: &str) -> Option<Policy> {
    match field {
        "DIRECT" => Some(Policy::Direct),
        "REJECT" => Some(Policy::Reject(field.to_string())),
        _ => {
            let variant = field.strip_prefix("REJECT-")?;
            let valid = !variant.is_empty()
                && variant
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-');
            valid.then(|| Policy::Reject(field.to_string()))
        }
    }
}

/// Split the policy keyword off a rule line.
///
/// The policy is the last field from the third on that names a
/// `REJECT`-family or `DIRECT` policy; it is removed and options after it are
/// kept. Fields are trimmed, so spacing after commas does not affect
/// deduplication.
///
/// # Examples
/// ```
/// use sgmodule_merger::rules::split_policy;
/// use sgmodule_merger::types::Policy;
///
/// let line = split_policy("DOMAIN-SUFFIX,ads.com,REJECT-TINYGIF,extended-matching");
/// assert_eq!(line.rule, "DOMAIN-SUFFIX,ads.com,extended-matching");
/// assert_eq!(line.policy, Some(Policy::Reject("REJECT-TINYGIF".to_string())));
/// ```
pub fn split_policy(line: &str) -> RuleLine {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();

    // Type and value come first; a keyword value such as `DIRECT` is not a policy.
    let found = fields
        .iter()
        .enumerate()
        .skip(2)
        .rev()
        .find_map(|(index, field)| parse_policy(field).map(|policy| (index, policy)));

    let (index, policy) = match found {
        Some((index, policy)) => (Some(index), Some(policy)),
        None => (None, None),
    };
    let rule = fields
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != index)
        .map(|(_, field)| *field)
        .collect::<Vec<_>>()
        .join(",");

    RuleLine { rule, policy }
}

/// Build a rule block from a `[Rule]` section body.
pub fn rule_block(header: &str, body: &str) -> RuleBlock {
    RuleBlock {
        header: header.to_string(),
        rules: content_lines(body).map(split_policy).collect(),
    }
}

/// A deduplicated rule list grouped by source.
#[derive(Debug, Default)]
struct GroupedList {
    lines: Vec<String>,
    seen: HashSet<String>,
    current_header: Option<String>,
}

impl GroupedList {
    fn push(&mut self, header: &str, rule: &str) -> bool {
        if !self.seen.insert(rule.to_string()) {
            return false;
        }
        if self.current_header.as_deref() != Some(header) {
            if !self.lines.is_empty() {
                self.lines.push(String::new());
            }
            self.lines.push(format!("{GROUP_HEADER_PREFIX}{header}"));
            self.current_header = Some(header.to_string());
        }
        self.lines.push(rule.to_string());
        true
    }

    fn into_text(self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Merged rule lists, ready to be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleLists {
    /// Every rule not marked `DIRECT`.
    pub reject: String,
    /// Rules marked `DIRECT`.
    pub direct: String,
}

/// Assemble the reject and direct rule lists from all rule blocks.
///
/// Rules are deduplicated per list on their policy-free text; the first
/// occurrence wins. A `# >> <header>` line opens each source's group, and only
/// sources that add at least one new rule get a group.
pub fn build_rule_lists(blocks: &[RuleBlock]) -> RuleLists {
    let mut reject = GroupedList::default();
    let mut direct = GroupedList::default();
    let mut duplicates = 0usize;

    for block in blocks {
        for line in &block.rules {
            let list = match &line.policy {
                Some(policy) if policy.is_direct() => &mut direct,
                _ => &mut reject,
            };
            if !list.push(&block.header, &line.rule) {
                duplicates += 1;
            }
        }
    }

    tracing::debug!(duplicates, "Built rule lists");

    RuleLists {
        reject: reject.into_text(),
        direct: direct.into_text(),
    }
}

/// Per-type rule counts of a rule list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleStats {
    counts: BTreeMap<&'static str, usize>,
    total: usize,
}

impl RuleStats {
    /// Count the rules in a rule list, skipping comments and blank lines.
    pub fn from_list(text: &str) -> Self {
        let mut stats = Self::default();
        for line in content_lines(text) {
            let rule_type = line.split(',').next().unwrap_or_default().trim();
            let key = RULE_TYPES
                .iter()
                .copied()
                .find(|t| t.eq_ignore_ascii_case(rule_type))
                .unwrap_or("OTHER");
            *stats.counts.entry(key).or_default() += 1;
            stats.total += 1;
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn count(&self, rule_type: &str) -> usize {
        self.counts.get(rule_type).copied().unwrap_or_default()
    }
}

impl fmt::Display for RuleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(rule_type, count)| format!("{rule_type}: {count}"))
            .collect();
        if parts.is_empty() {
            write!(f, "no rules")
        } else {
            write!(f, "{} ({})", self.total, parts.join(", "))
        }
    }
}
