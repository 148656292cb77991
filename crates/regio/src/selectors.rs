//! Selector table: nested region names mapped to CSS selector fragments.
//!
//! ```yaml
//! header:
//!   title: "h1.title"
//!   nav:
//!     links: "nav a"
//! results: "ul.results > li"
//! ```
//!
//! Each dot-segment of a region name descends one level, so `header.nav.links`
//! names `"nav a"`. The table is immutable once built.

use crate::result::{RegioError, RegioResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Characters that would make a key unreachable through a selector path
const RESERVED_KEY_CHARS: [char; 5] = ['.', '[', ']', '(', ')'];

/// A node of the selector table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorNode {
    /// CSS selector fragment
    Selector(String),
    /// Nested regions
    Group(BTreeMap<String, SelectorNode>),
}

/// Immutable mapping from region names to CSS selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, SelectorNode>",
    into = "BTreeMap<String, SelectorNode>"
)]
pub struct SelectorTable {
    root: BTreeMap<String, SelectorNode>,
}

impl SelectorTable {
    /// Build a table from its root group
    ///
    /// # Errors
    ///
    /// Returns [`RegioError::Config`] if a key is empty or contains one of
    /// `.[]()`, or if a selector is blank.
    pub fn new(root: BTreeMap<String, SelectorNode>) -> RegioResult<Self> {
        validate_group(&root, "")?;
        Ok(Self { root })
    }

    /// Parse a table from YAML
    pub fn from_yaml_str(source: &str) -> RegioResult<Self> {
        let root: BTreeMap<String, SelectorNode> = serde_yaml_ng::from_str(source)?;
        Self::new(root)
    }

    /// Parse a table from JSON
    pub fn from_json_str(source: &str) -> RegioResult<Self> {
        let root: BTreeMap<String, SelectorNode> = serde_json::from_str(source)?;
        Self::new(root)
    }

    /// Load a table from a file; `.json` files are JSON, anything else YAML
    pub fn load(path: impl AsRef<Path>) -> RegioResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        if is_json(path) {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }

    /// Look up the CSS selector for a dotted region name
    ///
    /// # Errors
    ///
    /// - [`RegioError::UnknownRegion`] if a segment is missing, naming the
    ///   prefix up to and including that segment
    /// - [`RegioError::NotASelector`] if the name stops on a group
    pub fn selector(&self, region: &str) -> RegioResult<&str> {
        let mut node: Option<&SelectorNode> = None;

        for (depth, segment) in region.split('.').enumerate() {
            let group = match node {
                None => &self.root,
                Some(SelectorNode::Group(group)) => group,
                Some(SelectorNode::Selector(_)) => {
                    return Err(unknown_region(region, depth + 1));
                }
            };
            node = Some(
                group
                    .get(segment)
                    .ok_or_else(|| unknown_region(region, depth + 1))?,
            );
        }

        match node {
            Some(SelectorNode::Selector(selector)) => Ok(selector),
            Some(SelectorNode::Group(_)) => Err(RegioError::NotASelector {
                region: region.to_string(),
            }),
            None => Err(unknown_region(region, 1)),
        }
    }

    /// Whether a dotted name resolves to a selector
    #[must_use]
    pub fn contains(&self, region: &str) -> bool {
        self.selector(region).is_ok()
    }

    /// Every selector leaf as `(dotted name, selector)`, in key order
    #[must_use]
    pub fn regions(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        collect_regions(&self.root, "", &mut out);
        out
    }

    /// Number of selector leaves
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions().len()
    }

    /// Whether the table has no selectors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<BTreeMap<String, SelectorNode>> for SelectorTable {
    type Error = RegioError;

    fn try_from(root: BTreeMap<String, SelectorNode>) -> RegioResult<Self> {
        Self::new(root)
    }
}

impl From<SelectorTable> for BTreeMap<String, SelectorNode> {
    fn from(table: SelectorTable) -> Self {
        table.root
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn unknown_region(region: &str, segments: usize) -> RegioError {
    RegioError::UnknownRegion {
        region: region
            .split('.')
            .take(segments)
            .collect::<Vec<_>>()
            .join("."),
    }
}

fn validate_group(group: &BTreeMap<String, SelectorNode>, prefix: &str) -> RegioResult<()> {
    for (key, node) in group {
        let name = join(prefix, key);
        if key.is_empty() {
            return Err(RegioError::config(format!(
                "empty region name under \"{prefix}\""
            )));
        }
        if key.contains(RESERVED_KEY_CHARS) {
            return Err(RegioError::config(format!(
                "region name \"{name}\" contains one of . [ ] ( )"
            )));
        }
        match node {
            SelectorNode::Selector(selector) if selector.trim().is_empty() => {
                return Err(RegioError::config(format!(
                    "region \"{name}\" has an empty selector"
                )));
            }
            SelectorNode::Selector(_) => {}
            SelectorNode::Group(children) => validate_group(children, &name)?,
        }
    }
    Ok(())
}

fn collect_regions<'a>(
    group: &'a BTreeMap<String, SelectorNode>,
    prefix: &str,
    out: &mut Vec<(String, &'a str)>,
) {
    for (key, node) in group {
        let name = join(prefix, key);
        match node {
            SelectorNode::Selector(selector) => out.push((name, selector.as_str())),
            SelectorNode::Group(children) => collect_regions(children, &name, out),
        }
    }
}
