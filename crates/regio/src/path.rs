//! Selector paths: symbolic region names with positional disambiguation.
//!
//! A path is either a dotted region name (`"results"`, `"header.nav.links"`)
//! or a chain of steps, each step a region (or nested chain) with an optional
//! zero-based index. An index narrows the elements found so far to one, and
//! the remaining steps are resolved inside that element.
//!
//! ```text
//! results                      every element of `results`
//! results[2]                   the third result
//! results[2].title             titles inside the third result
//! (table.rows[0].cells)[3]     fourth cell of the first row
//! ```

use crate::result::{RegioError, RegioResult};
use std::fmt;
use std::str::FromStr;

/// A region path to resolve against a selector table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectorPath {
    /// Dotted region name; every match is returned
    Region(String),
    /// Ordered steps; see [`PathStep`]
    Chain(Vec<PathStep>),
}

/// One step of a [`SelectorPath::Chain`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    /// What to resolve at this step
    pub target: SelectorPath,
    /// Element to keep among the matches, if any
    pub index: Option<usize>,
}

impl PathStep {
    /// Create a step
    #[must_use]
    pub fn new(target: impl Into<SelectorPath>, index: Option<usize>) -> Self {
        Self {
            target: target.into(),
            index,
        }
    }
}

/// Element of the flat sequence form accepted by [`SelectorPath::from_parts`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart {
    /// Dotted region name
    Key(String),
    /// Zero-based element index
    Index(usize),
}

impl From<&str> for PathPart {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathPart {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathPart {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl SelectorPath {
    /// A dotted region name
    #[must_use]
    pub fn region(name: impl Into<String>) -> Self {
        Self::Region(name.into())
    }

    /// Keep only the element at `index` of what this path resolves to
    #[must_use]
    pub fn nth(self, index: usize) -> Self {
        match self {
            Self::Region(name) => Self::Chain(vec![PathStep::new(Self::Region(name), Some(index))]),
            Self::Chain(mut steps) => match steps.last_mut() {
                Some(last) if last.index.is_none() => {
                    last.index = Some(index);
                    Self::Chain(steps)
                }
                _ => Self::Chain(vec![PathStep::new(Self::Chain(steps), Some(index))]),
            },
        }
    }

    /// Continue resolving `next` inside the element selected so far
    ///
    /// Only meaningful after [`SelectorPath::nth`]; without an index the
    /// continuation is ignored at resolution time, and the unindexed step
    /// displays in parentheses, e.g. `(a).b[2]`.
    #[must_use]
    pub fn then(self, next: impl Into<Self>) -> Self {
        let mut steps = self.into_steps();
        steps.extend(next.into().into_steps());
        Self::Chain(steps)
    }

    /// Build a path from the flat sequence form, e.g. `["a.b", 2, "c"]`
    ///
    /// # Errors
    ///
    /// Returns [`RegioError::InvalidPath`] when the sequence is empty, starts
    /// with an index, has two indices in a row, or has two region names in a
    /// row.
    pub fn from_parts<I, P>(parts: I) -> RegioResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathPart>,
    {
        let mut steps = Vec::new();
        let mut pending: Option<String> = None;

        for part in parts {
            match (part.into(), pending.take()) {
                (PathPart::Key(key), None) => {
                    if key.is_empty() {
                        return Err(RegioError::invalid_path("empty region name"));
                    }
                    pending = Some(key);
                }
                (PathPart::Key(key), Some(previous)) => {
                    return Err(RegioError::invalid_path(format!(
                        "expected an index after \"{previous}\", found \"{key}\""
                    )));
                }
                (PathPart::Index(index), Some(previous)) => {
                    steps.push(PathStep::new(Self::Region(previous), Some(index)));
                }
                (PathPart::Index(index), None) if steps.is_empty() => {
                    return Err(RegioError::invalid_path(format!(
                        "index {index} appears before any region"
                    )));
                }
                (PathPart::Index(index), None) => {
                    return Err(RegioError::invalid_path(format!(
                        "index {index} follows another index"
                    )));
                }
            }
        }

        if let Some(key) = pending {
            if steps.is_empty() {
                return Ok(Self::Region(key));
            }
            steps.push(PathStep::new(Self::Region(key), None));
        }

        if steps.is_empty() {
            return Err(RegioError::invalid_path("empty path"));
        }
        Ok(Self::Chain(steps))
    }

    fn into_steps(self) -> Vec<PathStep> {
        match self {
            Self::Region(name) => vec![PathStep::new(Self::Region(name), None)],
            Self::Chain(steps) => steps,
        }
    }
}

impl From<&str> for SelectorPath {
    fn from(name: &str) -> Self {
        Self::Region(name.to_string())
    }
}

impl From<String> for SelectorPath {
    fn from(name: String) -> Self {
        Self::Region(name)
    }
}

impl From<&Self> for SelectorPath {
    fn from(path: &Self) -> Self {
        path.clone()
    }
}

impl fmt::Display for SelectorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Region(name) => f.write_str(name),
            Self::Chain(steps) => {
                for (i, step) in steps.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    // An unindexed step that is not last ends resolution
                    if step.index.is_none() && i + 1 < steps.len() {
                        write!(f, "({})", step.target)?;
                    } else {
                        write!(f, "{step}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            SelectorPath::Region(name) => f.write_str(name)?,
            chain @ SelectorPath::Chain(_) => write!(f, "({chain})")?,
        }
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

impl FromStr for SelectorPath {
    type Err = RegioError;

    /// Parse the textual form: `a.b[2].c`, groups in parentheses
    fn from_str(source: &str) -> RegioResult<Self> {
        let mut parser = Parser { source, pos: 0 };
        let items = parser.path()?;
        if let Some(c) = parser.peek() {
            return Err(parser.error(format!("unexpected '{c}'")));
        }
        fold(items).map_err(|message| RegioError::invalid_path(format!("{message} in \"{source}\"")))
    }
}

enum Atom {
    Key(String),
    Group(SelectorPath),
}

struct Item {
    atom: Atom,
    index: Option<usize>,
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> RegioResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    fn error(&self, message: String) -> RegioError {
        RegioError::invalid_path(format!(
            "{message} at offset {} in \"{}\"",
            self.pos, self.source
        ))
    }

    fn path(&mut self) -> RegioResult<Vec<Item>> {
        let mut items = vec![self.item()?];
        while self.eat('.') {
            items.push(self.item()?);
        }
        Ok(items)
    }

    fn item(&mut self) -> RegioResult<Item> {
        let atom = if self.eat('(') {
            let inner = self.path()?;
            self.expect(')')?;
            Atom::Group(fold(inner).map_err(|message| self.error(message))?)
        } else {
            Atom::Key(self.key()?)
        };
        let index = if self.eat('[') {
            let index = self.index()?;
            self.expect(']')?;
            Some(index)
        } else {
            None
        };
        Ok(Item { atom, index })
    }

    fn key(&mut self) -> RegioResult<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '.' | '[' | ']' | '(' | ')') {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(self.error("expected a region name".to_string()));
        }
        Ok(self.source[start..self.pos].to_string())
    }

    fn index(&mut self) -> RegioResult<usize> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.source[start..self.pos]
            .parse()
            .map_err(|_| self.error("expected an index".to_string()))
    }
}

/// Merge unindexed runs of keys into dotted regions and build the path
fn fold(items: Vec<Item>) -> Result<SelectorPath, String> {
    let mut steps = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let count = items.len();

    for (position, item) in items.into_iter().enumerate() {
        let last = position + 1 == count;
        match item.atom {
            Atom::Key(key) => {
                pending.push(key);
                if item.index.is_some() {
                    let region = SelectorPath::Region(pending.join("."));
                    pending.clear();
                    steps.push(PathStep::new(region, item.index));
                }
            }
            Atom::Group(group) => {
                if !pending.is_empty() {
                    return Err(format!(
                        "region \"{}\" needs an index before a group",
                        pending.join(".")
                    ));
                }
                if item.index.is_none() && !last {
                    return Err(format!("group \"({group})\" needs an index"));
                }
                steps.push(PathStep::new(group, item.index));
            }
        }
    }

    if !pending.is_empty() {
        steps.push(PathStep::new(SelectorPath::Region(pending.join(".")), None));
    }

    if steps.len() == 1 && steps[0].index.is_none() {
        return Ok(steps.remove(0).target);
    }
    Ok(SelectorPath::Chain(steps))
}
