//! Selector path resolution.
//!
//! [`SelectorResolver`] turns a [`SelectorPath`] into live element handles by
//! looking each region up in the [`SelectorTable`] and asking an
//! [`ElementLookup`] for the matches inside the current context. Indexed steps
//! narrow the matches to one element, which becomes the context for the rest
//! of the path. Nothing is cached between calls.

use crate::driver::ElementHandle;
use crate::path::{PathStep, SelectorPath};
use crate::result::{RegioError, RegioResult};
use crate::selectors::SelectorTable;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// DOM scope of a CSS lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LookupContext {
    /// The whole document
    Root,
    /// The subtree of one previously selected element
    Element(ElementHandle),
}

impl LookupContext {
    /// The scoping element, if any
    #[must_use]
    pub const fn element(&self) -> Option<&ElementHandle> {
        match self {
            Self::Root => None,
            Self::Element(element) => Some(element),
        }
    }
}

/// "Find all elements matching a CSS selector within a context"
///
/// Implementations must return matches in document order and report invalid
/// selectors or detached contexts as errors.
#[async_trait]
pub trait ElementLookup: Send + Sync {
    /// Find every element matching `selector` inside `context`
    async fn find_all(
        &self,
        selector: &str,
        context: &LookupContext,
    ) -> RegioResult<Vec<ElementHandle>>;
}

/// One CSS lookup a path performs, as reported by [`SelectorResolver::explain`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupStep {
    /// Dotted label of the element the lookup is scoped to (empty for root)
    pub scope: String,
    /// Region name looked up in the table
    pub region: String,
    /// CSS selector sent to the lookup
    pub selector: String,
    /// Indices applied to the matches, in order
    pub indices: Vec<usize>,
}

/// Resolves selector paths against a shared selector table
#[derive(Debug, Clone)]
pub struct SelectorResolver {
    table: Arc<SelectorTable>,
}

impl SelectorResolver {
    /// Create a resolver over a selector table
    #[must_use]
    pub fn new(table: impl Into<Arc<SelectorTable>>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// The selector table
    #[must_use]
    pub fn table(&self) -> &SelectorTable {
        &self.table
    }

    /// Resolve a path from the document root
    ///
    /// # Errors
    ///
    /// - [`RegioError::Resolution`] when an index exceeds the elements found
    /// - [`RegioError::UnknownRegion`] / [`RegioError::NotASelector`] for bad names
    /// - any error of the lookup itself, unchanged
    pub async fn resolve<L>(&self, lookup: &L, path: &SelectorPath) -> RegioResult<Vec<ElementHandle>>
    where
        L: ElementLookup + ?Sized,
    {
        self.resolve_in(lookup, path, LookupContext::Root, String::new())
            .await
    }

    /// Resolve a path inside `context`, with `label` naming the regions
    /// consumed to reach that context
    pub fn resolve_in<'a, L>(
        &'a self,
        lookup: &'a L,
        path: &'a SelectorPath,
        context: LookupContext,
        label: String,
    ) -> BoxFuture<'a, RegioResult<Vec<ElementHandle>>>
    where
        L: ElementLookup + ?Sized,
    {
        async move {
            match path {
                SelectorPath::Region(region) => {
                    let selector = self.table.selector(region)?;
                    debug!(region = %region, selector, scope = %label, "looking up region");
                    let elements = lookup.find_all(selector, &context).await?;
                    debug!(region = %region, found = elements.len(), "region resolved");
                    Ok(elements)
                }
                SelectorPath::Chain(steps) => {
                    self.resolve_steps(lookup, steps, context, label).await
                }
            }
        }
        .boxed()
    }

    fn resolve_steps<'a, L>(
        &'a self,
        lookup: &'a L,
        steps: &'a [PathStep],
        context: LookupContext,
        label: String,
    ) -> BoxFuture<'a, RegioResult<Vec<ElementHandle>>>
    where
        L: ElementLookup + ?Sized,
    {
        async move {
            let Some((first, rest)) = steps.split_first() else {
                return Err(RegioError::invalid_path("empty chain"));
            };

            let elements = self
                .resolve_in(lookup, &first.target, context, label.clone())
                .await?;

            let Some(index) = first.index else {
                if !rest.is_empty() {
                    warn!(
                        region = %first.target,
                        "no index after region, ignoring the rest of the path"
                    );
                }
                return Ok(elements);
            };

            let label = extend_label(&label, &first.target);
            let found = elements.len();
            let Some(element) = elements.into_iter().nth(index) else {
                return Err(RegioError::Resolution {
                    required: index + 1,
                    region: label,
                    found,
                });
            };

            if rest.is_empty() {
                return Ok(vec![element]);
            }
            self.resolve_steps(lookup, rest, LookupContext::Element(element), label)
                .await
        }
        .boxed()
    }

    /// List the CSS lookups a path performs, without touching a page
    ///
    /// # Errors
    ///
    /// The same table errors [`SelectorResolver::resolve`] would report.
    pub fn explain(&self, path: &SelectorPath) -> RegioResult<Vec<LookupStep>> {
        let mut out = Vec::new();
        self.explain_in(path, "", &mut out)?;
        Ok(out)
    }

    fn explain_in(&self, path: &SelectorPath, label: &str, out: &mut Vec<LookupStep>) -> RegioResult<()> {
        match path {
            SelectorPath::Region(region) => {
                out.push(LookupStep {
                    scope: label.to_string(),
                    region: region.clone(),
                    selector: self.table.selector(region)?.to_string(),
                    indices: Vec::new(),
                });
            }
            SelectorPath::Chain(steps) => {
                let mut label = label.to_string();
                for step in steps {
                    self.explain_in(&step.target, &label, out)?;
                    let Some(index) = step.index else {
                        break;
                    };
                    if let Some(last) = out.last_mut() {
                        last.indices.push(index);
                    }
                    label = extend_label(&label, &step.target);
                }
            }
        }
        Ok(())
    }
}

fn extend_label(label: &str, target: &SelectorPath) -> String {
    if label.is_empty() {
        target.to_string()
    } else {
        format!("{label}.{target}")
    }
}
