//! RegionDriver - Abstract Browser Automation Client
//!
//! Regio never talks to a browser directly. Everything it needs from the
//! automation backend goes through [`RegionDriver`]:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  RegionPage (facade)                                          │
//! │     ├── SelectorResolver ──► ElementLookup::find_all          │
//! │     └── Poller ────────────► Clock                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  RegionDriver: ElementLookup                                  │
//! │  ┌──────────────────┐  ┌──────────────────────────────────┐  │
//! │  │  ChromiumDriver  │  │  MockDriver                      │  │
//! │  │  (feature        │  │  scripted matches for unit tests │  │
//! │  │   `browser`)     │  │                                  │  │
//! │  └──────────────────┘  └──────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::resolver::{ElementLookup, LookupContext};
use crate::result::{RegioError, RegioResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the box has no area
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether the two boxes share a non-empty area
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Element handle for DOM interactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Unique identifier for the element
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// Element text content
    pub text_content: Option<String>,
    /// Bounding box if rendered
    pub bounding_box: Option<BoundingBox>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text_content: None,
            bounding_box: None,
        }
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Set the bounding box
    #[must_use]
    pub const fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    /// Check if element is rendered
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.bounding_box.is_some()
    }
}

/// Automation client consumed by [`crate::RegionPage`]
///
/// All methods take `&self`; implementations synchronise internally.
#[async_trait]
pub trait RegionDriver: ElementLookup {
    /// Navigate to an absolute URL
    async fn navigate(&self, url: &str) -> RegioResult<()>;

    /// Current page URL
    async fn current_url(&self) -> RegioResult<String>;

    /// Visible text of an element
    async fn text(&self, element: &ElementHandle) -> RegioResult<String>;

    /// The visible viewport, in the same coordinates as element boxes
    async fn viewport(&self) -> RegioResult<BoundingBox>;
}

type MatchKey = (Option<String>, String);

#[derive(Debug, Default)]
struct MockState {
    current_url: String,
    lookups: HashMap<String, usize>,
    call_history: Vec<String>,
}

/// Mock driver for unit testing
///
/// Matches are scripted per (context element id, selector). A selector can be
/// held back for a number of lookups to imitate content that renders late.
#[derive(Debug)]
pub struct MockDriver {
    matches: HashMap<MatchKey, Vec<ElementHandle>>,
    hidden_for: HashMap<String, usize>,
    failing: HashSet<String>,
    viewport: BoundingBox,
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            matches: HashMap::new(),
            hidden_for: HashMap::new(),
            failing: HashSet::new(),
            viewport: BoundingBox::new(0.0, 0.0, 1280.0, 720.0),
            state: Mutex::new(MockState::default()),
        }
    }
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the document-level matches of a selector
    pub fn add_elements(&mut self, selector: impl Into<String>, elements: Vec<ElementHandle>) {
        self.matches.insert((None, selector.into()), elements);
    }

    /// Script the matches of a selector inside one element
    pub fn add_elements_within(
        &mut self,
        context: &ElementHandle,
        selector: impl Into<String>,
        elements: Vec<ElementHandle>,
    ) {
        self.matches
            .insert((Some(context.id.clone()), selector.into()), elements);
    }

    /// Return no matches for the first `lookups` lookups of a selector
    pub fn reveal_after(&mut self, selector: impl Into<String>, lookups: usize) {
        self.hidden_for.insert(selector.into(), lookups);
    }

    /// Make every lookup of a selector fail
    pub fn fail_selector(&mut self, selector: impl Into<String>) {
        self.failing.insert(selector.into());
    }

    /// Set the viewport rectangle
    pub fn set_viewport(&mut self, viewport: BoundingBox) {
        self.viewport = viewport;
    }

    /// Number of lookups issued for a selector
    #[must_use]
    pub fn lookup_count(&self, selector: &str) -> usize {
        self.state().lookups.get(selector).copied().unwrap_or(0)
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ElementLookup for MockDriver {
    async fn find_all(
        &self,
        selector: &str,
        context: &LookupContext,
    ) -> RegioResult<Vec<ElementHandle>> {
        let scope = context.element().map(|e| e.id.clone());
        let seen = {
            let mut state = self.state();
            state.call_history.push(match &scope {
                Some(id) => format!("find_all:{selector}@{id}"),
                None => format!("find_all:{selector}"),
            });
            let count = state.lookups.entry(selector.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if self.failing.contains(selector) {
            return Err(RegioError::driver(format!(
                "failed to query selector {selector:?}"
            )));
        }
        if self
            .hidden_for
            .get(selector)
            .is_some_and(|&hidden| seen <= hidden)
        {
            return Ok(Vec::new());
        }
        Ok(self
            .matches
            .get(&(scope, selector.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl RegionDriver for MockDriver {
    async fn navigate(&self, url: &str) -> RegioResult<()> {
        let mut state = self.state();
        state.call_history.push(format!("navigate:{url}"));
        state.current_url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> RegioResult<String> {
        Ok(self.state().current_url.clone())
    }

    async fn text(&self, element: &ElementHandle) -> RegioResult<String> {
        self.state().call_history.push(format!("text:{}", element.id));
        Ok(element.text_content.clone().unwrap_or_default())
    }

    async fn viewport(&self) -> RegioResult<BoundingBox> {
        Ok(self.viewport)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod bounding_box_tests {
        use super::*;

        #[test]
        fn test_overlapping_boxes_intersect() {
            let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
            let b = BoundingBox::new(50.0, 50.0, 100.0, 100.0);
            assert!(a.intersects(&b));
            assert!(b.intersects(&a));
        }

        #[test]
        fn test_touching_edges_do_not_intersect() {
            let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
            let b = BoundingBox::new(100.0, 0.0, 10.0, 10.0);
            assert!(!a.intersects(&b));
        }

        #[test]
        fn test_empty_box_never_intersects() {
            let viewport = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
            let empty = BoundingBox::new(10.0, 10.0, 0.0, 5.0);
            assert!(empty.is_empty());
            assert!(!viewport.intersects(&empty));
        }

        #[test]
        fn test_below_the_fold() {
            let viewport = BoundingBox::new(0.0, 0.0, 1280.0, 720.0);
            let footer = BoundingBox::new(0.0, 2000.0, 1280.0, 80.0);
            assert!(!viewport.intersects(&footer));
        }
    }

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_element_handle_creation() {
            let elem = ElementHandle::new("btn-1", "button");
            assert_eq!(elem.id, "btn-1");
            assert_eq!(elem.tag_name, "button");
            assert!(elem.text_content.is_none());
        }

        #[test]
        fn test_element_handle_visibility() {
            let elem = ElementHandle::new("elem", "div");
            assert!(!elem.is_visible());
            let elem = elem.with_bounding_box(BoundingBox::new(0.0, 0.0, 100.0, 100.0));
            assert!(elem.is_visible());
        }

        #[test]
        fn test_element_handle_deserializes_from_page_json() {
            let json = serde_json::json!({
                "id": "7",
                "tag_name": "li",
                "text_content": "Item",
                "bounding_box": {"x": 0.0, "y": 10.0, "width": 20.0, "height": 5.0}
            });
            let elem: ElementHandle = serde_json::from_value(json).unwrap();
            assert_eq!(elem.text_content.as_deref(), Some("Item"));
            assert!(elem.is_visible());
        }
    }

    mod mock_driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_scripted_root_matches() {
            let mut driver = MockDriver::new();
            driver.add_elements("li", vec![ElementHandle::new("1", "li")]);

            let found = driver.find_all("li", &LookupContext::Root).await.unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(driver.lookup_count("li"), 1);
            assert!(driver.was_called("find_all:li"));
        }

        #[tokio::test]
        async fn test_scoped_matches_are_separate() {
            let row = ElementHandle::new("row", "tr");
            let mut driver = MockDriver::new();
            driver.add_elements_within(&row, "td", vec![ElementHandle::new("c", "td")]);

            let at_root = driver.find_all("td", &LookupContext::Root).await.unwrap();
            let in_row = driver
                .find_all("td", &LookupContext::Element(row))
                .await
                .unwrap();
            assert!(at_root.is_empty());
            assert_eq!(in_row.len(), 1);
            assert_eq!(driver.history(), vec!["find_all:td", "find_all:td@row"]);
        }

        #[tokio::test]
        async fn test_reveal_after() {
            let mut driver = MockDriver::new();
            driver.add_elements("li", vec![ElementHandle::new("1", "li")]);
            driver.reveal_after("li", 2);

            for _ in 0..2 {
                assert!(driver
                    .find_all("li", &LookupContext::Root)
                    .await
                    .unwrap()
                    .is_empty());
            }
            assert_eq!(
                driver.find_all("li", &LookupContext::Root).await.unwrap().len(),
                1
            );
        }

        #[tokio::test]
        async fn test_failing_selector() {
            let mut driver = MockDriver::new();
            driver.fail_selector("[[");
            let err = driver
                .find_all("[[", &LookupContext::Root)
                .await
                .unwrap_err();
            assert!(matches!(err, RegioError::Driver { .. }));
        }

        #[tokio::test]
        async fn test_navigate_records_url() {
            let driver = MockDriver::new();
            driver.navigate("https://example.com/").await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://example.com/");
            assert!(driver.was_called("navigate"));
        }

        #[tokio::test]
        async fn test_text_uses_handle_content() {
            let driver = MockDriver::new();
            let elem = ElementHandle::new("h", "h1").with_text("Hello");
            assert_eq!(driver.text(&elem).await.unwrap(), "Hello");
            assert_eq!(
                driver.text(&ElementHandle::new("e", "div")).await.unwrap(),
                ""
            );
        }

        #[tokio::test]
        async fn test_default_viewport() {
            let viewport = MockDriver::new().viewport().await.unwrap();
            assert_eq!(viewport, BoundingBox::new(0.0, 0.0, 1280.0, 720.0));
        }
    }
}
