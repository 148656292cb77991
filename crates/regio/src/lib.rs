//! Regio: Named Page Regions for Browser UI Tests
//!
//! Regio lets UI tests address page regions by symbolic name instead of raw
//! CSS, and tolerate asynchronous rendering with bounded polling.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     REGIO Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Selector   │    │ Selector   │    │ Region     │            │
//! │   │ Table      │───►│ Resolver   │───►│ Driver     │            │
//! │   │ (YAML)     │    │ (paths)    │    │ (CDP/mock) │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │                           ▲                                      │
//! │   ┌────────────┐    ┌─────┴──────┐                              │
//! │   │ Poller     │◄───│ RegionPage │                              │
//! │   │ (budget)   │    │ (facade)   │                              │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use regio::{MockDriver, ElementHandle, RegionPage, SelectorPath, SelectorTable};
//!
//! # tokio_test_block(async {
//! let table = SelectorTable::from_yaml_str("results: \"ul > li\"\n")?;
//! let mut driver = MockDriver::new();
//! driver.add_elements("ul > li", vec![ElementHandle::new("a", "li").with_text("First")]);
//!
//! let page = RegionPage::new(driver, table);
//! let first = SelectorPath::region("results").nth(0);
//! assert_eq!(page.text(first).await?, "First");
//! # Ok::<(), regio::RegioError>(())
//! # }).unwrap();
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

mod clock;
#[allow(clippy::missing_errors_doc)]
mod config;
mod driver;
mod path;
mod resolver;
mod result;
#[allow(clippy::missing_errors_doc)]
mod selectors;

/// Bounded polling
pub mod wait;

/// Region-addressed page facade
#[allow(clippy::missing_errors_doc)]
pub mod page;

/// Chromium driver (requires the `browser` feature)
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
pub mod chromium;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::RegioConfig;
pub use driver::{BoundingBox, ElementHandle, MockDriver, RegionDriver};
pub use page::RegionPage;
pub use path::{PathPart, PathStep, SelectorPath};
pub use resolver::{ElementLookup, LookupContext, LookupStep, SelectorResolver};
pub use result::{RegioError, RegioResult};
pub use selectors::{SelectorNode, SelectorTable};
pub use wait::{wait_for, PollBudget, Poller, Truthy, WaitOptions};

#[cfg(feature = "browser")]
pub use chromium::{ChromiumDriver, ChromiumOptions};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        wait_for, ElementHandle, RegionDriver, RegionPage, RegioConfig, RegioError, RegioResult,
        SelectorPath, SelectorTable, WaitOptions,
    };
}
