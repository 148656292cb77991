//! RegionPage: region-addressed page facade.
//!
//! Bundles a [`RegionDriver`], a [`SelectorResolver`] over the page's
//! selector table, a base URL for relative routes and default
//! [`WaitOptions`]. Every operation resolves its path afresh.
//!
//! ```ignore
//! let page = RegionPage::new(driver, table).with_base_url("http://localhost:3000/app/")?;
//! page.goto("settings").await?;
//! page.wait_for_region("results", page.wait_options()).await?;
//! let third: SelectorPath = "results[2].title".parse()?;
//! assert_eq!(page.text(third).await?, "Third");
//! ```

use crate::clock::{Clock, SystemClock};
use crate::driver::{ElementHandle, RegionDriver};
use crate::path::SelectorPath;
use crate::resolver::{LookupStep, SelectorResolver};
use crate::result::{RegioError, RegioResult};
use crate::selectors::SelectorTable;
use crate::wait::{Poller, Truthy, WaitOptions};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Page whose elements are addressed by region paths
#[derive(Debug)]
pub struct RegionPage<D, C = SystemClock> {
    driver: D,
    resolver: SelectorResolver,
    base_url: Option<Url>,
    wait: WaitOptions,
    poller: Poller<C>,
}

impl<D: RegionDriver> RegionPage<D> {
    /// Create a page on the system clock with default wait options
    #[must_use]
    pub fn new(driver: D, table: impl Into<Arc<SelectorTable>>) -> Self {
        Self {
            driver,
            resolver: SelectorResolver::new(table),
            base_url: None,
            wait: WaitOptions::default(),
            poller: Poller::new(),
        }
    }
}

impl<D: RegionDriver, C: Clock> RegionPage<D, C> {
    /// Set the base URL relative routes are joined to
    ///
    /// # Errors
    ///
    /// Returns [`RegioError::Url`] if `base_url` is not an absolute URL.
    pub fn with_base_url(mut self, base_url: &str) -> RegioResult<Self> {
        self.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    /// Set the default wait options
    #[must_use]
    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Measure wait budgets on another clock
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> RegionPage<D, C2> {
        RegionPage {
            driver: self.driver,
            resolver: self.resolver,
            base_url: self.base_url,
            wait: self.wait,
            poller: Poller::with_clock(clock),
        }
    }

    /// The automation driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Take the driver back, e.g. to close it
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// The resolver over this page's selector table
    #[must_use]
    pub const fn resolver(&self) -> &SelectorResolver {
        &self.resolver
    }

    /// Base URL, if one is configured
    #[must_use]
    pub const fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Default wait options
    #[must_use]
    pub const fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    /// Absolute URL for a route
    ///
    /// Absolute routes are returned as they are; anything else is joined to
    /// the base URL (`"users/1"` under `http://h/app/` is `http://h/app/users/1`,
    /// `"/users/1"` is `http://h/users/1`).
    ///
    /// # Errors
    ///
    /// - [`RegioError::Navigation`] for a relative route without a base URL
    /// - [`RegioError::Url`] if the route cannot be joined
    pub fn url_for(&self, route: &str) -> RegioResult<Url> {
        if let Ok(absolute) = Url::parse(route) {
            return Ok(absolute);
        }
        match &self.base_url {
            Some(base) => Ok(base.join(route)?),
            None => Err(RegioError::Navigation {
                url: route.to_string(),
                message: "relative route and no base URL configured".to_string(),
            }),
        }
    }

    /// Navigate to a route
    pub async fn goto(&self, route: &str) -> RegioResult<()> {
        let url = self.url_for(route)?;
        debug!(%url, "navigating");
        self.driver.navigate(url.as_str()).await
    }

    /// Current page URL
    pub async fn current_url(&self) -> RegioResult<String> {
        self.driver.current_url().await
    }

    /// Every element a path resolves to
    pub async fn elements(&self, path: impl Into<SelectorPath>) -> RegioResult<Vec<ElementHandle>> {
        self.resolver.resolve(&self.driver, &path.into()).await
    }

    /// First element a path resolves to
    ///
    /// # Errors
    ///
    /// [`RegioError::Resolution`] with `required = 1` if nothing matches.
    pub async fn element(&self, path: impl Into<SelectorPath>) -> RegioResult<ElementHandle> {
        let path = path.into();
        self.resolver
            .resolve(&self.driver, &path)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RegioError::Resolution {
                required: 1,
                region: path.to_string(),
                found: 0,
            })
    }

    /// Number of elements a path resolves to
    pub async fn count(&self, path: impl Into<SelectorPath>) -> RegioResult<usize> {
        Ok(self.elements(path).await?.len())
    }

    /// Visible text of every element a path resolves to
    pub async fn texts(&self, path: impl Into<SelectorPath>) -> RegioResult<Vec<String>> {
        let mut texts = Vec::new();
        for element in self.elements(path).await? {
            texts.push(self.driver.text(&element).await?);
        }
        Ok(texts)
    }

    /// Visible text of the first element a path resolves to
    pub async fn text(&self, path: impl Into<SelectorPath>) -> RegioResult<String> {
        let element = self.element(path).await?;
        self.driver.text(&element).await
    }

    /// Whether a path resolves to at least one element and every element
    /// overlaps the viewport
    pub async fn is_in_viewport(&self, path: impl Into<SelectorPath>) -> RegioResult<bool> {
        let elements = self.elements(path).await?;
        if elements.is_empty() {
            return Ok(false);
        }
        let viewport = self.driver.viewport().await?;
        Ok(elements.iter().all(|element| {
            element
                .bounding_box
                .is_some_and(|bounds| bounds.intersects(&viewport))
        }))
    }

    /// Poll until a path resolves to at least one element
    ///
    /// An index past the elements rendered so far counts as "not yet" rather
    /// than failing the wait.
    ///
    /// # Errors
    ///
    /// - [`RegioError::Timeout`] with `options.error_msg`
    /// - table and driver errors, unchanged
    pub async fn wait_for_region(
        &self,
        path: impl Into<SelectorPath>,
        options: &WaitOptions,
    ) -> RegioResult<()> {
        let path = path.into();
        let (resolver, driver, path) = (&self.resolver, &self.driver, &path);
        self.poller
            .wait_for(
                move || async move {
                    match resolver.resolve(driver, path).await {
                        Err(RegioError::Resolution { .. }) => Ok(Vec::new()),
                        other => other,
                    }
                },
                options,
            )
            .await
    }

    /// Poll an arbitrary condition on this page's clock
    pub async fn wait_for<F, Fut, T>(&self, condition: F, options: &WaitOptions) -> RegioResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RegioResult<T>>,
        T: Truthy,
    {
        self.poller.wait_for(condition, options).await
    }

    /// The CSS lookups a path performs
    pub fn explain(&self, path: impl Into<SelectorPath>) -> RegioResult<Vec<LookupStep>> {
        self.resolver.explain(&path.into())
    }
}
