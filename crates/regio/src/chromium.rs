//! Chromium driver over the Chrome `DevTools` Protocol.
//!
//! Lookups run `querySelectorAll` in the page. Each matched element is tagged
//! with a `data-regio-id` attribute so later lookups can be scoped to it and
//! its text can be read back.

use crate::driver::{BoundingBox, ElementHandle, RegionDriver};
use crate::resolver::{ElementLookup, LookupContext};
use crate::result::{RegioError, RegioResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const FIND_ALL_SCRIPT: &str = r"(() => {
  const scopeId = __SCOPE__;
  const scope = scopeId === null
    ? document
    : document.querySelector('[data-regio-id=\x22' + scopeId + '\x22]');
  if (!scope) { throw new Error('context element ' + scopeId + ' is no longer attached'); }
  return Array.from(scope.querySelectorAll(__SELECTOR__)).map((el) => {
    if (!el.dataset.regioId) {
      window.__regioNextId = (window.__regioNextId || 0) + 1;
      el.dataset.regioId = 'regio-' + window.__regioNextId;
    }
    const r = el.getBoundingClientRect();
    const rendered = r.width > 0 || r.height > 0;
    return {
      id: el.dataset.regioId,
      tag_name: el.tagName.toLowerCase(),
      text_content: el.textContent,
      bounding_box: rendered ? { x: r.x, y: r.y, width: r.width, height: r.height } : null,
    };
  });
})()";

const TEXT_SCRIPT: &str = r"(() => {
  const el = document.querySelector('[data-regio-id=\x22' + __ID__ + '\x22]');
  if (!el) { throw new Error('element ' + __ID__ + ' is no longer attached'); }
  return el.innerText;
})()";

const VIEWPORT_SCRIPT: &str =
    "({ x: 0, y: 0, width: window.innerWidth, height: window.innerHeight })";

/// Launch options for [`ChromiumDriver`]
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    /// Run without a visible window
    pub headless: bool,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            window_width: 1280,
            window_height: 720,
        }
    }
}

impl ChromiumOptions {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set window dimensions
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }
}

/// [`RegionDriver`] backed by a launched Chromium
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Arc<Mutex<Browser>>,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank page
    ///
    /// # Errors
    ///
    /// Returns [`RegioError::Driver`] if the browser cannot be launched.
    pub async fn launch(options: ChromiumOptions) -> RegioResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.window_width, options.window_height);
        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &options.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RegioError::driver)?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| RegioError::driver(e.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RegioError::driver(e.to_string()))?;
        debug!("chromium launched");

        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            page,
            handler,
        })
    }

    /// Close the browser
    pub async fn close(self) -> RegioResult<()> {
        self.browser
            .lock()
            .await
            .close()
            .await
            .map_err(|e| RegioError::driver(e.to_string()))?;
        self.handler.abort();
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> RegioResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| RegioError::driver(e.to_string()))?
            .into_value()
            .map_err(|e| RegioError::driver(e.to_string()))
    }
}

#[async_trait]
impl ElementLookup for ChromiumDriver {
    async fn find_all(
        &self,
        selector: &str,
        context: &LookupContext,
    ) -> RegioResult<Vec<ElementHandle>> {
        let scope = serde_json::to_string(&context.element().map(|e| e.id.as_str()))?;
        let script = FIND_ALL_SCRIPT
            .replace("__SCOPE__", &scope)
            .replace("__SELECTOR__", &serde_json::to_string(selector)?);
        self.eval(script).await
    }
}

#[async_trait]
impl RegionDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> RegioResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| RegioError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> RegioResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(|e| RegioError::driver(e.to_string()))?
            .unwrap_or_default())
    }

    async fn text(&self, element: &ElementHandle) -> RegioResult<String> {
        let script = TEXT_SCRIPT.replace("__ID__", &serde_json::to_string(&element.id)?);
        self.eval(script).await
    }

    async fn viewport(&self) -> RegioResult<BoundingBox> {
        self.eval(VIEWPORT_SCRIPT.to_string()).await
    }
}
