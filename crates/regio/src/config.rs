//! Page configuration files.
//!
//! ```yaml
//! base_url: http://localhost:3000/app/
//! wait:
//!   timeout_ms: 1000
//!   error_msg: Timeout
//! selectors:
//!   header:
//!     title: "h1.title"
//! ```

use crate::driver::RegionDriver;
use crate::page::RegionPage;
use crate::result::RegioResult;
use crate::selectors::SelectorTable;
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Selector table plus page defaults, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegioConfig {
    /// Base URL relative routes are joined to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default wait options
    pub wait: WaitOptions,
    /// Region names and their selectors
    pub selectors: SelectorTable,
}

impl RegioConfig {
    /// Parse a configuration from YAML
    pub fn from_yaml_str(source: &str) -> RegioResult<Self> {
        let config: Self = serde_yaml_ng::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from JSON
    pub fn from_json_str(source: &str) -> RegioResult<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file; `.json` files are JSON, anything else YAML
    pub fn load(path: impl AsRef<Path>) -> RegioResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }

    /// Replace the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Check that the base URL, if any, is absolute
    ///
    /// The selector table validates itself while it is deserialised.
    pub fn validate(&self) -> RegioResult<()> {
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url)?;
        }
        Ok(())
    }

    /// Build a page over `driver`
    pub fn into_page<D: RegionDriver>(self, driver: D) -> RegioResult<RegionPage<D>> {
        let page = RegionPage::new(driver, self.selectors).with_wait_options(self.wait);
        match self.base_url {
            Some(base_url) => page.with_base_url(&base_url),
            None => Ok(page),
        }
    }
}
