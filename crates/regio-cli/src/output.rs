//! Output formatting and status reporting

use clap::ValueEnum;
use console::{style, Term};
use regio::LookupStep;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Region and selector, as listed by `regio list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionEntry {
    /// Dotted region name
    pub region: String,
    /// CSS selector
    pub selector: String,
}

/// Status lines go to stderr, results to stdout
#[derive(Debug)]
pub struct Reporter {
    out: Term,
    err: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            use_color,
            quiet,
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };

        let _ = self.err.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        let _ = self.err.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        let _ = self.err.write_line(&format!("{prefix} {message}"));
    }

    /// Print a command result on stdout, even in quiet mode
    pub fn result(&self, text: &str) {
        let _ = self.out.write_line(text.trim_end_matches('\n'));
    }
}

/// Render regions as aligned `name  selector` lines
#[must_use]
pub fn render_regions_text(regions: &[RegionEntry], use_color: bool) -> String {
    let width = regions.iter().map(|r| r.region.len()).max().unwrap_or(0);
    let mut out = String::new();
    for entry in regions {
        let name = format!("{:width$}", entry.region);
        let name = if use_color {
            style(name).cyan().to_string()
        } else {
            name
        };
        let _ = writeln!(out, "{name}  {}", entry.selector);
    }
    out
}

/// Render lookup steps as a numbered list
///
/// ```text
/// 1. results -> "ul > li" [1]
/// 2. result.title -> ".title" within results
/// ```
#[must_use]
pub fn render_plan_text(steps: &[LookupStep], use_color: bool) -> String {
    let mut out = String::new();
    for (n, step) in steps.iter().enumerate() {
        let region = if use_color {
            style(&step.region).cyan().bold().to_string()
        } else {
            step.region.clone()
        };
        let _ = write!(out, "{}. {region} -> {:?}", n + 1, step.selector);
        for index in &step.indices {
            let _ = write!(out, " [{index}]");
        }
        if !step.scope.is_empty() {
            let _ = write!(out, " within {}", step.scope);
        }
        out.push('\n');
    }
    out
}

/// Render texts read from a region, one per line with their position
#[must_use]
pub fn render_texts_text(texts: &[String]) -> String {
    let mut out = String::new();
    for (i, text) in texts.iter().enumerate() {
        let _ = writeln!(out, "[{i}] {}", text.trim());
    }
    out
}
