//! Regio CLI Library
//!
//! Command-line interface for inspecting Regio selector tables and probing
//! page regions.

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{CheckArgs, Cli, ColorArg, Commands, ListArgs, PlanArgs, ProbeArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{
    render_plan_text, render_regions_text, render_texts_text, OutputFormat, RegionEntry, Reporter,
};
