//! Log output on stderr.
//!
//! `RUST_LOG` takes precedence; otherwise the level follows `-q` / `-v`.

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use tracing_subscriber::EnvFilter;

/// Build the log filter, preferring an explicit `RUST_LOG` value
#[must_use]
pub fn build_filter(config: &CliConfig, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(config.verbosity.filter_directive()))
}

/// Install the global subscriber
pub fn init_logging(config: &CliConfig) -> CliResult<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config, rust_log.as_deref());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if config.log_json {
        builder.json().try_init()
    } else {
        builder.with_ansi(config.color.should_color()).try_init()
    };
    installed.map_err(|e| CliError::config(format!("cannot install logger: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Verbosity;

    #[test]
    fn test_verbosity_sets_default_level() {
        let config = CliConfig::new().with_verbosity(Verbosity::Verbose);
        assert_eq!(build_filter(&config, None).to_string(), "debug");
        assert_eq!(build_filter(&CliConfig::new(), None).to_string(), "warn");
    }

    #[test]
    fn test_rust_log_wins() {
        let config = CliConfig::new().with_verbosity(Verbosity::Quiet);
        let filter = build_filter(&config, Some("regio=trace"));
        assert_eq!(filter.to_string(), "regio=trace");
    }
}
