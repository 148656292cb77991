//! Command handlers

use crate::commands::{CheckArgs, ListArgs, PlanArgs, ProbeArgs};
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{render_plan_text, render_regions_text, OutputFormat, RegionEntry, Reporter};
use regio::{RegioConfig, SelectorPath, SelectorResolver};
use std::path::Path;
use tracing::debug;

/// Load a configuration file and apply the `--base-url` override
pub fn load_config(path: &Path, config: &CliConfig) -> CliResult<RegioConfig> {
    debug!(path = %path.display(), "loading configuration");
    let mut regio_config = RegioConfig::load(path)?;
    if let Some(base_url) = &config.base_url {
        regio_config = regio_config.with_base_url(base_url.clone());
        regio_config.validate()?;
    }
    Ok(regio_config)
}

/// `regio check`
pub fn run_check(config: &CliConfig, args: &CheckArgs, reporter: &Reporter) -> CliResult<()> {
    let regio_config = load_config(&args.config, config)?;
    reporter.success(&format!(
        "{}: {} regions",
        args.config.display(),
        regio_config.selectors.len()
    ));
    if let Some(base_url) = &regio_config.base_url {
        reporter.info(&format!("base URL {base_url}"));
    }
    reporter.info(&format!(
        "wait timeout {} ms, message {:?}",
        regio_config.wait.timeout_ms, regio_config.wait.error_msg
    ));
    Ok(())
}

/// `regio list`
pub fn run_list(config: &CliConfig, args: &ListArgs, reporter: &Reporter) -> CliResult<()> {
    let regio_config = load_config(&args.config, config)?;
    let regions: Vec<RegionEntry> = regio_config
        .selectors
        .regions()
        .into_iter()
        .map(|(region, selector)| RegionEntry {
            region,
            selector: selector.to_string(),
        })
        .collect();

    match args.format {
        OutputFormat::Text => {
            reporter.result(&render_regions_text(&regions, reporter.use_color));
        }
        OutputFormat::Json => reporter.result(&serde_json::to_string_pretty(&regions)?),
    }
    Ok(())
}

/// `regio plan`
pub fn run_plan(config: &CliConfig, args: &PlanArgs, reporter: &Reporter) -> CliResult<()> {
    let regio_config = load_config(&args.config, config)?;
    let path: SelectorPath = args.path.parse()?;
    debug!(%path, "planning lookups");
    let steps = SelectorResolver::new(regio_config.selectors).explain(&path)?;

    match args.format {
        OutputFormat::Text => reporter.result(&render_plan_text(&steps, reporter.use_color)),
        OutputFormat::Json => reporter.result(&serde_json::to_string_pretty(&steps)?),
    }
    Ok(())
}

/// `regio probe`
#[cfg(feature = "browser")]
pub fn run_probe(config: &CliConfig, args: &ProbeArgs, reporter: &Reporter) -> CliResult<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(probe::run(config, args, reporter))
}

/// `regio probe`
#[cfg(not(feature = "browser"))]
pub fn run_probe(_config: &CliConfig, _args: &ProbeArgs, _reporter: &Reporter) -> CliResult<()> {
    Err(crate::error::CliError::invalid_argument(
        "probe needs a browser; rebuild with --features browser",
    ))
}

#[cfg(feature = "browser")]
mod probe {
    use super::*;
    use crate::output::render_texts_text;
    use regio::{ChromiumDriver, ChromiumOptions, RegionPage};
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    struct ProbeReport {
        url: String,
        path: String,
        texts: Vec<String>,
        in_viewport: bool,
    }

    pub(super) async fn run(
        config: &CliConfig,
        args: &ProbeArgs,
        reporter: &Reporter,
    ) -> CliResult<()> {
        let regio_config = load_config(&args.config, config)?;
        let path: SelectorPath = args.path.parse()?;
        let mut wait = regio_config.wait.clone();
        if let Some(timeout) = args.timeout {
            wait = wait.with_timeout(timeout);
        }

        let mut options = ChromiumOptions::default().with_headless(!args.headed);
        if args.no_sandbox {
            options = options.with_no_sandbox();
        }
        let page = regio_config.into_page(ChromiumDriver::launch(options).await?)?;

        let outcome = read_region(&page, args, &path, &wait).await;
        page.into_driver().close().await?;
        let report = outcome?;

        match args.format {
            OutputFormat::Text => {
                reporter.success(&format!(
                    "{} at {}: {} elements",
                    report.path,
                    report.url,
                    report.texts.len()
                ));
                reporter.result(&render_texts_text(&report.texts));
            }
            OutputFormat::Json => reporter.result(&serde_json::to_string_pretty(&report)?),
        }
        Ok(())
    }

    async fn read_region(
        page: &RegionPage<ChromiumDriver>,
        args: &ProbeArgs,
        path: &SelectorPath,
        wait: &regio::WaitOptions,
    ) -> CliResult<ProbeReport> {
        page.goto(&args.route).await?;
        page.wait_for_region(path, wait).await?;
        Ok(ProbeReport {
            url: page.current_url().await?,
            path: path.to_string(),
            texts: page.texts(path).await?,
            in_viewport: page.is_in_viewport(path).await?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    const YAML: &str = r#"
base_url: http://localhost:3000/app/
selectors:
  header:
    title: "h1.title"
  results: "ul.results > li"
  result:
    title: ".title"
"#;

    fn config_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "{YAML}").unwrap();
        file
    }

    fn quiet() -> Reporter {
        Reporter::new(false, true)
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_load_without_override() {
            let file = config_file();
            let loaded = load_config(file.path(), &CliConfig::new()).unwrap();
            assert_eq!(loaded.base_url.as_deref(), Some("http://localhost:3000/app/"));
        }

        #[test]
        fn test_base_url_override() {
            let file = config_file();
            let config = CliConfig::new().with_base_url(Some("https://ci.example.com/".into()));
            let loaded = load_config(file.path(), &config).unwrap();
            assert_eq!(loaded.base_url.as_deref(), Some("https://ci.example.com/"));
        }

        #[test]
        fn test_invalid_override_rejected() {
            let file = config_file();
            let config = CliConfig::new().with_base_url(Some("relative/".into()));
            assert!(load_config(file.path(), &config).is_err());
        }

        #[test]
        fn test_missing_file() {
            let err = load_config(Path::new("/no/such/regions.yaml"), &CliConfig::new());
            assert!(err.is_err());
        }
    }

    mod command_tests {
        use super::*;

        #[test]
        fn test_check() {
            let file = config_file();
            let args = CheckArgs {
                config: file.path().to_path_buf(),
            };
            run_check(&CliConfig::new(), &args, &quiet()).unwrap();
        }

        #[test]
        fn test_list() {
            let file = config_file();
            let args = ListArgs {
                config: file.path().to_path_buf(),
                format: OutputFormat::Json,
            };
            run_list(&CliConfig::new(), &args, &quiet()).unwrap();
        }

        #[test]
        fn test_plan_rejects_bad_path() {
            let file = config_file();
            let args = PlanArgs {
                config: file.path().to_path_buf(),
                path: "results[".to_string(),
                format: OutputFormat::Text,
            };
            assert!(run_plan(&CliConfig::new(), &args, &quiet()).is_err());
        }

        #[test]
        fn test_plan_rejects_unknown_region() {
            let file = config_file();
            let args = PlanArgs {
                config: file.path().to_path_buf(),
                path: "footer[0]".to_string(),
                format: OutputFormat::Text,
            };
            let err = run_plan(&CliConfig::new(), &args, &quiet()).unwrap_err();
            assert!(err.to_string().contains("footer"));
        }

        #[test]
        fn test_check_missing_file() {
            let args = CheckArgs {
                config: PathBuf::from("/no/such/regions.yaml"),
            };
            assert!(run_check(&CliConfig::new(), &args, &quiet()).is_err());
        }
    }
}
