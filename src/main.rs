//! Partials CLI
//!
//! Runs one fragment load batch against an origin server and prints the
//! resulting report and page state as JSON.
//!
//! # Configuration
//!
//! Settings come from `--config`, then the default config locations, then
//! `PARTIALS_*` environment variables; command-line flags win over all of
//! them. `RUST_LOG` overrides the configured log level.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use partials::{
    config, logging, Config, CredentialProvider, EnvToken, HttpFetcher, LayoutLoader, LoadMode,
    LoaderOptions, PageDocument,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "partials")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Load dashboard HTML fragments into page containers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch fragments, inject them and activate scripts
    Load {
        /// Origin for relative fragment URLs
        #[arg(long)]
        base_url: Option<String>,

        /// Fragment as container=url (repeatable); replaces the config table
        #[arg(short, long = "fragment", value_parser = parse_fragment)]
        fragments: Vec<(String, String)>,

        /// Containers present in the page (default: every fragment's container)
        #[arg(long = "container")]
        containers: Vec<String>,

        /// Container whose scripts are activated
        #[arg(long)]
        activate: Option<String>,

        /// Inject markup only; never run scripts
        #[arg(long)]
        no_activate: bool,

        /// Per-fragment fetch timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Environment variable holding the bearer token
        #[arg(long)]
        token_env: Option<String>,

        /// Exit non-zero when any fragment fails
        #[arg(long)]
        strict: bool,
    },

    /// List the scripts an HTML file would activate
    Scripts {
        /// HTML fragment file
        path: PathBuf,
    },

    /// Print a default configuration file
    InitConfig,
}

#[derive(Serialize)]
struct LoadOutput<'a> {
    report: &'a partials::LoadReport,
    document: partials::DocumentSnapshot,
}

fn parse_fragment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((id, url)) if !id.trim().is_empty() && !url.trim().is_empty() => {
            Ok((id.trim().to_string(), url.trim().to_string()))
        }
        _ => Err(format!("expected container=url, got {:?}", raw)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A broken config file is reported here, before any subscriber exists
    let config_path = cli.config.clone().or_else(Config::default_path);
    let mut config = match &config_path {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::from_env(),
    };

    match cli.command {
        Commands::InitConfig => {
            print!("{}", config::generate_default_config());
            Ok(())
        }

        Commands::Scripts { path } => {
            let html = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let scripts = partials::extract_scripts(&html);
            println!("{}", serde_json::to_string_pretty(&scripts)?);
            Ok(())
        }

        Commands::Load {
            base_url,
            fragments,
            containers,
            activate,
            no_activate,
            timeout_ms,
            token_env,
            strict,
        } => {
            if let Some(url) = base_url {
                config.loader.base_url = url;
            }
            if !fragments.is_empty() {
                config.loader.fragments = fragments.into_iter().collect::<BTreeMap<_, _>>();
            }
            if let Some(id) = activate {
                config.loader.activation_container = Some(id);
            }
            if let Some(ms) = timeout_ms {
                config.loader.fetch_timeout_ms = ms;
            }
            if let Some(var) = token_env {
                config.loader.token_env = Some(var);
            }
            config.validate()?;

            logging::init(&config.logging).context("initializing logging")?;
            tracing::info!("Partials loader v{}", env!("CARGO_PKG_VERSION"));
            match &config_path {
                Some(path) => tracing::info!("Loaded config from {:?}", path),
                None => tracing::info!("Using default config with environment overrides"),
            }

            let mut fetcher = HttpFetcher::new(Some(config.loader.base_url.as_str()))?;
            if let Some(var) = &config.loader.token_env {
                let provider = EnvToken::new(var.as_str());
                if provider.bearer_token().is_none() {
                    tracing::warn!("Token variable {} is not set; fetching anonymously", var);
                }
                fetcher = fetcher.with_credentials(Arc::new(provider));
            }

            let loader =
                LayoutLoader::with_options(Arc::new(fetcher), LoaderOptions::from(&config.loader));

            let mut page = if containers.is_empty() {
                PageDocument::with_containers(config.loader.fragments.keys().cloned())
            } else {
                PageDocument::with_containers(containers)
            };

            let mode = if no_activate {
                LoadMode::Inject
            } else {
                LoadMode::InjectAndActivate
            };

            let report = loader
                .run(&mut page, config.loader.fragments.clone(), mode)
                .await;

            let output = LoadOutput {
                report: &report,
                document: page.snapshot(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);

            if strict && !report.is_complete_success() {
                bail!(
                    "{} of {} fragments failed to load",
                    report.failed().count(),
                    report.len()
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragment() {
        assert_eq!(
            parse_fragment("sidebar=/partials/sidebar.html"),
            Ok(("sidebar".to_string(), "/partials/sidebar.html".to_string()))
        );
        assert_eq!(
            parse_fragment("vendorjs=/partials/vendor.html?v=1"),
            Ok(("vendorjs".to_string(), "/partials/vendor.html?v=1".to_string()))
        );
        assert!(parse_fragment("sidebar").is_err());
        assert!(parse_fragment("=/x.html").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_load() {
        let cli = Cli::try_parse_from([
            "partials",
            "load",
            "--base-url",
            "http://localhost:5500",
            "-f",
            "sidebar=/partials/sidebar.html",
            "--fragment",
            "vendorjs=/partials/vendor.html",
            "--no-activate",
        ])
        .unwrap();

        match cli.command {
            Commands::Load {
                fragments,
                no_activate,
                ..
            } => {
                assert_eq!(fragments.len(), 2);
                assert!(no_activate);
            }
            _ => panic!("expected load command"),
        }
    }
}
