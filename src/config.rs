use crate::{
    models::profile::ContactProfile,
    services::{matcher::MatcherConfig, sheet_parser::ColumnMapping},
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::de::DeserializeOwned;
use std::{
    env,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::warn;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub drive_api_key: Option<String>,
    pub drive_folder_id: Option<String>,
    pub github_username: String,
    pub github_token: Option<String>,
    pub cache_ttl: Duration,
    /// Explicit sheet layout; `None` falls back to header detection.
    pub column_mapping: Option<ColumnMapping>,
    pub matcher: MatcherConfig,
    pub contact: ContactProfile,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Portfolio backend: certificates from Google Drive and GitHub projects")]
pub struct Args {
    /// Host to bind to (overrides PORTFOLIO_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORTFOLIO_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Cache lifetime in seconds (overrides PORTFOLIO_CACHE_TTL_SECS)
    #[arg(long)]
    pub cache_ttl_secs: Option<u64>,

    /// Minimum score to attach an asset (overrides PORTFOLIO_MATCH_THRESHOLD)
    #[arg(long)]
    pub match_threshold: Option<f64>,

    /// JSON file with an explicit column mapping (overrides PORTFOLIO_COLUMN_MAPPING)
    #[arg(long)]
    pub column_mapping: Option<PathBuf>,

    /// JSON file with matcher scores and dictionaries (overrides PORTFOLIO_MATCHER_CONFIG)
    #[arg(long)]
    pub matcher_config: Option<PathBuf>,

    /// GitHub account shown in the portfolio (overrides GITHUB_USERNAME)
    #[arg(long)]
    pub github_username: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_sources(Args::parse(), |key| env::var(key).ok())
    }

    /// Merge `args` over values returned by `lookup` (CLI > env > default).
    pub fn from_sources<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match args.port {
            Some(port) => port,
            None => parse_var(&var, "PORTFOLIO_PORT")?.unwrap_or(3000),
        };
        let ttl_secs = match args.cache_ttl_secs {
            Some(secs) => secs,
            None => parse_var(&var, "PORTFOLIO_CACHE_TTL_SECS")?.unwrap_or(120),
        };

        let column_mapping = args
            .column_mapping
            .or_else(|| var("PORTFOLIO_COLUMN_MAPPING").map(PathBuf::from))
            .map(|path| load_json::<ColumnMapping>(&path))
            .transpose()?;

        let mut matcher = args
            .matcher_config
            .or_else(|| var("PORTFOLIO_MATCHER_CONFIG").map(PathBuf::from))
            .map(|path| load_json::<MatcherConfig>(&path))
            .transpose()?
            .unwrap_or_default();
        let threshold = match args.match_threshold {
            Some(threshold) => Some(threshold),
            None => parse_var(&var, "PORTFOLIO_MATCH_THRESHOLD")?,
        };
        if let Some(threshold) = threshold {
            matcher.acceptance_threshold = threshold;
        }
        if !(0.0..=1.0).contains(&matcher.acceptance_threshold) {
            bail!(
                "match threshold must be between 0 and 1, got {}",
                matcher.acceptance_threshold
            );
        }

        let drive_api_key = var("GOOGLE_DRIVE_API_KEY");
        let drive_folder_id = var("GOOGLE_DRIVE_FOLDER_ID");
        if drive_api_key.is_none() {
            warn!("GOOGLE_DRIVE_API_KEY is not set");
        }
        if drive_folder_id.is_none() {
            warn!("GOOGLE_DRIVE_FOLDER_ID is not set");
        }

        Ok(Self {
            host: args
                .host
                .or_else(|| var("PORTFOLIO_HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port,
            drive_api_key,
            drive_folder_id,
            github_username: args
                .github_username
                .or_else(|| var("GITHUB_USERNAME"))
                .unwrap_or_else(|| "flameuss".into()),
            github_token: var("GITHUB_TOKEN"),
            cache_ttl: Duration::from_secs(ttl_secs),
            column_mapping,
            matcher,
            contact: ContactProfile {
                email: var("CONTACT_EMAIL"),
                github_url: var("SOCIAL_GITHUB"),
                linkedin_url: var("SOCIAL_LINKEDIN"),
                whatsapp_number: var("WHATSAPP_NUMBER"),
                cv_download_url: var("CV_DOWNLOAD_URL"),
            },
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("parsing {} value `{}`", key, value))
        })
        .transpose()
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
