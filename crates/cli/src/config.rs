use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONFIG_FILE: &str = "segview.toml";
pub const API_URL_ENV: &str = "SEGVIEW_API_URL";
pub const TIMEOUT_ENV: &str = "SEGVIEW_TIMEOUT_SECS";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
}

/// Values given on the command line; they beat every other source.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without a trailing slash.
    pub api_url: String,
    pub timeout: Duration,
}

/// Flag > environment > config file > defaults.
pub fn resolve(overrides: &ConfigOverrides) -> Result<ClientConfig> {
    let file = load_file(overrides.config_path.as_deref())?;
    resolve_with(overrides, &file, |key| std::env::var(key).ok())
}

fn load_file(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.is_file() {
                return Ok(FileConfig::default());
            }
            fallback
        }
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let file: FileConfig =
        toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(file)
}

fn resolve_with(
    overrides: &ConfigOverrides,
    file: &FileConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig> {
    let api_url = overrides
        .api_url
        .clone()
        .or_else(|| env(API_URL_ENV))
        .or_else(|| file.api_url.clone())
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_url = api_url.trim_end_matches('/').to_string();
    reqwest::Url::parse(&api_url).with_context(|| format!("Invalid API URL {api_url:?}"))?;

    let timeout_secs = match overrides.timeout_secs {
        Some(secs) => secs,
        None => match env(TIMEOUT_ENV) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{TIMEOUT_ENV} must be a whole number of seconds"))?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        },
    };
    if timeout_secs == 0 {
        anyhow::bail!("timeout must be at least 1 second");
    }

    Ok(ClientConfig {
        api_url,
        timeout: Duration::from_secs(timeout_secs),
    })
}
