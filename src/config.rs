use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::mail::gmail_client::GMAIL_API_BASE;

pub const DEFAULT_CREDENTIALS_PATH: &str = "./config/client_secret.json";
pub const DEFAULT_TOKEN_PATH: &str = "./config/access_token.json";
pub const DEFAULT_QUERY_SUBJECT: &str = "GIGA BITES CAFE - Transaction Receipt";
pub const DEFAULT_WINDOW_DAYS: i64 = 1;

/// How the authorization code is collected on a cold start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Print the consent URL and read the code from stdin.
    #[default]
    Console,
    /// Open a browser and catch the redirect on a loopback port.
    Loopback,
}

/// On-disk configuration; every key is optional.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct Config {
    pub credentials_path: Option<String>,
    pub token_path: Option<String>,
    pub query_subject: Option<String>,
    pub window_days: Option<i64>,
    pub auth_mode: Option<AuthMode>,
    pub api_base: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub query_subject: String,
    pub window_days: i64,
    pub auth_mode: AuthMode,
    pub api_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::from_config(&Config::default())
    }
}

impl Settings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            credentials_path: PathBuf::from(
                cfg.credentials_path.as_deref().unwrap_or(DEFAULT_CREDENTIALS_PATH),
            ),
            token_path: PathBuf::from(cfg.token_path.as_deref().unwrap_or(DEFAULT_TOKEN_PATH)),
            query_subject: cfg
                .query_subject
                .clone()
                .unwrap_or_else(|| DEFAULT_QUERY_SUBJECT.to_string()),
            window_days: cfg.window_days.unwrap_or(DEFAULT_WINDOW_DAYS),
            auth_mode: cfg.auth_mode.unwrap_or_default(),
            api_base: cfg
                .api_base
                .clone()
                .unwrap_or_else(|| GMAIL_API_BASE.to_string()),
        }
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("tip_tally"))
}

/// `<config dir>/tip_tally/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load the config file. A missing file means defaults; a malformed one is an
/// error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    if let Some(days) = cfg.window_days
        && days < 1
    {
        bail!("window_days must be at least 1 in {}, got {days}", path.display());
    }
    Ok(cfg)
}

/// Write a template config for users to edit.
pub fn write_template(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let sample = Config {
        credentials_path: Some(DEFAULT_CREDENTIALS_PATH.to_string()),
        token_path: Some(DEFAULT_TOKEN_PATH.to_string()),
        query_subject: Some(DEFAULT_QUERY_SUBJECT.to_string()),
        window_days: Some(DEFAULT_WINDOW_DAYS),
        auth_mode: Some(AuthMode::Console),
        api_base: None,
    };
    let tom = toml::to_string_pretty(&sample)?;
    fs::write(path, tom)?;
    Ok(())
}
