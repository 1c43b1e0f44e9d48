//! Process configuration from environment variables
//!
//! The service is configured entirely through the environment, read once at
//! startup into a shared singleton:
//!
//! - `PORT` — listen port (default 3000)
//! - `TUBEGRAB_BASE_URL` — display URL for startup logs
//!   (default `http://localhost:<port>`)
//! - `TUBEGRAB_YTDLP_PATH` — resolution collaborator binary (default `yt-dlp`)
//! - `TUBEGRAB_RESOLVE_TIMEOUT_SECS` — metadata/stream-startup deadline
//!   (default 30)
//!
//! Invalid values fall back to their defaults with a logged warning rather
//! than aborting startup.

use once_cell::sync::Lazy;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
pub const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 30;

const ENV_PORT: &str = "PORT";
const ENV_BASE_URL: &str = "TUBEGRAB_BASE_URL";
const ENV_YTDLP_PATH: &str = "TUBEGRAB_YTDLP_PATH";
const ENV_RESOLVE_TIMEOUT: &str = "TUBEGRAB_RESOLVE_TIMEOUT_SECS";

static CONFIG: Lazy<Arc<Config>> = Lazy::new(|| Arc::new(Config::from_env()));

/// Get the global configuration singleton
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Resolved process configuration
#[derive(Debug, Clone)]
pub struct Config {
    http_port: u16,
    base_url: String,
    ytdlp_path: String,
    resolve_timeout: Duration,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup. Lets tests exercise
    /// parsing without mutating process-global environment state.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let http_port = parse_or_default(lookup(ENV_PORT), DEFAULT_HTTP_PORT, ENV_PORT);
        let base_url = lookup(ENV_BASE_URL)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| format!("http://localhost:{http_port}"));
        let ytdlp_path = lookup(ENV_YTDLP_PATH)
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| DEFAULT_YTDLP_PATH.to_string());
        let timeout_secs = parse_or_default(
            lookup(ENV_RESOLVE_TIMEOUT),
            DEFAULT_RESOLVE_TIMEOUT_SECS,
            ENV_RESOLVE_TIMEOUT,
        );

        Self {
            http_port,
            base_url,
            ytdlp_path,
            resolve_timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn ytdlp_path(&self) -> &str {
        &self.ytdlp_path
    }

    pub fn resolve_timeout(&self) -> Duration {
        self.resolve_timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or_default<T>(raw: Option<String>, default: T, key: &str) -> T
where
    T: FromStr + Display,
{
    match raw {
        None => default,
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("invalid {key}={value:?}, using default {default}");
                default
            }
        },
    }
}
