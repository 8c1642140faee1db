use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:4000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Distinguishes runtime behavior for different deployment stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the desk and the console.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub api: ApiConfig,
    pub desk: DeskConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let base_url = parse_http_url(
            "APP_API_URL",
            &env::var("APP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        )?;
        let file_base_url = match env::var("APP_FILE_BASE_URL") {
            Ok(raw) => parse_http_url("APP_FILE_BASE_URL", &raw)?,
            Err(_) => origin_of(&base_url),
        };

        let token = match (env::var("APP_TOKEN"), env::var("APP_TOKEN_PATH")) {
            (Ok(token), _) if !token.trim().is_empty() => TokenConfig::Inline(token),
            (_, Ok(path)) if !path.trim().is_empty() => TokenConfig::File(PathBuf::from(path)),
            _ => TokenConfig::Missing,
        };

        let request_timeout = match env::var("APP_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout { value: raw }),
            },
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let force_review_panel = match env::var("APP_FORCE_REVIEW_PANEL") {
            Ok(raw) => parse_flag("APP_FORCE_REVIEW_PANEL", &raw)?,
            Err(_) => false,
        };
        let cache_path = env::var("APP_CACHE_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            api: ApiConfig {
                base_url,
                file_base_url,
                token,
                request_timeout,
            },
            desk: DeskConfig {
                force_review_panel,
                cache_path,
            },
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where the verification API lives and how requests authenticate.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Base against which relative document paths are resolved.
    pub file_base_url: String,
    pub token: TokenConfig,
    pub request_timeout: Duration,
}

/// Source of the landlord bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenConfig {
    Inline(String),
    /// Re-read on every request so a refreshed login is picked up without restarting.
    File(PathBuf),
    Missing,
}

/// Startup switches for the desk.
#[derive(Debug, Clone, Default)]
pub struct DeskConfig {
    /// Shows the review panel for resolved records too. The controls stay disabled.
    pub force_review_panel: bool,
    pub cache_path: Option<PathBuf>,
}

/// Binding for the local contract stub server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn parse_http_url(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(trimmed.trim_end_matches('/').to_string())
        }
        _ => Err(ConfigError::InvalidUrl {
            name,
            value: raw.to_string(),
        }),
    }
}

fn origin_of(base_url: &str) -> String {
    Url::parse(base_url)
        .map(|url| url.origin().ascii_serialization())
        .unwrap_or_else(|_| base_url.to_string())
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUrl { name: &'static str, value: String },
    InvalidTimeout { value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUrl { name, value } => {
                write!(f, "{name} must be an http(s) URL, got '{value}'")
            }
            ConfigError::InvalidTimeout { value } => write!(
                f,
                "APP_REQUEST_TIMEOUT_SECS must be a positive number of seconds, got '{value}'"
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidUrl { .. }
            | ConfigError::InvalidTimeout { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
