//! Client configuration.
//!
//! Values are layered lowest first: built-in local-development defaults, an
//! optional JSON file, then `WEBFORGE_*` environment variables. Empty values
//! at any layer count as unset.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use webforge_runtime::{DEFAULT_POLL_INTERVAL, EndpointConnector, TransportKind};

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_URL: &str = "WEBFORGE_API_URL";
pub const ENV_WS_URL: &str = "WEBFORGE_WS_URL";
pub const ENV_TRANSPORTS: &str = "WEBFORGE_TRANSPORTS";
pub const ENV_POLL_INTERVAL_MS: &str = "WEBFORGE_POLL_INTERVAL_MS";
pub const ENV_SESSION_COOKIE: &str = "WEBFORGE_SESSION_COOKIE";

/// On-disk configuration file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
	#[serde(default)]
	pub api_url: Option<String>,
	#[serde(default)]
	pub ws_url: Option<String>,
	#[serde(default)]
	pub transports: Option<Vec<TransportKind>>,
	#[serde(default)]
	pub poll_interval_ms: Option<u64>,
	#[serde(default)]
	pub request_timeout_ms: Option<u64>,
	/// `Cookie` header value of a signed-in browser session, e.g. `sessionid=...`.
	#[serde(default)]
	pub session_cookie: Option<String>,
}

impl ConfigFile {
	pub fn read(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)?;
		serde_json::from_str(&content).map_err(|err| Error::Config(format!("{}: {err}", path.display())))
	}
}

/// Resolved endpoints and transport settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
	pub api_url: Url,
	pub ws_url: Url,
	pub transports: Vec<TransportKind>,
	pub poll_interval: Duration,
	pub request_timeout: Duration,
	pub session_cookie: Option<String>,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			api_url: Url::parse(DEFAULT_API_URL).expect("DEFAULT_API_URL should parse"),
			ws_url: Url::parse(DEFAULT_WS_URL).expect("DEFAULT_WS_URL should parse"),
			transports: TransportKind::DEFAULT_ORDER.to_vec(),
			poll_interval: DEFAULT_POLL_INTERVAL,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			session_cookie: None,
		}
	}
}

impl ClientConfig {
	/// Loads configuration from `path` (which must exist) or from the default
	/// location (which may not), then applies the process environment.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let file = match path {
			Some(path) => ConfigFile::read(path)?,
			None => match default_config_path() {
				Some(path) if path.is_file() => ConfigFile::read(&path)?,
				_ => ConfigFile::default(),
			},
		};
		Self::from_sources(file, |key| std::env::var(key).ok())
	}

	/// Resolves a config from a parsed file and an environment lookup.
	pub fn from_sources(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let env = |key: &str| env(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());
		let mut config = Self::default();

		if let Some(url) = non_empty(file.api_url) {
			config.api_url = parse_url("apiUrl", &url, &["http", "https"])?;
		}
		if let Some(url) = non_empty(file.ws_url) {
			config.ws_url = parse_url("wsUrl", &url, &["ws", "wss"])?;
		}
		if let Some(url) = env(ENV_API_URL) {
			config.api_url = parse_url(ENV_API_URL, &url, &["http", "https"])?;
		}
		if let Some(url) = env(ENV_WS_URL) {
			config.ws_url = parse_url(ENV_WS_URL, &url, &["ws", "wss"])?;
		}

		if let Some(transports) = file.transports.filter(|transports| !transports.is_empty()) {
			config.transports = transports;
		}
		if let Some(list) = env(ENV_TRANSPORTS) {
			config.transports = parse_transports(&list)?;
		}

		if let Some(ms) = file.poll_interval_ms {
			config.poll_interval = interval("pollIntervalMs", ms)?;
		}
		if let Some(ms) = env(ENV_POLL_INTERVAL_MS) {
			let ms = ms
				.parse::<u64>()
				.map_err(|err| Error::Config(format!("{ENV_POLL_INTERVAL_MS}={ms}: {err}")))?;
			config.poll_interval = interval(ENV_POLL_INTERVAL_MS, ms)?;
		}

		if let Some(ms) = file.request_timeout_ms {
			config.request_timeout = interval("requestTimeoutMs", ms)?;
		}

		config.session_cookie = env(ENV_SESSION_COOKIE).or_else(|| non_empty(file.session_cookie));

		debug!(target = "webforge.config", api_url = %config.api_url, ws_url = %config.ws_url, transports = ?config.transports, "configuration resolved");
		Ok(config)
	}

	/// Scheme, host and port of the API, without its path.
	pub fn api_origin(&self) -> String {
		self.api_url.origin().ascii_serialization()
	}

	/// Full URL of an API path such as `generator/generate/`.
	pub fn endpoint(&self, path: &str) -> String {
		format!("{}/{}", self.api_url.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
	}

	/// Channel connector for these endpoints. `http` is reused for polling.
	pub fn connector(&self, http: reqwest::Client) -> EndpointConnector {
		EndpointConnector::new(self.ws_url.clone(), self.api_url.clone(), http)
			.with_transports(self.transports.clone())
			.with_poll_interval(self.poll_interval)
	}
}

/// `<config dir>/webforge/config.json`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("webforge").join("config.json"))
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_url(name: &str, value: &str, schemes: &[&str]) -> Result<Url> {
	let url = Url::parse(value).map_err(|err| Error::Config(format!("{name}={value}: {err}")))?;
	if !schemes.contains(&url.scheme()) {
		return Err(Error::Config(format!("{name}={value}: expected one of {} schemes", schemes.join("/"))));
	}
	Ok(url)
}

fn parse_transports(list: &str) -> Result<Vec<TransportKind>> {
	let transports = list
		.split(',')
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(|item| item.parse::<TransportKind>().map_err(|err| Error::Config(format!("{ENV_TRANSPORTS}: {err}"))))
		.collect::<Result<Vec<_>>>()?;
	if transports.is_empty() {
		return Err(Error::Config(format!("{ENV_TRANSPORTS} lists no transports")));
	}
	Ok(transports)
}

fn interval(name: &str, ms: u64) -> Result<Duration> {
	if ms == 0 {
		return Err(Error::Config(format!("{name} must be greater than zero")));
	}
	Ok(Duration::from_millis(ms))
}
