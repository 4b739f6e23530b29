//! HTTP client for the generation backend.

use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};
use webforge_protocol::{GenerateRequest, ProjectDescriptor, UserProfile};

use crate::config::ClientConfig;
use crate::error::{Error, Result};

pub const GENERATE_PATH: &str = "generator/generate/";
pub const CURRENT_USER_PATH: &str = "auth/me/";
pub const LOGOUT_PATH: &str = "auth/logout/";

/// Backend operations the session and auth state depend on.
#[async_trait]
pub trait ApiClient: Send + Sync {
	/// `POST /generator/generate/`
	async fn generate(&self, request: &GenerateRequest) -> Result<ProjectDescriptor>;

	/// `GET /auth/me/`
	async fn current_user(&self) -> Result<UserProfile>;

	/// `POST /auth/logout/`
	async fn logout(&self) -> Result<()>;
}

/// [`ApiClient`] over `reqwest`, carrying session cookies between calls.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
	http: reqwest::Client,
	config: ClientConfig,
}

impl HttpApiClient {
	pub fn new(config: ClientConfig) -> Result<Self> {
		let mut headers = HeaderMap::new();
		if let Some(cookie) = config.session_cookie.as_deref() {
			let value = HeaderValue::from_str(cookie).map_err(|err| Error::Config(format!("session cookie: {err}")))?;
			headers.insert(COOKIE, value);
		}
		let http = reqwest::Client::builder()
			.cookie_store(true)
			.default_headers(headers)
			.timeout(config.request_timeout)
			.build()?;
		Ok(Self { http, config })
	}

	/// The underlying client, shared with the polling transport.
	pub fn http_client(&self) -> &reqwest::Client {
		&self.http
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}
}

#[async_trait]
impl ApiClient for HttpApiClient {
	async fn generate(&self, request: &GenerateRequest) -> Result<ProjectDescriptor> {
		let url = self.config.endpoint(GENERATE_PATH);
		debug!(target = "webforge.api", %url, features = request.features.len(), "requesting generation");
		let response = self.http.post(&url).json(request).send().await?;
		let project: ProjectDescriptor = decode(response).await?;
		if project.id.is_empty() {
			return Err(Error::Api {
				status: StatusCode::OK.as_u16(),
				message: "generation response carried no project id".to_string(),
			});
		}
		Ok(project)
	}

	async fn current_user(&self) -> Result<UserProfile> {
		let url = self.config.endpoint(CURRENT_USER_PATH);
		let response = self.http.get(&url).send().await?;
		decode(response).await
	}

	async fn logout(&self) -> Result<()> {
		let url = self.config.endpoint(LOGOUT_PATH);
		let response = self.http.post(&url).send().await?;
		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(api_error(status, &body));
		}
		Ok(())
	}
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
	let status = response.status();
	let body = response.text().await?;
	if !status.is_success() {
		let err = api_error(status, &body);
		warn!(target = "webforge.api", status = status.as_u16(), error = %err, "request rejected");
		return Err(err);
	}
	Ok(serde_json::from_str(&body)?)
}

/// Builds an [`Error::Api`] from an error response, preferring the server's
/// `message`, `error` or `detail` field over the raw body.
pub fn api_error(status: StatusCode, body: &str) -> Error {
	let from_json = serde_json::from_str::<JsonValue>(body).ok().and_then(|value| {
		["message", "error", "detail"]
			.iter()
			.find_map(|key| value.get(*key).and_then(JsonValue::as_str).map(str::to_string))
	});
	let message = from_json
		.or_else(|| Some(body.trim().to_string()).filter(|body| !body.is_empty()))
		.unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
	Error::Api {
		status: status.as_u16(),
		message,
	}
}
