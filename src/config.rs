//! Client configuration: API root, per-attempt timeout, refresh endpoint, and default headers.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError, http::Headers};

/// Environment variable overriding the API origin.
pub const ENV_API_URL: &str = "SESSION_GATEWAY_API_URL";
/// Environment variable overriding the per-attempt timeout, in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "SESSION_GATEWAY_TIMEOUT_SECS";

/// Validated, immutable client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// API root every request path is resolved against (origin plus prefix, trailing slash).
	pub api_root: Url,
	/// Bound applied to each attempt and to each wait on an outstanding refresh.
	pub timeout: Duration,
	/// Path of the refresh endpoint, relative to the API root.
	pub refresh_path: String,
	/// Headers attached to every outbound request before interception.
	pub default_headers: Headers,
}
impl ClientConfig {
	/// Default API origin.
	pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
	/// Default API prefix.
	pub const DEFAULT_API_PREFIX: &str = "/api/v1";
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
	/// Default per-attempt timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

	/// Creates a builder seeded with the defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Builds a configuration from the defaults plus environment overrides.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_vars(|name| env::var(name).ok())
	}

	fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&'static str) -> Option<String>,
	{
		let mut builder = Self::builder();

		if let Some(url) = lookup(ENV_API_URL) {
			builder = builder.base_url(url);
		}
		if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
			let secs = raw
				.trim()
				.parse::<u64>()
				.map_err(|_| ConfigError::InvalidEnv { name: ENV_TIMEOUT_SECS, value: raw.clone() })?;

			builder = builder.timeout(Duration::from_secs(secs));
		}

		builder.build()
	}

	/// Resolves a request path against the API root.
	///
	/// Leading slashes are ignored so `/projects` and `projects` land on the same URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.api_root
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.refresh_path)
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// API origin, e.g. `https://renewal.example.com`.
	pub base_url: String,
	/// Path prefix appended to the origin.
	pub api_prefix: String,
	/// Per-attempt timeout.
	pub timeout: Duration,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Default headers.
	pub default_headers: Headers,
}
impl ClientConfigBuilder {
	fn json_headers() -> Headers {
		let mut headers = Headers::default();

		headers.insert("content-type", "application/json");

		headers
	}

	/// Sets the API origin.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = url.into();

		self
	}

	/// Sets the API prefix (use `""` for none).
	pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.api_prefix = prefix.into();

		self
	}

	/// Sets the per-attempt timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Adds or replaces a default header.
	pub fn default_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.default_headers.insert(name, value);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		if self.timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}

		let origin = self.base_url.trim_end_matches('/');
		let prefix = self.api_prefix.trim_matches('/');
		let root = if prefix.is_empty() {
			format!("{origin}/")
		} else {
			format!("{origin}/{prefix}/")
		};
		let api_root =
			Url::parse(&root).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		validate_root(&api_root)?;

		Ok(ClientConfig {
			api_root,
			timeout: self.timeout,
			refresh_path: self.refresh_path,
			default_headers: self.default_headers,
		})
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: ClientConfig::DEFAULT_BASE_URL.into(),
			api_prefix: ClientConfig::DEFAULT_API_PREFIX.into(),
			timeout: ClientConfig::DEFAULT_TIMEOUT,
			refresh_path: ClientConfig::DEFAULT_REFRESH_PATH.into(),
			default_headers: Self::json_headers(),
		}
	}
}

fn validate_root(url: &Url) -> Result<(), ConfigError> {
	if matches!(url.scheme(), "http" | "https") && url.has_host() {
		Ok(())
	} else {
		Err(ConfigError::UnsupportedBaseUrl { url: url.to_string() })
	}
}
