//! Client-level error types shared by the transport, refresh, and session layers.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS); no response was received.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Upstream answered with a non-success status.
	///
	/// A 401 surfaces here only after the one permitted replay also failed.
	#[error("Request failed with HTTP status {status}.")]
	Http {
		/// HTTP status code returned by the upstream.
		status: u16,
		/// Raw response body, lossily decoded as UTF-8.
		body: String,
	},
	/// The token refresh that would have recovered this request failed.
	#[error("Access token refresh failed: {reason}.")]
	AuthRefreshFailed {
		/// Human-readable failure summary.
		reason: String,
		/// HTTP status of the refresh call, when one was received.
		status: Option<u16>,
	},
	/// An attempt, or a wait on an outstanding refresh, exceeded its bound.
	#[error("Request did not complete within {after:?}.")]
	Timeout {
		/// Bound that elapsed.
		after: Duration,
	},
}
impl Error {
	/// Returns the HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Http { status, .. } => Some(*status),
			Self::AuthRefreshFailed { status, .. } => *status,
			_ => None,
		}
	}

	/// Returns `true` when the error is a terminal 401.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Http { status: 401, .. })
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL parsed but cannot serve as an API root.
	#[error("Base URL `{url}` must use http or https and carry a host.")]
	UnsupportedBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Request path cannot be joined onto the API root.
	#[error("Request path `{path}` is invalid.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	InvalidBody(#[from] serde_json::Error),
	/// Per-attempt timeout must be positive.
	#[error("Request timeout must be greater than zero.")]
	ZeroTimeout,
	/// Environment variable holds an unusable value.
	#[error("Environment variable `{name}` holds an invalid value: {value}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Raw value found in the environment.
		value: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body is not the JSON shape the caller asked for.
	#[error("Response body is not valid JSON for the requested type (status {status}).")]
	Json {
		/// Structured parsing failure, including the JSON path that failed.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the decoded response.
		status: u16,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_helpers_classify_terminal_unauthorized() {
		let terminal = Error::Http { status: 401, body: "{\"detail\":\"expired\"}".into() };
		let refresh = Error::AuthRefreshFailed { reason: "refresh rejected".into(), status: None };

		assert!(terminal.is_unauthorized());
		assert_eq!(terminal.status(), Some(401));
		assert!(!refresh.is_unauthorized());
		assert_eq!(refresh.status(), None);
	}

	#[test]
	fn refresh_failure_message_names_the_reason() {
		let err = Error::AuthRefreshFailed {
			reason: "refresh endpoint answered 500".into(),
			status: Some(500),
		};

		assert_eq!(err.to_string(), "Access token refresh failed: refresh endpoint answered 500.");
	}
}
