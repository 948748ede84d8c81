//! Transport primitives: request descriptors, responses, and the pluggable HTTP transport.
//!
//! [`HttpTransport`] is the client's only dependency on an HTTP stack. The client hands it fully
//! intercepted [`TransportRequest`] values and receives raw [`ApiResponse`] values back; status
//! classification, refresh, and replay all happen above this layer, so a transport must never
//! retry or follow authentication challenges on its own.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, DecodeError, TransportError},
};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a single request.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every clone
/// of a client and by the refresh coordinator.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends one request and returns whatever response arrived, success or not.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// HTTP methods exposed by the client surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Case-insensitive header map; names are stored lowercased.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);
impl Headers {
	/// Inserts or replaces a header.
	pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
		self.0.insert(name.as_ref().to_ascii_lowercase(), value.into());
	}

	/// Looks up a header by name.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Returns `true` if the header is present.
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(&name.to_ascii_lowercase())
	}

	/// Removes a header, returning its previous value.
	pub fn remove(&mut self, name: &str) -> Option<String> {
		self.0.remove(&name.to_ascii_lowercase())
	}

	/// Copies every header from `other` that is not already set here.
	pub fn fill_from(&mut self, other: &Headers) {
		for (name, value) in other.iter() {
			self.0.entry(name.to_owned()).or_insert_with(|| value.to_owned());
		}
	}

	/// Iterates `(name, value)` pairs in name order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
	}

	/// Number of headers.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if no header is set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<K, V> FromIterator<(K, V)> for Headers
where
	K: AsRef<str>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		let mut headers = Self::default();

		for (name, value) in iter {
			headers.insert(name, value);
		}

		headers
	}
}

/// Caller-facing request descriptor.
///
/// `already_retried` is owned by the client: it flips to `true` on the single replay that follows
/// a token refresh and keeps that replay from ever re-entering the refresh flow.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the API root.
	pub path: String,
	/// Caller-supplied headers.
	pub headers: Headers,
	/// Optional JSON body.
	pub body: Option<serde_json::Value>,
	/// Per-attempt timeout override.
	pub timeout: Option<Duration>,
	/// Whether this request is already the post-refresh replay.
	pub already_retried: bool,
}
impl ApiRequest {
	/// Creates a descriptor with no headers, body, or timeout override.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			headers: Headers::default(),
			body: None,
			timeout: None,
			already_retried: false,
		}
	}

	/// Attaches a JSON body.
	pub fn with_json(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes and attaches a JSON body.
	pub fn with_body<B>(self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		Ok(self.with_json(serde_json::to_value(body)?))
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Overrides the per-attempt timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}

/// Fully resolved request handed to an [`HttpTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL.
	pub url: Url,
	/// Final header set, including authorization and correlation headers.
	pub headers: Headers,
	/// Serialized body bytes.
	pub body: Option<Vec<u8>>,
}
impl TransportRequest {
	/// Returns the bearer token carried by the request, if any.
	pub fn bearer(&self) -> Option<&str> {
		self.headers.get(AUTHORIZATION).and_then(|value| value.strip_prefix("Bearer "))
	}
}

/// `Authorization` header name.
pub const AUTHORIZATION: &str = "authorization";

/// Raw response returned by an [`HttpTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: Headers,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response with no headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: Headers::default(), body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Body decoded lossily as UTF-8.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: serde::de::DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError::Json { source, status: self.status })
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Configure any custom [`ReqwestClient`] without its own request timeout: the client bounds each
/// attempt itself so queued refresh waiters and replays share one policy.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn execute(
		client: ReqwestClient,
		request: TransportRequest,
	) -> Result<ApiResponse, TransportError> {
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		};
		let mut builder = client.request(method, request.url);

		for (name, value) in request.headers.iter() {
			builder = builder.header(name, value);
		}
		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		let response = builder.send().await?;
		let status = response.status().as_u16();
		let headers = response
			.headers()
			.iter()
			.filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
			.collect::<Headers>();
		let body = response.bytes().await?.to_vec();

		Ok(ApiResponse { status, headers, body })
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(Self::execute(self.0.clone(), request))
	}
}
