//! Authenticated API client: the uniform `get | post | put | delete` surface.
//!
//! Every call runs the same pipeline: the [`interceptor`] decorates the request, the transport
//! sends it, and the [`detector`] classifies the outcome. A first 401 is handed to the
//! [`RefreshCoordinator`], and a successful refresh is followed by exactly one replay through the
//! [`retry`] dispatcher.

pub mod coordinator;
pub mod detector;
pub mod interceptor;
pub mod retry;

mod metrics;

pub use coordinator::*;
pub use detector::{UNAUTHORIZED, Verdict};
pub use metrics::RefreshMetrics;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::ClientConfig,
	error::ConfigError,
	http::{ApiRequest, ApiResponse, HttpTransport, Method, TransportRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Authenticated client for one API root and one session.
///
/// Construct it once at startup and share clones with every consumer: clones share the transport,
/// the credential store, and the refresh coordinator, so the single-flight guarantee spans all of
/// them.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound call, including the refresh exchange.
	pub transport: Arc<T>,
	/// Validated client configuration.
	pub config: Arc<ClientConfig>,
	/// Session credentials read on every call and rotated by refreshes.
	pub credentials: Arc<CredentialStore>,
	/// Shared counters for refresh flow outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	coordinator: Arc<RefreshCoordinator>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client over a caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		credentials: Arc<CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let refresh_metrics = Arc::new(RefreshMetrics::default());

		Self {
			transport: transport.into(),
			config: Arc::new(config),
			credentials,
			coordinator: Arc::new(RefreshCoordinator::new(refresh_metrics.clone())),
			refresh_metrics,
		}
	}

	/// Refresh coordinator shared by every clone of this client.
	pub fn coordinator(&self) -> &RefreshCoordinator {
		&self.coordinator
	}

	/// Issues a `GET`.
	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		self.execute(ApiRequest::new(Method::Get, path)).await
	}

	/// Issues a `POST` with an optional JSON body.
	pub async fn post(&self, path: &str, body: Option<serde_json::Value>) -> Result<ApiResponse> {
		self.execute(with_optional_body(ApiRequest::new(Method::Post, path), body)).await
	}

	/// Issues a `PUT` with an optional JSON body.
	pub async fn put(&self, path: &str, body: Option<serde_json::Value>) -> Result<ApiResponse> {
		self.execute(with_optional_body(ApiRequest::new(Method::Put, path), body)).await
	}

	/// Issues a `DELETE`.
	pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
		self.execute(ApiRequest::new(Method::Delete, path)).await
	}

	/// Issues a `GET` and decodes the JSON body.
	pub async fn get_json<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		Ok(self.get(path).await?.json()?)
	}

	/// Serializes `body`, issues a `POST`, and decodes the JSON response.
	pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		let request = ApiRequest::new(Method::Post, path).with_body(body)?;

		Ok(self.execute(request).await?.json()?)
	}

	/// Runs a request through interception, failure detection, refresh, and at most one replay.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, "execute").target(request.method, &request.path);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.run(request)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Sends a request once with the current token and no refresh recovery.
	///
	/// A 401 is delivered as a terminal [`Error::Http`]. Used for calls whose 401 means bad input
	/// rather than an expired token, such as a login.
	pub async fn execute_once(&self, request: ApiRequest) -> Result<ApiResponse> {
		let timeout = self.timeout_for(&request);
		let token = self.credentials.access_token();
		let response = self.attempt(&request, token.as_ref(), timeout).await?;

		detector::into_result(response)
	}

	async fn run(&self, request: ApiRequest) -> Result<ApiResponse> {
		let timeout = self.timeout_for(&request);
		let sent_with = self.credentials.access_token();
		let outcome = self.attempt(&request, sent_with.as_ref(), timeout).await;

		match detector::classify(&request, outcome) {
			Verdict::Deliver(result) => result,
			Verdict::RefreshEligible(_) => {
				let fresh = self
					.coordinator
					.recover(&self.credentials, sent_with.as_ref(), timeout, |refresh_token| {
						self.exchange_refresh_token(refresh_token)
					})
					.await?;

				self.replay(&request, &fresh, timeout).await
			},
		}
	}

	/// Sends a single decorated attempt bounded by `timeout`.
	pub(crate) async fn attempt(
		&self,
		request: &ApiRequest,
		token: Option<&TokenSecret>,
		timeout: Duration,
	) -> Result<ApiResponse> {
		let outbound = self.prepare(request, token)?;

		match tokio::time::timeout(timeout, self.transport.send(outbound)).await {
			Ok(result) => Ok(result?),
			Err(_) => Err(Error::Timeout { after: timeout }),
		}
	}

	fn prepare(&self, request: &ApiRequest, token: Option<&TokenSecret>) -> Result<TransportRequest> {
		let url = self.config.endpoint(&request.path)?;
		let mut headers = request.headers.clone();

		headers.fill_from(&self.config.default_headers);
		interceptor::attach(&mut headers, token);

		let body = match &request.body {
			Some(value) => Some(serde_json::to_vec(value).map_err(ConfigError::from)?),
			None => None,
		};

		Ok(TransportRequest { method: request.method, url, headers, body })
	}

	fn timeout_for(&self, request: &ApiRequest) -> Duration {
		request.timeout.unwrap_or(self.config.timeout)
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client that provisions its own reqwest-backed transport.
	pub fn new(config: ClientConfig, credentials: Arc<CredentialStore>) -> Self {
		Self::with_transport(config, credentials, ReqwestTransport::default())
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			config: self.config.clone(),
			credentials: self.credentials.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("api_root", &self.config.api_root.as_str())
			.field("credentials", &self.credentials)
			.field("refreshing", &self.coordinator.is_refreshing())
			.finish()
	}
}

fn with_optional_body(request: ApiRequest, body: Option<serde_json::Value>) -> ApiRequest {
	match body {
		Some(body) => request.with_json(body),
		None => request,
	}
}
