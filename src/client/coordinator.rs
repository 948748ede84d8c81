//! Single-flight refresh coordination.
//!
//! When many requests fail with 401 at once, exactly one of them becomes the leader and exchanges
//! the refresh token; the rest enqueue a one-shot continuation and sleep until the leader settles
//! the flight. Settling swaps the state back to idle and completes every queued continuation with
//! the same outcome, in one step, so no waiter is ever left behind or completed twice. The state
//! mutex is only held for those swaps and never across an `.await`; the `Refreshing` tag itself is
//! what keeps a second flight from starting while one is outstanding.

// std
use std::mem;
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, RefreshRequest, RefreshResponse, TokenSecret},
	client::{ApiClient, RefreshMetrics},
	error::TransportError,
	http::{HttpTransport, Method, TransportRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::CredentialStore,
};

type RefreshOutcome = std::result::Result<TokenSecret, RefreshFailure>;
type Continuation = oneshot::Sender<RefreshOutcome>;

/// Why a refresh flight failed; shared verbatim with every waiter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshFailure {
	/// Human-readable failure summary.
	pub reason: String,
	/// HTTP status of the refresh call, when one was received.
	pub status: Option<u16>,
}
impl RefreshFailure {
	fn new(reason: impl Into<String>, status: Option<u16>) -> Self {
		Self { reason: reason.into(), status }
	}

	fn missing_refresh_token() -> Self {
		Self::new("no refresh token available", None)
	}

	fn abandoned() -> Self {
		Self::new("refresh abandoned before it settled", None)
	}

	fn rejected(status: u16) -> Self {
		Self::new(format!("refresh endpoint answered {status}"), Some(status))
	}
}
impl From<RefreshFailure> for Error {
	fn from(value: RefreshFailure) -> Self {
		Error::AuthRefreshFailed { reason: value.reason, status: value.status }
	}
}

#[derive(Debug, Default)]
enum RefreshState {
	#[default]
	Idle,
	Refreshing {
		pending: Vec<Continuation>,
	},
}

enum Role {
	Leader,
	Follower(oneshot::Receiver<RefreshOutcome>),
	AlreadyRotated(TokenSecret),
}

/// Coalesces concurrent refresh-eligible failures into a single refresh flight.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
	state: Mutex<RefreshState>,
	metrics: Arc<RefreshMetrics>,
}
impl RefreshCoordinator {
	/// Creates an idle coordinator reporting into `metrics`.
	pub fn new(metrics: Arc<RefreshMetrics>) -> Self {
		Self { state: Default::default(), metrics }
	}

	/// Returns `true` while a refresh flight is outstanding.
	pub fn is_refreshing(&self) -> bool {
		matches!(*self.state.lock(), RefreshState::Refreshing { .. })
	}

	/// Number of continuations waiting on the outstanding flight.
	pub fn pending(&self) -> usize {
		match &*self.state.lock() {
			RefreshState::Idle => 0,
			RefreshState::Refreshing { pending } => pending.len(),
		}
	}

	/// Recovers from a refresh-eligible 401 and returns the access token to replay with.
	///
	/// `sent_with` is the token the failed request carried. If the store already holds a different
	/// token, another flight finished in between and that token is returned without a network call.
	/// Otherwise the caller either leads a new flight, running `refresh` with the current refresh
	/// token, or joins the outstanding one. Either way it waits at most `wait_bound`: a follower
	/// that gives up leaves the flight running, a leader that gives up abandons it.
	pub async fn recover<F, Fut>(
		&self,
		credentials: &CredentialStore,
		sent_with: Option<&TokenSecret>,
		wait_bound: Duration,
		refresh: F,
	) -> Result<TokenSecret>
	where
		F: FnOnce(TokenSecret) -> Fut,
		Fut: Future<Output = std::result::Result<CredentialPair, RefreshFailure>>,
	{
		match self.enter(credentials, sent_with) {
			Role::AlreadyRotated(token) => {
				obs::refresh_skipped();

				Ok(token)
			},
			Role::Follower(continuation) => Self::follow(continuation, wait_bound).await,
			Role::Leader => self.lead(credentials, wait_bound, refresh).await,
		}
	}

	fn enter(&self, credentials: &CredentialStore, sent_with: Option<&TokenSecret>) -> Role {
		let mut state = self.state.lock();

		if let RefreshState::Refreshing { pending } = &mut *state {
			let (continuation, completion) = oneshot::channel();

			pending.push(continuation);
			self.metrics.record_coalesced();
			obs::refresh_joined(pending.len());

			return Role::Follower(completion);
		}
		if let Some(current) = credentials.access_token()
			&& sent_with != Some(&current)
		{
			return Role::AlreadyRotated(current);
		}

		*state = RefreshState::Refreshing { pending: Vec::new() };

		Role::Leader
	}

	async fn follow(
		completion: oneshot::Receiver<RefreshOutcome>,
		wait_bound: Duration,
	) -> Result<TokenSecret> {
		match tokio::time::timeout(wait_bound, completion).await {
			Ok(Ok(outcome)) => outcome.map_err(Error::from),
			Ok(Err(_)) => Err(RefreshFailure::abandoned().into()),
			Err(_) => Err(Error::Timeout { after: wait_bound }),
		}
	}

	async fn lead<F, Fut>(
		&self,
		credentials: &CredentialStore,
		wait_bound: Duration,
		refresh: F,
	) -> Result<TokenSecret>
	where
		F: FnOnce(TokenSecret) -> Fut,
		Fut: Future<Output = std::result::Result<CredentialPair, RefreshFailure>>,
	{
		let mut flight = Flight { coordinator: self, settled: false };

		self.metrics.record_attempt();
		obs::refresh_started();

		let exchanged = match credentials.refresh_token() {
			Some(refresh_token) =>
				match tokio::time::timeout(wait_bound, refresh(refresh_token)).await {
					Ok(exchanged) => exchanged,
					Err(_) => {
						// No outcome was observed, so the credentials stay as they are.
						self.metrics.record_failure();
						flight.settle(Err(RefreshFailure::abandoned()));

						return Err(Error::Timeout { after: wait_bound });
					},
				},
			None => Err(RefreshFailure::missing_refresh_token()),
		};
		let outcome = match exchanged {
			Ok(pair) => {
				let access_token = pair.access_token.clone();

				if let Err(e) = credentials.store_pair(pair) {
					obs::persist_failed("store_pair", &e);
				}

				self.metrics.record_success();

				Ok(access_token)
			},
			Err(failure) => {
				credentials.clear_logged();
				self.metrics.record_failure();

				Err(failure)
			},
		};

		flight.settle(outcome.clone());

		outcome.map_err(Error::from)
	}

	fn release(&self, outcome: RefreshOutcome) {
		let state = mem::take(&mut *self.state.lock());
		let pending = match state {
			RefreshState::Idle => Vec::new(),
			RefreshState::Refreshing { pending } => pending,
		};

		obs::refresh_settled(
			outcome.is_ok(),
			pending.len(),
			outcome.as_ref().err().map(|failure| failure.reason.as_str()),
		);
		obs::record_refresh_fanout(outcome.is_ok(), pending.len());

		for continuation in pending {
			// A waiter that timed out has dropped its receiver.
			let _ = continuation.send(outcome.clone());
		}
	}
}

/// Leader-side handle that guarantees the flight settles even if the leader is dropped mid-call.
struct Flight<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl Flight<'_> {
	fn settle(&mut self, outcome: RefreshOutcome) {
		self.settled = true;
		self.coordinator.release(outcome);
	}
}
impl Drop for Flight<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.coordinator.release(Err(RefreshFailure::abandoned()));
		}
	}
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges `refresh_token` for a new pair over the raw transport.
	///
	/// The call bypasses interception and failure detection entirely, so a rejected refresh can
	/// never recurse into another refresh.
	pub(crate) async fn exchange_refresh_token(
		&self,
		refresh_token: TokenSecret,
	) -> std::result::Result<CredentialPair, RefreshFailure> {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "exchange_refresh_token")
			.target(Method::Post, &self.config.refresh_path);

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.send_refresh(refresh_token)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn send_refresh(
		&self,
		refresh_token: TokenSecret,
	) -> std::result::Result<CredentialPair, RefreshFailure> {
		let url = self
			.config
			.refresh_endpoint()
			.map_err(|e| RefreshFailure::new(format!("refresh endpoint is invalid: {e}"), None))?;
		let body = serde_json::to_vec(&RefreshRequest { refresh_token: refresh_token.expose() })
			.map_err(|e| RefreshFailure::new(format!("refresh body is invalid: {e}"), None))?;
		let request = TransportRequest {
			method: Method::Post,
			url,
			headers: self.config.default_headers.clone(),
			body: Some(body),
		};
		let timeout = self.config.timeout;
		let response = match tokio::time::timeout(timeout, self.transport.send(request)).await {
			Ok(Ok(response)) => response,
			Ok(Err(e)) => return Err(network_failure(&e)),
			Err(_) =>
				return Err(RefreshFailure::new(
					format!("refresh did not complete within {timeout:?}"),
					None,
				)),
		};

		if !response.is_success() {
			return Err(RefreshFailure::rejected(response.status));
		}

		response.json::<RefreshResponse>().map(CredentialPair::from).map_err(|e| {
			RefreshFailure::new(format!("refresh response is malformed: {e}"), Some(response.status))
		})
	}
}

fn network_failure(error: &TransportError) -> RefreshFailure {
	let detail = StdError::source(error).map(ToString::to_string);

	match detail {
		Some(detail) => RefreshFailure::new(format!("{error} ({detail})"), None),
		None => RefreshFailure::new(error.to_string(), None),
	}
}
