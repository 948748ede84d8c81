//! One-shot replay of a request after its credentials were refreshed.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::{ApiClient, detector},
	http::{ApiRequest, ApiResponse, HttpTransport},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

/// Copies `request` and marks the copy as the post-refresh replay.
pub fn replay_of(request: &ApiRequest) -> ApiRequest {
	ApiRequest { already_retried: true, ..request.clone() }
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Re-sends `request` once with `fresh`; any 401 it earns is terminal.
	pub(crate) async fn replay(
		&self,
		request: &ApiRequest,
		fresh: &TokenSecret,
		timeout: Duration,
	) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Retry;

		let replay = replay_of(request);
		let span = CallSpan::new(KIND, "replay").target(replay.method, &replay.path);

		self.refresh_metrics.record_replay();
		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let outcome = span.instrument(self.attempt(&replay, Some(fresh), timeout)).await;
		let result = outcome.and_then(detector::into_result);

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}
}
