//! Response classification: which outcomes reach the caller and which trigger a refresh.

// self
use crate::{
	_prelude::*,
	http::{ApiRequest, ApiResponse},
};

/// Status that marks an expired or rejected access token.
pub const UNAUTHORIZED: u16 = 401;

/// What the client should do with one attempt's outcome.
#[derive(Debug)]
pub enum Verdict {
	/// Hand the result to the caller unchanged.
	Deliver(Result<ApiResponse>),
	/// First 401 for this request; recover through the refresh coordinator.
	RefreshEligible(ApiResponse),
}

/// Classifies an attempt's outcome against the request that produced it.
///
/// Only a 401 on a request that has not been replayed yet is refresh-eligible; a replay's 401 is
/// delivered as a terminal [`Error::Http`].
pub fn classify(request: &ApiRequest, outcome: Result<ApiResponse>) -> Verdict {
	match outcome {
		Ok(response) if response.status == UNAUTHORIZED && !request.already_retried =>
			Verdict::RefreshEligible(response),
		Ok(response) => Verdict::Deliver(into_result(response)),
		Err(e) => Verdict::Deliver(Err(e)),
	}
}

/// Maps non-2xx responses onto [`Error::Http`].
pub fn into_result(response: ApiResponse) -> Result<ApiResponse> {
	if response.is_success() {
		Ok(response)
	} else {
		Err(Error::Http { status: response.status, body: response.text() })
	}
}
