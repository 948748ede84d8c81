// self
use crate::{_prelude::*, auth::Identity, http::Method, obs::CallKind, store::StoreError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span covering one client call, tagged with its kind, call site, and target.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Opens a span for `kind` at `stage`; the target fields stay empty until
	/// [`target`](Self::target) fills them.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"session_gateway.call",
				call = kind.as_str(),
				stage,
				method = tracing::field::Empty,
				path = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Records the request line this span covers.
	pub fn target(self, method: Method, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			self.span.record("method", method.as_str());
			self.span.record("path", path);
		}
		#[cfg(not(feature = "tracing"))]
		let _ = (method, path);

		self
	}

	/// Runs `fut` inside the span; nothing is entered across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Notes that this caller became the refresh leader.
pub fn refresh_started() {
	#[cfg(feature = "tracing")]
	tracing::debug!("access token rejected; starting refresh");
}

/// Notes that this caller joined an outstanding refresh instead of starting one.
pub fn refresh_joined(position: usize) {
	#[cfg(feature = "tracing")]
	tracing::debug!(position, "refresh already in flight; waiting for its outcome");
	#[cfg(not(feature = "tracing"))]
	let _ = position;
}

/// Notes that a newer token was already in place, so no refresh was needed.
pub fn refresh_skipped() {
	#[cfg(feature = "tracing")]
	tracing::debug!("credentials rotated since the request was sent; replaying directly");
}

/// Notes how a refresh flight settled and how many waiters it released.
pub fn refresh_settled(succeeded: bool, waiters: usize, reason: Option<&str>) {
	#[cfg(feature = "tracing")]
	{
		if succeeded {
			tracing::info!(waiters, "access token refreshed");
		} else {
			tracing::warn!(waiters, reason, "access token refresh failed; credentials cleared");
		}
	}
	#[cfg(not(feature = "tracing"))]
	let _ = (succeeded, waiters, reason);
}

/// Reports a credential persistence failure that cannot be returned to a caller.
pub fn persist_failed(operation: &'static str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	tracing::error!(operation, %error, "failed to persist session state");
	#[cfg(not(feature = "tracing"))]
	let _ = (operation, error);
}

/// Notes a successful login.
pub fn session_opened(identity: &Identity) {
	#[cfg(feature = "tracing")]
	tracing::info!(user_id = %identity.user_id, role = %identity.role, "session opened");
	#[cfg(not(feature = "tracing"))]
	let _ = identity;
}

/// Reports a best-effort call whose failure is deliberately swallowed.
pub fn ignored_failure(stage: &'static str, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(stage, %error, "ignoring failed call");
	#[cfg(not(feature = "tracing"))]
	let _ = (stage, error);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn call_span_noop_without_subscriber() {
		let _span = CallSpan::new(CallKind::Request, "test").target(Method::Get, "/projects");

		refresh_settled(false, 3, Some("refresh endpoint answered 500"));
	}

	#[tokio::test]
	async fn instrument_passes_the_output_through() {
		let span = CallSpan::new(CallKind::Refresh, "exchange_refresh_token");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
