// self
use crate::obs::{CallKind, CallOutcome};

/// Increments `session_gateway_call_total{call, outcome}` when the `metrics` feature is on.
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"session_gateway_call_total",
		"call" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records how many queued callers a settled refresh released, labeled by its outcome.
pub fn record_refresh_fanout(succeeded: bool, waiters: usize) {
	#[cfg(feature = "metrics")]
	{
		let outcome = if succeeded { CallOutcome::Success } else { CallOutcome::Failure };

		metrics::histogram!("session_gateway_refresh_waiters", "outcome" => outcome.as_str())
			.record(waiters as f64);
	}
	#[cfg(not(feature = "metrics"))]
	let _ = (succeeded, waiters);
}
