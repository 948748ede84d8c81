//! Fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use httpmock::MockServer;
use parking_lot::Mutex;
use session_gateway::{
	client::ApiClient,
	config::ClientConfig,
	error::TransportError,
	http::{ApiResponse, HttpTransport, TransportFuture, TransportRequest},
	store::CredentialStore,
};
use tokio::sync::Notify;

/// Token pair issued by every successful scripted refresh.
pub const ROTATED_ACCESS: &str = "access-2";
/// Refresh token issued alongside [`ROTATED_ACCESS`].
pub const ROTATED_REFRESH: &str = "refresh-2";

/// In-process gateway: resources accept only [`ROTATED_ACCESS`], refreshes rotate to it.
pub struct ScriptedTransport {
	/// Status the refresh endpoint answers with.
	pub refresh_status: u16,
	/// Released by the test to let the refresh response through.
	pub refresh_gate: Option<Arc<Notify>>,
	/// Number of refresh exchanges received.
	pub refresh_calls: AtomicUsize,
	/// Every non-refresh request, in arrival order.
	pub requests: Mutex<Vec<TransportRequest>>,
}
impl ScriptedTransport {
	/// Refreshes succeed immediately.
	pub fn rotating() -> Self {
		Self {
			refresh_status: 200,
			refresh_gate: None,
			refresh_calls: AtomicUsize::new(0),
			requests: Mutex::new(Vec::new()),
		}
	}

	/// Refreshes succeed once `gate` is notified.
	pub fn gated(gate: Arc<Notify>) -> Self {
		Self { refresh_gate: Some(gate), ..Self::rotating() }
	}

	/// Refreshes fail with `status`.
	pub fn rejecting(status: u16) -> Self {
		Self { refresh_status: status, ..Self::rotating() }
	}

	/// Refreshes fail with `status` once `gate` is notified.
	pub fn gated_rejecting(gate: Arc<Notify>, status: u16) -> Self {
		Self { refresh_status: status, ..Self::gated(gate) }
	}

	pub fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}

	async fn answer(&self, request: TransportRequest) -> ApiResponse {
		if request.url.path().ends_with("/auth/refresh") {
			self.refresh_calls.fetch_add(1, Ordering::SeqCst);

			if let Some(gate) = &self.refresh_gate {
				gate.notified().await;
			}
			if self.refresh_status != 200 {
				return ApiResponse::new(self.refresh_status, r#"{"detail":"refresh rejected"}"#);
			}

			let body = serde_json::json!({
				"access_token": ROTATED_ACCESS,
				"refresh_token": ROTATED_REFRESH,
				"token_type": "bearer",
			});

			return ApiResponse::new(200, body.to_string());
		}

		let authorized = request.bearer() == Some(ROTATED_ACCESS);

		self.requests.lock().push(request);

		if authorized {
			ApiResponse::new(200, r#"{"ok":true}"#)
		} else {
			ApiResponse::new(401, r#"{"detail":"token expired"}"#)
		}
	}
}
impl HttpTransport for ScriptedTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move { Ok::<_, TransportError>(self.answer(request).await) })
	}
}

/// Configuration pointing at a fake gateway.
pub fn scripted_config() -> ClientConfig {
	ClientConfig::builder()
		.base_url("http://gateway.test")
		.build()
		.expect("Scripted configuration should be valid.")
}

/// Builds a scripted client whose store holds `access-1`/`refresh-1`.
pub fn scripted_client(transport: ScriptedTransport) -> ApiClient<ScriptedTransport> {
	ApiClient::with_transport(scripted_config(), seeded_credentials(), transport)
}

/// Credential store seeded with the expired `access-1`/`refresh-1` pair.
pub fn seeded_credentials() -> Arc<CredentialStore> {
	let credentials = Arc::new(CredentialStore::in_memory());

	credentials.set_tokens("access-1", "refresh-1").expect("Fixture tokens should persist.");

	credentials
}

/// Configuration pointing at an `httpmock` server.
pub fn mock_config(server: &MockServer) -> ClientConfig {
	ClientConfig::builder()
		.base_url(server.base_url())
		.build()
		.expect("Mock server configuration should be valid.")
}

/// Builds a reqwest-backed client against an `httpmock` server.
#[cfg(feature = "reqwest")]
pub fn mock_client(
	server: &MockServer,
	credentials: Arc<CredentialStore>,
) -> session_gateway::client::ReqwestApiClient {
	ApiClient::new(mock_config(server), credentials)
}
