//! Walks a session through login, an expired access token, the transparent refresh, and logout
//! against a local mock gateway.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use session_gateway::{
	client::ApiClient,
	config::ClientConfig,
	session::{AuthSession, LoginCredentials},
	store::CredentialStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/login");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"access_token": "demo-access-1",
				"refresh_token": "demo-refresh-1",
				"token_type": "bearer",
				"user": {
					"user_id": "demo-user",
					"email": "agent@renewal.local",
					"full_name": "Demo Agent",
					"role": "AGENT",
					"is_active": true,
				},
			}));
		})
		.await;
	let _expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/projects").header("authorization", "Bearer demo-access-1");
			then.status(401).body("{\"detail\":\"token expired\"}");
		})
		.await;
	let _projects = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/projects").header("authorization", "Bearer demo-access-2");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"name\":\"Herzl 12\"},{\"name\":\"Bialik 4\"}]");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"access_token": "demo-access-2",
				"refresh_token": "demo-refresh-2",
			}));
		})
		.await;
	let _logout = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/logout");
			then.status(204);
		})
		.await;
	let config = ClientConfig::builder().base_url(server.base_url()).build()?;
	let client = ApiClient::new(config, CredentialStore::in_memory().into());
	let session = AuthSession::new(client.clone());
	let auth = session.login(&LoginCredentials::new("agent@renewal.local", "demo-password")).await?;

	println!("Logged in as {} ({}).", auth.user.full_name, auth.user.role);

	let (first, second) = tokio::join!(client.get("/projects"), client.get("/projects"));

	println!("First listing: {}", first?.text());
	println!("Second listing: {}", second?.text());
	println!(
		"Refresh endpoint calls: {}, coalesced waiters: {}, replays: {}.",
		refresh.calls_async().await,
		client.refresh_metrics.coalesced(),
		client.refresh_metrics.replays(),
	);

	session.logout().await?;

	println!("Authenticated after logout: {}.", session.is_authenticated());

	Ok(())
}
