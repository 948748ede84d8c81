#![cfg(feature = "reqwest")]

mod common;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
use session_gateway::{
	error::Error,
	http::{ApiRequest, Method},
	store::CredentialStore,
};
// self
use common::{mock_client, seeded_credentials};

const REFRESH_PATH: &str = "/api/v1/auth/refresh";
const PROJECTS_PATH: &str = "/api/v1/projects";

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
	let server = MockServer::start_async().await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path(PROJECTS_PATH).header("authorization", "Bearer access-1");
			then.status(401).body("{\"detail\":\"token expired\"}");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path(PROJECTS_PATH).header("authorization", "Bearer access-2");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"name\":\"Herzl 12\"}]");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH).json_body(json!({ "refresh_token": "refresh-1" }));
			then.status(200)
				.header("content-type", "application/json")
				.delay(Duration::from_millis(200))
				.body(
					"{\"access_token\":\"access-2\",\"refresh_token\":\"refresh-2\",\"token_type\":\"bearer\"}",
				);
		})
		.await;
	let credentials = seeded_credentials();
	let client = mock_client(&server, credentials.clone());
	let (first, second) = tokio::join!(client.get("/projects"), client.get("/projects"));
	let first = first.expect("First request should succeed after the refresh.");
	let second = second.expect("Second request should succeed after the refresh.");

	assert_eq!(first.status, 200);
	assert_eq!(second.status, 200);
	assert_eq!(first.text(), "[{\"name\":\"Herzl 12\"}]");
	assert_eq!(credentials.access_token().map(|t| t.expose().to_owned()), Some("access-2".into()));
	assert_eq!(credentials.refresh_token().map(|t| t.expose().to_owned()), Some("refresh-2".into()));
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.replays(), 2);

	refresh.assert_calls_async(1).await;
	expired.assert_calls_async(2).await;
	fresh.assert_calls_async(2).await;
}

#[tokio::test]
async fn failed_refresh_clears_the_session() {
	let server = MockServer::start_async().await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path(PROJECTS_PATH);
			then.status(401).body("{\"detail\":\"token expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(500).body("{\"detail\":\"database unavailable\"}");
		})
		.await;
	let credentials = seeded_credentials();
	let client = mock_client(&server, credentials.clone());
	let err = client.get("/projects").await.expect_err("Request should fail with the refresh.");

	assert!(matches!(err, Error::AuthRefreshFailed { status: Some(500), .. }));
	assert!(!credentials.is_authenticated());
	assert!(credentials.refresh_token().is_none());
	assert_eq!(client.refresh_metrics.failures(), 1);
	assert_eq!(client.refresh_metrics.replays(), 0);

	refresh.assert_calls_async(1).await;
	expired.assert_calls_async(1).await;
}

#[tokio::test]
async fn replayed_unauthorized_is_terminal() {
	let server = MockServer::start_async().await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path(PROJECTS_PATH);
			then.status(401).body("{\"detail\":\"insufficient role\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-2\",\"refresh_token\":\"refresh-2\"}");
		})
		.await;
	let client = mock_client(&server, seeded_credentials());
	let err = client.get("/projects").await.expect_err("Replay should fail with 401.");

	assert!(err.is_unauthorized());
	assert!(matches!(err, Error::Http { ref body, .. } if body.contains("insufficient role")));
	assert!(client.credentials.is_authenticated());

	refresh.assert_calls_async(1).await;
	rejected.assert_calls_async(2).await;
}

#[tokio::test]
async fn non_auth_failures_pass_through_without_refresh() {
	let server = MockServer::start_async().await;
	let broken = server
		.mock_async(|when, then| {
			when.method(GET).path(PROJECTS_PATH);
			then.status(500).body("{\"detail\":\"boom\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200);
		})
		.await;
	let client = mock_client(&server, seeded_credentials());
	let err = client.get("/projects").await.expect_err("A 500 should reach the caller.");

	assert_eq!(err.status(), Some(500));
	assert_eq!(client.refresh_metrics.attempts(), 0);

	broken.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn missing_refresh_token_never_calls_the_refresh_endpoint() {
	let server = MockServer::start_async().await;
	let anonymous = server
		.mock_async(|when, then| {
			when.method(GET).path(PROJECTS_PATH);
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200);
		})
		.await;
	let client = mock_client(&server, Arc::new(CredentialStore::in_memory()));
	let err = client.get("/projects").await.expect_err("Anonymous request should fail.");

	assert!(matches!(err, Error::AuthRefreshFailed { status: None, .. }));

	anonymous.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn outbound_requests_carry_bearer_correlation_and_body() {
	let server = MockServer::start_async().await;
	let created = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(PROJECTS_PATH)
				.header("authorization", "Bearer access-1")
				.header("content-type", "application/json")
				.header_exists("x-request-id")
				.json_body(json!({ "name": "Herzl 12", "buildings": 3 }));
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"project_id\":\"p-1\"}");
		})
		.await;
	let client = mock_client(&server, seeded_credentials());
	let response = client
		.post("/projects", Some(json!({ "name": "Herzl 12", "buildings": 3 })))
		.await
		.expect("Create request should succeed.");

	assert_eq!(response.status, 201);

	created.assert_async().await;
}

#[tokio::test]
async fn slow_attempts_time_out() {
	let server = MockServer::start_async().await;
	let _slow = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/v1/projects/7");
			then.status(204).delay(Duration::from_millis(500));
		})
		.await;
	let client = mock_client(&server, seeded_credentials());
	let bound = Duration::from_millis(50);
	let err = client
		.execute(ApiRequest::new(Method::Delete, "/projects/7").with_timeout(bound))
		.await
		.expect_err("Attempt should exceed its bound.");

	assert!(matches!(err, Error::Timeout { after } if after == bound));
}
