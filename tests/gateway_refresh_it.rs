#![cfg(feature = "reqwest")]

// std
use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use auth_gateway::{
	backend::{BackendDescriptor, BackendId},
	credential::{AccessCredential, RefreshCredential},
	error::{Error, ExpiredSession},
	ext::SessionListener,
	gateway::Gateway,
	request::RequestDescriptor,
	store::{CredentialStore, MemoryStore},
	transport::ReqwestHttpClient,
};

fn build_descriptor(server: &MockServer) -> BackendDescriptor {
	BackendDescriptor::builder(
		BackendId::new("mock-refresh")
			.expect("Backend identifier should be valid for refresh tests."),
	)
	.base_url(Url::parse(&server.base_url()).expect("Mock base URL should parse successfully."))
	.refresh_path("auth/refresh")
	.build()
	.expect("Backend descriptor should build successfully.")
}

fn build_test_gateway(
	descriptor: BackendDescriptor,
) -> (Gateway<ReqwestHttpClient>, Arc<MemoryStore>) {
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn CredentialStore> = store_backend.clone();
	let client = reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");
	let gateway =
		Gateway::with_http_client(store, descriptor, ReqwestHttpClient::with_client(client));

	(gateway, store_backend)
}

async fn seed_credentials(store: &dyn CredentialStore, access: AccessCredential, refresh: &str) {
	store.store_access(access).await.expect("Seeding the access credential should succeed.");
	store
		.store_refresh(RefreshCredential::new(refresh))
		.await
		.expect("Seeding the refresh credential should succeed.");
}

/// Counts expiry notifications and records the last reason.
#[derive(Debug, Default)]
struct RecordingListener {
	notifications: AtomicUsize,
	last_reason: Mutex<Option<String>>,
}
impl RecordingListener {
	fn notifications(&self) -> usize {
		self.notifications.load(Ordering::SeqCst)
	}

	fn last_reason(&self) -> Option<String> {
		self.last_reason.lock().expect("Reason lock should not be poisoned.").clone()
	}
}
impl SessionListener for RecordingListener {
	fn session_expired(&self, reason: &ExpiredSession) {
		self.notifications.fetch_add(1, Ordering::SeqCst);
		*self.last_reason.lock().expect("Reason lock should not be poisoned.") =
			Some(reason.reason.clone());
	}
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_test_gateway(build_descriptor(&server));

	seed_credentials(store.as_ref(), AccessCredential::new("t1"), "refresh-1").await;

	let _stale_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/data").header("authorization", "Bearer t1");
			then.status(401);
		})
		.await;
	let fresh_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/data").header("authorization", "Bearer t2");
			then.status(200).body("fresh");
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/refresh")
				.json_body(serde_json::json!({ "refresh_token": "refresh-1" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"t2\",\"expires_in\":1800}");
		})
		.await;
	let (first, second, third) = tokio::join!(
		gateway.send(RequestDescriptor::get("/data")),
		gateway.send(RequestDescriptor::get("/data")),
		gateway.send(RequestDescriptor::get("/data")),
	);

	for response in [first, second, third] {
		let response = response.expect("Every queued request should settle successfully.");

		assert!(response.is_success());
		assert_eq!(response.text(), "fresh");
	}

	refresh_mock.assert_calls_async(1).await;
	fresh_mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn request_queued_during_refresh_replays_with_the_rotated_credential() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_test_gateway(build_descriptor(&server));

	seed_credentials(store.as_ref(), AccessCredential::new("t1"), "refresh-1").await;

	let _stale_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/lessons").header("authorization", "Bearer t1");
			then.status(401);
		})
		.await;
	let fresh_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/lessons").header("authorization", "Bearer t2");
			then.status(200).body("lesson");
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.delay(core::time::Duration::from_millis(300))
				.body(
					"{\"access_token\":\"t2\",\"refresh_token\":\"refresh-2\",\"expires_in\":1800}",
				);
		})
		.await;
	// Request A hits 401 and starts the refresh; request B arrives while the
	// refresh is still in flight and must suspend behind it.
	let request_a = tokio::spawn({
		let gateway = gateway.clone();

		async move { gateway.send(RequestDescriptor::get("/lessons")).await }
	});

	tokio::time::sleep(core::time::Duration::from_millis(50)).await;

	let request_b = tokio::spawn({
		let gateway = gateway.clone();

		async move { gateway.send(RequestDescriptor::get("/lessons")).await }
	});
	let response_a = request_a
		.await
		.expect("Task A should not panic.")
		.expect("Request A should settle successfully after the refresh.");
	let response_b = request_b
		.await
		.expect("Task B should not panic.")
		.expect("Request B should settle successfully after the refresh.");

	assert_eq!(response_a.text(), "lesson");
	assert_eq!(response_b.text(), "lesson");

	refresh_mock.assert_calls_async(1).await;
	fresh_mock.assert_calls_async(2).await;

	let rotated = store
		.refresh_credential()
		.await
		.expect("Refresh credential fetch should succeed.")
		.expect("Rotated refresh credential should be persisted.");

	assert_eq!(rotated.expose(), "refresh-2");
}

#[tokio::test]
async fn failed_refresh_rejects_every_waiter_and_notifies_once() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_test_gateway(build_descriptor(&server));
	let listener = Arc::new(RecordingListener::default());
	let gateway = gateway.with_listener(listener.clone());

	seed_credentials(store.as_ref(), AccessCredential::new("t1"), "refresh-dead").await;

	let _locked_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/locked");
			then.status(401);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(400)
				.header("content-type", "application/json")
				.delay(core::time::Duration::from_millis(300))
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let request_a = tokio::spawn({
		let gateway = gateway.clone();

		async move { gateway.send(RequestDescriptor::get("/locked")).await }
	});

	tokio::time::sleep(core::time::Duration::from_millis(50)).await;

	let request_b = tokio::spawn({
		let gateway = gateway.clone();

		async move { gateway.send(RequestDescriptor::get("/locked")).await }
	});
	let err_a = request_a
		.await
		.expect("Task A should not panic.")
		.expect_err("Request A must reject after the failed refresh.");
	let err_b = request_b
		.await
		.expect("Task B should not panic.")
		.expect_err("Request B must reject with the same terminal failure.");

	assert!(matches!(err_a, Error::SessionExpired(_)));
	assert!(matches!(err_b, Error::SessionExpired(_)));

	refresh_mock.assert_calls_async(1).await;

	assert_eq!(listener.notifications(), 1, "Expiry notification must fire exactly once.");
	assert!(
		listener
			.last_reason()
			.expect("A notification reason should be recorded.")
			.contains("HTTP 400"),
	);
	assert!(
		store
			.refresh_credential()
			.await
			.expect("Refresh credential fetch should succeed.")
			.is_none(),
		"The refresh credential must be deleted after a terminal failure.",
	);
}

#[tokio::test]
async fn missing_refresh_credential_is_terminal_without_an_endpoint_call() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_test_gateway(build_descriptor(&server));
	let listener = Arc::new(RecordingListener::default());
	let gateway = gateway.with_listener(listener.clone());

	store
		.store_access(AccessCredential::new("t1"))
		.await
		.expect("Seeding the access credential should succeed.");

	let _locked_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/locked");
			then.status(401);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"unexpected\"}");
		})
		.await;
	let err = gateway
		.send(RequestDescriptor::get("/locked"))
		.await
		.expect_err("Recovery without a refresh credential must fail terminally.");

	assert!(matches!(err, Error::SessionExpired(_)));

	refresh_mock.assert_calls_async(0).await;

	assert_eq!(listener.notifications(), 1);
}

#[tokio::test]
async fn locally_expired_credential_refreshes_before_dispatch() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_test_gateway(build_descriptor(&server));

	seed_credentials(
		store.as_ref(),
		AccessCredential::new("t1").with_expires_at(OffsetDateTime::now_utc() - Duration::minutes(1)),
		"refresh-1",
	)
	.await;

	// Only the refreshed credential is mocked: a dispatch carrying the expired
	// one would miss every mock and fail the success assertion below.
	let fresh_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/catalog").header("authorization", "Bearer t2");
			then.status(200).body("catalog");
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"t2\",\"expires_in\":1800}");
		})
		.await;
	let response = gateway
		.send(RequestDescriptor::get("/catalog"))
		.await
		.expect("Preemptive refresh should let the request succeed first try.");

	assert!(response.is_success());

	refresh_mock.assert_calls_async(1).await;
	fresh_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn forced_refresh_rotates_through_the_public_api() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_test_gateway(build_descriptor(&server));

	seed_credentials(store.as_ref(), AccessCredential::new("t1"), "refresh-1").await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"t2\",\"expires_in\":1800}");
		})
		.await;
	let credential = gateway
		.refresh_access_credential()
		.await
		.expect("Forced refresh should succeed with a valid refresh credential.");

	assert_eq!(credential.expose(), "t2");
	assert!(credential.expires_at().is_some());

	refresh_mock.assert_async().await;

	let stored = store
		.access_credential()
		.await
		.expect("Access credential fetch should succeed.")
		.expect("Access credential should be present after the forced refresh.");

	assert_eq!(stored.expose(), "t2");
	assert_eq!(gateway.refresh_metrics.attempts(), 1);
	assert_eq!(gateway.refresh_metrics.successes(), 1);
}
