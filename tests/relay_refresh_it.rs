#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::Duration;
use url::Url;
// self
use auth_relay::{
	auth::CredentialPair,
	error::Error,
	http::ReqwestRefreshClient,
	policy::RetryPolicy,
	relay::Relay,
	store::{MemoryStore, SessionBlob, SessionState, SessionStore},
};

fn build_relay(server: &MockServer) -> (Relay<ReqwestRefreshClient>, Arc<MemoryStore>) {
	let base = Url::parse(&server.base_url()).expect("Mock server URL should parse.");
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn SessionStore> = store_backend.clone();
	let relay = Relay::new(store, base);

	(relay, store_backend)
}

async fn seed_session(store: &MemoryStore, tokens: CredentialPair) {
	let blob = SessionBlob::new(SessionState {
		tokens: Some(tokens),
		user: Some(json!({ "id": "user-1" })),
		is_authenticated: true,
		extra: Default::default(),
	});

	store.save(blob).await.expect("Failed to seed session blob into the store.");
}

#[tokio::test]
async fn refresh_rotates_and_persists_the_full_pair() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed_session(&store, CredentialPair::new("old-access").with_refresh_token("old-refresh"))
		.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/refresh")
				.json_body(json!({ "refresh_token": "old-refresh" }));
			then.status(200).json_body(json!({
				"access_token": "new-access",
				"refresh_token": "new-refresh",
				"token_type": "bearer"
			}));
		})
		.await;
	let rotated = relay
		.refresh_token_if_needed()
		.await
		.expect("Refresh should return the rotated access token.");

	mock.assert_async().await;

	assert_eq!(rotated, "new-access");
	assert_eq!(relay.metrics.refresh_attempts(), 1);
	assert_eq!(relay.metrics.refresh_successes(), 1);

	let blob = store
		.load()
		.await
		.expect("Store load should succeed after refresh.")
		.expect("Session blob should exist after refresh.");
	let tokens = blob.state.tokens.expect("Rotated tokens should be persisted.");

	assert_eq!(tokens.access_token, "new-access");
	assert_eq!(tokens.refresh_token.as_ref().map(|secret| secret.expose()), Some("new-refresh"));
	assert_eq!(tokens.token_type, "bearer");
	assert_eq!(blob.state.user, Some(json!({ "id": "user-1" })));
}

#[tokio::test]
async fn missing_refresh_token_makes_no_network_call() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed_session(&store, CredentialPair::new("access-only")).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).json_body(json!({
				"access_token": "never-used",
				"token_type": "Bearer"
			}));
		})
		.await;

	assert!(relay.refresh_token_if_needed().await.is_none());

	mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn concurrent_refreshes_share_one_exchange() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed_session(&store, CredentialPair::new("old-access").with_refresh_token("old-refresh"))
		.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).json_body(json!({
				"access_token": "shared-access",
				"refresh_token": "shared-refresh",
				"token_type": "Bearer"
			}));
		})
		.await;
	let (first, second) =
		tokio::join!(relay.refresh_token_if_needed(), relay.refresh_token_if_needed());

	mock.assert_async().await;

	assert_eq!(first.as_deref(), Some("shared-access"));
	assert_eq!(second.as_deref(), Some("shared-access"));
	assert_eq!(relay.metrics.refresh_attempts(), 1);
	assert_eq!(relay.metrics.refresh_joins(), 1);
}

#[tokio::test]
async fn concurrent_failed_refreshes_share_the_failure() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed_session(&store, CredentialPair::new("old-access").with_refresh_token("old-refresh"))
		.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(401).json_body(json!({ "error": "invalid refresh token" }));
		})
		.await;
	let (first, second) =
		tokio::join!(relay.refresh_token_if_needed(), relay.refresh_token_if_needed());

	mock.assert_async().await;

	assert!(first.is_none());
	assert!(second.is_none());
	assert_eq!(relay.metrics.refresh_attempts(), 1);
	assert_eq!(relay.metrics.refresh_joins(), 1);
	assert_eq!(relay.metrics.refresh_failures(), 1);
}

#[tokio::test]
async fn concurrent_executions_recover_through_a_single_refresh() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed_session(&store, CredentialPair::new("old-access").with_refresh_token("old-refresh"))
		.await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).json_body(json!({
				"access_token": "shared-access",
				"refresh_token": "shared-refresh",
				"token_type": "Bearer"
			}));
		})
		.await;
	let policy = RetryPolicy::new().with_retry_delay(Duration::ZERO);
	let run = |relay: Relay<ReqwestRefreshClient>, policy: RetryPolicy| async move {
		relay
			.execute_with_policy("old-access", policy, |token| async move {
				if token == "shared-access" {
					Ok(token)
				} else {
					Err(Error::unauthorized("access token expired"))
				}
			})
			.await
	};
	let (first, second) =
		tokio::join!(run(relay.clone(), policy.clone()), run(relay.clone(), policy));

	mock.assert_async().await;

	assert_eq!(first.expect("First concurrent call should recover."), "shared-access");
	assert_eq!(second.expect("Second concurrent call should recover."), "shared-access");
	assert_eq!(relay.metrics.refresh_attempts(), 1);
	assert_eq!(relay.metrics.refresh_joins(), 1);
}
