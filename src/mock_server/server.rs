//! Mock SCM API server.
//!
//! Provides an axum-based HTTP server that simulates the token endpoint and
//! the configuration API.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;

/// A mock SCM API server for testing.
///
/// The server runs in the background and serves both the OAuth2 endpoints
/// and the configuration API from one address.
pub struct MockServer {
    /// Base URL, `http://127.0.0.1:<port>`.
    url: String,
    handle: JoinHandle<()>,
    /// Objects, credentials and counters; tests may inspect or edit them.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a server seeded with [`Fixtures::default_scenario`] on an
    /// ephemeral port.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_scenario()).await
    }

    /// Start a server with no objects; credentials are the defaults.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a server around prepared state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = router(shared_state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "mock server stopped");
            }
        });

        tracing::debug!(%addr, "mock server listening");

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// API base URL for `ScmClient`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The token endpoint, for `AuthRequest::with_token_url`.
    pub fn token_url(&self) -> String {
        format!("{}/am/oauth2/access_token", self.url)
    }

    /// Handle to the live state.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Stop serving and wait for the task to finish.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

/// All routes of the mock API.
///
/// The BGP routing singleton shares the collection route and is dispatched
/// inside the collection handlers.
pub fn router(state: Arc<RwLock<MockState>>) -> Router {
    Router::new()
        // OAuth2
        .route("/am/oauth2/access_token", post(handlers::issue_token))
        .route("/am/oauth2/connect/jwk_uri", get(handlers::signing_keys))
        // Configuration collections
        .route(
            "/config/:area/v1/:collection",
            get(handlers::list_objects)
                .post(handlers::create_object)
                .put(handlers::put_collection),
        )
        // Single objects and `{id}:move` actions
        .route(
            "/config/:area/v1/:collection/:id",
            get(handlers::get_object)
                .put(handlers::update_object)
                .delete(handlers::delete_object)
                .post(handlers::object_action),
        )
        // Health check
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::mock_server::handlers::mint_token;

    async fn bearer(state: &Arc<RwLock<MockState>>) -> String {
        let state = state.read().await;
        format!("Bearer {}", mint_token(&state, "tsg_id:1", 900).unwrap())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_server_starts_and_responds() {
        let server = MockServer::start().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/health", server.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), "ok");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_list_requires_bearer_token() {
        let state = Fixtures::default_scenario().shared();
        let response = router(state)
            .oneshot(
                Request::get("/config/objects/v1/addresses?folder=Texas")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["_errors"][0]["code"], "E016");
    }

    #[tokio::test]
    async fn test_list_paginates_with_total() {
        let state = Fixtures::default_scenario().shared();
        let auth = bearer(&state).await;
        let response = router(state)
            .oneshot(
                Request::get("/config/objects/v1/addresses?folder=Texas&limit=2&offset=1")
                    .header(header::AUTHORIZATION, auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["offset"], 1);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rules_require_position() {
        let state = Fixtures::default_scenario().shared();
        let auth = bearer(&state).await;
        let response = router(state)
            .oneshot(
                Request::get("/config/security/v1/security-rules?folder=Texas")
                    .header(header::AUTHORIZATION, auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["_errors"][0]["code"], "E003");
    }

    #[tokio::test]
    async fn test_bgp_routing_shares_collection_route() {
        let state = Fixtures::default_scenario().shared();
        let auth = bearer(&state).await;
        let response = router(state)
            .oneshot(
                Request::get("/config/deployment/v1/bgp-routing")
                    .header(header::AUTHORIZATION, auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["backbone_routing"], "no-asymmetric-routing");
    }
}
