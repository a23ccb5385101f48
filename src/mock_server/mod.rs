//! Mock SCM API server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the OAuth2
//! token endpoint and the configuration API. Unlike wiremock which mocks at
//! the HTTP level per-test, this server maintains state across requests,
//! enabling realistic create/list/update/delete workflows, name uniqueness
//! and reference checks.
//!
//! # Example
//!
//! ```ignore
//! use scmapi::mock_server::MockServer;
//! use scmapi::{AuthRequest, ListOptions, ScmClient};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let auth = AuthRequest::new("mock-client", "mock-secret", "1")
//!         .unwrap()
//!         .with_token_url(&server.token_url())
//!         .unwrap();
//!     let client = ScmClient::connect(auth, server.url()).await.unwrap();
//!
//!     // Server comes with the default scenario
//!     let addresses = client.addresses().list(&ListOptions::folder("Texas")).await.unwrap();
//!     assert_eq!(addresses.len(), 3);
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{security_rules, Fixtures, ADDRESSES, ADDRESS_GROUPS, SERVICES, TAGS, ZONES};
pub use handlers::SIGNING_KEY_ID;
pub use server::{router, MockServer};
pub use state::{MockError, MockResult, MockState, INHERITED_FOLDER};
