//! HTTP request handlers for the mock server.

pub mod auth;
pub mod bgp;
pub mod objects;

pub use auth::*;
pub use bgp::*;
pub use objects::*;

use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tokio::sync::RwLock;

use crate::mock_server::state::{MockError, MockResult, MockState};

/// State handle shared by all handlers.
pub type SharedState = Arc<RwLock<MockState>>;

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body())).into_response()
    }
}

/// Check the bearer token of a config request.
pub(crate) fn authorize(state: &MockState, headers: &HeaderMap) -> MockResult<()> {
    if !state.require_auth {
        return Ok(());
    }

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| MockError::unauthenticated("Missing bearer token"))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[state.client_id.as_str()]);
    validation.leeway = 0;

    decode::<MockClaims>(token, &DecodingKey::from_secret(&state.signing_secret), &validation)
        .map(|_| ())
        .map_err(|e| MockError::unauthenticated(format!("Invalid access token: {e}")))
}
