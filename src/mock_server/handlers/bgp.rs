//! BGP routing singleton handlers.

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use super::{authorize, SharedState};
use crate::mock_server::state::{MockError, MockResult};

const PREFERENCES: [&str; 2] = ["default", "hot_potato_routing"];

/// GET /config/deployment/v1/bgp-routing
pub async fn get_bgp_routing(state: &SharedState, headers: &HeaderMap) -> MockResult<Response> {
    let state = state.read().await;
    authorize(&state, headers)?;
    Ok(Json(state.bgp_routing.clone()).into_response())
}

/// PUT /config/deployment/v1/bgp-routing
pub async fn update_bgp_routing(
    state: &SharedState,
    headers: &HeaderMap,
    body: Value,
) -> MockResult<Response> {
    let mut state = state.write().await;
    authorize(&state, headers)?;

    let Value::Object(patch) = body else {
        return Err(MockError::invalid("Request body must be an object"));
    };
    if patch.is_empty() {
        return Err(MockError::invalid("At least one field is required"));
    }
    if let Some(preference) = patch.get("routing_preference") {
        let valid = preference.as_object().is_some_and(|p| {
            p.len() == 1 && p.keys().all(|k| PREFERENCES.contains(&k.as_str()))
        });
        if !valid {
            return Err(MockError::invalid("Invalid routing_preference"));
        }
    }

    if let Value::Object(current) = &mut state.bgp_routing {
        current.extend(patch);
    }
    Ok(Json(state.bgp_routing.clone()).into_response())
}
