//! Configuration object endpoint handlers.
//!
//! One set of handlers serves every collection under
//! `/config/{area}/v1/{collection}`.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::bgp;
use super::{authorize, SharedState};
use crate::container::ContainerQuery;
use crate::mock_server::state::{MockError, MockResult};

/// Page size used when a list request carries no `limit`.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Query parameters accepted by object endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ObjectQuery {
    pub folder: Option<String>,
    pub snippet: Option<String>,
    pub device: Option<String>,
    pub name: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub position: Option<String>,
}

impl ObjectQuery {
    fn container(&self) -> ContainerQuery {
        ContainerQuery {
            folder: self.folder.clone(),
            snippet: self.snippet.clone(),
            device: self.device.clone(),
        }
    }
}

/// Body of a rule move.
#[derive(Debug, Deserialize)]
pub struct MoveBody {
    pub destination: String,
    pub rulebase: String,
    pub destination_rule: Option<String>,
}

/// Storage key for a collection; rule collections are split by position.
fn collection_key(area: &str, collection: &str, position: Option<&str>) -> MockResult<String> {
    match (collection, position) {
        ("security-rules", None) => Err(MockError::missing_parameter("'position' is required")),
        ("security-rules", Some(position)) if position != "pre" && position != "post" => {
            Err(MockError::invalid(format!("Invalid position '{position}'")))
        }
        (_, Some(position)) if collection == "security-rules" => {
            Ok(format!("{area}/{collection}@{position}"))
        }
        _ => Ok(format!("{area}/{collection}")),
    }
}

fn is_bgp_routing(area: &str, collection: &str) -> bool {
    area == "deployment" && collection == "bgp-routing"
}

/// GET /config/{area}/v1/{collection}
pub async fn list_objects(
    State(state): State<SharedState>,
    Path((area, collection)): Path<(String, String)>,
    Query(query): Query<ObjectQuery>,
    headers: HeaderMap,
) -> MockResult<Response> {
    if is_bgp_routing(&area, &collection) {
        return bgp::get_bgp_routing(&state, &headers).await;
    }

    let mut state = state.write().await;
    authorize(&state, &headers)?;
    state.list_requests += 1;

    let key = collection_key(&area, &collection, query.position.as_deref())?;
    let mut items = state.list(&key, &query.container())?;
    if let Some(name) = &query.name {
        items.retain(|item| item.get("name").and_then(Value::as_str) == Some(name.as_str()));
    }

    let total = items.len();
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);
    let data: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();

    Ok(Json(json!({
        "data": data,
        "limit": limit,
        "offset": offset,
        "total": total,
    }))
    .into_response())
}

/// POST /config/{area}/v1/{collection}
pub async fn create_object(
    State(state): State<SharedState>,
    Path((area, collection)): Path<(String, String)>,
    Query(query): Query<ObjectQuery>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> MockResult<Response> {
    let mut state = state.write().await;
    authorize(&state, &headers)?;

    let key = collection_key(&area, &collection, query.position.as_deref())?;
    let created = state.create(&key, body)?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

/// PUT /config/{area}/v1/{collection}
///
/// Only the BGP routing singleton is updated this way.
pub async fn put_collection(
    State(state): State<SharedState>,
    Path((area, collection)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> MockResult<Response> {
    if is_bgp_routing(&area, &collection) {
        return bgp::update_bgp_routing(&state, &headers, body).await;
    }
    Err(MockError::new(
        405,
        "E012",
        "Method Not Allowed",
        "PUT is not supported on collections",
    ))
}

/// GET /config/{area}/v1/{collection}/{id}
pub async fn get_object(
    State(state): State<SharedState>,
    Path((area, collection, id)): Path<(String, String, String)>,
    Query(query): Query<ObjectQuery>,
    headers: HeaderMap,
) -> MockResult<Response> {
    let state = state.read().await;
    authorize(&state, &headers)?;

    let key = collection_key(&area, &collection, query.position.as_deref())?;
    Ok(Json(state.get(&key, &id)?).into_response())
}

/// PUT /config/{area}/v1/{collection}/{id}
pub async fn update_object(
    State(state): State<SharedState>,
    Path((area, collection, id)): Path<(String, String, String)>,
    Query(query): Query<ObjectQuery>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> MockResult<Response> {
    let mut state = state.write().await;
    authorize(&state, &headers)?;

    let key = collection_key(&area, &collection, query.position.as_deref())?;
    Ok(Json(state.update(&key, &id, body)?).into_response())
}

/// DELETE /config/{area}/v1/{collection}/{id}
pub async fn delete_object(
    State(state): State<SharedState>,
    Path((area, collection, id)): Path<(String, String, String)>,
    Query(query): Query<ObjectQuery>,
    headers: HeaderMap,
) -> MockResult<Response> {
    let mut state = state.write().await;
    authorize(&state, &headers)?;

    let key = collection_key(&area, &collection, query.position.as_deref())?;
    state.delete(&key, &id)?;
    Ok(StatusCode::OK.into_response())
}

/// POST /config/{area}/v1/{collection}/{id}:move
pub async fn object_action(
    State(state): State<SharedState>,
    Path((area, collection, target)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> MockResult<Response> {
    let mut state = state.write().await;
    authorize(&state, &headers)?;

    let Some(id) = target.strip_suffix(":move") else {
        return Err(MockError::new(
            405,
            "E012",
            "Method Not Allowed",
            format!("Unsupported action on '{target}'"),
        ));
    };

    let request: MoveBody = serde_json::from_value(body)
        .map_err(|e| MockError::invalid(format!("Invalid move request: {e}")))?;
    let key = collection_key(&area, &collection, Some(&request.rulebase))?;
    state.move_object(
        &key,
        id,
        &request.destination,
        request.destination_rule.as_deref(),
    )?;
    Ok(StatusCode::OK.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_key() {
        assert_eq!(
            collection_key("objects", "addresses", None).unwrap(),
            "objects/addresses"
        );
        assert_eq!(
            collection_key("security", "security-rules", Some("post")).unwrap(),
            "security/security-rules@post"
        );
        assert!(collection_key("security", "security-rules", None).is_err());
        assert!(collection_key("security", "security-rules", Some("middle")).is_err());
    }
}
