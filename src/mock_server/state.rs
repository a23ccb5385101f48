//! Mock server state management.
//!
//! Provides the in-memory data store for the mock SCM API server.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use serde_with::base64::Base64;
use serde_with::serde_as;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::container::ContainerQuery;

/// Folder whose objects are visible from every other folder.
pub const INHERITED_FOLDER: &str = "All";

/// An error the mock answers with, rendered as the vendor error envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct MockError {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
    pub error_type: &'static str,
}

impl MockError {
    pub fn new(
        status: u16,
        code: &'static str,
        error_type: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            error_type,
        }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::new(
            404,
            "E005",
            "Object Not Present",
            format!("{what} not found"),
        )
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(400, "E003", "Invalid Object", message)
    }

    pub fn missing_parameter(message: impl Into<String>) -> Self {
        Self::new(400, "E003", "Missing Query Parameter", message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(401, "E016", "Not Authenticated", message)
    }

    /// The `{"_errors": [...], "_request_id": ...}` body.
    pub fn body(&self) -> Value {
        json!({
            "_errors": [{
                "code": self.code,
                "message": self.message,
                "details": {"errorType": self.error_type, "message": self.message},
            }],
            "_request_id": Uuid::new_v4().to_string(),
        })
    }
}

pub type MockResult<T> = std::result::Result<T, MockError>;

#[serde_as]
#[derive(Serialize)]
struct Encoded(#[serde_as(as = "Base64")] Vec<u8>);

/// Shared state for the mock server.
///
/// Objects are stored as raw JSON per collection, in insertion order. A
/// collection key is `"{area}/{collection}"`, with `"@{position}"`
/// appended for position-scoped collections such as security rules.
#[derive(Debug)]
pub struct MockState {
    /// Accepted client id.
    pub client_id: String,
    /// Accepted client secret.
    pub client_secret: String,
    /// HMAC secret tokens are signed with.
    pub signing_secret: Vec<u8>,
    /// Lifetime of minted tokens, in seconds.
    pub token_lifetime_secs: i64,
    /// Reject config requests without a valid bearer token.
    pub require_auth: bool,
    /// Objects per collection key.
    pub collections: HashMap<String, Vec<Value>>,
    /// The BGP routing singleton.
    pub bgp_routing: Value,
    /// Number of tokens issued.
    pub tokens_issued: usize,
    /// Number of list requests served.
    pub list_requests: usize,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            client_id: "mock-client".to_string(),
            client_secret: "mock-secret".to_string(),
            signing_secret: b"mock-signing-secret-0123456789abcdef".to_vec(),
            token_lifetime_secs: 900,
            require_auth: true,
            collections: HashMap::new(),
            bgp_routing: json!({
                "routing_preference": {"default": {}},
                "backbone_routing": "no-asymmetric-routing",
                "accept_route_over_SC": false,
                "outbound_routes_for_services": [],
                "add_host_route_to_ike_peer": false,
                "withdraw_static_route": false
            }),
            tokens_issued: 0,
            list_requests: 0,
        }
    }
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Set the accepted client credentials.
    pub fn with_credentials(mut self, client_id: &str, client_secret: &str) -> Self {
        self.client_id = client_id.to_string();
        self.client_secret = client_secret.to_string();
        self
    }

    /// Accept config requests without a token.
    pub fn without_auth(mut self) -> Self {
        self.require_auth = false;
        self
    }

    /// Add an object to a collection as-is; an `id` is assigned if missing.
    pub fn with_object(mut self, collection: &str, mut object: Value) -> Self {
        if let Value::Object(map) = &mut object {
            map.entry("id")
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        }
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(object);
        self
    }

    /// The `Authorization` header value a client must send to the token
    /// endpoint.
    pub fn basic_credentials(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret).into_bytes();
        let encoded = serde_json::to_value(Encoded(raw))
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        format!("Basic {encoded}")
    }

    /// Objects visible from the queried container, in storage order.
    pub fn list(&self, collection: &str, container: &ContainerQuery) -> MockResult<Vec<Value>> {
        let (field, name) = container_param(container)?;
        let items = self.collections.get(collection).map(Vec::as_slice).unwrap_or_default();
        Ok(items
            .iter()
            .filter(|item| {
                let value = item.get(field).and_then(Value::as_str);
                value == Some(name) || (field == "folder" && value == Some(INHERITED_FOLDER))
            })
            .cloned()
            .collect())
    }

    pub fn get(&self, collection: &str, id: &str) -> MockResult<Value> {
        self.collections
            .get(collection)
            .and_then(|items| items.iter().find(|item| id_of(item) == Some(id)))
            .cloned()
            .ok_or_else(|| MockError::not_found(format!("Object '{id}'")))
    }

    /// Store a new object after container and uniqueness checks.
    pub fn create(&mut self, collection: &str, body: Value) -> MockResult<Value> {
        let Value::Object(mut map) = body else {
            return Err(MockError::invalid("Request body must be an object"));
        };
        let name = map
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| MockError::invalid("'name' is required"))?
            .to_string();
        let (field, container) = object_container(&map)?;

        if self.name_taken(collection, &name, field, &container, None) {
            return Err(MockError::new(
                400,
                "E006",
                "Name Not Unique",
                format!("An object named '{name}' already exists"),
            ));
        }

        map.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        let object = Value::Object(map);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(object.clone());
        Ok(object)
    }

    /// Merge `patch` into an existing object.
    pub fn update(&mut self, collection: &str, id: &str, patch: Value) -> MockResult<Value> {
        let Value::Object(patch) = patch else {
            return Err(MockError::invalid("Request body must be an object"));
        };
        if patch.contains_key("id") {
            return Err(MockError::invalid("'id' is not allowed in the request body"));
        }

        let current = self.get(collection, id)?;
        let Value::Object(mut merged) = current else {
            return Err(MockError::invalid("Stored object is not an object"));
        };
        merged.extend(patch);

        let name = merged.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
        let (field, container) = object_container(&merged)?;
        if self.name_taken(collection, &name, field, &container, Some(id)) {
            return Err(MockError::new(
                400,
                "E006",
                "Name Not Unique",
                format!("An object named '{name}' already exists"),
            ));
        }

        let updated = Value::Object(merged);
        if let Some(slot) = self
            .collections
            .get_mut(collection)
            .and_then(|items| items.iter_mut().find(|item| id_of(item) == Some(id)))
        {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    /// Remove an object unless another object still refers to it by name.
    pub fn delete(&mut self, collection: &str, id: &str) -> MockResult<()> {
        let object = self.get(collection, id)?;
        let name = object.get("name").and_then(Value::as_str).unwrap_or_default();

        let referenced = self.collections.values().flatten().any(|other| {
            id_of(other) != Some(id) && references(other, name)
        });
        if referenced {
            return Err(MockError::new(
                409,
                "E009",
                "Reference Not Zero",
                format!("'{name}' is still referenced by other objects"),
            ));
        }

        if let Some(items) = self.collections.get_mut(collection) {
            items.retain(|item| id_of(item) != Some(id));
        }
        Ok(())
    }

    /// Reorder a rule within its collection.
    pub fn move_object(
        &mut self,
        collection: &str,
        id: &str,
        destination: &str,
        anchor: Option<&str>,
    ) -> MockResult<()> {
        let items = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| MockError::not_found(format!("Object '{id}'")))?;
        let from = items
            .iter()
            .position(|item| id_of(item) == Some(id))
            .ok_or_else(|| MockError::not_found(format!("Object '{id}'")))?;
        let object = items.remove(from);

        let to = match (destination, anchor) {
            ("top", None) => 0,
            ("bottom", None) => items.len(),
            ("before" | "after", Some(anchor)) => {
                let Some(at) = items.iter().position(|item| id_of(item) == Some(anchor)) else {
                    items.insert(from, object);
                    return Err(MockError::not_found(format!("Rule '{anchor}'")));
                };
                if destination == "before" {
                    at
                } else {
                    at + 1
                }
            }
            _ => {
                items.insert(from, object);
                return Err(MockError::invalid(format!(
                    "Invalid move: destination '{destination}' with destination_rule {anchor:?}"
                )));
            }
        };
        items.insert(to, object);
        Ok(())
    }

    /// Names of the objects in a collection, in order.
    pub fn names(&self, collection: &str) -> Vec<String> {
        self.collections
            .get(collection)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("name").and_then(Value::as_str).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn name_taken(
        &self,
        collection: &str,
        name: &str,
        field: &str,
        container: &str,
        except: Option<&str>,
    ) -> bool {
        self.collections.get(collection).is_some_and(|items| {
            items.iter().any(|item| {
                id_of(item) != except
                    && item.get("name").and_then(Value::as_str) == Some(name)
                    && item.get(field).and_then(Value::as_str) == Some(container)
            })
        })
    }
}

fn id_of(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

/// True if any string array inside `value` names `name`.
fn references(value: &Value, name: &str) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .any(|v| v.as_str() == Some(name) || references(v, name)),
        Value::Object(map) => map.values().any(|v| references(v, name)),
        _ => false,
    }
}

fn container_param(query: &ContainerQuery) -> MockResult<(&'static str, &str)> {
    let present: Vec<(&'static str, &str)> = [
        ("folder", query.folder.as_deref()),
        ("snippet", query.snippet.as_deref()),
        ("device", query.device.as_deref()),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|v| (field, v)))
    .collect();

    match present.as_slice() {
        [(field, value)] if !value.trim().is_empty() => Ok((*field, *value)),
        [] | [_] => Err(MockError::missing_parameter(
            "One of 'folder', 'snippet' or 'device' is required",
        )),
        _ => Err(MockError::invalid(
            "Only one of 'folder', 'snippet' or 'device' may be given",
        )),
    }
}

fn object_container(map: &Map<String, Value>) -> MockResult<(&'static str, String)> {
    let present: Vec<(&'static str, &str)> = ["folder", "snippet", "device"]
        .into_iter()
        .filter_map(|field| map.get(field).and_then(Value::as_str).map(|v| (field, v)))
        .collect();
    match present.as_slice() {
        [(field, value)] => Ok((*field, value.to_string())),
        _ => Err(MockError::invalid(
            "Exactly one of 'folder', 'snippet' or 'device' must be provided",
        )),
    }
}
