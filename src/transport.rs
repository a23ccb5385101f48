//! Transport contract the resource services are written against.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Performs the HTTP verbs for the resource services.
///
/// Implementations translate failed responses into the typed error family
/// themselves; services only see parsed payloads or [`crate::ScmError`]s.
/// Paths are relative to the API base and may carry a query string.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` with query parameters. Returns an object or an array.
    async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value>;

    /// POST a JSON body.
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;

    /// PUT a JSON body.
    async fn put(&self, path: &str, body: &Value) -> Result<Value>;

    /// DELETE `path`.
    async fn delete(&self, path: &str) -> Result<()>;
}
