//! Model traits for request and response payloads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::container::{Container, ContainerFields};
use crate::error::Result;

/// Payload accepted by a create call.
///
/// Implementations deny unknown fields on deserialization and skip unset
/// fields on serialization, so only what the caller set is sent.
pub trait CreateModel: Serialize + DeserializeOwned + Send + Sync {
    /// The container fields of the payload.
    fn container(&self) -> ContainerFields<'_>;

    /// Check model invariants. The default checks that exactly one
    /// container is set.
    fn validate(&self) -> Result<()> {
        Container::from_parts(self.container())?;
        Ok(())
    }
}

/// Payload accepted by an update call.
///
/// The identifier travels in the URL; the service strips it from the body.
pub trait UpdateModel: Serialize + DeserializeOwned + Send + Sync {
    /// Identifier of the object being updated.
    fn id(&self) -> Uuid;

    /// Check model invariants.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Object as returned by the API.
pub trait ResponseModel: Serialize + DeserializeOwned + Clone + Send + Sync {
    fn id(&self) -> Uuid;

    fn name(&self) -> &str;

    fn container(&self) -> ContainerFields<'_>;
}
