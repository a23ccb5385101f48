//! Service objects (TCP/UDP port definitions).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{any_in, exactly_one, unique_items, validate_name};
use crate::container::{Container, ContainerFields};
use crate::error::Result;
use crate::traits::{CreateModel, Resource, ResponseModel, UpdateModel};

/// Service resource (`config/objects/v1/services`).
#[derive(Debug, Clone, Copy)]
pub struct Service;

impl Resource for Service {
    const NAME: &'static str = "service";
    const ENDPOINT: &'static str = "config/objects/v1/services";

    type Create = ServiceCreate;
    type Update = ServiceUpdate;
    type Response = ServiceResponse;
    type Filters = ServiceFilters;

    fn apply_filters(
        mut items: Vec<ServiceResponse>,
        filters: &ServiceFilters,
    ) -> Vec<ServiceResponse> {
        if let Some(protocols) = &filters.protocols {
            items.retain(|s| {
                s.protocol
                    .name()
                    .is_some_and(|p| protocols.iter().any(|w| w == p))
            });
        }
        if let Some(tags) = &filters.tags {
            items.retain(|s| s.tag.as_deref().is_some_and(|t| any_in(t, tags)));
        }
        items
    }
}

/// Session timeout overrides.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub timeout: Option<u32>,
    pub halfclose_timeout: Option<u32>,
    pub timewait_timeout: Option<u32>,
}

/// Ports for one transport protocol, e.g. `"80,443"` or `"8000-8080"`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub port: String,
    pub source_port: Option<String>,
    #[serde(rename = "override")]
    pub override_: Option<Override>,
}

impl PortSpec {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            source_port: None,
            override_: None,
        }
    }
}

/// Protocol block. Exactly one of `tcp` or `udp` is set.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    pub tcp: Option<PortSpec>,
    pub udp: Option<PortSpec>,
}

impl Protocol {
    pub fn tcp(port: impl Into<String>) -> Self {
        Self {
            tcp: Some(PortSpec::new(port)),
            udp: None,
        }
    }

    pub fn udp(port: impl Into<String>) -> Self {
        Self {
            tcp: None,
            udp: Some(PortSpec::new(port)),
        }
    }

    /// `"tcp"` or `"udp"`.
    pub fn name(&self) -> Option<&'static str> {
        match (&self.tcp, &self.udp) {
            (Some(_), _) => Some("tcp"),
            (None, Some(_)) => Some("udp"),
            (None, None) => None,
        }
    }

    pub fn port(&self) -> Option<&str> {
        self.tcp
            .as_ref()
            .or(self.udp.as_ref())
            .map(|p| p.port.as_str())
    }

    fn validate(&self) -> Result<()> {
        exactly_one(
            "service protocol",
            &[("tcp", self.tcp.is_some()), ("udp", self.udp.is_some())],
        )
    }
}

/// Payload for creating a service.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceCreate {
    pub name: String,
    pub protocol: Protocol,
    pub description: Option<String>,
    pub tag: Option<Vec<String>>,
    pub folder: Option<String>,
    pub snippet: Option<String>,
    pub device: Option<String>,
}

impl ServiceCreate {
    pub fn new(name: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            name: name.into(),
            protocol,
            description: None,
            tag: None,
            folder: None,
            snippet: None,
            device: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn in_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    #[must_use]
    pub fn in_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    #[must_use]
    pub fn on_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }
}

impl CreateModel for ServiceCreate {
    fn container(&self) -> ContainerFields<'_> {
        ContainerFields::new(
            self.folder.as_deref(),
            self.snippet.as_deref(),
            self.device.as_deref(),
        )
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        self.protocol.validate()?;
        unique_items("tag", self.tag.as_deref())?;
        Container::from_parts(self.container())?;
        Ok(())
    }
}

/// Payload for updating a service.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceUpdate {
    pub id: Uuid,
    pub name: Option<String>,
    pub protocol: Option<Protocol>,
    pub description: Option<String>,
    pub tag: Option<Vec<String>>,
}

impl UpdateModel for ServiceUpdate {
    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(protocol) = &self.protocol {
            protocol.validate()?;
        }
        unique_items("tag", self.tag.as_deref())
    }
}

/// A service as returned by the API.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub id: Uuid,
    pub name: String,
    pub protocol: Protocol,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag: Option<Vec<String>>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

impl ResponseModel for ServiceResponse {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn container(&self) -> ContainerFields<'_> {
        ContainerFields::new(
            self.folder.as_deref(),
            self.snippet.as_deref(),
            self.device.as_deref(),
        )
    }
}

/// Client-side filters for listing services.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilters {
    /// `tcp` and/or `udp`.
    pub protocols: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_protocol_wire_shape() {
        let service = ServiceCreate::new("web", Protocol::tcp("80,443")).in_folder("Texas");
        assert!(service.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&service).unwrap(),
            json!({"name": "web", "protocol": {"tcp": {"port": "80,443"}}, "folder": "Texas"})
        );
    }

    #[test]
    fn test_exactly_one_protocol() {
        let both = Protocol {
            tcp: Some(PortSpec::new("80")),
            udp: Some(PortSpec::new("53")),
        };
        assert!(ServiceCreate::new("x", both).in_folder("F").validate().is_err());
        assert!(ServiceCreate::new("x", Protocol::default()).in_folder("F").validate().is_err());
    }

    #[test]
    fn test_protocol_filter() {
        let items: Vec<ServiceResponse> = serde_json::from_value(json!([
            {"id": Uuid::new_v4(), "name": "http", "protocol": {"tcp": {"port": "80"}}, "folder": "F"},
            {"id": Uuid::new_v4(), "name": "dns", "protocol": {"udp": {"port": "53"}}, "folder": "F"},
        ]))
        .unwrap();

        let filters = ServiceFilters {
            protocols: Some(vec!["udp".to_string()]),
            ..Default::default()
        };
        let kept = Service::apply_filters(items, &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].protocol.port(), Some("53"));
    }
}
