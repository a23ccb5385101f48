//! Security zones.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{at_most_one, validate_name};
use crate::container::{Container, ContainerFields};
use crate::error::Result;
use crate::traits::{CreateModel, Resource, ResponseModel, UpdateModel};

/// Security zone resource (`config/network/v1/zones`).
#[derive(Debug, Clone, Copy)]
pub struct SecurityZone;

impl Resource for SecurityZone {
    const NAME: &'static str = "security zone";
    const ENDPOINT: &'static str = "config/network/v1/zones";

    type Create = SecurityZoneCreate;
    type Update = SecurityZoneUpdate;
    type Response = SecurityZoneResponse;
    type Filters = SecurityZoneFilters;

    fn apply_filters(
        mut items: Vec<SecurityZoneResponse>,
        filters: &SecurityZoneFilters,
    ) -> Vec<SecurityZoneResponse> {
        if let Some(modes) = &filters.modes {
            items.retain(|z| {
                z.network
                    .as_ref()
                    .and_then(ZoneNetwork::mode)
                    .is_some_and(|m| modes.iter().any(|w| w == m))
            });
        }
        items
    }
}

/// Interface mode of a zone, one of `layer3`, `layer2`, `virtual_wire`,
/// `tap`, `tunnel`. At most one is set.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneNetwork {
    pub layer3: Option<Vec<String>>,
    pub layer2: Option<Vec<String>>,
    pub virtual_wire: Option<Vec<String>>,
    pub tap: Option<Vec<String>>,
    pub tunnel: Option<Value>,
    pub zone_protection_profile: Option<String>,
    pub enable_packet_buffer_protection: Option<bool>,
    pub log_setting: Option<String>,
}

impl ZoneNetwork {
    /// Layer-3 zone with the given interfaces.
    pub fn layer3<I, S>(interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            layer3: Some(interfaces.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Name of the configured mode.
    pub fn mode(&self) -> Option<&'static str> {
        self.mode_fields()
            .into_iter()
            .find_map(|(mode, set)| set.then_some(mode))
    }

    fn mode_fields(&self) -> [(&'static str, bool); 5] {
        [
            ("layer3", self.layer3.is_some()),
            ("layer2", self.layer2.is_some()),
            ("virtual_wire", self.virtual_wire.is_some()),
            ("tap", self.tap.is_some()),
            ("tunnel", self.tunnel.is_some()),
        ]
    }

    fn validate(&self) -> Result<()> {
        at_most_one("zone network", &self.mode_fields())
    }
}

/// User or device identification access lists.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneAcl {
    pub include_list: Option<Vec<String>>,
    pub exclude_list: Option<Vec<String>>,
}

/// Payload for creating a security zone.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityZoneCreate {
    pub name: String,
    pub enable_user_identification: Option<bool>,
    pub enable_device_identification: Option<bool>,
    pub dos_profile: Option<String>,
    pub dos_log_setting: Option<String>,
    pub network: Option<ZoneNetwork>,
    pub user_acl: Option<ZoneAcl>,
    pub device_acl: Option<ZoneAcl>,
    pub folder: Option<String>,
    pub snippet: Option<String>,
    pub device: Option<String>,
}

impl SecurityZoneCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enable_user_identification: None,
            enable_device_identification: None,
            dos_profile: None,
            dos_log_setting: None,
            network: None,
            user_acl: None,
            device_acl: None,
            folder: None,
            snippet: None,
            device: None,
        }
    }

    #[must_use]
    pub fn with_network(mut self, network: ZoneNetwork) -> Self {
        self.network = Some(network);
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

impl CreateModel for SecurityZoneCreate {
    fn container(&self) -> ContainerFields<'_> {
        ContainerFields::new(
            self.folder.as_deref(),
            self.snippet.as_deref(),
            self.device.as_deref(),
        )
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if let Some(network) = &self.network {
            network.validate()?;
        }
        Container::from_parts(self.container())?;
        Ok(())
    }
}

/// Payload for updating a security zone.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityZoneUpdate {
    pub id: Uuid,
    pub name: Option<String>,
    pub enable_user_identification: Option<bool>,
    pub enable_device_identification: Option<bool>,
    pub dos_profile: Option<String>,
    pub dos_log_setting: Option<String>,
    pub network: Option<ZoneNetwork>,
    pub user_acl: Option<ZoneAcl>,
    pub device_acl: Option<ZoneAcl>,
}

impl UpdateModel for SecurityZoneUpdate {
    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        self.network.as_ref().map_or(Ok(()), ZoneNetwork::validate)
    }
}

/// A security zone as returned by the API.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityZoneResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub enable_user_identification: Option<bool>,
    #[serde(default)]
    pub enable_device_identification: Option<bool>,
    #[serde(default)]
    pub dos_profile: Option<String>,
    #[serde(default)]
    pub dos_log_setting: Option<String>,
    #[serde(default)]
    pub network: Option<ZoneNetwork>,
    #[serde(default)]
    pub user_acl: Option<ZoneAcl>,
    #[serde(default)]
    pub device_acl: Option<ZoneAcl>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

impl ResponseModel for SecurityZoneResponse {
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

/// Client-side filters for listing security zones.
#[derive(Debug, Clone, Default)]
pub struct SecurityZoneFilters {
    /// Network modes, e.g. `layer3` or `tap`.
    pub modes: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_network_mode() {
        assert_eq!(ZoneNetwork::layer3(["ethernet1/1"]).mode(), Some("layer3"));
        assert_eq!(ZoneNetwork::default().mode(), None);

        let both = ZoneNetwork {
            layer2: Some(vec![]),
            ..ZoneNetwork::layer3(["ethernet1/1"])
        };
        let zone = SecurityZoneCreate::new("trust").with_network(both).in_folder("F");
        assert!(zone.validate().is_err());
    }

    #[test]
    fn test_mode_filter() {
        let items: Vec<SecurityZoneResponse> = serde_json::from_value(json!([
            {"id": Uuid::new_v4(), "name": "trust", "network": {"layer3": ["ethernet1/1"]}, "folder": "F"},
            {"id": Uuid::new_v4(), "name": "span", "network": {"tap": ["ethernet1/5"]}, "folder": "F"},
            {"id": Uuid::new_v4(), "name": "bare", "folder": "F"},
        ]))
        .unwrap();

        let filters = SecurityZoneFilters {
            modes: Some(vec!["tap".to_string()]),
        };
        let kept = SecurityZone::apply_filters(items, &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "span");
    }
}
