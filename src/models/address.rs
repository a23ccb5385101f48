//! Address objects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{any_in, at_most_one, exactly_one, unique_items, validate_name};
use crate::container::{Container, ContainerFields};
use crate::error::Result;
use crate::traits::{CreateModel, Resource, ResponseModel, UpdateModel};

/// Address resource (`config/objects/v1/addresses`).
#[derive(Debug, Clone, Copy)]
pub struct Address;

impl Resource for Address {
    const NAME: &'static str = "address";
    const ENDPOINT: &'static str = "config/objects/v1/addresses";

    type Create = AddressCreate;
    type Update = AddressUpdate;
    type Response = AddressResponse;
    type Filters = AddressFilters;

    fn apply_filters(
        mut items: Vec<AddressResponse>,
        filters: &AddressFilters,
    ) -> Vec<AddressResponse> {
        if let Some(types) = &filters.types {
            items.retain(|a| {
                a.address_type()
                    .is_some_and(|(kind, _)| types.iter().any(|t| t == kind.field()))
            });
        }
        if let Some(values) = &filters.values {
            items.retain(|a| a.address_type().is_some_and(|(_, v)| values.iter().any(|w| w == v)));
        }
        if let Some(tags) = &filters.tags {
            items.retain(|a| a.tag.as_deref().is_some_and(|t| any_in(t, tags)));
        }
        items
    }
}

/// The four ways an address can be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    IpNetmask,
    IpRange,
    IpWildcard,
    Fqdn,
}

impl AddressType {
    /// Wire field name.
    pub fn field(self) -> &'static str {
        match self {
            Self::IpNetmask => "ip_netmask",
            Self::IpRange => "ip_range",
            Self::IpWildcard => "ip_wildcard",
            Self::Fqdn => "fqdn",
        }
    }
}

/// Payload for creating an address.
///
/// Exactly one of `ip_netmask`, `ip_range`, `ip_wildcard` or `fqdn` must
/// be set, along with exactly one container.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressCreate {
    pub name: String,
    pub description: Option<String>,
    pub tag: Option<Vec<String>>,
    pub ip_netmask: Option<String>,
    pub ip_range: Option<String>,
    pub ip_wildcard: Option<String>,
    pub fqdn: Option<String>,
    pub folder: Option<String>,
    pub snippet: Option<String>,
    pub device: Option<String>,
}

impl AddressCreate {
    fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            tag: None,
            ip_netmask: None,
            ip_range: None,
            ip_wildcard: None,
            fqdn: None,
            folder: None,
            snippet: None,
            device: None,
        }
    }

    /// e.g. `10.0.0.0/24`.
    pub fn ip_netmask(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            ip_netmask: Some(value.into()),
            ..Self::empty(name)
        }
    }

    /// e.g. `10.0.0.1-10.0.0.9`.
    pub fn ip_range(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            ip_range: Some(value.into()),
            ..Self::empty(name)
        }
    }

    /// e.g. `10.20.1.0/0.0.248.255`.
    pub fn ip_wildcard(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            ip_wildcard: Some(value.into()),
            ..Self::empty(name)
        }
    }

    pub fn fqdn(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            fqdn: Some(value.into()),
            ..Self::empty(name)
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag = Some(tags.into_iter().map(Into::into).collect());
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

    fn type_fields(&self) -> [(&'static str, bool); 4] {
        [
            ("ip_netmask", self.ip_netmask.is_some()),
            ("ip_range", self.ip_range.is_some()),
            ("ip_wildcard", self.ip_wildcard.is_some()),
            ("fqdn", self.fqdn.is_some()),
        ]
    }
}

impl CreateModel for AddressCreate {
    fn container(&self) -> ContainerFields<'_> {
        ContainerFields::new(
            self.folder.as_deref(),
            self.snippet.as_deref(),
            self.device.as_deref(),
        )
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        exactly_one("address", &self.type_fields())?;
        unique_items("tag", self.tag.as_deref())?;
        Container::from_parts(self.container())?;
        Ok(())
    }
}

/// Payload for updating an address. Unset fields are left untouched.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressUpdate {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub tag: Option<Vec<String>>,
    pub ip_netmask: Option<String>,
    pub ip_range: Option<String>,
    pub ip_wildcard: Option<String>,
    pub fqdn: Option<String>,
}

impl AddressUpdate {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

impl UpdateModel for AddressUpdate {
    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        at_most_one(
            "address",
            &[
                ("ip_netmask", self.ip_netmask.is_some()),
                ("ip_range", self.ip_range.is_some()),
                ("ip_wildcard", self.ip_wildcard.is_some()),
                ("fqdn", self.fqdn.is_some()),
            ],
        )?;
        unique_items("tag", self.tag.as_deref())
    }
}

/// An address as returned by the API.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag: Option<Vec<String>>,
    #[serde(default)]
    pub ip_netmask: Option<String>,
    #[serde(default)]
    pub ip_range: Option<String>,
    #[serde(default)]
    pub ip_wildcard: Option<String>,
    #[serde(default)]
    pub fqdn: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

impl AddressResponse {
    /// The address kind and its value.
    pub fn address_type(&self) -> Option<(AddressType, &str)> {
        self.ip_netmask
            .as_deref()
            .map(|v| (AddressType::IpNetmask, v))
            .or_else(|| self.ip_range.as_deref().map(|v| (AddressType::IpRange, v)))
            .or_else(|| self.ip_wildcard.as_deref().map(|v| (AddressType::IpWildcard, v)))
            .or_else(|| self.fqdn.as_deref().map(|v| (AddressType::Fqdn, v)))
    }
}

impl ResponseModel for AddressResponse {
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

/// Client-side filters for listing addresses.
#[derive(Debug, Clone, Default)]
pub struct AddressFilters {
    /// Address kinds by wire name: `ip_netmask`, `ip_range`,
    /// `ip_wildcard`, `fqdn`.
    pub types: Option<Vec<String>>,
    /// Exact address values.
    pub values: Option<Vec<String>>,
    /// Keep addresses carrying any of these tags.
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScmError;
    use serde_json::json;

    fn response(value: serde_json::Value) -> AddressResponse {
        let mut base = json!({"id": Uuid::new_v4(), "folder": "Texas"});
        base.as_object_mut()
            .unwrap()
            .extend(value.as_object().unwrap().clone());
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_create_requires_exactly_one_type() {
        let ok = AddressCreate::ip_netmask("web", "10.0.0.1/32").in_folder("Texas");
        assert!(ok.validate().is_ok());

        let mut both = ok.clone();
        both.fqdn = Some("web.example.com".to_string());
        assert!(matches!(both.validate(), Err(ScmError::InvalidObject(_))));

        let mut none = ok;
        none.ip_netmask = None;
        assert!(matches!(none.validate(), Err(ScmError::InvalidObject(_))));
    }

    #[test]
    fn test_create_requires_container() {
        let address = AddressCreate::fqdn("web", "web.example.com");
        assert!(matches!(
            address.validate(),
            Err(ScmError::InvalidObject(_))
        ));
    }

    #[test]
    fn test_update_allows_partial_fields() {
        let update = AddressUpdate {
            description: Some("moved".to_string()),
            ..AddressUpdate::new(Uuid::nil())
        };
        assert!(update.validate().is_ok());

        let update = AddressUpdate {
            ip_netmask: Some("10.0.0.1/32".to_string()),
            fqdn: Some("x".to_string()),
            ..AddressUpdate::new(Uuid::nil())
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_filters() {
        let items = vec![
            response(json!({"name": "a", "ip_netmask": "10.0.0.1/32", "tag": ["web"]})),
            response(json!({"name": "b", "fqdn": "b.example.com"})),
            response(json!({"name": "c", "ip_range": "10.0.0.1-10.0.0.9", "tag": ["db"]})),
        ];

        let types = AddressFilters {
            types: Some(vec!["fqdn".to_string()]),
            ..Default::default()
        };
        let names: Vec<_> = Address::apply_filters(items.clone(), &types)
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["b"]);

        let values = AddressFilters {
            values: Some(vec!["10.0.0.1/32".to_string()]),
            ..Default::default()
        };
        assert_eq!(Address::apply_filters(items.clone(), &values)[0].name, "a");

        let tags = AddressFilters {
            tags: Some(vec!["db".to_string()]),
            ..Default::default()
        };
        assert_eq!(Address::apply_filters(items, &tags)[0].name, "c");
    }
}
