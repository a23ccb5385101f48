//! Address group objects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{any_in, at_most_one, exactly_one, unique_items, validate_name};
use crate::container::{Container, ContainerFields};
use crate::error::Result;
use crate::traits::{CreateModel, Resource, ResponseModel, UpdateModel};

/// Address group resource (`config/objects/v1/address-groups`).
#[derive(Debug, Clone, Copy)]
pub struct AddressGroup;

impl Resource for AddressGroup {
    const NAME: &'static str = "address group";
    const ENDPOINT: &'static str = "config/objects/v1/address-groups";

    type Create = AddressGroupCreate;
    type Update = AddressGroupUpdate;
    type Response = AddressGroupResponse;
    type Filters = AddressGroupFilters;

    fn apply_filters(
        mut items: Vec<AddressGroupResponse>,
        filters: &AddressGroupFilters,
    ) -> Vec<AddressGroupResponse> {
        if let Some(types) = &filters.types {
            items.retain(|g| types.iter().any(|t| t == g.group_type()));
        }
        if let Some(values) = &filters.values {
            items.retain(|g| match (&g.static_members, &g.dynamic) {
                (Some(members), _) => any_in(members, values),
                (None, Some(dynamic)) => values.contains(&dynamic.filter),
                (None, None) => false,
            });
        }
        if let Some(tags) = &filters.tags {
            items.retain(|g| g.tag.as_deref().is_some_and(|t| any_in(t, tags)));
        }
        items
    }
}

/// Tag-expression membership, e.g. `'web' and 'prod'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicFilter {
    pub filter: String,
}

/// Payload for creating an address group.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressGroupCreate {
    pub name: String,
    pub description: Option<String>,
    pub tag: Option<Vec<String>>,
    /// Member address names.
    #[serde(rename = "static")]
    pub static_members: Option<Vec<String>>,
    pub dynamic: Option<DynamicFilter>,
    pub folder: Option<String>,
    pub snippet: Option<String>,
    pub device: Option<String>,
}

impl AddressGroupCreate {
    pub fn static_group<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            static_members: Some(members.into_iter().map(Into::into).collect()),
            ..Self::empty(name)
        }
    }

    pub fn dynamic_group(name: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            dynamic: Some(DynamicFilter {
                filter: filter.into(),
            }),
            ..Self::empty(name)
        }
    }

    fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            tag: None,
            static_members: None,
            dynamic: None,
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

impl CreateModel for AddressGroupCreate {
    fn container(&self) -> ContainerFields<'_> {
        ContainerFields::new(
            self.folder.as_deref(),
            self.snippet.as_deref(),
            self.device.as_deref(),
        )
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        exactly_one(
            "address group",
            &[
                ("static", self.static_members.is_some()),
                ("dynamic", self.dynamic.is_some()),
            ],
        )?;
        unique_items("static", self.static_members.as_deref())?;
        unique_items("tag", self.tag.as_deref())?;
        Container::from_parts(self.container())?;
        Ok(())
    }
}

/// Payload for updating an address group.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressGroupUpdate {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub tag: Option<Vec<String>>,
    #[serde(rename = "static")]
    pub static_members: Option<Vec<String>>,
    pub dynamic: Option<DynamicFilter>,
}

impl UpdateModel for AddressGroupUpdate {
    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        at_most_one(
            "address group",
            &[
                ("static", self.static_members.is_some()),
                ("dynamic", self.dynamic.is_some()),
            ],
        )?;
        unique_items("static", self.static_members.as_deref())
    }
}

/// An address group as returned by the API.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressGroupResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag: Option<Vec<String>>,
    #[serde(rename = "static", default)]
    pub static_members: Option<Vec<String>>,
    #[serde(default)]
    pub dynamic: Option<DynamicFilter>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

impl AddressGroupResponse {
    /// `"static"` or `"dynamic"`.
    pub fn group_type(&self) -> &'static str {
        if self.dynamic.is_some() {
            "dynamic"
        } else {
            "static"
        }
    }
}

impl ResponseModel for AddressGroupResponse {
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

/// Client-side filters for listing address groups.
#[derive(Debug, Clone, Default)]
pub struct AddressGroupFilters {
    /// `static` and/or `dynamic`.
    pub types: Option<Vec<String>>,
    /// Static member names or dynamic filter expressions.
    pub values: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}
