//! Tag objects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validate_name;
use crate::container::{Container, ContainerFields};
use crate::error::Result;
use crate::traits::{CreateModel, Resource, ResponseModel, UpdateModel};

/// Tag resource (`config/objects/v1/tags`).
#[derive(Debug, Clone, Copy)]
pub struct Tag;

impl Resource for Tag {
    const NAME: &'static str = "tag";
    const ENDPOINT: &'static str = "config/objects/v1/tags";

    type Create = TagCreate;
    type Update = TagUpdate;
    type Response = TagResponse;
    type Filters = TagFilters;

    fn apply_filters(mut items: Vec<TagResponse>, filters: &TagFilters) -> Vec<TagResponse> {
        if let Some(colors) = &filters.colors {
            items.retain(|t| t.color.as_ref().is_some_and(|c| colors.contains(c)));
        }
        items
    }
}

/// Payload for creating a tag.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagCreate {
    pub name: String,
    /// Display color, e.g. "Red" or "Azure Blue".
    pub color: Option<String>,
    pub comments: Option<String>,
    pub folder: Option<String>,
    pub snippet: Option<String>,
    pub device: Option<String>,
}

impl TagCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            comments: None,
            folder: None,
            snippet: None,
            device: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
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

impl CreateModel for TagCreate {
    fn container(&self) -> ContainerFields<'_> {
        ContainerFields::new(
            self.folder.as_deref(),
            self.snippet.as_deref(),
            self.device.as_deref(),
        )
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        Container::from_parts(self.container())?;
        Ok(())
    }
}

/// Payload for updating a tag.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagUpdate {
    pub id: Uuid,
    pub name: Option<String>,
    pub color: Option<String>,
    pub comments: Option<String>,
}

impl UpdateModel for TagUpdate {
    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<()> {
        self.name.as_deref().map_or(Ok(()), validate_name)
    }
}

/// A tag as returned by the API.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

impl ResponseModel for TagResponse {
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

/// Client-side filters for listing tags.
#[derive(Debug, Clone, Default)]
pub struct TagFilters {
    /// Keep tags whose color is one of these.
    pub colors: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(name: &str, color: Option<&str>) -> TagResponse {
        TagResponse {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: color.map(str::to_string),
            comments: None,
            folder: Some("Texas".to_string()),
            snippet: None,
            device: None,
        }
    }

    #[test]
    fn test_create_serializes_only_set_fields() {
        let tag = TagCreate::new("prod").with_color("Red").in_folder("Texas");
        assert_eq!(
            serde_json::to_value(&tag).unwrap(),
            json!({"name": "prod", "color": "Red", "folder": "Texas"})
        );
        assert!(tag.validate().is_ok());
    }

    #[test]
    fn test_create_requires_name() {
        assert!(TagCreate::new("").in_folder("Texas").validate().is_err());
    }

    #[test]
    fn test_color_filter() {
        let items = vec![
            response("a", Some("Red")),
            response("b", Some("Blue")),
            response("c", None),
        ];
        let filters = TagFilters {
            colors: Some(vec!["Red".to_string()]),
        };
        let kept = Tag::apply_filters(items.clone(), &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "a");

        assert_eq!(Tag::apply_filters(items, &TagFilters::default()).len(), 3);
    }
}
