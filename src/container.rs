//! Container scopes (folder, snippet or device).
//!
//! Every configuration object lives in exactly one container. Queries and
//! creation payloads must name exactly one of the three.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorPayload, Result, ScmError};

/// The three container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Folder,
    Snippet,
    Device,
}

impl ContainerKind {
    /// Field / query parameter name for this kind.
    pub fn field(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Snippet => "snippet",
            Self::Device => "device",
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field())
    }
}

/// A validated container reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Container {
    kind: ContainerKind,
    name: String,
}

impl Container {
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            kind: ContainerKind::Folder,
            name: name.into(),
        }
    }

    pub fn snippet(name: impl Into<String>) -> Self {
        Self {
            kind: ContainerKind::Snippet,
            name: name.into(),
        }
    }

    pub fn device(name: impl Into<String>) -> Self {
        Self {
            kind: ContainerKind::Device,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `(field, value)` query pair for this container.
    pub fn query_pair(&self) -> (String, String) {
        (self.kind.field().to_string(), self.name.clone())
    }

    /// Validate a folder/snippet/device triple.
    ///
    /// A field that is present but blank is a [`ScmError::MissingQueryParameter`];
    /// zero or several present fields is a [`ScmError::InvalidObject`].
    pub fn from_parts(fields: ContainerFields<'_>) -> Result<Self> {
        let candidates = [
            (ContainerKind::Folder, fields.folder),
            (ContainerKind::Snippet, fields.snippet),
            (ContainerKind::Device, fields.device),
        ];

        for (kind, value) in candidates {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                let field = kind.field();
                return Err(ScmError::MissingQueryParameter(
                    ErrorPayload::client_side(format!("Field '{field}' cannot be empty"))
                        .with_detail("errorType", "Missing Query Parameter")
                        .with_detail("field", field)
                        .with_detail("error", format!("\"{field}\" is not allowed to be empty")),
                ));
            }
        }

        let present: Vec<_> = candidates
            .into_iter()
            .filter_map(|(kind, value)| value.map(|v| (kind, v)))
            .collect();

        match present.as_slice() {
            [(kind, value)] => Ok(Self {
                kind: *kind,
                name: value.to_string(),
            }),
            _ => Err(ScmError::InvalidObject(
                ErrorPayload::client_side(
                    "Exactly one of 'folder', 'snippet', or 'device' must be provided.",
                )
                .with_detail("errorType", "Invalid Object")
                .with_detail("error", "Invalid container parameters")
                .with_detail(
                    "provided",
                    present.iter().map(|(k, _)| k.field()).collect::<Vec<_>>(),
                ),
            )),
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// Borrowed view of an object's three container fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerFields<'a> {
    pub folder: Option<&'a str>,
    pub snippet: Option<&'a str>,
    pub device: Option<&'a str>,
}

impl<'a> ContainerFields<'a> {
    pub fn new(folder: Option<&'a str>, snippet: Option<&'a str>, device: Option<&'a str>) -> Self {
        Self { folder, snippet, device }
    }

    /// Value of the given container field.
    pub fn get(&self, kind: ContainerKind) -> Option<&'a str> {
        match kind {
            ContainerKind::Folder => self.folder,
            ContainerKind::Snippet => self.snippet,
            ContainerKind::Device => self.device,
        }
    }

    /// The single set container, if any, in folder/snippet/device order.
    pub fn first(&self) -> Option<(ContainerKind, &'a str)> {
        self.folder
            .map(|v| (ContainerKind::Folder, v))
            .or(self.snippet.map(|v| (ContainerKind::Snippet, v)))
            .or(self.device.map(|v| (ContainerKind::Device, v)))
    }
}

/// Unvalidated container arguments for list and fetch calls.
///
/// Validated at call time with [`ContainerQuery::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerQuery {
    pub folder: Option<String>,
    pub snippet: Option<String>,
    pub device: Option<String>,
}

impl ContainerQuery {
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            folder: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn snippet(name: impl Into<String>) -> Self {
        Self {
            snippet: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn device(name: impl Into<String>) -> Self {
        Self {
            device: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn fields(&self) -> ContainerFields<'_> {
        ContainerFields::new(
            self.folder.as_deref(),
            self.snippet.as_deref(),
            self.device.as_deref(),
        )
    }

    pub fn validate(&self) -> Result<Container> {
        Container::from_parts(self.fields())
    }
}

impl From<Container> for ContainerQuery {
    fn from(container: Container) -> Self {
        match container.kind {
            ContainerKind::Folder => Self::folder(container.name),
            ContainerKind::Snippet => Self::snippet(container.name),
            ContainerKind::Device => Self::device(container.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(
        folder: Option<&str>,
        snippet: Option<&str>,
        device: Option<&str>,
    ) -> Result<Container> {
        Container::from_parts(ContainerFields::new(folder, snippet, device))
    }

    #[test]
    fn test_exactly_one_container_passes() {
        assert_eq!(
            check(Some("Texas"), None, None).unwrap(),
            Container::folder("Texas")
        );
        assert_eq!(
            check(None, Some("base"), None).unwrap(),
            Container::snippet("base")
        );
        assert_eq!(
            check(None, None, Some("fw-01")).unwrap(),
            Container::device("fw-01")
        );
    }

    #[test]
    fn test_no_container_is_invalid_combination() {
        let err = check(None, None, None).unwrap_err();
        assert!(matches!(err, ScmError::InvalidObject(_)));
        assert_eq!(err.http_status(), Some(400));
        assert_eq!(
            err.payload().unwrap().detail_str("error"),
            Some("Invalid container parameters")
        );
    }

    #[test]
    fn test_multiple_containers_are_invalid_combination() {
        for (f, s, d) in [
            (Some("a"), Some("b"), None),
            (Some("a"), None, Some("c")),
            (None, Some("b"), Some("c")),
            (Some("a"), Some("b"), Some("c")),
        ] {
            let err = check(f, s, d).unwrap_err();
            assert!(
                matches!(err, ScmError::InvalidObject(_)),
                "{f:?} {s:?} {d:?}"
            );
        }
    }

    #[test]
    fn test_blank_container_is_missing_parameter() {
        let err = check(Some(""), None, None).unwrap_err();
        assert!(matches!(err, ScmError::MissingQueryParameter(_)));
        assert_eq!(err.payload().unwrap().detail_str("field"), Some("folder"));

        // Blank wins over the combination check.
        let err = check(Some("Texas"), Some("  "), None).unwrap_err();
        assert!(matches!(err, ScmError::MissingQueryParameter(_)));
        assert_eq!(err.payload().unwrap().detail_str("field"), Some("snippet"));
    }

    #[test]
    fn test_query_round_trips_container() {
        let query = ContainerQuery::from(Container::device("fw-01"));
        assert_eq!(query.validate().unwrap(), Container::device("fw-01"));
        assert_eq!(
            query.validate().unwrap().query_pair(),
            ("device".to_string(), "fw-01".to_string())
        );
    }
}
