//! Create input accepted as either raw JSON or a typed model.

use serde_json::Value;

use crate::error::{ErrorPayload, Result, ScmError};
use crate::traits::CreateModel;

/// Input to a create call.
///
/// Both forms are validated once, at the service boundary, by
/// [`Payload::into_model`].
#[derive(Debug, Clone)]
pub enum Payload<T> {
    /// Untyped JSON, e.g. loaded from a file. Unknown fields are rejected.
    Raw(Value),
    /// An already-typed model.
    Model(T),
}

impl<T: CreateModel> Payload<T> {
    /// Wrap raw JSON.
    pub fn raw(value: Value) -> Self {
        Self::Raw(value)
    }

    /// Convert to a validated model.
    ///
    /// # Errors
    ///
    /// [`ScmError::InvalidObject`] if the JSON does not match the model or
    /// the model breaks its invariants.
    pub fn into_model(self) -> Result<T> {
        let model = match self {
            Self::Raw(value) => serde_json::from_value::<T>(value).map_err(|e| {
                ScmError::InvalidObject(
                    ErrorPayload::client_side(format!("Invalid payload: {e}"))
                        .with_detail("errorType", "Invalid Object")
                        .with_detail("errors", e.to_string()),
                )
            })?,
            Self::Model(model) => model,
        };
        model.validate()?;
        Ok(model)
    }
}

impl<T: CreateModel> From<T> for Payload<T> {
    fn from(model: T) -> Self {
        Self::Model(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagCreate;
    use serde_json::json;

    #[test]
    fn test_raw_payload_becomes_model() {
        let model = Payload::<TagCreate>::raw(json!({"name": "prod", "folder": "Texas"}))
            .into_model()
            .unwrap();
        assert_eq!(model.name, "prod");
        assert_eq!(model.folder.as_deref(), Some("Texas"));
    }

    #[test]
    fn test_raw_payload_rejects_unknown_fields() {
        let err = Payload::<TagCreate>::raw(json!({"name": "prod", "folder": "Texas", "colour": "Red"}))
            .into_model()
            .unwrap_err();
        assert!(matches!(err, ScmError::InvalidObject(_)));
        assert!(err.payload().unwrap().detail_str("errors").unwrap().contains("colour"));
    }

    #[test]
    fn test_model_payload_is_validated_too() {
        let tag = TagCreate {
            name: "prod".to_string(),
            color: None,
            comments: None,
            folder: None,
            snippet: None,
            device: None,
        };
        let err = Payload::from(tag).into_model().unwrap_err();
        assert!(matches!(err, ScmError::InvalidObject(_)));
    }
}
