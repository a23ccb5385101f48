//! Classification of failed HTTP responses into [`ScmError`].
//!
//! Dispatch is tiered: a recognized vendor error code decides first, then
//! the HTTP status alone, then the generic [`ScmError::Api`] fallback. An
//! unknown vendor code therefore still yields an error classed by status.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ErrorPayload, ScmError};

/// Vendor error envelope: `{"_errors": [...], "_request_id": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorErrorResponse {
    #[serde(rename = "_errors")]
    pub errors: Vec<VendorError>,
    #[serde(rename = "_request_id", default)]
    pub request_id: Option<String>,
}

/// One entry of the vendor error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorError {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl VendorError {
    /// The `errorType` detail, if the details are an object carrying one.
    pub fn error_type(&self) -> Option<&str> {
        self.details.get("errorType").and_then(Value::as_str)
    }
}

/// Coarse error category used by the dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Authentication,
    Authorization,
    InvalidObject,
    MissingQueryParameter,
    NotFound,
    NameNotUnique,
    ReferenceNotZero,
}

/// Maps failure tuples onto the typed error family.
pub struct ErrorHandler;

impl ErrorHandler {
    /// Classify a failed response from its status and raw body.
    ///
    /// A body in the vendor envelope contributes code, message and details;
    /// any other body is used verbatim as the message.
    pub fn classify(status: u16, body: &str) -> ScmError {
        match Self::parse_vendor_error(body) {
            Some(parsed) => {
                let mut error = parsed.errors.into_iter().next().unwrap_or(VendorError {
                    code: String::new(),
                    message: String::new(),
                    details: Value::Null,
                });
                if let Some(request_id) = parsed.request_id {
                    let mut details = normalize_details(error.details.take());
                    details
                        .entry("request_id")
                        .or_insert(Value::String(request_id));
                    error.details = Value::Object(details);
                }
                Self::from_vendor_error(status, error)
            }
            None => {
                let message = if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim().to_string()
                };
                Self::from_parts(status, "", message, Value::Null)
            }
        }
    }

    /// Parse the vendor envelope, if the body is one.
    pub fn parse_vendor_error(body: &str) -> Option<VendorErrorResponse> {
        serde_json::from_str::<VendorErrorResponse>(body)
            .ok()
            .filter(|r| !r.errors.is_empty())
    }

    /// Classify a single vendor error entry.
    pub fn from_vendor_error(status: u16, error: VendorError) -> ScmError {
        Self::from_parts(status, &error.code, error.message, error.details)
    }

    /// Classify a failure tuple.
    pub fn from_parts(status: u16, code: &str, message: String, details: Value) -> ScmError {
        let details = normalize_details(details);
        let error_type = details.get("errorType").and_then(Value::as_str);

        let class =
            Self::class_for_code(code, error_type).or_else(|| Self::class_for_status(status));

        let message = if message.is_empty() {
            error_type
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {status}"))
        } else {
            message
        };
        let payload = ErrorPayload::new(message, code, status).with_details(details);

        tracing::debug!(status, code, class = ?class, "classified API error");

        match class {
            Some(Class::Authentication) => ScmError::Authentication(payload),
            Some(Class::Authorization) => ScmError::Authorization(payload),
            Some(Class::InvalidObject) => ScmError::InvalidObject(payload),
            Some(Class::MissingQueryParameter) => ScmError::MissingQueryParameter(payload),
            Some(Class::NotFound) => ScmError::NotFound(payload),
            Some(Class::NameNotUnique) => ScmError::NameNotUnique(payload),
            Some(Class::ReferenceNotZero) => ScmError::ReferenceNotZero(payload),
            None => ScmError::Api(payload),
        }
    }

    fn class_for_code(code: &str, error_type: Option<&str>) -> Option<Class> {
        match code {
            "E016" | "E007" => Some(Class::Authentication),
            "E003" => match error_type {
                Some("Missing Query Parameter") => Some(Class::MissingQueryParameter),
                _ => Some(Class::InvalidObject),
            },
            "E005" => Some(Class::NotFound),
            "E006" => Some(Class::NameNotUnique),
            "E009" => Some(Class::ReferenceNotZero),
            "API_I00013" | "API_I00035" => Some(match error_type {
                Some("Object Already Exists") | Some("Name Not Unique") => Class::NameNotUnique,
                Some("Reference Not Zero") => Class::ReferenceNotZero,
                Some("Object Not Present") => Class::NotFound,
                _ => Class::InvalidObject,
            }),
            _ => None,
        }
    }

    fn class_for_status(status: u16) -> Option<Class> {
        match status {
            400 => Some(Class::InvalidObject),
            401 => Some(Class::Authentication),
            403 => Some(Class::Authorization),
            404 => Some(Class::NotFound),
            409 => Some(Class::NameNotUnique),
            _ => None,
        }
    }
}

fn normalize_details(details: Value) -> Map<String, Value> {
    match details {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("errors".to_string(), other);
            map
        }
    }
}
