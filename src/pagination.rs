//! Offset pagination for SCM list endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorPayload, Result, ScmError};

/// Default page size for list operations.
pub const DEFAULT_MAX_LIMIT: u32 = 2500;

/// Largest page size the API accepts.
pub const ABSOLUTE_MAX_LIMIT: u32 = 5000;

/// Maximum pages to fetch (safety limit).
pub const MAX_PAGES: u32 = 1000;

/// A page of results from a list endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Total number of items across all pages (if reported).
    pub total: Option<u64>,
    /// Offset this page was requested at.
    pub offset: u32,
    /// Requested page size.
    pub limit: u32,
    /// Whether another page should be requested.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Create a new page from items and pagination info.
    ///
    /// A short page (fewer items than `limit`) always ends the listing,
    /// whatever `total` claims.
    #[must_use]
    pub fn new(items: Vec<T>, offset: u32, limit: u32, total: Option<u64>) -> Self {
        let has_more = items.len() >= limit as usize && limit > 0;
        Self {
            items,
            total,
            offset,
            limit,
            has_more,
        }
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
            has_more: self.has_more,
        }
    }

    /// Offset of the page following this one.
    #[must_use]
    pub fn next_offset(&self) -> u32 {
        self.offset.saturating_add(self.limit)
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Query parameters for paginated requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub limit: u32,
    pub offset: u32,
}

impl PaginationParams {
    #[must_use]
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// As `(name, value)` query pairs.
    pub fn to_query(self) -> Vec<(String, String)> {
        vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ]
    }
}

/// Validate a requested page size.
///
/// `None` yields `default`. Anything below 1 or above `absolute_max` is an
/// [`ScmError::InvalidObject`] whose details carry `reason`, `value`,
/// `min` and `max`.
pub fn validate_max_limit(value: Option<i64>, default: u32, absolute_max: u32) -> Result<u32> {
    let Some(value) = value else {
        return Ok(default);
    };

    let reason = if value < 1 {
        Some(("below_minimum", "max_limit must be greater than 0".to_string()))
    } else if value > i64::from(absolute_max) {
        Some((
            "above_maximum",
            format!("max_limit cannot exceed {absolute_max}"),
        ))
    } else {
        None
    };

    match reason {
        Some((reason, message)) => Err(ScmError::InvalidObject(
            ErrorPayload::client_side(message)
                .with_detail("errorType", "Invalid Object")
                .with_detail("error", "Invalid max_limit value")
                .with_detail("field", "max_limit")
                .with_detail("reason", reason)
                .with_detail("value", value)
                .with_detail("min", 1)
                .with_detail("max", absolute_max),
        )),
        None => Ok(value as u32),
    }
}

/// The two shapes a list endpoint may answer with.
///
/// Some resource families answer with a wrapper carrying pagination
/// metadata, others with a bare array. Which one is authoritative is not
/// settled, so both are accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum ListShape {
    /// `{"data": [...], "limit": n, "offset": n, "total": n}`.
    Wrapped {
        data: Vec<Value>,
        total: Option<u64>,
    },
    /// `[...]`, understood as a single final page.
    Bare(Vec<Value>),
}

impl ListShape {
    /// Classify a list response.
    pub fn from_response(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(Self::Bare(items)),
            Value::Object(mut map) => {
                let total = map.get("total").and_then(Value::as_u64);
                match map.remove("data") {
                    Some(Value::Array(data)) => Ok(Self::Wrapped { data, total }),
                    Some(other) => Err(ScmError::InvalidObject(
                        ErrorPayload::server_side(
                            "Invalid response format: 'data' field must be a list",
                        )
                        .with_detail("error", "Response 'data' is not a list")
                        .with_detail("received", json_type(&other)),
                    )),
                    None => Err(ScmError::InvalidObject(
                        ErrorPayload::server_side("Invalid response format: missing 'data' field")
                            .with_detail("error", "Response missing 'data' field"),
                    )),
                }
            }
            other => Err(ScmError::InvalidObject(
                ErrorPayload::server_side("Invalid response format: expected an object or a list")
                    .with_detail("error", "Unexpected response type")
                    .with_detail("received", json_type(&other)),
            )),
        }
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_has_more_only_on_full_page() {
        let page: Page<i32> = Page::new(vec![1; 100], 0, 100, Some(250));
        assert!(page.has_more);
        assert_eq!(page.next_offset(), 100);

        let page: Page<i32> = Page::new(vec![1; 50], 200, 100, Some(250));
        assert!(!page.has_more);

        // A short page ends the listing even if total disagrees.
        let page: Page<i32> = Page::new(vec![1; 10], 0, 100, Some(1000));
        assert!(!page.has_more);

        let page: Page<i32> = Page::new(vec![], 0, 100, None);
        assert!(!page.has_more);
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], 0, 100, Some(3));
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.offset, 0);
    }

    #[test]
    fn test_max_limit_default_and_range() {
        assert_eq!(validate_max_limit(None, 2500, 5000).unwrap(), 2500);
        for v in [1, 2, 2500, 4999, 5000] {
            assert_eq!(validate_max_limit(Some(v), 2500, 5000).unwrap() as i64, v);
        }
    }

    #[test]
    fn test_max_limit_out_of_range() {
        for (v, reason) in [
            (0, "below_minimum"),
            (-1, "below_minimum"),
            (5001, "above_maximum"),
            (i64::MAX, "above_maximum"),
        ] {
            let err = validate_max_limit(Some(v), 2500, 5000).unwrap_err();
            let payload = err.payload().expect("structured payload");
            assert!(matches!(err, ScmError::InvalidObject(_)));
            assert_eq!(payload.detail_str("reason"), Some(reason));
            assert_eq!(payload.details.get("value"), Some(&json!(v)));
            assert!(!payload.is_server_side());
        }
    }

    #[test]
    fn test_list_shape_wrapped_and_bare() {
        let wrapped = json!({"data": [{"id": 1}], "limit": 1, "offset": 0, "total": 3});
        assert_eq!(
            ListShape::from_response(wrapped).unwrap(),
            ListShape::Wrapped {
                data: vec![json!({"id": 1})],
                total: Some(3),
            }
        );

        let bare = json!([{"id": 1}, {"id": 2}]);
        assert!(matches!(
            ListShape::from_response(bare).unwrap(),
            ListShape::Bare(v) if v.len() == 2
        ));
    }

    #[test]
    fn test_list_shape_rejects_unknown_shapes() {
        for value in [json!({"items": []}), json!({"data": "oops"}), json!("text"), Value::Null] {
            let err = ListShape::from_response(value).unwrap_err();
            assert!(err.payload().unwrap().is_server_side());
        }
    }
}
