//! Resource descriptor trait.

use std::fmt::Debug;

use super::model::{CreateModel, ResponseModel, UpdateModel};
use crate::pagination::{ABSOLUTE_MAX_LIMIT, DEFAULT_MAX_LIMIT};

/// Describes one SCM resource type.
///
/// Implement this on a marker type to get create/get/update/delete/list/
/// fetch through [`crate::ResourceService`].
///
/// # Example
///
/// ```ignore
/// pub struct Tag;
///
/// impl Resource for Tag {
///     const NAME: &'static str = "tag";
///     const ENDPOINT: &'static str = "config/objects/v1/tags";
///     type Create = TagCreate;
///     type Update = TagUpdate;
///     type Response = TagResponse;
///     type Filters = TagFilters;
/// }
/// ```
pub trait Resource: Send + Sync + 'static {
    /// Name used in logs and error messages.
    const NAME: &'static str;

    /// Collection path relative to the API base URL.
    const ENDPOINT: &'static str;

    /// Page size used when none is configured.
    const DEFAULT_MAX_LIMIT: u32 = DEFAULT_MAX_LIMIT;

    /// Largest page size the endpoint accepts.
    const ABSOLUTE_MAX_LIMIT: u32 = ABSOLUTE_MAX_LIMIT;

    type Create: CreateModel;
    type Update: UpdateModel;
    type Response: ResponseModel;

    /// Resource-specific client-side filters for list calls.
    type Filters: Default + Clone + Debug + Send + Sync;

    /// Apply the resource-specific filters. Runs before the generic
    /// container filters.
    fn apply_filters(items: Vec<Self::Response>, filters: &Self::Filters) -> Vec<Self::Response> {
        let _ = filters;
        items
    }
}
