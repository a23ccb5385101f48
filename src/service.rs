//! Generic CRUD, list and fetch engine shared by every resource type.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::container::{Container, ContainerQuery};
use crate::error::{ErrorPayload, Result, ScmError};
use crate::logging::Logger;
use crate::pagination::{
    json_type, validate_max_limit, ListShape, Page, PaginationParams, MAX_PAGES,
};
use crate::payload::Payload;
use crate::traits::{Resource, ResponseModel, UpdateModel};
use crate::transport::Transport;

/// Options for [`ResourceService::list`].
///
/// Filtering is entirely client-side and runs after every page has been
/// collected, in this order: `filters`, `exact_match`, `exclude_folders`,
/// `exclude_snippets`, `exclude_devices`.
#[derive(Debug, Clone, Default)]
pub struct ListOptions<F> {
    /// The container to list; exactly one field must be set.
    pub container: ContainerQuery,
    /// Keep only objects whose container equals the queried one (drops
    /// objects inherited from parent folders).
    pub exact_match: bool,
    pub exclude_folders: Vec<String>,
    pub exclude_snippets: Vec<String>,
    pub exclude_devices: Vec<String>,
    /// Resource-specific filters.
    pub filters: F,
}

impl<F: Default> ListOptions<F> {
    pub fn new(container: ContainerQuery) -> Self {
        Self {
            container,
            exact_match: false,
            exclude_folders: Vec::new(),
            exclude_snippets: Vec::new(),
            exclude_devices: Vec::new(),
            filters: F::default(),
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self::new(ContainerQuery::folder(name))
    }

    pub fn snippet(name: impl Into<String>) -> Self {
        Self::new(ContainerQuery::snippet(name))
    }

    pub fn device(name: impl Into<String>) -> Self {
        Self::new(ContainerQuery::device(name))
    }

    #[must_use]
    pub fn exact_match(mut self) -> Self {
        self.exact_match = true;
        self
    }

    #[must_use]
    pub fn exclude_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_folders = folders.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn exclude_snippets<I, S>(mut self, snippets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_snippets = snippets.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn exclude_devices<I, S>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_devices = devices.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: F) -> Self {
        self.filters = filters;
        self
    }
}

/// CRUD, list and fetch for one resource type.
///
/// # Example
///
/// ```no_run
/// use scmapi::{AddressCreate, ContainerQuery, ListOptions, ScmClient};
///
/// # async fn example() -> scmapi::Result<()> {
/// let client = ScmClient::from_env().await?;
/// let addresses = client.addresses();
///
/// let created = addresses
///     .create(AddressCreate::ip_netmask("web-01", "10.0.0.10/32").in_folder("Texas"))
///     .await?;
///
/// let all = addresses.list(&ListOptions::folder("Texas").exact_match()).await?;
/// let same = addresses.fetch("web-01", &ContainerQuery::folder("Texas")).await?;
/// assert_eq!(created.id, same.id);
/// # let _ = all;
/// # Ok(())
/// # }
/// ```
pub struct ResourceService<R: Resource> {
    transport: Arc<dyn Transport>,
    max_limit: u32,
    scope_params: Vec<(String, String)>,
    logger: Logger,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            max_limit: self.max_limit,
            scope_params: self.scope_params.clone(),
            logger: self.logger.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> std::fmt::Debug for ResourceService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("resource", &R::NAME)
            .field("endpoint", &R::ENDPOINT)
            .field("max_limit", &self.max_limit)
            .field("scope_params", &self.scope_params)
            .finish_non_exhaustive()
    }
}

impl<R: Resource> ResourceService<R> {
    /// Create a service using the resource's default page size.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            max_limit: R::DEFAULT_MAX_LIMIT,
            scope_params: Vec::new(),
            logger: Logger::global(),
            _resource: PhantomData,
        }
    }

    /// Set the page size; `None` restores the default.
    ///
    /// # Errors
    ///
    /// [`ScmError::InvalidObject`] when the value is below 1 or above
    /// [`Resource::ABSOLUTE_MAX_LIMIT`].
    pub fn with_max_limit(mut self, max_limit: Option<i64>) -> Result<Self> {
        self.set_max_limit(max_limit)?;
        Ok(self)
    }

    /// See [`Self::with_max_limit`].
    pub fn set_max_limit(&mut self, max_limit: Option<i64>) -> Result<()> {
        self.max_limit =
            validate_max_limit(max_limit, R::DEFAULT_MAX_LIMIT, R::ABSOLUTE_MAX_LIMIT)?;
        Ok(())
    }

    /// Page size used by [`Self::list`].
    pub fn max_limit(&self) -> u32 {
        self.max_limit
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Add a query parameter sent with every request of this service.
    #[must_use]
    pub fn with_scope_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope_params.push((key.into(), value.into()));
        self
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn logger(&self) -> &Logger {
        &self.logger
    }

    fn with_scope_query(&self, path: String) -> String {
        if self.scope_params.is_empty() {
            return path;
        }
        let query = self
            .scope_params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{path}?{query}")
    }

    fn collection_path(&self) -> String {
        self.with_scope_query(R::ENDPOINT.to_string())
    }

    fn item_path(&self, id: Uuid) -> String {
        self.with_scope_query(format!("{}/{}", R::ENDPOINT, id))
    }

    /// Create an object.
    ///
    /// The input is validated (unknown fields rejected), only set fields
    /// are sent, and the response is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Client-side [`ScmError::InvalidObject`] for bad input, server-side
    /// [`ScmError::InvalidObject`] for an unparseable response, or the
    /// classified API error.
    #[tracing::instrument(skip(self, data), fields(resource = R::NAME))]
    pub async fn create(&self, data: impl Into<Payload<R::Create>>) -> Result<R::Response> {
        let model = data.into().into_model()?;
        let body = serde_json::to_value(&model)?;

        let response = self.transport.post(&self.collection_path(), &body).await?;
        let created: R::Response = parse_response(response)?;

        self.logger.emit(|| {
            tracing::debug!(
                resource = R::NAME,
                id = %created.id(),
                name = created.name(),
                "created object"
            );
        });
        Ok(created)
    }

    /// Get an object by id.
    #[tracing::instrument(skip(self), fields(resource = R::NAME))]
    pub async fn get(&self, id: Uuid) -> Result<R::Response> {
        let response = self.transport.get(&self.item_path(id), &[]).await?;
        parse_response(response)
    }

    /// Update an object. The id is taken from the model and sent only in
    /// the URL.
    #[tracing::instrument(skip(self, model), fields(resource = R::NAME, id = %model.id()))]
    pub async fn update(&self, model: R::Update) -> Result<R::Response> {
        model.validate()?;
        let id = model.id();

        let mut body = serde_json::to_value(&model)?;
        if let Value::Object(map) = &mut body {
            map.remove("id");
        }

        let response = self.transport.put(&self.item_path(id), &body).await?;
        parse_response(response)
    }

    /// Delete an object by id.
    #[tracing::instrument(skip(self), fields(resource = R::NAME))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.transport.delete(&self.item_path(id)).await?;
        self.logger
            .emit(|| tracing::debug!(resource = R::NAME, %id, "deleted object"));
        Ok(())
    }

    /// Fetch a single page without client-side filtering.
    ///
    /// # Errors
    ///
    /// Container or page size validation errors, or the request failure.
    #[tracing::instrument(skip(self, container), fields(resource = R::NAME))]
    pub async fn list_page(
        &self,
        container: &ContainerQuery,
        offset: u32,
        limit: u32,
    ) -> Result<Page<R::Response>> {
        let container = container.validate()?;
        let limit = validate_max_limit(
            Some(i64::from(limit)),
            R::DEFAULT_MAX_LIMIT,
            R::ABSOLUTE_MAX_LIMIT,
        )?;
        self.request_page(&container, offset, limit).await
    }

    async fn request_page(
        &self,
        container: &Container,
        offset: u32,
        limit: u32,
    ) -> Result<Page<R::Response>> {
        let mut params = self.scope_params.clone();
        params.push(container.query_pair());
        params.extend(PaginationParams::new(limit, offset).to_query());

        let response = self.transport.get(R::ENDPOINT, &params).await?;

        match ListShape::from_response(response)? {
            ListShape::Wrapped { data, total } => {
                Ok(Page::new(parse_items(data)?, offset, limit, total))
            }
            ListShape::Bare(items) => {
                let total = items.len() as u64;
                let mut page = Page::new(parse_items(items)?, offset, limit, Some(total));
                page.has_more = false;
                Ok(page)
            }
        }
    }

    /// List every object in a container.
    ///
    /// Pages of [`Self::max_limit`] items are requested sequentially until a
    /// short page arrives; a bare-array response counts as the only page.
    /// Filters from `options` are applied afterwards.
    ///
    /// # Errors
    ///
    /// Container validation errors, or the first failing page request.
    #[tracing::instrument(skip(self, options), fields(resource = R::NAME))]
    pub async fn list(&self, options: &ListOptions<R::Filters>) -> Result<Vec<R::Response>> {
        let container = options.container.validate()?;
        let limit = self.max_limit;

        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut duplicates = 0usize;
        let mut offset = 0u32;
        let mut pages = 0u32;

        loop {
            let page = self.request_page(&container, offset, limit).await?;
            pages += 1;
            let has_more = page.has_more;
            offset = page.next_offset();

            for item in page {
                if seen.insert(item.id()) {
                    items.push(item);
                } else {
                    duplicates += 1;
                }
            }

            if !has_more {
                break;
            }

            // Safety limit to prevent infinite loops
            if pages >= MAX_PAGES {
                self.logger.emit(|| {
                    tracing::warn!(
                        resource = R::NAME,
                        "Reached pagination limit of {} pages, stopping",
                        MAX_PAGES
                    );
                });
                break;
            }
        }

        if duplicates > 0 {
            self.logger.emit(|| {
                tracing::warn!(
                    resource = R::NAME,
                    duplicates,
                    "dropped objects repeated across pages"
                );
            });
        }

        self.logger.emit(|| {
            tracing::debug!(
                resource = R::NAME,
                pages,
                count = items.len(),
                "collected listing"
            );
        });

        let items = R::apply_filters(items, &options.filters);
        Ok(apply_container_filters(items, &container, options))
    }

    /// Fetch one object by name within a container.
    ///
    /// The response may be the object itself, a `data` wrapper or a bare
    /// array. When several objects carry the name, the first is returned
    /// and a warning is logged.
    ///
    /// # Errors
    ///
    /// [`ScmError::MissingQueryParameter`] for a blank name,
    /// [`ScmError::NotFound`] when nothing matches.
    #[tracing::instrument(skip(self, container), fields(resource = R::NAME))]
    pub async fn fetch(&self, name: &str, container: &ContainerQuery) -> Result<R::Response> {
        if name.trim().is_empty() {
            return Err(ScmError::MissingQueryParameter(
                ErrorPayload::client_side("Field 'name' cannot be empty")
                    .with_detail("errorType", "Missing Query Parameter")
                    .with_detail("field", "name")
                    .with_detail("error", "\"name\" is not allowed to be empty"),
            ));
        }
        let container = container.validate()?;

        let mut params = self.scope_params.clone();
        params.push(container.query_pair());
        params.push(("name".to_string(), name.to_string()));

        let response = self.transport.get(R::ENDPOINT, &params).await?;

        let candidates = match response {
            Value::Object(map) if map.contains_key("id") => {
                return parse_response(Value::Object(map));
            }
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(ScmError::InvalidObject(
                        ErrorPayload::server_side(
                            "Invalid response format: missing 'id' or 'data' field",
                        )
                        .with_detail("error", "Response has invalid structure"),
                    ))
                }
            },
            Value::Array(items) => items,
            other => {
                return Err(ScmError::InvalidObject(
                    ErrorPayload::server_side(
                        "Invalid response format: expected an object or a list",
                    )
                    .with_detail("error", "Unexpected response type")
                    .with_detail("received", json_type(&other)),
                ))
            }
        };

        let mut matches = candidates
            .into_iter()
            .filter(|item| item.get("name").and_then(Value::as_str) == Some(name));

        let Some(first) = matches.next() else {
            let (field, value) = container.query_pair();
            return Err(ScmError::NotFound(
                ErrorPayload::new(
                    format!("{} '{}' not found in {}", R::NAME, name, container),
                    "E005",
                    404,
                )
                .with_detail("errorType", "Object Not Present")
                .with_detail("name", name)
                .with_detail(&field, value),
            ));
        };

        let others = matches.count();
        if others > 0 {
            self.logger.emit(|| {
                tracing::warn!(
                    resource = R::NAME,
                    name,
                    matches = others + 1,
                    "multiple objects share the requested name; using the first"
                );
            });
        }

        parse_response(first)
    }
}

/// Validate a server payload against a response model.
///
/// A mismatch is a server-side [`ScmError::InvalidObject`] (HTTP 500).
pub(crate) fn parse_response<T: DeserializeOwned>(value: Value) -> Result<T> {
    if !value.is_object() {
        return Err(ScmError::InvalidObject(
            ErrorPayload::server_side("Invalid response format: expected an object")
                .with_detail("error", "Response is not an object")
                .with_detail("received", json_type(&value)),
        ));
    }
    serde_json::from_value(value).map_err(|e| {
        ScmError::InvalidObject(
            ErrorPayload::server_side(format!("Response does not match the expected model: {e}"))
                .with_detail("error", "Invalid response model")
                .with_detail("errors", e.to_string()),
        )
    })
}

fn parse_items<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>> {
    items.into_iter().map(parse_response).collect()
}

/// The generic container filters: `exact_match`, then the three deny-lists.
pub(crate) fn apply_container_filters<T: ResponseModel, F>(
    mut items: Vec<T>,
    container: &Container,
    options: &ListOptions<F>,
) -> Vec<T> {
    if options.exact_match {
        items.retain(|item| item.container().get(container.kind()) == Some(container.name()));
    }
    if !options.exclude_folders.is_empty() {
        items.retain(|item| !is_listed(item.container().folder, &options.exclude_folders));
    }
    if !options.exclude_snippets.is_empty() {
        items.retain(|item| !is_listed(item.container().snippet, &options.exclude_snippets));
    }
    if !options.exclude_devices.is_empty() {
        items.retain(|item| !is_listed(item.container().device, &options.exclude_devices));
    }
    items
}

fn is_listed(value: Option<&str>, list: &[String]) -> bool {
    value.is_some_and(|v| list.iter().any(|entry| entry == v))
}
