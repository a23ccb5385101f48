//! SCM configuration object models.

mod address;
mod address_group;
mod bgp_routing;
mod security_rule;
mod security_zone;
mod service_object;
mod tag;

pub use address::*;
pub use address_group::*;
pub use bgp_routing::*;
pub use security_rule::*;
pub use security_zone::*;
pub use service_object::*;
pub use tag::*;

use crate::error::{ErrorPayload, Result, ScmError};

fn invalid(message: impl Into<String>) -> ScmError {
    ScmError::InvalidObject(
        ErrorPayload::client_side(message).with_detail("errorType", "Invalid Object"),
    )
}

/// Names must contain something other than whitespace.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ScmError::InvalidObject(
            ErrorPayload::client_side("Field 'name' cannot be empty")
                .with_detail("errorType", "Invalid Object")
                .with_detail("field", "name"),
        ));
    }
    Ok(())
}

/// Exactly one of the named fields must be set.
pub(crate) fn exactly_one(group: &str, fields: &[(&str, bool)]) -> Result<()> {
    let set: Vec<&str> = fields.iter().filter(|(_, set)| *set).map(|(f, _)| *f).collect();
    if set.len() == 1 {
        return Ok(());
    }
    let names: Vec<&str> = fields.iter().map(|(f, _)| *f).collect();
    Err(ScmError::InvalidObject(
        ErrorPayload::client_side(format!(
            "Exactly one of {} must be provided for {group}",
            names.join(", ")
        ))
        .with_detail("errorType", "Invalid Object")
        .with_detail("provided", set),
    ))
}

/// At most one of the named fields may be set (partial updates).
pub(crate) fn at_most_one(group: &str, fields: &[(&str, bool)]) -> Result<()> {
    if fields.iter().filter(|(_, set)| *set).count() <= 1 {
        Ok(())
    } else {
        exactly_one(group, fields)
    }
}

/// List fields must not repeat entries.
pub(crate) fn unique_items(field: &str, items: Option<&[String]>) -> Result<()> {
    let Some(items) = items else {
        return Ok(());
    };
    for (i, item) in items.iter().enumerate() {
        if items[..i].contains(item) {
            return Err(invalid(format!("List items in '{field}' must be unique")));
        }
    }
    Ok(())
}

/// True if any of `values` is in `wanted`.
pub(crate) fn any_in(values: &[String], wanted: &[String]) -> bool {
    values.iter().any(|v| wanted.contains(v))
}
