//! Trait definitions for SCM resources.
//!
//! Each resource type supplies its three model types and endpoint through
//! [`Resource`]; the generic [`crate::ResourceService`] does the rest.

mod model;
mod resource;

pub use model::{CreateModel, ResponseModel, UpdateModel};
pub use resource::Resource;
