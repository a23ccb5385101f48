//! Security rules and rule ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{any_in, unique_items, validate_name};
use crate::container::{Container, ContainerFields};
use crate::error::{ErrorPayload, Result, ScmError};
use crate::service::ResourceService;
use crate::traits::{CreateModel, Resource, ResponseModel, UpdateModel};

/// Security rule resource (`config/security/v1/security-rules`).
///
/// Rules live in a rulebase; obtain a service bound to one with
/// [`crate::ScmClient::security_rules`].
#[derive(Debug, Clone, Copy)]
pub struct SecurityRule;

impl Resource for SecurityRule {
    const NAME: &'static str = "security rule";
    const ENDPOINT: &'static str = "config/security/v1/security-rules";

    type Create = SecurityRuleCreate;
    type Update = SecurityRuleUpdate;
    type Response = SecurityRuleResponse;
    type Filters = SecurityRuleFilters;

    fn apply_filters(
        mut items: Vec<SecurityRuleResponse>,
        filters: &SecurityRuleFilters,
    ) -> Vec<SecurityRuleResponse> {
        if let Some(actions) = &filters.actions {
            items.retain(|r| r.action.is_some_and(|a| actions.contains(&a)));
        }
        if let Some(sources) = &filters.sources {
            items.retain(|r| any_in(&r.source, sources));
        }
        if let Some(destinations) = &filters.destinations {
            items.retain(|r| any_in(&r.destination, destinations));
        }
        if let Some(applications) = &filters.applications {
            items.retain(|r| any_in(&r.application, applications));
        }
        if let Some(tags) = &filters.tags {
            items.retain(|r| any_in(&r.tag, tags));
        }
        if let Some(disabled) = filters.disabled {
            items.retain(|r| r.disabled == disabled);
        }
        items
    }
}

/// Pre- or post-rulebase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rulebase {
    #[default]
    Pre,
    Post,
}

impl Rulebase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Post => "post",
        }
    }
}

impl fmt::Display for Rulebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rulebase {
    type Err = ScmError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pre" => Ok(Self::Pre),
            "post" => Ok(Self::Post),
            other => Err(ScmError::InvalidObject(
                ErrorPayload::client_side(format!(
                    "rulebase must be 'pre' or 'post', got '{other}'"
                ))
                .with_detail("errorType", "Invalid Object")
                .with_detail("field", "rulebase"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleAction {
    Allow,
    Deny,
    Drop,
    ResetClient,
    ResetServer,
    ResetBoth,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSetting {
    #[serde(default)]
    pub group: Vec<String>,
}

/// Payload for creating a security rule.
///
/// Unset list fields are filled in by the service (usually `["any"]`).
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityRuleCreate {
    pub name: String,
    pub disabled: Option<bool>,
    pub description: Option<String>,
    pub tag: Option<Vec<String>>,
    #[serde(rename = "from")]
    pub from_zones: Option<Vec<String>>,
    pub source: Option<Vec<String>>,
    pub negate_source: Option<bool>,
    pub source_user: Option<Vec<String>>,
    pub source_hip: Option<Vec<String>>,
    #[serde(rename = "to")]
    pub to_zones: Option<Vec<String>>,
    pub destination: Option<Vec<String>>,
    pub negate_destination: Option<bool>,
    pub destination_hip: Option<Vec<String>>,
    pub application: Option<Vec<String>>,
    pub service: Option<Vec<String>>,
    pub category: Option<Vec<String>>,
    pub action: Option<RuleAction>,
    pub profile_setting: Option<ProfileSetting>,
    pub log_setting: Option<String>,
    pub schedule: Option<String>,
    pub log_start: Option<bool>,
    pub log_end: Option<bool>,
    pub folder: Option<String>,
    pub snippet: Option<String>,
    pub device: Option<String>,
}

impl SecurityRuleCreate {
    pub fn new(name: impl Into<String>, action: RuleAction) -> Self {
        Self {
            name: name.into(),
            disabled: None,
            description: None,
            tag: None,
            from_zones: None,
            source: None,
            negate_source: None,
            source_user: None,
            source_hip: None,
            to_zones: None,
            destination: None,
            negate_destination: None,
            destination_hip: None,
            application: None,
            service: None,
            category: None,
            action: Some(action),
            profile_setting: None,
            log_setting: None,
            schedule: None,
            log_start: None,
            log_end: None,
            folder: None,
            snippet: None,
            device: None,
        }
    }

    #[must_use]
    pub fn with_from_zones<I: IntoIterator<Item = S>, S: Into<String>>(mut self, zones: I) -> Self {
        self.from_zones = Some(zones.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_to_zones<I: IntoIterator<Item = S>, S: Into<String>>(mut self, zones: I) -> Self {
        self.to_zones = Some(zones.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_sources<I: IntoIterator<Item = S>, S: Into<String>>(mut self, sources: I) -> Self {
        self.source = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_destinations<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        destinations: I,
    ) -> Self {
        self.destination = Some(destinations.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_applications<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        applications: I,
    ) -> Self {
        self.application = Some(applications.into_iter().map(Into::into).collect());
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

fn validate_rule_lists(lists: [(&str, Option<&[String]>); 11]) -> Result<()> {
    for (field, items) in lists {
        unique_items(field, items)?;
    }
    Ok(())
}

impl CreateModel for SecurityRuleCreate {
    fn container(&self) -> ContainerFields<'_> {
        ContainerFields::new(
            self.folder.as_deref(),
            self.snippet.as_deref(),
            self.device.as_deref(),
        )
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_rule_lists([
            ("tag", self.tag.as_deref()),
            ("from", self.from_zones.as_deref()),
            ("source", self.source.as_deref()),
            ("source_user", self.source_user.as_deref()),
            ("source_hip", self.source_hip.as_deref()),
            ("to", self.to_zones.as_deref()),
            ("destination", self.destination.as_deref()),
            ("destination_hip", self.destination_hip.as_deref()),
            ("application", self.application.as_deref()),
            ("service", self.service.as_deref()),
            ("category", self.category.as_deref()),
        ])?;
        Container::from_parts(self.container())?;
        Ok(())
    }
}

/// Payload for updating a security rule.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityRuleUpdate {
    pub id: Uuid,
    pub name: Option<String>,
    pub disabled: Option<bool>,
    pub description: Option<String>,
    pub tag: Option<Vec<String>>,
    #[serde(rename = "from")]
    pub from_zones: Option<Vec<String>>,
    pub source: Option<Vec<String>>,
    pub negate_source: Option<bool>,
    pub source_user: Option<Vec<String>>,
    pub source_hip: Option<Vec<String>>,
    #[serde(rename = "to")]
    pub to_zones: Option<Vec<String>>,
    pub destination: Option<Vec<String>>,
    pub negate_destination: Option<bool>,
    pub destination_hip: Option<Vec<String>>,
    pub application: Option<Vec<String>>,
    pub service: Option<Vec<String>>,
    pub category: Option<Vec<String>>,
    pub action: Option<RuleAction>,
    pub profile_setting: Option<ProfileSetting>,
    pub log_setting: Option<String>,
    pub schedule: Option<String>,
    pub log_start: Option<bool>,
    pub log_end: Option<bool>,
}

impl UpdateModel for SecurityRuleUpdate {
    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        validate_rule_lists([
            ("tag", self.tag.as_deref()),
            ("from", self.from_zones.as_deref()),
            ("source", self.source.as_deref()),
            ("source_user", self.source_user.as_deref()),
            ("source_hip", self.source_hip.as_deref()),
            ("to", self.to_zones.as_deref()),
            ("destination", self.destination.as_deref()),
            ("destination_hip", self.destination_hip.as_deref()),
            ("application", self.application.as_deref()),
            ("service", self.service.as_deref()),
            ("category", self.category.as_deref()),
        ])
    }
}

/// A security rule as returned by the API.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRuleResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag: Vec<String>,
    #[serde(rename = "from", default)]
    pub from_zones: Vec<String>,
    #[serde(default)]
    pub source: Vec<String>,
    #[serde(default)]
    pub negate_source: bool,
    #[serde(default)]
    pub source_user: Vec<String>,
    #[serde(default)]
    pub source_hip: Vec<String>,
    #[serde(rename = "to", default)]
    pub to_zones: Vec<String>,
    #[serde(default)]
    pub destination: Vec<String>,
    #[serde(default)]
    pub negate_destination: bool,
    #[serde(default)]
    pub destination_hip: Vec<String>,
    #[serde(default)]
    pub application: Vec<String>,
    #[serde(default)]
    pub service: Vec<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub action: Option<RuleAction>,
    #[serde(default)]
    pub profile_setting: Option<ProfileSetting>,
    #[serde(default)]
    pub log_setting: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub log_start: Option<bool>,
    #[serde(default)]
    pub log_end: Option<bool>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

impl ResponseModel for SecurityRuleResponse {
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

/// Client-side filters for listing security rules.
#[derive(Debug, Clone, Default)]
pub struct SecurityRuleFilters {
    pub actions: Option<Vec<RuleAction>>,
    pub sources: Option<Vec<String>>,
    pub destinations: Option<Vec<String>>,
    pub applications: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub disabled: Option<bool>,
}

/// Where to move a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDestination {
    Top,
    Bottom,
    Before,
    After,
}

impl MoveDestination {
    fn needs_anchor(self) -> bool {
        matches!(self, Self::Before | Self::After)
    }
}

/// Body of a rule move.
///
/// `destination_rule` is required for `before`/`after` and forbidden for
/// `top`/`bottom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMoveRequest {
    pub destination: MoveDestination,
    pub rulebase: Rulebase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_rule: Option<Uuid>,
}

impl RuleMoveRequest {
    pub fn top(rulebase: Rulebase) -> Self {
        Self {
            destination: MoveDestination::Top,
            rulebase,
            destination_rule: None,
        }
    }

    pub fn bottom(rulebase: Rulebase) -> Self {
        Self {
            destination: MoveDestination::Bottom,
            rulebase,
            destination_rule: None,
        }
    }

    pub fn before(anchor: Uuid, rulebase: Rulebase) -> Self {
        Self {
            destination: MoveDestination::Before,
            rulebase,
            destination_rule: Some(anchor),
        }
    }

    pub fn after(anchor: Uuid, rulebase: Rulebase) -> Self {
        Self {
            destination: MoveDestination::After,
            rulebase,
            destination_rule: Some(anchor),
        }
    }

    /// Check the request for moving rule `moved`.
    pub fn validate(&self, moved: Uuid) -> Result<()> {
        let message = match (self.destination.needs_anchor(), self.destination_rule) {
            (true, None) => {
                "destination_rule is required when destination is 'before' or 'after'"
            }
            (false, Some(_)) => {
                "destination_rule is only allowed when destination is 'before' or 'after'"
            }
            (true, Some(anchor)) if anchor == moved => {
                "destination_rule cannot be the rule being moved"
            }
            _ => return Ok(()),
        };
        Err(ScmError::InvalidObject(
            ErrorPayload::client_side(message)
                .with_detail("errorType", "Invalid Object")
                .with_detail("field", "destination_rule"),
        ))
    }
}

impl ResourceService<SecurityRule> {
    /// Move a rule within its rulebase.
    ///
    /// # Errors
    ///
    /// [`ScmError::InvalidObject`] if the request is inconsistent, or the
    /// classified API error.
    #[tracing::instrument(skip(self, request), fields(destination = ?request.destination))]
    pub async fn move_rule(&self, id: Uuid, request: &RuleMoveRequest) -> Result<()> {
        request.validate(id)?;
        let body = serde_json::to_value(request)?;
        let path = format!(
            "{}/{}:move?position={}",
            SecurityRule::ENDPOINT,
            id,
            request.rulebase.as_str()
        );
        self.transport().post(&path, &body).await?;
        self.logger().emit(|| {
            tracing::debug!(
                %id,
                destination = ?request.destination,
                rulebase = %request.rulebase,
                "moved rule"
            );
        });
        Ok(())
    }
}
