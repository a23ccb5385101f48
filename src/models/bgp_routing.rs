//! BGP routing settings (a singleton, not a collection).

use std::sync::Arc;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorPayload, Result, ScmError};
use crate::logging::Logger;
use crate::service::parse_response;
use crate::transport::Transport;

/// Path of the BGP routing settings.
pub const BGP_ROUTING_ENDPOINT: &str = "config/deployment/v1/bgp-routing";

/// Routing preference.
///
/// On the wire this is an object with a single empty member, e.g.
/// `{"default": {}}`. The bare strings `"default"` and
/// `"hot_potato_routing"` are accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoutingPreference {
    #[default]
    Default,
    HotPotatoRouting,
}

impl RoutingPreference {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::HotPotatoRouting => "hot_potato_routing",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::Default),
            "hot_potato_routing" => Some(Self::HotPotatoRouting),
            _ => None,
        }
    }

    /// Parse either accepted input form.
    pub fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::String(name) => {
                Self::from_name(name).ok_or_else(|| format!("unknown routing preference '{name}'"))
            }
            Value::Object(map) if map.len() == 1 => {
                let (name, inner) = map.iter().next().ok_or("empty routing preference")?;
                let preference = Self::from_name(name)
                    .ok_or_else(|| format!("unknown routing preference '{name}'"))?;
                if inner.as_object().is_some_and(Map::is_empty) {
                    Ok(preference)
                } else {
                    Err(format!("routing preference '{name}' must be an empty object"))
                }
            }
            _ => Err(
                "routing preference must be 'default', 'hot_potato_routing' or a single-key object"
                    .to_string(),
            ),
        }
    }
}

impl Serialize for RoutingPreference {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.as_str(), &Map::new())?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for RoutingPreference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(de::Error::custom)
    }
}

/// Routing preference as supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingPreferenceInput {
    /// `"default"`, `"hot_potato_routing"`, `{"default": {}}` or
    /// `{"hot_potato_routing": {}}`.
    Raw(Value),
    Model(RoutingPreference),
}

impl RoutingPreferenceInput {
    /// Resolve to a typed preference.
    ///
    /// # Errors
    ///
    /// [`ScmError::InvalidObject`] for any other raw value.
    pub fn resolve(&self) -> Result<RoutingPreference> {
        match self {
            Self::Model(preference) => Ok(*preference),
            Self::Raw(value) => RoutingPreference::from_value(value).map_err(|message| {
                ScmError::InvalidObject(
                    ErrorPayload::client_side(message)
                        .with_detail("errorType", "Invalid Object")
                        .with_detail("field", "routing_preference")
                        .with_detail("received", value.clone()),
                )
            }),
        }
    }
}

impl From<RoutingPreference> for RoutingPreferenceInput {
    fn from(preference: RoutingPreference) -> Self {
        Self::Model(preference)
    }
}

impl From<Value> for RoutingPreferenceInput {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackboneRouting {
    #[default]
    NoAsymmetricRouting,
    AsymmetricRoutingOnly,
    AsymmetricRoutingWithLoadShare,
}

/// BGP routing settings as returned by the API.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgpRouting {
    #[serde(default)]
    pub routing_preference: Option<RoutingPreference>,
    #[serde(default)]
    pub backbone_routing: Option<BackboneRouting>,
    #[serde(rename = "accept_route_over_SC", default)]
    pub accept_route_over_sc: Option<bool>,
    #[serde(default)]
    pub outbound_routes_for_services: Vec<String>,
    #[serde(default)]
    pub add_host_route_to_ike_peer: Option<bool>,
    #[serde(default)]
    pub withdraw_static_route: Option<bool>,
}

/// Partial update of the BGP routing settings. At least one field must be
/// set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BgpRoutingUpdate {
    pub routing_preference: Option<RoutingPreferenceInput>,
    pub backbone_routing: Option<BackboneRouting>,
    pub accept_route_over_sc: Option<bool>,
    pub outbound_routes_for_services: Option<Vec<String>>,
    pub add_host_route_to_ike_peer: Option<bool>,
    pub withdraw_static_route: Option<bool>,
}

/// Wire form of an update.
#[serde_with::skip_serializing_none]
#[derive(Serialize)]
struct BgpRoutingBody<'a> {
    routing_preference: Option<RoutingPreference>,
    backbone_routing: Option<BackboneRouting>,
    #[serde(rename = "accept_route_over_SC")]
    accept_route_over_sc: Option<bool>,
    outbound_routes_for_services: Option<&'a [String]>,
    add_host_route_to_ike_peer: Option<bool>,
    withdraw_static_route: Option<bool>,
}

impl BgpRoutingUpdate {
    /// The settings `reset` restores.
    pub fn defaults() -> Self {
        Self {
            routing_preference: Some(RoutingPreference::Default.into()),
            backbone_routing: Some(BackboneRouting::NoAsymmetricRouting),
            accept_route_over_sc: Some(false),
            outbound_routes_for_services: Some(Vec::new()),
            add_host_route_to_ike_peer: Some(false),
            withdraw_static_route: Some(false),
        }
    }

    fn is_empty(&self) -> bool {
        self.routing_preference.is_none()
            && self.backbone_routing.is_none()
            && self.accept_route_over_sc.is_none()
            && self.outbound_routes_for_services.is_none()
            && self.add_host_route_to_ike_peer.is_none()
            && self.withdraw_static_route.is_none()
    }

    /// Validate and build the request body.
    pub fn to_body(&self) -> Result<Value> {
        if self.is_empty() {
            return Err(ScmError::InvalidObject(
                ErrorPayload::client_side("At least one BGP routing field must be set")
                    .with_detail("errorType", "Invalid Object"),
            ));
        }
        let routing_preference = self
            .routing_preference
            .as_ref()
            .map(RoutingPreferenceInput::resolve)
            .transpose()?;

        let body = BgpRoutingBody {
            routing_preference,
            backbone_routing: self.backbone_routing,
            accept_route_over_sc: self.accept_route_over_sc,
            outbound_routes_for_services: self.outbound_routes_for_services.as_deref(),
            add_host_route_to_ike_peer: self.add_host_route_to_ike_peer,
            withdraw_static_route: self.withdraw_static_route,
        };
        Ok(serde_json::to_value(body)?)
    }
}

/// Get, update and reset the BGP routing settings.
#[derive(Clone)]
pub struct BgpRoutingService {
    transport: Arc<dyn Transport>,
    logger: Logger,
}

impl std::fmt::Debug for BgpRoutingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BgpRoutingService")
            .field("endpoint", &BGP_ROUTING_ENDPOINT)
            .finish_non_exhaustive()
    }
}

impl BgpRoutingService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            logger: Logger::global(),
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Current settings.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self) -> Result<BgpRouting> {
        let response = self.transport.get(BGP_ROUTING_ENDPOINT, &[]).await?;
        parse_response(response)
    }

    /// Change the settings given in `update`.
    ///
    /// # Errors
    ///
    /// [`ScmError::InvalidObject`] when nothing is set or the routing
    /// preference is not recognised.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, update: &BgpRoutingUpdate) -> Result<BgpRouting> {
        let body = update.to_body()?;
        let response = self.transport.put(BGP_ROUTING_ENDPOINT, &body).await?;
        self.logger.emit(|| tracing::debug!("updated BGP routing settings"));
        parse_response(response)
    }

    /// Restore the default settings.
    #[tracing::instrument(skip(self))]
    pub async fn reset(&self) -> Result<BgpRouting> {
        self.update(&BgpRoutingUpdate::defaults()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preference_accepts_both_forms() {
        for value in [json!("hot_potato_routing"), json!({"hot_potato_routing": {}})] {
            let input = RoutingPreferenceInput::Raw(value);
            assert_eq!(
                input.resolve().unwrap(),
                RoutingPreference::HotPotatoRouting
            );
        }
        let model: RoutingPreferenceInput = RoutingPreference::Default.into();
        assert_eq!(model.resolve().unwrap(), RoutingPreference::Default);
    }

    #[test]
    fn test_preference_rejects_other_values() {
        for value in [
            json!("cold_potato"),
            json!({"default": {}, "hot_potato_routing": {}}),
            json!({"default": {"x": 1}}),
            json!(42),
        ] {
            let err = RoutingPreferenceInput::Raw(value).resolve().unwrap_err();
            assert!(matches!(err, ScmError::InvalidObject(_)));
        }
    }

    #[test]
    fn test_preference_wire_form() {
        assert_eq!(
            serde_json::to_value(RoutingPreference::HotPotatoRouting).unwrap(),
            json!({"hot_potato_routing": {}})
        );
    }

    #[test]
    fn test_update_requires_a_field() {
        assert!(BgpRoutingUpdate::default().to_body().is_err());

        let update = BgpRoutingUpdate {
            withdraw_static_route: Some(true),
            ..Default::default()
        };
        assert_eq!(update.to_body().unwrap(), json!({"withdraw_static_route": true}));
    }

    #[test]
    fn test_defaults_body() {
        assert_eq!(
            BgpRoutingUpdate::defaults().to_body().unwrap(),
            json!({
                "routing_preference": {"default": {}},
                "backbone_routing": "no-asymmetric-routing",
                "accept_route_over_SC": false,
                "outbound_routes_for_services": [],
                "add_host_route_to_ike_peer": false,
                "withdraw_static_route": false
            })
        );
    }

    #[test]
    fn test_response_parses() {
        let routing: BgpRouting = serde_json::from_value(json!({
            "routing_preference": {"hot_potato_routing": {}},
            "backbone_routing": "asymmetric-routing-only",
            "accept_route_over_SC": true,
            "outbound_routes_for_services": ["10.0.0.0/8"]
        }))
        .unwrap();
        assert_eq!(
            routing.routing_preference,
            Some(RoutingPreference::HotPotatoRouting)
        );
        assert_eq!(routing.accept_route_over_sc, Some(true));
    }
}
