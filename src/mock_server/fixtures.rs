//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use serde_json::{json, Value};

use super::state::{MockState, INHERITED_FOLDER};

/// Collection key for addresses.
pub const ADDRESSES: &str = "objects/addresses";
/// Collection key for address groups.
pub const ADDRESS_GROUPS: &str = "objects/address-groups";
/// Collection key for tags.
pub const TAGS: &str = "objects/tags";
/// Collection key for services.
pub const SERVICES: &str = "objects/services";
/// Collection key for zones.
pub const ZONES: &str = "network/zones";

/// Collection key for the security rules of one rulebase.
pub fn security_rules(position: &str) -> String {
    format!("security/security-rules@{position}")
}

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    // =========================================================================
    // Object Fixtures
    // =========================================================================

    pub fn tag(name: &str, folder: &str, color: &str) -> Value {
        json!({"name": name, "folder": folder, "color": color})
    }

    pub fn address(name: &str, folder: &str, ip_netmask: &str) -> Value {
        json!({"name": name, "folder": folder, "ip_netmask": ip_netmask})
    }

    pub fn fqdn_address(name: &str, folder: &str, fqdn: &str) -> Value {
        json!({"name": name, "folder": folder, "fqdn": fqdn})
    }

    pub fn static_group(name: &str, folder: &str, members: &[&str]) -> Value {
        json!({"name": name, "folder": folder, "static": members})
    }

    pub fn tcp_service(name: &str, folder: &str, port: &str) -> Value {
        json!({"name": name, "folder": folder, "protocol": {"tcp": {"port": port}}})
    }

    pub fn udp_service(name: &str, folder: &str, port: &str) -> Value {
        json!({"name": name, "folder": folder, "protocol": {"udp": {"port": port}}})
    }

    pub fn layer3_zone(name: &str, folder: &str, interfaces: &[&str]) -> Value {
        json!({"name": name, "folder": folder, "network": {"layer3": interfaces}})
    }

    pub fn rule(name: &str, folder: &str, action: &str) -> Value {
        json!({
            "name": name,
            "folder": folder,
            "from": ["any"],
            "to": ["any"],
            "source": ["any"],
            "destination": ["any"],
            "application": ["any"],
            "service": ["application-default"],
            "action": action
        })
    }

    // =========================================================================
    // Scenario Fixtures
    // =========================================================================

    /// Create a default scenario: one folder ("Texas") with a small but
    /// cross-referenced set of objects, plus one address inherited from
    /// the shared folder.
    pub fn default_scenario() -> MockState {
        let folder = "Texas";
        MockState::new()
            .with_object(TAGS, Self::tag("prod", folder, "Red"))
            .with_object(TAGS, Self::tag("dev", folder, "Blue"))
            .with_object(ADDRESSES, {
                let mut web = Self::address("web-01", folder, "10.0.0.10/32");
                web["tag"] = json!(["prod"]);
                web
            })
            .with_object(
                ADDRESSES,
                Self::fqdn_address("web-02", folder, "web-02.example.com"),
            )
            .with_object(
                ADDRESSES,
                Self::address("dns-shared", INHERITED_FOLDER, "10.0.0.53/32"),
            )
            .with_object(
                ADDRESS_GROUPS,
                Self::static_group("web-servers", folder, &["web-01", "web-02"]),
            )
            .with_object(SERVICES, Self::tcp_service("http-alt", folder, "8080"))
            .with_object(SERVICES, Self::udp_service("syslog", folder, "514"))
            .with_object(ZONES, Self::layer3_zone("trust", folder, &["ethernet1/1"]))
            .with_object(
                ZONES,
                Self::layer3_zone("untrust", folder, &["ethernet1/2"]),
            )
            .with_object(
                &security_rules("pre"),
                Self::rule("allow-web", folder, "allow"),
            )
            .with_object(
                &security_rules("pre"),
                Self::rule("deny-all", folder, "deny"),
            )
            .with_object(
                &security_rules("post"),
                Self::rule("log-all", folder, "allow"),
            )
    }

    /// `count` addresses named `host-000`, `host-001`, ... in one folder.
    pub fn many_addresses(state: MockState, folder: &str, count: usize) -> MockState {
        (0..count).fold(state, |state, i| {
            let address = Self::address(
                &format!("host-{i:03}"),
                folder,
                &format!("10.1.{}.{}/32", i / 256, i % 256),
            );
            state.with_object(ADDRESSES, address)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerQuery;

    #[test]
    fn test_default_scenario_contents() {
        let state = Fixtures::default_scenario();
        let texas = ContainerQuery::folder("Texas");

        assert_eq!(state.list(ADDRESSES, &texas).unwrap().len(), 3);
        assert_eq!(
            state.names(&security_rules("pre")),
            vec!["allow-web", "deny-all"]
        );
        assert_eq!(state.names(&security_rules("post")), vec!["log-all"]);
    }

    #[test]
    fn test_many_addresses() {
        let state = Fixtures::many_addresses(MockState::new(), "Bulk", 300);
        let listed = state.list(ADDRESSES, &ContainerQuery::folder("Bulk")).unwrap();
        assert_eq!(listed.len(), 300);
        assert_eq!(listed[299]["ip_netmask"], "10.1.1.43/32");
    }
}
