//! CLI output formatting tests.
//!
//! JSON output is the serialized response model; the default output is
//! [`PrettyPrint`].

use scmapi::{
    AddressGroupResponse, PrettyPrint, SecurityRuleResponse, SecurityZoneResponse,
    ServiceResponse, TagResponse,
};
use serde_json::json;

const ID: &str = "123e4567-e89b-12d3-a456-426655440000";

fn make_rule() -> SecurityRuleResponse {
    serde_json::from_value(json!({
        "id": ID,
        "name": "allow-web",
        "folder": "Texas",
        "from": ["trust"],
        "to": ["untrust"],
        "source": ["any"],
        "destination": ["web-servers"],
        "application": ["web-browsing"],
        "service": ["application-default"],
        "action": "allow"
    }))
    .unwrap()
}

// ============================================================================
// JSON Output Tests
// ============================================================================

#[test]
fn test_json_output_keeps_wire_names() {
    let rule = make_rule();
    let parsed = serde_json::to_value(&rule).unwrap();

    assert_eq!(parsed["from"], json!(["trust"]));
    assert_eq!(parsed["to"], json!(["untrust"]));
    assert_eq!(parsed["action"], "allow");
    assert!(parsed.get("from_zones").is_none());
}

#[test]
fn test_json_output_omits_unset_fields() {
    let tag: TagResponse =
        serde_json::from_value(json!({"id": ID, "name": "prod", "folder": "Texas"})).unwrap();
    let parsed = serde_json::to_value(&tag).unwrap();

    assert!(parsed.get("color").is_none());
    assert!(parsed.get("snippet").is_none());
}

#[test]
fn test_json_list_outputs_array() {
    let rules = vec![make_rule(), make_rule()];
    let parsed = serde_json::to_value(&rules).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}

// ============================================================================
// Pretty Print Tests
// ============================================================================

#[test]
fn test_rule_pretty_print() {
    let output = make_rule().pretty_print();

    assert!(output.starts_with("Security Rule: allow-web"));
    assert!(output.contains(ID));
    assert!(output.contains("Folder:"));
    assert!(output.contains("From:           trust"));
    assert!(output.contains("Application:    web-browsing"));
    assert!(!output.contains("disabled"));
}

#[test]
fn test_tag_pretty_print() {
    let tag: TagResponse = serde_json::from_value(json!({
        "id": ID,
        "name": "prod",
        "snippet": "shared",
        "color": "Red"
    }))
    .unwrap();

    let output = tag.pretty_print();
    assert!(output.starts_with("Tag: prod"));
    assert!(output.contains("Snippet:"));
    assert!(output.contains("Color:          Red"));
}

#[test]
fn test_group_pretty_print() {
    let group: AddressGroupResponse = serde_json::from_value(json!({
        "id": ID,
        "name": "web-servers",
        "folder": "Texas",
        "static": ["web-01", "web-02"]
    }))
    .unwrap();

    let output = group.pretty_print();
    assert!(output.contains("Type:           static"));
    assert!(output.contains("Members:        web-01, web-02"));
}

#[test]
fn test_service_pretty_print() {
    let service: ServiceResponse = serde_json::from_value(json!({
        "id": ID,
        "name": "http-alt",
        "device": "fw-01",
        "protocol": {"tcp": {"port": "8080"}}
    }))
    .unwrap();

    let output = service.pretty_print();
    assert!(output.contains("Device:"));
    assert!(output.contains("Protocol:       tcp/8080"));
}

#[test]
fn test_zone_pretty_print() {
    let zone: SecurityZoneResponse = serde_json::from_value(json!({
        "id": ID,
        "name": "trust",
        "folder": "Texas",
        "network": {"layer3": ["ethernet1/1"]},
        "enable_user_identification": true
    }))
    .unwrap();

    let output = zone.pretty_print();
    assert!(output.contains("Mode:           layer3"));
    assert!(output.contains("User-ID:        enabled"));
}

#[test]
fn test_pretty_print_not_json() {
    let output = make_rule().pretty_print();
    assert!(serde_json::from_str::<serde_json::Value>(&output).is_err());
}
