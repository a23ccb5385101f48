//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use crate::models::{
    AddressGroupResponse, AddressResponse, SecurityRuleResponse, SecurityZoneResponse,
    ServiceResponse, TagResponse,
};
use crate::traits::ResponseModel;

/// Trait for human-readable key-value output.
///
/// Implemented by response types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

fn header<T: ResponseModel>(kind: &str, item: &T) -> Vec<String> {
    let title = format!("{}: {}", kind, item.name());
    let divider = "─".repeat(title.chars().count().max(30));
    let mut lines = vec![title, divider, format!("ID:             {}", item.id())];
    if let Some((kind, name)) = item.container().first() {
        lines.push(format!("{:<16}{}", format!("{}:", capitalize(kind.field())), name));
    }
    lines
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn push_list(lines: &mut Vec<String>, label: &str, values: &[String]) {
    if !values.is_empty() {
        lines.push(format!("{:<16}{}", format!("{label}:"), values.join(", ")));
    }
}

impl PrettyPrint for AddressResponse {
    fn pretty_print(&self) -> String {
        let mut lines = header("Address", self);

        if let Some((kind, value)) = self.address_type() {
            lines.push(format!("Type:           {}", kind.field()));
            lines.push(format!("Value:          {}", value));
        }

        if let Some(ref description) = self.description {
            lines.push(format!("Description:    {}", description));
        }

        push_list(&mut lines, "Tags", self.tag.as_deref().unwrap_or_default());

        lines.join("\n")
    }
}

impl PrettyPrint for AddressGroupResponse {
    fn pretty_print(&self) -> String {
        let mut lines = header("Address Group", self);
        lines.push(format!("Type:           {}", self.group_type()));

        if let Some(ref members) = self.static_members {
            push_list(&mut lines, "Members", members);
        }

        if let Some(ref dynamic) = self.dynamic {
            lines.push(format!("Filter:         {}", dynamic.filter));
        }

        push_list(&mut lines, "Tags", self.tag.as_deref().unwrap_or_default());

        lines.join("\n")
    }
}

impl PrettyPrint for TagResponse {
    fn pretty_print(&self) -> String {
        let mut lines = header("Tag", self);

        if let Some(ref color) = self.color {
            lines.push(format!("Color:          {}", color));
        }

        if let Some(ref comments) = self.comments {
            lines.push(format!("Comments:       {}", comments));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for ServiceResponse {
    fn pretty_print(&self) -> String {
        let mut lines = header("Service", self);

        if let (Some(protocol), Some(port)) = (self.protocol.name(), self.protocol.port()) {
            lines.push(format!("Protocol:       {}/{}", protocol, port));
        }

        if let Some(ref description) = self.description {
            lines.push(format!("Description:    {}", description));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for SecurityZoneResponse {
    fn pretty_print(&self) -> String {
        let mut lines = header("Zone", self);

        if let Some(mode) = self.network.as_ref().and_then(|n| n.mode()) {
            lines.push(format!("Mode:           {}", mode));
        }

        if self.enable_user_identification == Some(true) {
            lines.push("User-ID:        enabled".to_string());
        }

        lines.join("\n")
    }
}

impl PrettyPrint for SecurityRuleResponse {
    fn pretty_print(&self) -> String {
        let mut lines = header("Security Rule", self);

        if let Some(action) = self.action {
            lines.push(format!("Action:         {:?}", action));
        }
        if self.disabled {
            lines.push("State:          disabled".to_string());
        }

        push_list(&mut lines, "From", &self.from_zones);
        push_list(&mut lines, "To", &self.to_zones);
        push_list(&mut lines, "Source", &self.source);
        push_list(&mut lines, "Destination", &self.destination);
        push_list(&mut lines, "Application", &self.application);
        push_list(&mut lines, "Service", &self.service);

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_pretty_print_format() {
        let address: AddressResponse = serde_json::from_value(serde_json::json!({
            "id": "123e4567-e89b-12d3-a456-426655440000",
            "name": "web-01",
            "ip_netmask": "10.0.0.10/32",
            "folder": "Texas"
        }))
        .unwrap();

        let output = address.pretty_print();
        assert!(output.starts_with("Address: web-01"));
        assert!(output.contains("Folder:"));
        assert!(output.contains("ip_netmask"));
        assert!(output.contains("10.0.0.10/32"));
    }
}
