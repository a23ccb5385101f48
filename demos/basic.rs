//! Basic example demonstrating the SCM API client.
//!
//! Run with:
//! ```
//! SCM_CLIENT_ID=... SCM_CLIENT_SECRET=... SCM_TSG_ID=... \
//!     SCM_FOLDER=Texas cargo run --example basic
//! ```

use scmapi::{
    AddressFilters, ContainerQuery, ListOptions, Rulebase, ScmClient, ScmError, TagCreate,
};

#[tokio::main]
async fn main() -> scmapi::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    let folder = std::env::var("SCM_FOLDER").unwrap_or_else(|_| "Texas".to_string());

    // Authenticate from environment variables
    println!("Creating SCM client...");
    let client = ScmClient::from_env().await?;
    println!("Connected to: {}", client.base_url());

    if let Some(manager) = client.token_manager() {
        println!("Session state: {:?}", manager.state().await);
    }

    // List every address in the folder
    println!("\n--- Addresses in {folder} ---");
    let addresses = client.addresses().list(&ListOptions::folder(&folder)).await?;
    println!("Found {} addresses", addresses.len());
    for address in addresses.iter().take(10) {
        let value = address
            .address_type()
            .map(|(kind, value)| format!("{}={}", kind.field(), value))
            .unwrap_or_default();
        println!(
            "  - {} {} [{}]",
            address.name,
            value,
            address.folder.as_deref().unwrap_or("-")
        );
    }

    // Only FQDN addresses defined directly in the folder
    let fqdns = client
        .addresses()
        .list(
            &ListOptions::folder(&folder)
                .exact_match()
                .with_filters(AddressFilters {
                    types: Some(vec!["fqdn".to_string()]),
                    ..Default::default()
                }),
        )
        .await?;
    println!(
        "{} of them are FQDN addresses defined in {folder}",
        fqdns.len()
    );

    // Pre-rulebase security rules, in order
    println!("\n--- Pre Rules ---");
    let rules = client
        .security_rules(Rulebase::Pre)
        .list(&ListOptions::folder(&folder))
        .await?;
    for (i, rule) in rules.iter().enumerate() {
        println!("  {}. {} ({:?})", i + 1, rule.name, rule.action);
    }

    // Create a tag unless it already exists
    println!("\n--- Tag ---");
    let tags = client.tags();
    let tag = match tags.fetch("scmapi-demo", &ContainerQuery::folder(&folder)).await {
        Ok(tag) => tag,
        Err(ScmError::NotFound(_)) => {
            tags.create(TagCreate::new("scmapi-demo").with_color("Azure Blue").in_folder(&folder))
                .await?
        }
        Err(e) => return Err(e),
    };
    println!("Tag {} ({})", tag.name, tag.id);

    // BGP routing settings
    let bgp = client.bgp_routing().get().await?;
    println!("\nBGP routing preference: {:?}", bgp.routing_preference);

    println!("\nDone!");
    Ok(())
}
