//! E2E tests using the mock SCM server.
//!
//! These tests exercise full workflows against the mock server, including
//! the OAuth2 grant, rather than individual endpoints.

#![cfg(feature = "test-server")]

use scmapi::mock_server::{Fixtures, MockServer, MockState, ADDRESSES};
use scmapi::{
    AddressCreate, AddressGroupCreate, AuthRequest, BackboneRouting, BgpRoutingUpdate,
    ContainerQuery, ListOptions, RoutingPreference, RuleAction, RuleMoveRequest, Rulebase,
    ScmClient, ScmError, SecurityRuleCreate, SessionState, TagCreate, TagUpdate,
};

async fn connect(server: &MockServer) -> ScmClient {
    let auth = AuthRequest::new("mock-client", "mock-secret", "1234567890")
        .unwrap()
        .with_token_url(&server.token_url())
        .unwrap();
    ScmClient::connect(auth, server.url())
        .await
        .expect("Failed to authenticate against the mock server")
}

// =============================================================================
// Server Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_server_starts_on_random_port() {
    let server1 = MockServer::start().await;
    let server2 = MockServer::start().await;

    assert_ne!(server1.url(), server2.url());

    server1.shutdown().await;
    server2.shutdown().await;
}

#[tokio::test]
async fn test_server_shutdown_is_clean() {
    let server = MockServer::start().await;
    let url = server.url().to_string();

    server.shutdown().await;

    let client = reqwest::Client::new();
    let result = client.get(format!("{}/health", url)).send().await;

    assert!(result.is_err());
}

// =============================================================================
// Authentication Tests
// =============================================================================

#[tokio::test]
async fn test_connect_obtains_verifiable_token() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let manager = client.token_manager().unwrap();
    assert_eq!(manager.state().await, SessionState::Valid);
    assert!(!manager.is_expired().await.unwrap());
    assert_eq!(server.state().read().await.tokens_issued, 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let server = MockServer::start().await;
    let auth = AuthRequest::new("mock-client", "wrong", "1234567890")
        .unwrap()
        .with_token_url(&server.token_url())
        .unwrap();

    let result = ScmClient::connect(auth, server.url()).await;
    assert!(result.is_err());
    assert_eq!(server.state().read().await.tokens_issued, 0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_requests_without_token_are_unauthenticated() {
    let server = MockServer::start().await;
    let client = ScmClient::with_bearer_token("forged", server.url()).unwrap();

    let err = client
        .tags()
        .list(&ListOptions::folder("Texas"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScmError::Authentication(_)));

    server.shutdown().await;
}

// =============================================================================
// Object Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_tag_crud_workflow() {
    let server = MockServer::start_empty().await;
    let client = connect(&server).await;
    let tags = client.tags();

    // Step 1: Create
    let created = tags
        .create(TagCreate::new("staging").with_color("Azure Blue").in_folder("Texas"))
        .await
        .expect("Failed to create tag");
    assert_eq!(created.color.as_deref(), Some("Azure Blue"));

    // Step 2: Get by id and fetch by name
    let fetched = tags.get(created.id).await.unwrap();
    assert_eq!(fetched, created);
    let by_name = tags
        .fetch("staging", &ContainerQuery::folder("Texas"))
        .await
        .unwrap();
    assert_eq!(by_name.id, created.id);

    // Step 3: Update
    let updated = tags
        .update(TagUpdate {
            id: created.id,
            name: None,
            color: Some("Red".to_string()),
            comments: Some("pre-production".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(updated.color.as_deref(), Some("Red"));
    assert_eq!(updated.name, "staging");

    // Step 4: Delete
    tags.delete(created.id).await.unwrap();
    let err = tags.get(created.id).await.unwrap_err();
    assert!(err.is_not_found());

    server.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_name_is_name_not_unique() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let err = client
        .tags()
        .create(TagCreate::new("prod").in_folder("Texas"))
        .await
        .unwrap_err();

    assert!(matches!(err, ScmError::NameNotUnique(_)));
    assert_eq!(err.error_code(), Some("E006"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_referenced_object_cannot_be_deleted() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    let addresses = client.addresses();

    let member = addresses
        .fetch("web-02", &ContainerQuery::folder("Texas"))
        .await
        .unwrap();

    let err = addresses.delete(member.id).await.unwrap_err();
    assert!(matches!(err, ScmError::ReferenceNotZero(_)));
    assert_eq!(err.http_status(), Some(409));

    // Once the group is gone the address can go too.
    let group = client
        .address_groups()
        .fetch("web-servers", &ContainerQuery::folder("Texas"))
        .await
        .unwrap();
    client.address_groups().delete(group.id).await.unwrap();
    addresses.delete(member.id).await.unwrap();

    server.shutdown().await;
}

#[tokio::test]
async fn test_group_of_created_addresses() {
    let server = MockServer::start_empty().await;
    let client = connect(&server).await;

    for (name, value) in [("app-01", "10.2.0.1/32"), ("app-02", "10.2.0.2/32")] {
        client
            .addresses()
            .create(AddressCreate::ip_netmask(name, value).in_snippet("apps"))
            .await
            .unwrap();
    }
    let group = client
        .address_groups()
        .create(AddressGroupCreate::static_group("apps", ["app-01", "app-02"]).in_snippet("apps"))
        .await
        .unwrap();

    assert_eq!(group.group_type(), "static");
    assert_eq!(
        group.static_members.as_deref(),
        Some(&["app-01".to_string(), "app-02".to_string()][..])
    );

    server.shutdown().await;
}

// =============================================================================
// Listing Tests
// =============================================================================

#[tokio::test]
async fn test_list_includes_inherited_unless_exact_match() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    let addresses = client.addresses();

    let all = addresses.list(&ListOptions::folder("Texas")).await.unwrap();
    assert_eq!(all.len(), 3);

    let exact = addresses
        .list(&ListOptions::folder("Texas").exact_match())
        .await
        .unwrap();
    let names: Vec<&str> = exact.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["web-01", "web-02"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_list_collects_every_page() {
    let state = Fixtures::many_addresses(MockState::new(), "Bulk", 25);
    let server = MockServer::with_state(state).await;
    let client = connect(&server).await;

    let addresses = client.addresses().with_max_limit(Some(10)).unwrap();
    let listed = addresses.list(&ListOptions::folder("Bulk")).await.unwrap();

    assert_eq!(listed.len(), 25);
    assert_eq!(listed[24].name, "host-024");
    // Pages of 10, 10 and 5.
    assert_eq!(server.state().read().await.list_requests, 3);

    server.shutdown().await;
}

#[tokio::test]
async fn test_list_exact_multiple_of_page_size() {
    let state = Fixtures::many_addresses(MockState::new(), "Bulk", 20);
    let server = MockServer::with_state(state).await;
    let client = connect(&server).await;

    let addresses = client.addresses().with_max_limit(Some(10)).unwrap();
    let listed = addresses.list(&ListOptions::folder("Bulk")).await.unwrap();

    assert_eq!(listed.len(), 20);
    // Two full pages plus the empty page that ends the listing.
    assert_eq!(server.state().read().await.list_requests, 3);
    assert_eq!(server.state().read().await.names(ADDRESSES).len(), 20);

    server.shutdown().await;
}

#[tokio::test]
async fn test_fetch_missing_name_is_not_found() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let err = client
        .services()
        .fetch("no-such-service", &ContainerQuery::folder("Texas"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    server.shutdown().await;
}

// =============================================================================
// Security Rule Tests
// =============================================================================

#[tokio::test]
async fn test_rulebases_are_separate() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let pre = client
        .security_rules(Rulebase::Pre)
        .list(&ListOptions::folder("Texas"))
        .await
        .unwrap();
    let post = client
        .security_rules(Rulebase::Post)
        .list(&ListOptions::folder("Texas"))
        .await
        .unwrap();

    assert_eq!(pre.len(), 2);
    assert_eq!(post.len(), 1);
    assert_eq!(post[0].name, "log-all");

    server.shutdown().await;
}

#[tokio::test]
async fn test_create_and_move_rule() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    let rules = client.security_rules(Rulebase::Pre);

    let created = rules
        .create(
            SecurityRuleCreate::new("allow-dns", RuleAction::Allow)
                .with_from_zones(["trust"])
                .with_to_zones(["untrust"])
                .with_applications(["dns"])
                .in_folder("Texas"),
        )
        .await
        .unwrap();
    assert_eq!(created.from_zones, vec!["trust"]);

    let names = |rules: Vec<scmapi::SecurityRuleResponse>| -> Vec<String> {
        rules.into_iter().map(|r| r.name).collect()
    };

    let before = names(rules.list(&ListOptions::folder("Texas")).await.unwrap());
    assert_eq!(before, vec!["allow-web", "deny-all", "allow-dns"]);

    rules
        .move_rule(created.id, &RuleMoveRequest::top(Rulebase::Pre))
        .await
        .unwrap();
    let after = names(rules.list(&ListOptions::folder("Texas")).await.unwrap());
    assert_eq!(after, vec!["allow-dns", "allow-web", "deny-all"]);

    let deny = rules
        .fetch("deny-all", &ContainerQuery::folder("Texas"))
        .await
        .unwrap();
    rules
        .move_rule(created.id, &RuleMoveRequest::after(deny.id, Rulebase::Pre))
        .await
        .unwrap();
    let last = names(rules.list(&ListOptions::folder("Texas")).await.unwrap());
    assert_eq!(last, vec!["allow-web", "deny-all", "allow-dns"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_move_onto_itself_is_rejected_locally() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    let rules = client.security_rules(Rulebase::Pre);

    let rule = rules
        .fetch("allow-web", &ContainerQuery::folder("Texas"))
        .await
        .unwrap();
    let err = rules
        .move_rule(rule.id, &RuleMoveRequest::before(rule.id, Rulebase::Pre))
        .await
        .unwrap_err();
    assert!(matches!(err, ScmError::InvalidObject(_)));

    server.shutdown().await;
}

// =============================================================================
// BGP Routing Tests
// =============================================================================

#[tokio::test]
async fn test_bgp_routing_update_and_reset() {
    let server = MockServer::start().await;
    let client = connect(&server).await;
    let bgp = client.bgp_routing();

    let current = bgp.get().await.unwrap();
    assert_eq!(current.routing_preference, Some(RoutingPreference::Default));

    let updated = bgp
        .update(&BgpRoutingUpdate {
            routing_preference: Some(RoutingPreference::HotPotatoRouting.into()),
            backbone_routing: Some(BackboneRouting::AsymmetricRoutingOnly),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(
        updated.routing_preference,
        Some(RoutingPreference::HotPotatoRouting)
    );
    assert_eq!(
        updated.backbone_routing,
        Some(BackboneRouting::AsymmetricRoutingOnly)
    );

    let reset = bgp.reset().await.unwrap();
    assert_eq!(reset.routing_preference, Some(RoutingPreference::Default));
    assert_eq!(
        reset.backbone_routing,
        Some(BackboneRouting::NoAsymmetricRouting)
    );

    server.shutdown().await;
}

#[tokio::test]
async fn test_empty_bgp_update_is_rejected_locally() {
    let server = MockServer::start().await;
    let client = connect(&server).await;

    let err = client
        .bgp_routing()
        .update(&BgpRoutingUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ScmError::InvalidObject(_)));

    server.shutdown().await;
}
