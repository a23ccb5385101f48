//! Strata Cloud Manager configuration API client library.
//!
//! A Rust library for managing SCM configuration objects over the REST
//! API. Every resource type shares one generic engine,
//! [`ResourceService`], which provides create, get, update, delete,
//! paginated list with client-side filtering, and fetch-by-name.
//!
//! # Quick Start
//!
//! ```no_run
//! use scmapi::{AddressCreate, ContainerQuery, ListOptions, ScmClient};
//!
//! #[tokio::main]
//! async fn main() -> scmapi::Result<()> {
//!     // Authenticate from environment variables
//!     let client = ScmClient::from_env().await?;
//!
//!     // Create an address in a folder
//!     let address = client
//!         .addresses()
//!         .create(AddressCreate::ip_netmask("web-01", "10.0.0.10/32").in_folder("Texas"))
//!         .await?;
//!     println!("Created {}", address.id);
//!
//!     // List every address in the folder, all pages
//!     let all = client.addresses().list(&ListOptions::folder("Texas")).await?;
//!     println!("Found {} addresses", all.len());
//!
//!     // Look one up by name
//!     let found = client
//!         .addresses()
//!         .fetch("web-01", &ContainerQuery::folder("Texas"))
//!         .await?;
//!     println!("{:?}", found.address_type());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`TokenManager`] performs the OAuth2 client-credentials grant,
//!   validates tokens against the published signing keys and refreshes.
//! - [`ScmClient`] is the HTTP [`Transport`]: it attaches the bearer
//!   token and turns error responses into [`ScmError`] via
//!   [`ErrorHandler`].
//! - [`Resource`] describes one resource type (endpoint, models,
//!   filters); [`ResourceService`] implements the operations once for all
//!   of them.
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `SCM_CLIENT_ID`, `SCM_CLIENT_SECRET`, `SCM_TSG_ID` (required)
//! - `SCM_TOKEN_URL` (optional) - token endpoint
//! - `SCM_SCOPE` (optional) - defaults to `tsg_id:<SCM_TSG_ID>`
//! - `SCM_API_URL` (optional) - defaults to `https://api.strata.paloaltonetworks.com`

mod auth;
mod client;
mod container;
mod error;
mod error_handler;
mod logging;
mod models;
mod pagination;
mod payload;
mod service;
mod traits;
mod transport;

pub mod cli;
mod output;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use auth::{
    AccessTokenClaims, AuthRequest, SessionState, SigningKey, Token, TokenManager, TokenResponse,
    DEFAULT_TOKEN_URL, JWKS_PATH, TOKEN_EXPIRY_BUFFER_SECS,
};
pub use client::ScmClient;
pub use container::{Container, ContainerFields, ContainerKind, ContainerQuery};
pub use error::{BoxError, ErrorPayload, Result, ScmError};
pub use error_handler::{ErrorHandler, VendorError, VendorErrorResponse};
pub use logging::Logger;
pub use output::PrettyPrint;
pub use pagination::{
    validate_max_limit, ListShape, Page, PaginationParams, ABSOLUTE_MAX_LIMIT, DEFAULT_MAX_LIMIT,
    MAX_PAGES,
};
pub use payload::Payload;
pub use service::{ListOptions, ResourceService};
pub use transport::Transport;

// Re-export traits
pub use traits::{CreateModel, Resource, ResponseModel, UpdateModel};

// Re-export models
pub use models::{
    // Addresses
    Address,
    AddressCreate,
    AddressFilters,
    AddressGroup,
    AddressGroupCreate,
    AddressGroupFilters,
    AddressGroupResponse,
    AddressGroupUpdate,
    AddressResponse,
    AddressType,
    AddressUpdate,
    DynamicFilter,
    // BGP routing
    BackboneRouting,
    BgpRouting,
    BgpRoutingService,
    BgpRoutingUpdate,
    RoutingPreference,
    RoutingPreferenceInput,
    BGP_ROUTING_ENDPOINT,
    // Security rules
    MoveDestination,
    ProfileSetting,
    RuleAction,
    RuleMoveRequest,
    Rulebase,
    SecurityRule,
    SecurityRuleCreate,
    SecurityRuleFilters,
    SecurityRuleResponse,
    SecurityRuleUpdate,
    // Zones
    SecurityZone,
    SecurityZoneCreate,
    SecurityZoneFilters,
    SecurityZoneResponse,
    SecurityZoneUpdate,
    ZoneAcl,
    ZoneNetwork,
    // Services
    Override,
    PortSpec,
    Protocol,
    Service,
    ServiceCreate,
    ServiceFilters,
    ServiceResponse,
    ServiceUpdate,
    // Tags
    Tag,
    TagCreate,
    TagFilters,
    TagResponse,
    TagUpdate,
};
