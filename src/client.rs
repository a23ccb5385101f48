//! SCM API client.
//!
//! Low-level HTTP client that handles authentication and raw requests.
//! Resource operations are implemented by [`crate::ResourceService`] on top
//! of the [`Transport`] implementation here.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

use crate::auth::{AuthRequest, TokenManager};
use crate::error::{Result, ScmError};
use crate::error_handler::ErrorHandler;
use crate::logging::Logger;
use crate::models::{
    Address, AddressGroup, BgpRoutingService, Rulebase, SecurityRule, SecurityZone, Service, Tag,
};
use crate::service::ResourceService;
use crate::traits::Resource;
use crate::transport::Transport;

const DEFAULT_API_URL: &str = "https://api.strata.paloaltonetworks.com";
const USER_AGENT: &str = concat!("scmapi/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
enum Credentials {
    OAuth(Arc<TokenManager>),
    Bearer(String),
}

/// Low-level SCM API client.
///
/// Handles authentication and HTTP requests. It implements [`Transport`],
/// and hands out one [`ResourceService`] per resource type sharing the same
/// connection pool and session.
///
/// This struct is cheaply cloneable; clones reference the same underlying
/// connection pool and token manager.
///
/// # Example
///
/// ```no_run
/// use scmapi::{AuthRequest, ScmClient};
///
/// # async fn example() -> scmapi::Result<()> {
/// // Create from environment variables
/// let client = ScmClient::from_env().await?;
///
/// // Or configure manually
/// let auth = AuthRequest::new("client-id", "client-secret", "1234567890")?;
/// let client = ScmClient::connect(auth, "https://api.strata.paloaltonetworks.com").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ScmClient {
    http: Client,
    base_url: Arc<Url>,
    credentials: Credentials,
    logger: Logger,
}

impl std::fmt::Debug for ScmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match &self.credentials {
            Credentials::OAuth(_) => "oauth2",
            Credentials::Bearer(_) => "bearer",
        };
        f.debug_struct("ScmClient")
            .field("base_url", &self.base_url.as_str())
            .field("auth", &auth)
            .finish_non_exhaustive()
    }
}

impl ScmClient {
    /// Create a client from environment variables and authenticate.
    ///
    /// Credentials come from [`AuthRequest::from_env`]; `SCM_API_URL`
    /// optionally overrides the API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or the grant fails.
    pub async fn from_env() -> Result<Self> {
        let auth = AuthRequest::from_env()?;
        let base_url = env::var("SCM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::connect(auth, &base_url).await
    }

    /// Authenticate with client credentials and create a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the grant fails.
    pub async fn connect(auth: AuthRequest, base_url: &str) -> Result<Self> {
        let manager = TokenManager::connect(auth).await?;
        Self::with_token_manager(Arc::new(manager), base_url)
    }

    /// Create a client around an existing token manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn with_token_manager(manager: Arc<TokenManager>, base_url: &str) -> Result<Self> {
        Self::build(Credentials::OAuth(manager), base_url)
    }

    /// Create a client that sends a pre-issued access token as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn with_bearer_token(token: &str, base_url: &str) -> Result<Self> {
        Self::build(Credentials::Bearer(token.to_string()), base_url)
    }

    fn build(credentials: Credentials, base_url: &str) -> Result<Self> {
        // Ensure base URL ends with /
        let base_url_str = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        let base_url = Url::parse(&base_url_str)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(ScmError::HttpError)?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
            credentials,
            logger: Logger::global(),
        })
    }

    /// Logger handed to the services this client creates.
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The token manager, for OAuth clients.
    pub fn token_manager(&self) -> Option<&Arc<TokenManager>> {
        match &self.credentials {
            Credentials::OAuth(manager) => Some(manager),
            Credentials::Bearer(_) => None,
        }
    }

    /// A service for resource type `R` sharing this client.
    pub fn service<R: Resource>(&self) -> ResourceService<R> {
        ResourceService::new(Arc::new(self.clone())).with_logger(self.logger.clone())
    }

    pub fn addresses(&self) -> ResourceService<Address> {
        self.service()
    }

    pub fn address_groups(&self) -> ResourceService<AddressGroup> {
        self.service()
    }

    pub fn tags(&self) -> ResourceService<Tag> {
        self.service()
    }

    pub fn services(&self) -> ResourceService<Service> {
        self.service()
    }

    pub fn security_zones(&self) -> ResourceService<SecurityZone> {
        self.service()
    }

    /// Security rules of one rulebase.
    pub fn security_rules(&self, rulebase: Rulebase) -> ResourceService<SecurityRule> {
        self.service().with_scope_param("position", rulebase.as_str())
    }

    pub fn bgp_routing(&self) -> BgpRoutingService {
        BgpRoutingService::new(Arc::new(self.clone())).with_logger(self.logger.clone())
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = match &self.credentials {
            Credentials::OAuth(manager) => manager.bearer_token().await?,
            Credentials::Bearer(token) => token.clone(),
        };
        Ok(request.bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .await?
            .send()
            .await
            .map_err(ScmError::HttpError)?;

        Self::check_response(response).await
    }

    /// Check response status and convert errors.
    async fn check_response(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ErrorHandler::classify(status.as_u16(), &body);
        tracing::debug!(status = status.as_u16(), error = %error, "request failed");
        Err(error)
    }

    /// Parse a response body, treating an empty body as `null`.
    async fn read_json(response: Response) -> Result<Value> {
        let body = response.text().await.map_err(ScmError::HttpError)?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Transport for ScmClient {
    #[tracing::instrument(skip(self, params))]
    async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let url = self.base_url.join(path)?;
        let response = self.send(self.http.get(url).query(params)).await?;
        Self::read_json(response).await
    }

    #[tracing::instrument(skip(self, body))]
    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.base_url.join(path)?;
        let response = self.send(self.http.post(url).json(body)).await?;
        Self::read_json(response).await
    }

    #[tracing::instrument(skip(self, body))]
    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.base_url.join(path)?;
        let response = self.send(self.http.put(url).json(body)).await?;
        Self::read_json(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.base_url.join(path)?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_debug() {
        let client =
            ScmClient::with_bearer_token("test-token", "https://api.strata.paloaltonetworks.com")
                .unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("ScmClient"));
        assert!(debug.contains("base_url"));
        // Token should not be in debug output
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client1 = ScmClient::with_bearer_token("token", "https://api.example.com").unwrap();
        let client2 = ScmClient::with_bearer_token("token", "https://api.example.com/").unwrap();
        assert_eq!(client1.base_url().as_str(), client2.base_url().as_str());
    }

    #[test]
    fn test_relative_paths_keep_query() {
        let client = ScmClient::with_bearer_token("token", "https://api.example.com").unwrap();
        let url = client
            .base_url()
            .join("config/security/v1/security-rules?position=pre")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/config/security/v1/security-rules?position=pre"
        );
    }

    #[test]
    fn test_bearer_client_has_no_token_manager() {
        let client = ScmClient::with_bearer_token("token", "https://api.example.com").unwrap();
        assert!(client.token_manager().is_none());
    }
}
