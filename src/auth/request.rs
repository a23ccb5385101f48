//! Client-credentials bundle.

use std::env;

use url::Url;

use crate::error::{Result, ScmError};

/// Default OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URL: &str =
    "https://auth.apps.paloaltonetworks.com/am/oauth2/access_token";

/// Immutable credentials for the client-credentials grant.
///
/// # Example
///
/// ```
/// use scmapi::AuthRequest;
///
/// let auth = AuthRequest::new("my-client", "s3cret", "1234567890").unwrap();
/// assert_eq!(auth.scope(), "tsg_id:1234567890");
/// ```
#[derive(Clone)]
pub struct AuthRequest {
    client_id: String,
    client_secret: String,
    tsg_id: String,
    scope: String,
    token_url: Url,
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("client_id", &self.client_id)
            .field("tsg_id", &self.tsg_id)
            .field("scope", &self.scope)
            .field("token_url", &self.token_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AuthRequest {
    /// Create credentials for a tenant service group.
    ///
    /// The scope defaults to `tsg_id:<tsg_id>` and the token endpoint to
    /// [`DEFAULT_TOKEN_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`ScmError::ConfigMissing`] if any argument is blank.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tsg_id: impl Into<String>,
    ) -> Result<Self> {
        let client_id = required("client_id", client_id.into())?;
        let client_secret = required("client_secret", client_secret.into())?;
        let tsg_id = required("tsg_id", tsg_id.into())?;

        Ok(Self {
            scope: format!("tsg_id:{tsg_id}"),
            client_id,
            client_secret,
            tsg_id,
            token_url: Url::parse(DEFAULT_TOKEN_URL)?,
        })
    }

    /// Create credentials from environment variables.
    ///
    /// Reads `SCM_CLIENT_ID`, `SCM_CLIENT_SECRET` and `SCM_TSG_ID`, plus the
    /// optional `SCM_TOKEN_URL` and `SCM_SCOPE`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is unset or blank.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            env::var(name).map_err(|_| {
                ScmError::ConfigMissing(format!("{name} environment variable not set"))
            })
        };

        let mut auth = Self::new(
            var("SCM_CLIENT_ID")?,
            var("SCM_CLIENT_SECRET")?,
            var("SCM_TSG_ID")?,
        )?;

        if let Ok(token_url) = env::var("SCM_TOKEN_URL") {
            auth = auth.with_token_url(&token_url)?;
        }
        if let Ok(scope) = env::var("SCM_SCOPE") {
            auth = auth.with_scope(scope);
        }

        Ok(auth)
    }

    /// Use a different token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_token_url(mut self, token_url: &str) -> Result<Self> {
        self.token_url = Url::parse(token_url)?;
        Ok(self)
    }

    /// Use a different scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn tsg_id(&self) -> &str {
        &self.tsg_id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }
}

fn required(field: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        Err(ScmError::ConfigMissing(format!("{field} must not be empty")))
    } else {
        Ok(value)
    }
}
