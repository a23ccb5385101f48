//! OAuth2 session lifecycle.

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use super::request::AuthRequest;
use super::token::{AccessTokenClaims, Token, TokenResponse};
use crate::error::{ErrorPayload, Result, ScmError};
use crate::error_handler::ErrorHandler;

/// Path segments that replace the token endpoint's last segment to form the
/// key-verification endpoint.
pub const JWKS_PATH: [&str; 2] = ["connect", "jwk_uri"];

/// Remaining lifetime under which a token counts as expiring soon.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 300;

const USER_AGENT: &str = concat!("scmapi/", env!("CARGO_PKG_VERSION"));

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No grant attempted yet.
    Unauthenticated,
    /// Token present with more than the safety buffer left.
    Valid,
    /// Token present but within the safety buffer.
    ExpiringSoon,
    /// Token lifetime exhausted.
    Expired,
    /// The last grant failed; only an explicit refresh leaves this state.
    AuthenticationFailed,
}

/// Key used to verify the access token's signature.
///
/// Carries the algorithms the published key admits; the token header's
/// `alg` must be one of them.
#[derive(Clone)]
pub struct SigningKey {
    kid: Option<String>,
    algorithms: Vec<Algorithm>,
    key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithms", &self.algorithms)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }
}

/// Algorithms a published key may verify: its declared `alg`, otherwise
/// every signing algorithm of its key type.
fn allowed_algorithms(jwk: &Jwk) -> Vec<Algorithm> {
    let declared = jwk
        .common
        .key_algorithm
        .as_ref()
        .and_then(|alg| serde_json::to_value(alg).ok())
        .and_then(|alg| serde_json::from_value::<Algorithm>(alg).ok());
    if let Some(alg) = declared {
        return vec![alg];
    }

    match &jwk.algorithm {
        AlgorithmParameters::OctetKey(_) => {
            vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512]
        }
        AlgorithmParameters::RSA(_) => vec![
            Algorithm::RS256,
            Algorithm::RS384,
            Algorithm::RS512,
            Algorithm::PS256,
            Algorithm::PS384,
            Algorithm::PS512,
        ],
        AlgorithmParameters::EllipticCurve(_) => vec![Algorithm::ES256, Algorithm::ES384],
        AlgorithmParameters::OctetKeyPair(_) => vec![Algorithm::EdDSA],
    }
}

#[derive(Default)]
struct Session {
    token: Option<Token>,
    signing_key: Option<SigningKey>,
    failed: bool,
}

/// Owns one client-credentials session.
///
/// Reads take a shared lock; refreshes are serialized so concurrent callers
/// never race a grant.
///
/// # Example
///
/// ```no_run
/// use scmapi::{AuthRequest, TokenManager};
///
/// # async fn example() -> scmapi::Result<()> {
/// let manager = TokenManager::connect(AuthRequest::from_env()?).await?;
/// if manager.token_expires_soon().await {
///     manager.refresh_token().await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct TokenManager {
    http: Client,
    auth: AuthRequest,
    expiry_buffer: Duration,
    session: RwLock<Session>,
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("auth", &self.auth)
            .field("expiry_buffer", &self.expiry_buffer)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a manager without contacting the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(auth: AuthRequest) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(StdDuration::from_secs(60))
            .build()
            .map_err(ScmError::HttpError)?;

        Ok(Self {
            http,
            auth,
            expiry_buffer: Duration::seconds(TOKEN_EXPIRY_BUFFER_SECS),
            session: RwLock::new(Session::default()),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Create a manager and authenticate: performs the grant and retrieves
    /// the signing key.
    ///
    /// # Errors
    ///
    /// Returns the grant or key retrieval failure.
    pub async fn connect(auth: AuthRequest) -> Result<Self> {
        let manager = Self::new(auth)?;
        manager.create_session().await?;
        manager.get_signing_key().await?;
        Ok(manager)
    }

    /// Use a different safety buffer for [`Self::token_expires_soon`].
    #[must_use]
    pub fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.expiry_buffer = buffer;
        self
    }

    pub fn auth_request(&self) -> &AuthRequest {
        &self.auth
    }

    /// Perform the client-credentials grant and store the new token.
    ///
    /// A vendor error body is classified by [`ErrorHandler`]; any other
    /// failure becomes [`ScmError::Session`] with the cause attached.
    #[tracing::instrument(skip(self), fields(client_id = %self.auth.client_id()))]
    pub async fn create_session(&self) -> Result<Token> {
        match self.request_token().await {
            Ok(token) => {
                let mut session = self.session.write().await;
                session.token = Some(token.clone());
                // The new token may be signed by a different key.
                session.signing_key = None;
                session.failed = false;
                tracing::info!(expires_at = %token.expires_at(), "obtained access token");
                Ok(token)
            }
            Err(e) => {
                self.session.write().await.failed = true;
                tracing::error!(error = %e, "client-credentials grant failed");
                Err(e)
            }
        }
    }

    async fn request_token(&self) -> Result<Token> {
        let form = [
            ("grant_type", "client_credentials"),
            ("scope", self.auth.scope()),
            ("client_id", self.auth.client_id()),
        ];

        let response = self
            .http
            .post(self.auth.token_url().clone())
            .basic_auth(self.auth.client_id(), Some(self.auth.client_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|e| ScmError::session("Failed to reach the token endpoint", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Some(parsed) = ErrorHandler::parse_vendor_error(&body) {
                if let Some(error) = parsed.errors.into_iter().next() {
                    return Err(ErrorHandler::from_vendor_error(status.as_u16(), error));
                }
            }
            return Err(ScmError::session(
                format!("Token request failed with HTTP {status}"),
                format!("HTTP {status}: {body}"),
            ));
        }

        let issued_at = Utc::now();
        let grant: TokenResponse = response
            .json()
            .await
            .map_err(|e| ScmError::session("Invalid token endpoint response", e))?;

        Ok(Token::from_response(grant, issued_at))
    }

    /// The key-verification endpoint derived from the token endpoint.
    pub fn jwks_url(&self) -> Result<Url> {
        let mut url = self.auth.token_url().clone();
        url.path_segments_mut()
            .map_err(|()| {
                ScmError::ConfigMissing(format!(
                    "token URL '{}' cannot carry a path",
                    self.auth.token_url()
                ))
            })?
            .pop_if_empty()
            .pop()
            .extend(JWKS_PATH);
        url.set_query(None);
        Ok(url)
    }

    /// Retrieve the key matching the current token's key id and cache it.
    ///
    /// # Errors
    ///
    /// [`ScmError::TokenUnavailable`] without a token, [`ScmError::Session`]
    /// when the key set cannot be retrieved or holds no matching key.
    #[tracing::instrument(skip(self))]
    pub async fn get_signing_key(&self) -> Result<SigningKey> {
        let access_token = self.access_token().await?;
        let jwks_url = self.jwks_url()?;

        let header = decode_header(&access_token)
            .map_err(|e| ScmError::session("Access token header is malformed", e))?;

        tracing::debug!(url = %jwks_url, kid = ?header.kid, "fetching signing key");

        let response = self
            .http
            .get(jwks_url.clone())
            .send()
            .await
            .map_err(|e| ScmError::session("Failed to reach the key endpoint", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScmError::session(
                format!("Key endpoint returned HTTP {status}"),
                format!("GET {jwks_url}: HTTP {status}"),
            ));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| ScmError::session("Invalid key set response", e))?;

        let jwk = match header.kid.as_deref() {
            Some(kid) => jwks.find(kid),
            None if jwks.keys.len() == 1 => jwks.keys.first(),
            None => None,
        }
        .ok_or_else(|| {
            ScmError::session(
                "No signing key matches the access token",
                format!(
                    "kid {:?} not in key set of {} keys",
                    header.kid,
                    jwks.keys.len()
                ),
            )
        })?;

        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| ScmError::session("Signing key could not be decoded", e))?;

        let signing_key = SigningKey {
            kid: header.kid,
            algorithms: allowed_algorithms(jwk),
            key,
        };
        self.session.write().await.signing_key = Some(signing_key.clone());
        Ok(signing_key)
    }

    /// Whether the current token has expired, judged by validating it.
    ///
    /// Returns `true` only for an expiry failure; any other validation
    /// failure is [`ScmError::TokenValidation`].
    pub async fn is_expired(&self) -> Result<bool> {
        let (token, cached_key) = {
            let session = self.session.read().await;
            (session.token.clone(), session.signing_key.clone())
        };
        let token = token.ok_or_else(|| {
            ScmError::TokenUnavailable("no session has been created".to_string())
        })?;
        let header = decode_header(token.secret())?;
        let signing_key = match cached_key {
            Some(key) if key.kid == header.kid => key,
            _ => self.get_signing_key().await?,
        };

        let mut validation = Validation::default();
        validation.algorithms = signing_key.algorithms.clone();
        validation.set_audience(&[self.auth.client_id()]);
        validation.leeway = 0;

        match decode::<AccessTokenClaims>(token.secret(), &signing_key.key, &validation) {
            Ok(_) => Ok(false),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Ok(true),
            Err(e) => Err(ScmError::TokenValidation(e)),
        }
    }

    /// Whether a refresh is due: no token yet, or less than the safety
    /// buffer left.
    pub async fn token_expires_soon(&self) -> bool {
        match &self.session.read().await.token {
            None => true,
            Some(token) => token.remaining() < self.expiry_buffer,
        }
    }

    /// Repeat the grant and re-derive the signing key.
    pub async fn refresh_token(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<()> {
        tracing::debug!("refreshing access token");
        self.create_session().await?;
        self.get_signing_key().await?;
        Ok(())
    }

    /// The current bearer credential.
    pub async fn access_token(&self) -> Result<String> {
        self.session
            .read()
            .await
            .token
            .as_ref()
            .map(|t| t.secret().to_string())
            .ok_or_else(|| ScmError::TokenUnavailable("no session has been created".to_string()))
    }

    /// A bearer credential that is not about to expire, refreshing first
    /// when needed.
    ///
    /// After a failed grant this does not retry; it returns
    /// [`ScmError::Authentication`] until [`Self::refresh_token`] succeeds.
    pub async fn bearer_token(&self) -> Result<String> {
        if self.token_expires_soon().await {
            let _guard = self.refresh_lock.lock().await;
            // Another task may have refreshed while we waited.
            if self.token_expires_soon().await {
                if self.session.read().await.failed {
                    return Err(ScmError::Authentication(
                        ErrorPayload::new(
                            "A previous token request failed; call refresh_token() to retry",
                            "E016",
                            401,
                        )
                        .with_detail("errorType", "Not Authenticated"),
                    ));
                }
                self.refresh_locked().await?;
            }
        }
        self.access_token().await
    }

    /// Current position in the session lifecycle.
    pub async fn state(&self) -> SessionState {
        let session = self.session.read().await;
        if session.failed {
            return SessionState::AuthenticationFailed;
        }
        match &session.token {
            None => SessionState::Unauthenticated,
            Some(token) => {
                let remaining = token.remaining();
                if remaining <= Duration::zero() {
                    SessionState::Expired
                } else if remaining < self.expiry_buffer {
                    SessionState::ExpiringSoon
                } else {
                    SessionState::Valid
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn install_token(&self, token: Token) {
        self.session.write().await.token = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(token_url: &str) -> TokenManager {
        let auth = AuthRequest::new("client", "secret", "42")
            .unwrap()
            .with_token_url(token_url)
            .unwrap();
        TokenManager::new(auth).unwrap()
    }

    #[test]
    fn test_jwks_url_replaces_last_segment() {
        let m = manager("https://auth.apps.paloaltonetworks.com/am/oauth2/access_token");
        assert_eq!(
            m.jwks_url().unwrap().as_str(),
            "https://auth.apps.paloaltonetworks.com/am/oauth2/connect/jwk_uri"
        );

        let m = manager("http://127.0.0.1:9000/oauth2/access_token?realm=x");
        assert_eq!(
            m.jwks_url().unwrap().as_str(),
            "http://127.0.0.1:9000/oauth2/connect/jwk_uri"
        );
    }

    #[tokio::test]
    async fn test_expires_soon_without_token() {
        let m = manager("http://127.0.0.1:9/token");
        assert!(m.token_expires_soon().await);
        assert_eq!(m.state().await, SessionState::Unauthenticated);
        assert!(matches!(
            m.access_token().await,
            Err(ScmError::TokenUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_expires_soon_respects_buffer() {
        let m = manager("http://127.0.0.1:9/token");

        m.install_token(Token::new("t", Utc::now() + Duration::seconds(3600))).await;
        assert!(!m.token_expires_soon().await);
        assert_eq!(m.state().await, SessionState::Valid);

        m.install_token(Token::new("t", Utc::now() + Duration::seconds(60))).await;
        assert!(m.token_expires_soon().await);
        assert_eq!(m.state().await, SessionState::ExpiringSoon);

        m.install_token(Token::new("t", Utc::now() - Duration::seconds(1))).await;
        assert_eq!(m.state().await, SessionState::Expired);
    }

    #[tokio::test]
    async fn test_signing_key_requires_token() {
        let m = manager("http://127.0.0.1:9/token");
        assert!(matches!(
            m.get_signing_key().await,
            Err(ScmError::TokenUnavailable(_))
        ));
        assert!(matches!(
            m.is_expired().await,
            Err(ScmError::TokenUnavailable(_))
        ));
    }

    #[test]
    fn test_allowed_algorithms_follow_published_key() {
        let declared: Jwk = serde_json::from_value(serde_json::json!({
            "kty": "oct",
            "kid": "k1",
            "alg": "HS256",
            "k": "c2VjcmV0"
        }))
        .unwrap();
        assert_eq!(allowed_algorithms(&declared), vec![Algorithm::HS256]);

        let undeclared: Jwk = serde_json::from_value(serde_json::json!({
            "kty": "oct",
            "kid": "k2",
            "k": "c2VjcmV0"
        }))
        .unwrap();
        let algorithms = allowed_algorithms(&undeclared);
        assert!(algorithms.contains(&Algorithm::HS512));
        assert!(!algorithms.contains(&Algorithm::RS256));
    }
}
