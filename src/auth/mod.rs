//! OAuth2 client-credentials authentication.
//!
//! [`AuthRequest`] is the immutable credentials bundle, [`Token`] the
//! issued access token, and [`TokenManager`] owns the session: it performs
//! the grant, retrieves the signing key, answers expiry queries and
//! refreshes.

mod manager;
mod request;
mod token;

pub use manager::{SessionState, SigningKey, TokenManager, JWKS_PATH, TOKEN_EXPIRY_BUFFER_SECS};
pub use request::{AuthRequest, DEFAULT_TOKEN_URL};
pub use token::{AccessTokenClaims, Token, TokenResponse};
