//! Token and signing-key endpoint handlers.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_with::base64::{Base64, UrlSafe};
use serde_with::formats::Unpadded;
use serde_with::serde_as;

use super::SharedState;
use crate::mock_server::state::MockState;

/// Key id carried by every minted token.
pub const SIGNING_KEY_ID: &str = "mock-signing-key";

/// Form body of a client-credentials grant.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub grant_type: String,
    pub scope: Option<String>,
    pub client_id: Option<String>,
}

/// Claims of a minted access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockClaims {
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub scope: String,
}

/// A symmetric JWK as published by the key endpoint.
#[serde_as]
#[derive(Debug, Serialize)]
struct OctetJwk {
    kty: &'static str,
    kid: &'static str,
    alg: &'static str,
    #[serde(rename = "use")]
    key_use: &'static str,
    #[serde_as(as = "Base64<UrlSafe, Unpadded>")]
    k: Vec<u8>,
}

/// Sign an access token for the state's client.
pub fn mint_token(state: &MockState, scope: &str, lifetime_secs: i64) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now().timestamp();
    let claims = MockClaims {
        sub: state.client_id.clone(),
        aud: state.client_id.clone(),
        exp: now + lifetime_secs,
        iat: now,
        scope: scope.to_string(),
    };
    let header = Header {
        kid: Some(SIGNING_KEY_ID.to_string()),
        ..Header::new(Algorithm::HS256)
    };
    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(&state.signing_secret),
    )
}

fn oauth_error(status: StatusCode, error: &str, description: &str) -> Response {
    (
        status,
        Json(json!({"error": error, "error_description": description})),
    )
        .into_response()
}

/// POST /am/oauth2/access_token
pub async fn issue_token(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Response {
    let mut state = state.write().await;

    if form.grant_type != "client_credentials" {
        return oauth_error(
            StatusCode::BAD_REQUEST,
            "unsupported_grant_type",
            "Only client_credentials is supported",
        );
    }

    let presented = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let client_matches = form
        .client_id
        .as_deref()
        .map_or(true, |id| id == state.client_id);
    if presented != Some(state.basic_credentials().as_str()) || !client_matches {
        return oauth_error(
            StatusCode::UNAUTHORIZED,
            "invalid_client",
            "Client authentication failed",
        );
    }

    let scope = form.scope.unwrap_or_default();
    let lifetime = state.token_lifetime_secs;
    match mint_token(&state, &scope, lifetime) {
        Ok(access_token) => {
            state.tokens_issued += 1;
            Json(json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "expires_in": lifetime,
                "scope": scope,
            }))
            .into_response()
        }
        Err(e) => oauth_error(StatusCode::INTERNAL_SERVER_ERROR, "server_error", &e.to_string()),
    }
}

/// GET /am/oauth2/connect/jwk_uri
pub async fn signing_keys(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    let key = OctetJwk {
        kty: "oct",
        kid: SIGNING_KEY_ID,
        alg: "HS256",
        key_use: "sig",
        k: state.signing_secret.clone(),
    };
    Json(json!({ "keys": [key] }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::jwk::JwkSet;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    #[test]
    fn test_minted_token_verifies_with_published_key() {
        let state = MockState::new();
        let token = mint_token(&state, "tsg_id:1", 900).unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some(SIGNING_KEY_ID));

        let jwks: JwkSet = serde_json::from_value(json!({"keys": [OctetJwk {
            kty: "oct",
            kid: SIGNING_KEY_ID,
            alg: "HS256",
            key_use: "sig",
            k: state.signing_secret.clone(),
        }]}))
        .unwrap();
        let key = DecodingKey::from_jwk(jwks.find(SIGNING_KEY_ID).unwrap()).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[state.client_id.as_str()]);
        let claims = decode::<MockClaims>(&token, &key, &validation).unwrap().claims;
        assert_eq!(claims.scope, "tsg_id:1");
        assert_eq!(claims.exp - claims.iat, 900);
    }
}
