//! OAuth2 service-account flow: sign a JWT bearer assertion with the key's
//! RSA private key and trade it for a short-lived access token.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::ServiceAccountKey;
use crate::errors::SeedError;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize, PartialEq)]
pub struct AssertionClaims<'a> {
    pub iss: &'a str,
    pub scope: &'a str,
    pub aud: &'a str,
    pub iat: i64,
    pub exp: i64,
}

impl<'a> AssertionClaims<'a> {
    pub fn new(key: &'a ServiceAccountKey, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: &key.client_email,
            scope: DATASTORE_SCOPE,
            aud: &key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Signs the RS256 assertion for `key`.
pub fn sign_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String, SeedError> {
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SeedError::Connection(format!("Invalid service account private key: {e}")))?;

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    encode(&header, &AssertionClaims::new(key, now), &encoding_key)
        .map_err(|e| SeedError::Connection(format!("Failed to sign token assertion: {e}")))
}

/// Exchanges a signed assertion for an access token at the key's `token_uri`.
pub async fn fetch_access_token(
    http: &Client,
    key: &ServiceAccountKey,
    now: DateTime<Utc>,
) -> Result<String, SeedError> {
    let assertion = sign_assertion(key, now)?;

    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| SeedError::Connection(format!("Token request failed: {e}")))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        let message = serde_json::from_str::<TokenError>(&body)
            .map(|e| match e.error_description {
                Some(desc) => format!("{}: {desc}", e.error),
                None => e.error,
            })
            .unwrap_or(body);
        return Err(SeedError::Connection(format!(
            "Token endpoint returned {status}: {message}"
        )));
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| SeedError::Connection(format!("Malformed token response: {e}")))?;

    debug!("Access token issued (expires_in={:?})", token.expires_in);

    token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SeedError::Connection("Token response had no access_token".to_string()))
}
