//! Bearer credential encoding and verification (HS256).

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Claims carried by a bearer credential. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the principal id.
    pub sub: String,
    /// Issued-at, seconds since epoch.
    pub iat: u64,
    /// Expiry, seconds since epoch.
    pub exp: u64,
    /// Credential id, consulted by the revocation list when configured.
    pub jti: String,
}

/// Verification failure, distinguished so the caller can decide whether to
/// refresh or re-authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    Expired,
    Malformed,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Issue a signed credential for a subject with the given lifetime.
pub fn issue(secret: &str, subject: &str, ttl_secs: u64) -> Result<String, jsonwebtoken::errors::Error> {
    let iat = now_secs();
    let claims = Claims {
        sub: subject.to_string(),
        iat,
        exp: iat + ttl_secs,
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Issue a credential with an explicit expiry. Test and tooling helper.
pub fn issue_with_expiry(
    secret: &str,
    subject: &str,
    exp: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: subject.to_string(),
        iat: now_secs(),
        exp,
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify signature and expiry, returning the decoded claims.
///
/// Expiry is checked with zero leeway: an expired credential is always
/// `Expired`, and every other failure collapses to `Malformed` so internal
/// verification faults never leak through the response.
pub fn verify(secret: &str, token: &str) -> Result<Claims, CredentialError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(CredentialError::Expired),
            _ => Err(CredentialError::Malformed),
        },
    }
}
