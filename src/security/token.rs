//! App Store Connect bearer tokens.
//!
//! Tokens are ES256 JWTs with the key id in the header and a fixed audience.
//! The API refuses tokens valid for longer than twenty minutes, so the window
//! is pinned at that maximum.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

pub const AUDIENCE: &str = "appstoreconnect-v1";
pub const TOKEN_TTL_SECS: i64 = 1200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
}

impl Claims {
    pub fn new(issuer_id: &str, issued_at: i64) -> Self {
        Self {
            iss: issuer_id.to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECS,
            aud: AUDIENCE.to_string(),
        }
    }
}

/// A signed token. Held only for the single probe it authorizes.
#[derive(Clone)]
pub struct SignedToken {
    token: String,
    claims: Claims,
}

impl std::fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedToken")
            .field("token", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

impl SignedToken {
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// The first `n` characters, for display.
    pub fn preview(&self, n: usize) -> String {
        self.token.chars().take(n).collect()
    }
}

/// Sign a token for `key_id`/`issuer_id` with the PEM-encoded EC key,
/// issued at `issued_at` (unix seconds).
pub fn sign(
    key_id: &str,
    issuer_id: &str,
    pem: &str,
    issued_at: i64,
) -> Result<SignedToken, VerifyError> {
    let key = EncodingKey::from_ec_pem(pem.as_bytes())?;

    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(key_id.to_string());

    let claims = Claims::new(issuer_id, issued_at);
    let token = jsonwebtoken::encode(&header, &claims, &key)?;
    Ok(SignedToken { token, claims })
}
