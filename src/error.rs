use thiserror::Error;

use crate::commands::verify::Report;

/// Errors produced while verifying a credential.
///
/// `AuthorizationFailure` means the tool worked and the API answered, but the
/// credential was rejected. Every other variant means the check itself could
/// not be completed.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// One of key id, issuer id or key material is absent or empty.
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The temporary key file could not be written.
    #[error("key file error: {0}")]
    KeyFile(#[from] std::io::Error),

    /// Private key material could not produce a signed token.
    #[error("signing error: {0}")]
    SigningError(String),

    /// Network unreachable, TLS failure or timeout.
    #[error("transport error: {0}")]
    TransportError(String),

    #[error("authorization failure: HTTP {}", .0.status)]
    AuthorizationFailure(Report),
}

impl VerifyError {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            VerifyError::AuthorizationFailure(_) => 1,
            VerifyError::MissingCredential(_) | VerifyError::InvalidCredential(_) => 2,
            VerifyError::SigningError(_) => 3,
            VerifyError::TransportError(_) => 4,
            VerifyError::KeyFile(_) => 5,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        VerifyError::SigningError(err.to_string())
    }
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VerifyError::TransportError(format!("request timed out: {err}"))
        } else {
            VerifyError::TransportError(err.to_string())
        }
    }
}
