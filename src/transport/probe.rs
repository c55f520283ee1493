use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use tracing::debug;

use crate::error::VerifyError;
use crate::security::token::SignedToken;

pub const APPS_PATH: &str = "/v1/apps";

/// HTTP status and body returned by the probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: u16,
    pub body: String,
}

impl ProbeResult {
    pub fn is_authorized(&self) -> bool {
        self.status == 200
    }

    /// The first `n` characters of the body, for display.
    pub fn body_preview(&self, n: usize) -> String {
        self.body.chars().take(n).collect()
    }
}

/// Client for the authorization-protected endpoint used as a probe.
#[derive(Debug, Clone)]
pub struct ApiProbe {
    base_url: String,
    http_client: Client,
}

impl ApiProbe {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, VerifyError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::TransportError(format!("creating HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, APPS_PATH)
    }

    /// Single GET of the app listing with the token as bearer credential.
    pub async fn list_apps(&self, token: &SignedToken) -> Result<ProbeResult, VerifyError> {
        let url = self.url();
        debug!(url = %url, "probing app listing");

        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token.as_str()))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, body_len = body.len(), "probe response received");
        Ok(ProbeResult { status, body })
    }
}
