use std::fmt;
use std::io::Write;

use chrono::Utc;
use tracing::{debug, info};

use crate::config::{Credential, Settings};
use crate::error::VerifyError;
use crate::security::audit_log::AuditLogger;
use crate::security::key_file::KeyFile;
use crate::security::token;
use crate::transport::{ApiProbe, ProbeResult};

pub const TOKEN_PREVIEW_CHARS: usize = 50;
pub const BODY_PREVIEW_CHARS: usize = 200;

pub const SUCCESS_LINE: &str = "PASS: API key works, credential is valid and can list apps.";
pub const FAILURE_LINE: &str = "FAIL: API key was rejected, check its permissions and expiration.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Success => write!(f, "success"),
            Verdict::Failure => write!(f, "failure"),
        }
    }
}

/// Outcome of a probe that reached the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub status: u16,
    pub body: String,
    pub verdict: Verdict,
}

impl From<ProbeResult> for Report {
    fn from(result: ProbeResult) -> Self {
        let verdict = if result.is_authorized() {
            Verdict::Success
        } else {
            Verdict::Failure
        };
        Self {
            status: result.status,
            body: result.body,
            verdict,
        }
    }
}

/// Runs the key check: key file, token, probe, verdict.
#[derive(Debug, Clone)]
pub struct Verifier {
    settings: Settings,
    probe: ApiProbe,
    audit: AuditLogger,
}

impl Verifier {
    pub fn new(settings: Settings) -> Result<Self, VerifyError> {
        let probe = ApiProbe::new(&settings.api_base_url, settings.timeout)?;
        Ok(Self {
            settings,
            probe,
            audit: AuditLogger::new(),
        })
    }

    /// Verify `credential` against the API, writing the console transcript to
    /// `out`. Non-200 answers come back as [`VerifyError::AuthorizationFailure`]
    /// carrying the report.
    pub async fn verify<W: Write>(
        &self,
        credential: &Credential,
        out: &mut W,
    ) -> Result<Report, VerifyError> {
        let key_file = KeyFile::create(
            &self.settings.temp_root,
            &credential.key_id,
            &credential.key_material,
        )?;

        say(out, format_args!("Testing App Store Connect API key..."));
        say(out, format_args!("Key ID: {}", credential.key_id));
        say(out, format_args!("Issuer ID: {}", credential.issuer_id));
        say(out, format_args!("Key file: {}", key_file.path().display()));
        say(out, format_args!("Key starts with: {}", key_file.first_line()?));

        let pem = key_file.read()?;
        let signed = match token::sign(
            &credential.key_id,
            &credential.issuer_id,
            &pem,
            Utc::now().timestamp(),
        ) {
            Ok(signed) => signed,
            Err(err) => {
                self.audit.signing_failed(&credential.key_id, &err.to_string());
                return Err(err);
            }
        };
        self.audit
            .token_signed(&credential.key_id, &credential.issuer_id, signed.claims().exp);
        say(
            out,
            format_args!(
                "JWT token generated (first {} chars): {}...",
                TOKEN_PREVIEW_CHARS,
                signed.preview(TOKEN_PREVIEW_CHARS)
            ),
        );

        let result = match self.probe.list_apps(&signed).await {
            Ok(result) => result,
            Err(err) => {
                self.audit.transport_failed(&credential.key_id, &err.to_string());
                return Err(err);
            }
        };
        say(out, format_args!("API Response Status: {}", result.status));
        say(
            out,
            format_args!(
                "API Response Body: {}...",
                result.body_preview(BODY_PREVIEW_CHARS)
            ),
        );

        let report = Report::from(result);
        match report.verdict {
            Verdict::Success => {
                self.audit.probe_accepted(&credential.key_id, report.status);
                say(out, format_args!("{SUCCESS_LINE}"));
                info!(key_id = %credential.key_id, "credential accepted");
                Ok(report)
            }
            Verdict::Failure => {
                self.audit.probe_rejected(&credential.key_id, report.status);
                say(out, format_args!("Full error: {}", report.body));
                say(out, format_args!("{FAILURE_LINE}"));
                debug!(key_id = %credential.key_id, status = report.status, "credential rejected");
                Err(VerifyError::AuthorizationFailure(report))
            }
        }
    }
}

// Write errors on the transcript are ignored.
fn say<W: Write>(out: &mut W, line: fmt::Arguments<'_>) {
    let _ = writeln!(out, "{line}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_from_probe_result() {
        let ok = Report::from(ProbeResult {
            status: 200,
            body: r#"{"data":[]}"#.to_string(),
        });
        assert_eq!(ok.verdict, Verdict::Success);

        let denied = Report::from(ProbeResult {
            status: 401,
            body: "NOT_AUTHORIZED".to_string(),
        });
        assert_eq!(denied.verdict, Verdict::Failure);
        assert_eq!(denied.body, "NOT_AUTHORIZED");
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Success.to_string(), "success");
        assert_eq!(Verdict::Failure.to_string(), "failure");
    }

    #[tokio::test]
    async fn test_verify_signing_error_cleans_up_without_network() {
        let root = tempfile::tempdir().unwrap();
        // Nothing listens here; reaching the network would surface as TransportError.
        let settings = Settings {
            api_base_url: "http://127.0.0.1:9".to_string(),
            timeout: std::time::Duration::from_secs(1),
            temp_root: root.path().to_path_buf(),
        };
        let verifier = Verifier::new(settings).unwrap();
        let cred = Credential::new("ABC123", "issuer-xyz", "not-a-key").unwrap();

        let mut out = Vec::new();
        let err = verifier.verify(&cred, &mut out).await.unwrap_err();

        assert!(matches!(err, VerifyError::SigningError(_)));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Key starts with: not-a-key"));
        assert!(!text.contains("API Response Status"));
    }
}
