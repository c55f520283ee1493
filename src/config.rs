use std::path::PathBuf;
use std::time::Duration;

use crate::error::VerifyError;

pub const ENV_KEY_ID: &str = "APP_STORE_CONNECT_API_KEY_KEY_ID";
pub const ENV_ISSUER_ID: &str = "APP_STORE_CONNECT_API_KEY_ISSUER_ID";
pub const ENV_KEY_CONTENT: &str = "APP_STORE_CONNECT_API_KEY_KEY";
pub const ENV_API_BASE_URL: &str = "APP_STORE_CONNECT_API_BASE_URL";

pub const DEFAULT_API_BASE_URL: &str = "https://api.appstoreconnect.apple.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Looks up `name` through `lookup` (normally the process environment),
/// falling back to `arg`. Empty values are treated as absent at both steps.
pub fn resolve<F>(lookup: F, name: &str, arg: Option<&str>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .or_else(|| arg.filter(|v| !v.is_empty()).map(str::to_string))
}

/// Positional values as they arrived on the command line.
#[derive(Debug, Clone, Default)]
pub struct CredentialArgs {
    pub key_id: Option<String>,
    pub issuer_id: Option<String>,
    pub key_content: Option<String>,
}

/// An App Store Connect API key: key id, issuer id and the PEM private key.
#[derive(Clone)]
pub struct Credential {
    pub key_id: String,
    pub issuer_id: String,
    pub key_material: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key_id", &self.key_id)
            .field("issuer_id", &self.issuer_id)
            .field("key_material", &"<redacted>")
            .finish()
    }
}

impl Credential {
    pub fn new(
        key_id: impl Into<String>,
        issuer_id: impl Into<String>,
        key_material: impl Into<String>,
    ) -> Result<Self, VerifyError> {
        let key_id = key_id.into();
        let issuer_id = issuer_id.into();
        let key_material = key_material.into();

        if key_id.is_empty() {
            return Err(VerifyError::MissingCredential("key id"));
        }
        if issuer_id.is_empty() {
            return Err(VerifyError::MissingCredential("issuer id"));
        }
        if key_material.trim().is_empty() {
            return Err(VerifyError::MissingCredential("key content"));
        }
        // key id ends up in a file name
        if !key_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(VerifyError::InvalidCredential(format!(
                "key id {key_id:?} may only contain ASCII letters, digits, '-' or '_'"
            )));
        }

        Ok(Self {
            key_id,
            issuer_id,
            key_material,
        })
    }

    /// Resolve all three fields through `lookup`, then the positionals.
    pub fn resolve<F>(lookup: F, args: &CredentialArgs) -> Result<Self, VerifyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_id = resolve(&lookup, ENV_KEY_ID, args.key_id.as_deref())
            .ok_or(VerifyError::MissingCredential("key id"))?;
        let issuer_id = resolve(&lookup, ENV_ISSUER_ID, args.issuer_id.as_deref())
            .ok_or(VerifyError::MissingCredential("issuer id"))?;
        let key_material = resolve(&lookup, ENV_KEY_CONTENT, args.key_content.as_deref())
            .ok_or(VerifyError::MissingCredential("key content"))?;
        Self::new(key_id, issuer_id, key_material)
    }
}

/// Where and how to run the probe.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub timeout: Duration,
    pub temp_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            temp_root: std::env::temp_dir(),
        }
    }
}

impl Settings {
    /// Build settings from optional CLI overrides. The base URL may also come
    /// from `APP_STORE_CONNECT_API_BASE_URL`; the flag wins over it.
    pub fn from_overrides<F>(
        lookup: F,
        api_base_url: Option<String>,
        timeout_secs: Option<u64>,
        temp_root: Option<PathBuf>,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let api_base_url = api_base_url
            .filter(|v| !v.is_empty())
            .or_else(|| lookup(ENV_API_BASE_URL).filter(|v| !v.is_empty()))
            .unwrap_or(defaults.api_base_url);
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            timeout: timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            temp_root: temp_root.unwrap_or(defaults.temp_root),
        }
    }
}
