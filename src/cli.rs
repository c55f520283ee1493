//! Command-line surface: argument parsing, input resolution, exit codes.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use crate::commands::verify::Verifier;
use crate::config::{
    Credential, CredentialArgs, Settings, DEFAULT_TIMEOUT_SECS, ENV_ISSUER_ID, ENV_KEY_CONTENT,
    ENV_KEY_ID,
};
use crate::error::VerifyError;

pub const EXIT_OK: u8 = 0;
/// The `--key-file` path could not be read.
pub const EXIT_KEY_FILE_READ: u8 = 5;
/// A signal interrupted the run.
pub const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(
    name = "asc-key-check",
    version,
    about = "Check that an App Store Connect API key can sign a token the API accepts"
)]
pub struct AppCli {
    /// Key identifier (env APP_STORE_CONNECT_API_KEY_KEY_ID wins if set)
    pub key_id: Option<String>,

    /// Issuer identifier (env APP_STORE_CONNECT_API_KEY_ISSUER_ID wins if set)
    pub issuer_id: Option<String>,

    /// PEM private key content (env APP_STORE_CONNECT_API_KEY_KEY wins if set)
    #[arg(allow_hyphen_values = true)]
    pub key_content: Option<String>,

    /// Read the private key from a .p8 file instead of the KEY_CONTENT argument
    #[arg(long, conflicts_with = "key_content")]
    pub key_file: Option<PathBuf>,

    /// API base URL (also APP_STORE_CONNECT_API_BASE_URL)
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Directory in which the temporary key file is created
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn print_usage<W: Write>(out: &mut W) {
    let _ = writeln!(out, "Usage: asc-key-check <KEY_ID> <ISSUER_ID> <KEY_CONTENT>");
    let _ = writeln!(
        out,
        "Or set env vars: {ENV_KEY_ID}, {ENV_ISSUER_ID}, {ENV_KEY_CONTENT}"
    );
}

fn read_key_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading key file {}", path.display()))
}

enum Outcome {
    Finished(Result<crate::commands::verify::Report, VerifyError>),
    Interrupted,
}

/// Run one key check and return the process exit code.
///
/// `lookup` stands in for the process environment. When `shutdown` resolves
/// first, the verification is dropped (removing the key file) and
/// [`EXIT_INTERRUPTED`] is returned.
pub async fn run<F, W, S>(args: AppCli, lookup: F, out: &mut W, shutdown: S) -> u8
where
    F: Fn(&str) -> Option<String>,
    W: Write,
    S: Future<Output = ()>,
{
    // The environment wins over --key-file, so only read the file when it counts.
    let env_has_key = lookup(ENV_KEY_CONTENT).is_some_and(|v| !v.is_empty());
    let key_content = match (args.key_content, &args.key_file) {
        (Some(content), _) => Some(content),
        (None, Some(path)) if !env_has_key => match read_key_file(path) {
            Ok(content) => Some(content),
            Err(err) => {
                let _ = writeln!(out, "Error: {err:#}");
                return EXIT_KEY_FILE_READ;
            }
        },
        (None, _) => None,
    };
    let cred_args = CredentialArgs {
        key_id: args.key_id,
        issuer_id: args.issuer_id,
        key_content,
    };

    let credential = match Credential::resolve(&lookup, &cred_args) {
        Ok(c) => c,
        Err(err @ VerifyError::MissingCredential(_)) => {
            debug!(error = %err, "credential incomplete");
            print_usage(out);
            return err.exit_code() as u8;
        }
        Err(err) => {
            let _ = writeln!(out, "Error: {err}");
            return err.exit_code() as u8;
        }
    };

    let settings = Settings::from_overrides(
        &lookup,
        args.api_base_url,
        Some(args.timeout_secs),
        args.temp_dir,
    );
    info!(api = %settings.api_base_url, timeout_secs = settings.timeout.as_secs(), "starting key check");

    let verifier = match Verifier::new(settings) {
        Ok(v) => v,
        Err(err) => {
            let _ = writeln!(out, "Error: {err}");
            return err.exit_code() as u8;
        }
    };

    // The verification future owns the key file; losing the race drops it.
    let outcome = tokio::select! {
        res = verifier.verify(&credential, &mut *out) => Outcome::Finished(res),
        _ = shutdown => Outcome::Interrupted,
    };

    match outcome {
        Outcome::Finished(Ok(_)) => EXIT_OK,
        Outcome::Finished(Err(err @ VerifyError::AuthorizationFailure(_))) => {
            err.exit_code() as u8
        }
        Outcome::Finished(Err(err)) => {
            let _ = writeln!(out, "Error: {err}");
            err.exit_code() as u8
        }
        Outcome::Interrupted => {
            let _ = writeln!(out, "Interrupted, temporary key file removed.");
            EXIT_INTERRUPTED
        }
    }
}
