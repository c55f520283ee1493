pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod security;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod testutil;

pub use commands::{Report, Verdict, Verifier};
pub use config::{Credential, CredentialArgs, Settings};
pub use error::VerifyError;

// Crate version exposed for runtime queries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
