use std::path::Path;

use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct AuditLogger;

impl AuditLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn key_file_created(&self, key_id: &str, path: &Path) {
        info!(target: "audit", event = "key_file_created", key_id, path = %path.display());
    }

    pub fn key_file_removed(&self, path: &Path) {
        info!(target: "audit", event = "key_file_removed", path = %path.display());
    }

    pub fn token_signed(&self, key_id: &str, issuer_id: &str, exp: i64) {
        info!(target: "audit", event = "token_signed", key_id, issuer_id, exp);
    }

    pub fn signing_failed(&self, key_id: &str, reason: &str) {
        warn!(target: "audit", event = "signing_failed", key_id, reason);
    }

    pub fn probe_accepted(&self, key_id: &str, status: u16) {
        info!(target: "audit", event = "probe_accepted", key_id, status);
    }

    pub fn probe_rejected(&self, key_id: &str, status: u16) {
        warn!(target: "audit", event = "probe_rejected", key_id, status);
    }

    pub fn transport_failed(&self, key_id: &str, error_msg: &str) {
        warn!(target: "audit", event = "transport_failed", key_id, error = error_msg);
    }
}
