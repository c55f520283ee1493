pub mod audit_log;
pub mod key_file;
pub mod token;
