use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::security::audit_log::AuditLogger;

/// Private key written to disk for the duration of one verification.
///
/// The key lives at `<run dir>/AuthKey_<key_id>.p8`, where the run directory
/// is freshly created under the temp root with owner-only access. Dropping the
/// value removes the file and the directory, whichever way the run ends.
#[derive(Debug)]
pub struct KeyFile {
    path: PathBuf,
    dir: Option<TempDir>,
    audit: AuditLogger,
}

impl KeyFile {
    pub fn create(temp_root: &Path, key_id: &str, material: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("asc-key-check.")
            .tempdir_in(temp_root)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o700))?;
        }
        let path = dir.path().join(format!("AuthKey_{key_id}.p8"));

        let mut opts = OpenOptions::new();
        opts.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut file = opts.open(&path)?;
        file.write_all(material.as_bytes())?;
        file.sync_all()?;

        let audit = AuditLogger::new();
        audit.key_file_created(key_id, &path);
        Ok(Self {
            path,
            dir: Some(dir),
            audit,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> std::io::Result<String> {
        fs::read_to_string(&self.path)
    }

    /// First line of the stored key, without the trailing newline.
    pub fn first_line(&self) -> std::io::Result<String> {
        Ok(self.read()?.lines().next().unwrap_or("").to_string())
    }
}

impl KeyFile {
    /// Removes the key file and its run directory. Returns whether both are gone.
    fn release(&mut self) -> bool {
        let mut removed = match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to remove key file");
                false
            }
        };
        if let Some(dir) = self.dir.take() {
            let dir_path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(path = %dir_path.display(), "key directory removed"),
                Err(err) => {
                    warn!(path = %dir_path.display(), error = %err, "failed to remove key directory");
                    removed = false;
                }
            }
        }
        removed
    }
}

impl Drop for KeyFile {
    fn drop(&mut self) {
        if self.dir.is_some() && self.release() {
            self.audit.key_file_removed(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_file_written_with_expected_name() {
        let root = tempfile::tempdir().unwrap();
        let key = KeyFile::create(root.path(), "ABC123", "line one\nline two\n").unwrap();

        assert!(key.path().starts_with(root.path()));
        assert_eq!(key.path().file_name().unwrap(), "AuthKey_ABC123.p8");
        assert_eq!(key.read().unwrap(), "line one\nline two\n");
        assert_eq!(key.first_line().unwrap(), "line one");
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let key = KeyFile::create(root.path(), "ABC123", "secret").unwrap();

        let mode = fs::metadata(key.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let dir_mode = fs::metadata(key.path().parent().unwrap())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn test_key_file_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let key = KeyFile::create(root.path(), "ABC123", "secret").unwrap();
        let path = key.path().to_path_buf();
        let dir = path.parent().unwrap().to_path_buf();
        assert!(path.exists());

        drop(key);

        assert!(!path.exists());
        assert!(!dir.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_key_file_drop_tolerates_missing_file() {
        let root = tempfile::tempdir().unwrap();
        let key = KeyFile::create(root.path(), "ABC123", "secret").unwrap();
        fs::remove_file(key.path()).unwrap();
        drop(key);
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_release_reports_failed_file_removal() {
        let root = tempfile::tempdir().unwrap();
        let mut key = KeyFile::create(root.path(), "ABC123", "secret").unwrap();
        // A non-empty directory in place of the key cannot be unlinked as a file.
        fs::remove_file(key.path()).unwrap();
        fs::create_dir(key.path()).unwrap();
        fs::write(key.path().join("blocker"), "x").unwrap();

        assert!(!key.release());
        // The run directory still goes, taking the blocker with it.
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_release_succeeds_once() {
        let root = tempfile::tempdir().unwrap();
        let mut key = KeyFile::create(root.path(), "ABC123", "secret").unwrap();
        assert!(key.release());
        assert!(key.dir.is_none());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_two_runs_do_not_collide() {
        let root = tempfile::tempdir().unwrap();
        let a = KeyFile::create(root.path(), "ABC123", "a").unwrap();
        let b = KeyFile::create(root.path(), "ABC123", "b").unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(a.read().unwrap(), "a");
        assert_eq!(b.read().unwrap(), "b");
    }
}
