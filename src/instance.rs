//! Single-instance lock file.
//!
//! The lock file holds the PID of the running instance. A new launch
//! checks whether that PID is still alive; a lock left behind by a crashed
//! run is replaced.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Lock file location: `%APPDATA%\wpmon\wpmon.lock`, or the working
/// directory when APPDATA is unset.
pub fn default_lock_path() -> PathBuf {
    match std::env::var("APPDATA") {
        Ok(appdata) => PathBuf::from(appdata).join("wpmon").join("wpmon.lock"),
        Err(_) => PathBuf::from(".").join("wpmon.lock"),
    }
}

/// Held for the lifetime of the process. Deletes the lock file on drop.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    /// Takes the lock at `path`.
    ///
    /// Returns `None` if the recorded PID is reported alive by
    /// `is_running`.
    pub fn acquire<F>(path: impl Into<PathBuf>, is_running: F) -> io::Result<Option<Self>>
    where
        F: Fn(u32) -> bool,
    {
        let path = path.into();

        if let Some(pid) = read_pid(&path) {
            if is_running(pid) {
                tracing::debug!(pid, "Another instance holds the lock");
                return Ok(None);
            }
            tracing::debug!(pid, "Removing stale lock file");
        }
        // Unreadable or stale
        let _ = fs::remove_file(&path);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        write!(file, "{}", std::process::id())?;

        Ok(Some(Self { path }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// PID stored in the lock file, if it exists and parses.
fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("wpmon-test-{}-{}", std::process::id(), name))
            .join("wpmon.lock")
    }

    #[test]
    fn test_acquire_writes_pid_and_removes_on_drop() {
        let path = scratch_path("fresh");
        let lock = InstanceLock::acquire(&path, |_| false).unwrap().unwrap();

        assert_eq!(read_pid(lock.path()), Some(std::process::id()));
        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_live_owner_blocks_second_instance() {
        let path = scratch_path("live");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "4242").unwrap();

        let lock = InstanceLock::acquire(&path, |pid| pid == 4242).unwrap();
        assert!(lock.is_none());
        assert_eq!(read_pid(&path), Some(4242));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_stale_or_garbled_lock_is_replaced() {
        let path = scratch_path("stale");
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        fs::write(&path, "4242").unwrap();
        let lock = InstanceLock::acquire(&path, |_| false).unwrap().unwrap();
        assert_eq!(read_pid(&path), Some(std::process::id()));
        drop(lock);

        fs::write(&path, "not a pid").unwrap();
        let lock = InstanceLock::acquire(&path, |_| true).unwrap();
        assert!(lock.is_some());
    }
}
