//! Errors raised by the outer surfaces (tracker thread, tray, hooks).
//!
//! The session core itself is total and never returns errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker thread is no longer running")]
    EngineStopped,

    #[error("failed to start tracker runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("system tray error: {0}")]
    Tray(String),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Hook(#[from] windows::core::Error),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            TrackerError::EngineStopped.to_string(),
            "tracker thread is no longer running"
        );
        assert!(TrackerError::Tray("no shell".into())
            .to_string()
            .contains("no shell"));
    }

    #[test]
    fn test_io_error_converts() {
        fn open() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "lock"))?;
            Ok(())
        }
        assert!(matches!(open(), Err(TrackerError::Io(_))));
    }
}
