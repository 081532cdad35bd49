//! Error types for rads-core
//!
//! Every backend maps its own failures into this taxonomy so the driver can
//! reason about timeouts and state errors without knowing which platform it
//! runs on.

use thiserror::Error;

/// Driver error taxonomy
#[derive(Debug, Error)]
pub enum Error {
    /// A required argument or configuration value is missing or invalid
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `open` was called while the driver was not closed
    #[error("Device is already open")]
    AlreadyOpen,

    /// The operation needs an open device
    #[error("Device is not open")]
    NotOpen,

    /// The operation is not permitted in the current state
    #[error("Operation not permitted in the current driver state")]
    NotPermitted,

    /// The data-ready wait exceeded its deadline
    #[error("Timed out waiting for data-ready")]
    TimedOut,

    /// A line reservation is already held elsewhere
    #[error("Resource busy")]
    Busy,

    /// An underlying transport or line call failed
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted
        context: String,
        /// The underlying OS error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with a short description of what was being done
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns true for the distinguished data-ready timeout outcome
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
