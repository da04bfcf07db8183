//! Error types for the Stellar scene subsystem
//!
//! Only persistence and configuration parsing are fallible. Scene mutation,
//! spatial queries and ray casting report failure through `Option` or empty
//! collections instead.

use std::fmt;

/// Result type for Stellar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stellar errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Reading or writing a scene document failed
    Io(String),

    /// A scene document could not be encoded or decoded
    Serialization(String),

    /// A scene document was well-formed but semantically unusable
    InvalidDocument(String),

    /// A configuration section could not be parsed
    InvalidConfig(String),

    /// A deferred save/load was requested without an installed scene store
    StoreMissing,

    /// Internal error built by `engine_err!`
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::InvalidDocument(msg) => write!(f, "Invalid document: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::StoreMissing => write!(f, "No scene store installed"),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::Internal` with the same text
///
/// # Example
///
/// ```no_run
/// # use stellar_scene::engine_err;
/// let err = engine_err!("stellar::SceneManager", "Node {} not found", 42);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::stellar::Error::Internal(message)
    }};
}

/// Log an ERROR message and return `Err(Error::Internal)` from the current function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
