//! Error types for the Tollgate service.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Tollgate operations.
#[derive(Error, Debug)]
pub enum TollgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The connection carried no client address to derive a key from
    #[error("Request has no client information")]
    MissingIdentity,

    /// The client exhausted its quota for the current window
    #[error("Rate limit exceeded. Retry after {:.2} seconds", .wait.as_secs_f64())]
    RateLimited {
        /// Time until the oldest recorded request leaves the window
        wait: Duration,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Tollgate operations.
pub type Result<T> = std::result::Result<T, TollgateError>;
