//! Error types for the plant environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error, PartialEq)]
pub enum EnvError {
    /// Requested tick rate is NaN or infinite
    #[error("Invalid tick rate: {0} Hz")]
    InvalidRate(f64),

    /// Requested run duration is NaN, infinite or too long to represent
    #[error("Invalid duration: {0} s")]
    InvalidDuration(f64),

    /// A wall-clock driver was requested outside a tokio runtime
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
}

impl EnvError {
    /// Creates a no-runtime error.
    pub fn no_runtime(msg: impl std::fmt::Display) -> Self {
        Self::NoRuntime(msg.to_string())
    }
}
