//! Error types for mywire.

use thiserror::Error;

/// The main error type for handshake and encoding operations.
#[derive(Debug, Error)]
pub enum WireError {
    /// No encoder is registered for the value's type and no fallback applies.
    #[error("no encoder registered for type '{0}'")]
    Unencodable(&'static str),

    /// A value was recognized but cannot be turned into a literal.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The server advertised an authentication mechanism we do not implement.
    #[error("unsupported authentication plugin '{0}'")]
    UnsupportedAuthPlugin(String),

    /// The server explicitly refused the credentials.
    #[error("authentication rejected: {0}")]
    Rejected(String),

    /// An interactive plugin used up its round budget without success.
    #[error("authentication round budget exhausted")]
    ExhaustedAttempts,

    /// Malformed or unexpected packet from the server.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for mywire operations.
pub type WireResult<T> = Result<T, WireError>;
