//! # Error Types
//!
//! Every failure an rkit call can produce, from the socket up to reply
//! decoding. Transport and object model share one enum so a terminal call
//! reports connection failures and decode failures through the same `Result`.

use std::io;

use thiserror::Error;

/// Result type used across the rkit crates.
pub type KitResult<T> = Result<T, KitError>;

/// Errors surfaced by the transport and the object model.
#[derive(Debug, Error)]
pub enum KitError {
    /// Network or IO failure while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// RESP2 framing or parse error.
    #[error("protocol error")]
    Protocol,

    /// Server returned an error reply.
    #[error("server error: {}", String::from_utf8_lossy(.message))]
    Server { message: Vec<u8> },

    /// Reply type did not match the expected command response.
    #[error("unexpected response")]
    UnexpectedResponse,

    /// Pool is at capacity and no idle connections are available.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Address could not be parsed into a socket address.
    #[error("invalid address")]
    InvalidAddress,

    /// Connect, read or write did not finish within the configured timeout.
    #[error("operation timed out")]
    Timeout,

    /// A key handle was created without a name.
    #[error("key required")]
    InvalidKey,

    /// The reply had the right wire type but the wrong shape for the command.
    #[error("decode error: {0}")]
    Decode(String),

    /// Client configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl KitError {
    /// Builds a decode error from any displayable reason.
    pub fn decode(reason: impl Into<String>) -> Self {
        KitError::Decode(reason.into())
    }

    /// True when the error came from the connection rather than the reply.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            KitError::Io(_) | KitError::Timeout | KitError::PoolExhausted | KitError::InvalidAddress
        )
    }
}
