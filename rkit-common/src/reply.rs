//! # Reply and Argument Types
//!
//! Values exchanged with the store: `Arg` for one command argument on the way
//! out, `Reply` for one RESP2 value on the way back.
//!
//! ## Design Principles
//!
//! 1. **Binary-Safe**: Arguments and bulk replies are raw bytes; text is a view.
//! 2. **Explicit Nil**: Null bulk strings and null arrays stay distinguishable
//!    from empty values so positional replies never lose alignment.
//! 3. **Cheap Clones**: `Arg` wraps `Bytes`, so compiled commands can be kept
//!    and re-sent without copying payloads.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{KitError, KitResult};

/// RESP2 reply value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// +OK or +PONG style replies.
    Simple(Vec<u8>),
    /// -ERR ... replies.
    Error(Vec<u8>),
    /// :123 replies.
    Integer(i64),
    /// $... bulk strings, with None for null.
    Bulk(Option<Vec<u8>>),
    /// *... arrays.
    Array(Vec<Reply>),
    /// *-1 null array.
    Nil,
}

impl Reply {
    /// Returns the integer payload or an `UnexpectedResponse` error.
    pub fn into_integer(self) -> KitResult<i64> {
        match self {
            Reply::Integer(value) => Ok(value),
            _ => Err(KitError::UnexpectedResponse),
        }
    }

    /// Returns the text of a simple or bulk string reply.
    pub fn into_text(self) -> KitResult<String> {
        let raw = match self {
            Reply::Simple(raw) | Reply::Bulk(Some(raw)) => raw,
            _ => return Err(KitError::UnexpectedResponse),
        };
        String::from_utf8(raw).map_err(|_| KitError::decode("reply is not valid UTF-8"))
    }

    /// Short name of the variant, used in decode diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Simple(_) => "simple string",
            Reply::Error(_) => "error",
            Reply::Integer(_) => "integer",
            Reply::Bulk(Some(_)) => "bulk string",
            Reply::Bulk(None) => "null bulk string",
            Reply::Array(_) => "array",
            Reply::Nil => "null array",
        }
    }
}

/// One binary-safe command argument.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Arg(Bytes);

impl Arg {
    /// Raw bytes as sent on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl AsRef<[u8]> for Arg {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for Arg {
    fn from(value: Bytes) -> Self {
        Arg(value)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(value: Vec<u8>) -> Self {
        Arg(Bytes::from(value))
    }
}

impl From<&[u8]> for Arg {
    fn from(value: &[u8]) -> Self {
        Arg(Bytes::copy_from_slice(value))
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg(Bytes::from(value))
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::from(value.as_str())
    }
}

macro_rules! arg_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg(Bytes::from(value.to_string()))
                }
            }
        )*
    };
}

arg_from_number!(i32, i64, u32, u64, usize, f64);

/// TTL state returned by the server, mirroring Redis semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Key is missing or already expired.
    Missing,
    /// Key exists without expiration.
    NoExpiry,
    /// Key expires after the provided duration.
    ExpiresIn(Duration),
}

impl Ttl {
    /// Interprets a TTL integer reply (-2 missing, -1 persistent, else seconds).
    pub fn from_seconds(value: i64) -> KitResult<Self> {
        match value {
            -2 => Ok(Ttl::Missing),
            -1 => Ok(Ttl::NoExpiry),
            secs if secs >= 0 => Ok(Ttl::ExpiresIn(Duration::from_secs(secs as u64))),
            other => Err(KitError::decode(format!("invalid ttl {other}"))),
        }
    }
}
