//! # Async Client API
//!
//! Purpose: Expose the pooled RESP2 transport as a `CommandChannel` that the
//! rkit object model can share across key handles.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `KitClient` hides pooling and protocol details.
//! 2. **Errors Are Not Replies**: `-ERR` replies become `KitError::Server`.
//! 3. **Fail Fast**: Protocol violations surface immediately as errors.
//! 4. **Shareable**: The client is `Send + Sync` and meant to live in an `Arc`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use rkit_common::{Arg, CommandChannel, KitError, KitResult, Reply};

use crate::pool::{ConnectionPool, PoolConfig};

/// Configuration for the async client and its pool.
///
/// Deserializable from JSON; timeouts are given in milliseconds and missing
/// fields fall back to `ClientConfig::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server address, e.g. "127.0.0.1:6379".
    pub addr: String,
    /// Maximum idle connections kept in the pool.
    pub max_idle: usize,
    /// Maximum total connections (idle + in-use).
    pub max_total: usize,
    /// Optional read timeout.
    #[serde(rename = "read_timeout_ms", deserialize_with = "millis")]
    pub read_timeout: Option<Duration>,
    /// Optional write timeout.
    #[serde(rename = "write_timeout_ms", deserialize_with = "millis")]
    pub write_timeout: Option<Duration>,
    /// Optional TCP connect timeout.
    #[serde(rename = "connect_timeout_ms", deserialize_with = "millis")]
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            addr: "127.0.0.1:6379".to_string(),
            max_idle: 8,
            max_total: 16,
            read_timeout: None,
            write_timeout: None,
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> KitResult<Self> {
        let config: ClientConfig =
            serde_json::from_str(json).map_err(|err| KitError::Config(err.to_string()))?;
        if config.max_total == 0 {
            return Err(KitError::Config("max_total must be at least 1".to_string()));
        }
        Ok(config)
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

/// Async client with connection pooling.
///
/// This is a facade over the pool and RESP encoder/decoder. Each call acquires
/// a connection, executes one command, and returns the connection to the pool.
#[derive(Clone)]
pub struct KitClient {
    pool: ConnectionPool,
}

impl KitClient {
    /// Creates a client with default configuration.
    pub fn connect(addr: impl Into<String>) -> KitResult<Self> {
        let config = ClientConfig {
            addr: addr.into(),
            ..ClientConfig::default()
        };
        Self::with_config(config)
    }

    /// Creates a client with a custom configuration.
    pub fn with_config(config: ClientConfig) -> KitResult<Self> {
        let pool = ConnectionPool::new(PoolConfig {
            addr: config.addr,
            max_idle: config.max_idle,
            max_total: config.max_total,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            connect_timeout: config.connect_timeout,
        })?;
        Ok(KitClient { pool })
    }

    /// Pings the server. Returns the raw reply payload.
    pub async fn ping(&self, payload: Option<&[u8]>) -> KitResult<Vec<u8>> {
        let args: Vec<Arg> = payload.map(Arg::from).into_iter().collect();
        match self.execute("PING", &args).await? {
            Reply::Simple(text) => Ok(text),
            Reply::Bulk(Some(data)) => Ok(data),
            _ => Err(KitError::UnexpectedResponse),
        }
    }

    /// Connections currently open (idle + in-use).
    pub fn open_connections(&self) -> usize {
        self.pool.total()
    }

    /// Connections parked in the pool.
    pub fn idle_connections(&self) -> usize {
        self.pool.idle()
    }
}

#[async_trait]
impl CommandChannel for KitClient {
    async fn execute(&self, command: &str, args: &[Arg]) -> KitResult<Reply> {
        debug!(command, args = args.len(), "executing command");
        let mut conn = self.pool.acquire().await?;
        match conn.exec(command.as_bytes(), args).await? {
            Reply::Error(message) => Err(KitError::Server { message }),
            reply => Ok(reply),
        }
    }
}
