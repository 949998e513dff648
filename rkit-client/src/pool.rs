//! # Connection Pool
//!
//! Purpose: Reuse TCP connections for the async client to reduce handshake
//! latency and allocation churn.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Keep a bounded set of reusable connections.
//! 2. **Minimal Locking**: Hold the mutex only while moving idle connections,
//!    never across an `.await`.
//! 3. **Fail Fast**: Exceeding the pool limit returns an error immediately.
//! 4. **Cache-Friendly Buffers**: Each connection reuses its own buffers.

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{trace, warn};

use rkit_common::{Arg, KitError, KitResult, Reply};

use crate::resp::{encode_command, parse_reply};

/// Pool configuration for the async client.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Server address, e.g. "127.0.0.1:6379".
    pub addr: String,
    /// Maximum number of idle connections to keep.
    pub max_idle: usize,
    /// Maximum total connections (idle + in-use).
    pub max_total: usize,
    /// Optional read timeout per reply.
    pub read_timeout: Option<Duration>,
    /// Optional write timeout per command.
    pub write_timeout: Option<Duration>,
    /// Optional TCP connect timeout.
    pub connect_timeout: Option<Duration>,
}

struct PoolState {
    idle: VecDeque<Connection>,
    total: usize,
}

struct PoolInner {
    config: PoolConfig,
    addr: SocketAddr,
    state: Mutex<PoolState>,
}

impl PoolInner {
    fn state(&self) -> MutexGuard<'_, PoolState> {
        // Pool state stays consistent even if a holder panicked; no await happens under the lock.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Connection pool handle.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Creates a new connection pool with the provided configuration.
    ///
    /// No connection is opened until the first `acquire`.
    pub fn new(config: PoolConfig) -> KitResult<Self> {
        let addr: SocketAddr = config.addr.parse().map_err(|_| KitError::InvalidAddress)?;
        let state = PoolState {
            idle: VecDeque::with_capacity(config.max_idle),
            total: 0,
        };
        Ok(ConnectionPool {
            inner: Arc::new(PoolInner {
                config,
                addr,
                state: Mutex::new(state),
            }),
        })
    }

    /// Acquires a connection from the pool.
    pub async fn acquire(&self) -> KitResult<PooledConnection> {
        if let Some(conn) = self.pop_idle() {
            trace!(addr = %self.inner.addr, "reusing idle connection");
            return Ok(PooledConnection::new(self.inner.clone(), conn));
        }

        if !self.try_reserve() {
            return Err(KitError::PoolExhausted);
        }

        trace!(addr = %self.inner.addr, "opening connection");
        match Connection::connect(self.inner.addr, &self.inner.config).await {
            Ok(conn) => Ok(PooledConnection::new(self.inner.clone(), conn)),
            Err(err) => {
                self.release_slot();
                Err(err)
            }
        }
    }

    /// Number of connections currently open (idle + in-use).
    pub fn total(&self) -> usize {
        self.inner.state().total
    }

    /// Number of idle connections ready for reuse.
    pub fn idle(&self) -> usize {
        self.inner.state().idle.len()
    }

    fn pop_idle(&self) -> Option<Connection> {
        self.inner.state().idle.pop_front()
    }

    fn try_reserve(&self) -> bool {
        let mut state = self.inner.state();
        if state.total >= self.inner.config.max_total {
            return false;
        }
        state.total += 1;
        true
    }

    fn release_slot(&self) {
        let mut state = self.inner.state();
        state.total = state.total.saturating_sub(1);
    }

    fn return_connection(&self, conn: Connection) {
        let mut state = self.inner.state();
        if state.idle.len() < self.inner.config.max_idle {
            state.idle.push_back(conn);
        } else {
            state.total = state.total.saturating_sub(1);
        }
    }
}

/// RAII wrapper returning a connection to the pool on drop.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    conn: Option<Connection>,
    valid: bool,
}

impl PooledConnection {
    fn new(pool: Arc<PoolInner>, conn: Connection) -> Self {
        PooledConnection {
            pool,
            conn: Some(conn),
            valid: true,
        }
    }

    /// Executes a RESP command and returns the parsed reply.
    pub async fn exec(&mut self, command: &[u8], args: &[Arg]) -> KitResult<Reply> {
        let conn = match self.conn.as_mut() {
            Some(conn) => conn,
            None => return Err(KitError::Protocol),
        };
        // Invalidate up front: a future dropped mid-exchange leaves the stream unusable.
        self.valid = false;
        let reply = conn.exec(command, args, &self.pool.config).await;
        match &reply {
            // A server error reply still leaves the stream in sync.
            Ok(_) => self.valid = true,
            Err(err) => warn!(error = %err, "discarding connection after failure"),
        }
        reply
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => return,
        };

        let pool = ConnectionPool {
            inner: self.pool.clone(),
        };

        if self.valid {
            pool.return_connection(conn);
        } else {
            pool.release_slot();
        }
    }
}

/// Single TCP connection with reusable buffers.
///
/// The buffers are stored on the connection to avoid per-call allocations.
pub struct Connection {
    stream: TcpStream,
    read_buf: BytesMut,
    write_buf: Vec<u8>,
}

impl Connection {
    async fn connect(addr: SocketAddr, config: &PoolConfig) -> KitResult<Self> {
        let stream = with_timeout(config.connect_timeout, async {
            Ok(TcpStream::connect(addr).await?)
        })
        .await?;
        // Disable Nagle to keep request latency low for small payloads.
        stream.set_nodelay(true)?;

        Ok(Connection {
            stream,
            read_buf: BytesMut::with_capacity(4 * 1024),
            write_buf: Vec::with_capacity(256),
        })
    }

    async fn exec(&mut self, command: &[u8], args: &[Arg], config: &PoolConfig) -> KitResult<Reply> {
        self.write_buf.clear();
        encode_command(command, args, &mut self.write_buf);

        let stream = &mut self.stream;
        let out = &self.write_buf;
        with_timeout(config.write_timeout, async {
            stream.write_all(out).await?;
            stream.flush().await?;
            Ok(())
        })
        .await?;

        with_timeout(config.read_timeout, self.read_reply()).await
    }

    async fn read_reply(&mut self) -> KitResult<Reply> {
        loop {
            if let Some((reply, used)) = parse_reply(&self.read_buf)? {
                let _ = self.read_buf.split_to(used);
                return Ok(reply);
            }
            let bytes = self.stream.read_buf(&mut self.read_buf).await?;
            if bytes == 0 {
                return Err(KitError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                )));
            }
        }
    }
}

async fn with_timeout<T, F>(limit: Option<Duration>, fut: F) -> KitResult<T>
where
    F: Future<Output = KitResult<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| KitError::Timeout)?,
        None => fut.await,
    }
}
