//! # rkit Async Client
//!
//! Purpose: Provide a lightweight, async Redis-compatible client with
//! connection pooling to minimize TCP handshake overhead. `KitClient` is the
//! `CommandChannel` the rkit object model runs on.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Reuse TCP connections to avoid repeated connects.
//! 2. **One Command, One Reply**: Each call writes one array and reads one value.
//! 3. **Minimal Allocation**: Reuse buffers for RESP framing and parsing.
//! 4. **Protocol Clarity**: Encode/parse RESP2 explicitly for correctness.

mod client;
mod pool;
mod resp;

pub use client::{ClientConfig, KitClient};
pub use resp::{encode_command, parse_reply};
pub use rkit_common::{Arg, CommandChannel, KitError, KitResult, Reply, Ttl};
