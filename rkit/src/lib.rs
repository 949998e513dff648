//! # rkit Object Model
//!
//! Purpose: Typed handles over keys of a Redis-compatible store, plus a
//! fluent builder for the store's `SORT` command.
//!
//! ## Design Principles
//! 1. **Composition Over Inheritance**: `List`, `Hash`, `Str`, `Set` and `ZSet`
//!    wrap a `Key` and gain its lifecycle operations through `KeyOperations`.
//! 2. **One Capability**: Everything talks to the store through a shared
//!    `CommandChannel`; the transport is swappable.
//! 3. **Fluent Accumulation**: `SortBuilder` setters return `&mut Self` and no
//!    I/O happens before the terminal `end()`.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rkit::{CommandChannel, KeyOperations, List};
//!
//! # async fn demo(channel: Arc<dyn CommandChannel>) -> rkit::KitResult<()> {
//! let letters = List::new("letters", channel)?;
//! let reply = letters.sort().alpha().desc().limit(1, 3).end().await?;
//! println!("{:?}", reply.into_values());
//! # Ok(())
//! # }
//! ```

mod key;
mod sort;
mod types;

pub use key::{Key, KeyOperations, KeyType};
pub use rkit_common::{Arg, CommandChannel, KitError, KitResult, Reply, Ttl};
pub use sort::{Direction, SortBuilder, SortReply, SortRows};
pub use types::{Hash, List, Set, Str, ZSet};
