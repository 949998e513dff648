//! # Command Channel
//!
//! The one capability the object model needs from a connection: send a named
//! command with positional arguments and get back the raw reply.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::KitResult;
use crate::reply::{Arg, Reply};

/// Executes commands against a store connection.
///
/// Implementations must turn server error replies into `KitError::Server`
/// rather than returning `Reply::Error` as a success.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Sends `command` with `args` and waits for its single reply.
    async fn execute(&self, command: &str, args: &[Arg]) -> KitResult<Reply>;
}

#[async_trait]
impl<C: CommandChannel + ?Sized> CommandChannel for Arc<C> {
    async fn execute(&self, command: &str, args: &[Arg]) -> KitResult<Reply> {
        (**self).execute(command, args).await
    }
}
