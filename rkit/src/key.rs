//! # Key Handles
//!
//! A `Key` names one remote entity and carries the shared `CommandChannel`
//! used to reach it. Lifecycle commands (TYPE, TTL, EXISTS, EXPIRE, DEL,
//! RENAME) live on the `KeyOperations` trait so every typed wrapper gets them
//! by exposing its inner `Key`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use rkit_common::{Arg, CommandChannel, KitError, KitResult, Reply, Ttl};

use crate::sort::SortBuilder;

/// Name + channel pair identifying one remote key.
#[derive(Clone)]
pub struct Key {
    name: String,
    channel: Arc<dyn CommandChannel>,
}

impl Key {
    /// Creates a handle. Empty names are rejected with `KitError::InvalidKey`.
    pub fn new(name: impl Into<String>, channel: Arc<dyn CommandChannel>) -> KitResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(KitError::InvalidKey);
        }
        Ok(Key { name, channel })
    }

    /// Remote key name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel shared with every other handle built from it.
    pub fn channel(&self) -> &Arc<dyn CommandChannel> {
        &self.channel
    }

    /// Runs `command` with this key as the first argument.
    pub(crate) async fn call(&self, command: &str, extra: &[Arg]) -> KitResult<Reply> {
        let mut args = Vec::with_capacity(extra.len() + 1);
        args.push(Arg::from(self.name.as_str()));
        args.extend_from_slice(extra);
        self.channel.execute(command, &args).await
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Value type reported by the store's TYPE command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    /// Key does not exist.
    None,
    String,
    List,
    Set,
    ZSet,
    Hash,
    Stream,
    /// Anything a newer store version reports.
    Other(String),
}

impl KeyType {
    fn parse(name: &str) -> Self {
        match name {
            "none" => KeyType::None,
            "string" => KeyType::String,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "zset" => KeyType::ZSet,
            "hash" => KeyType::Hash,
            "stream" => KeyType::Stream,
            other => KeyType::Other(other.to_string()),
        }
    }
}

/// Lifecycle operations shared by every key wrapper.
#[async_trait]
pub trait KeyOperations: Send + Sync {
    /// The wrapped handle.
    fn key(&self) -> &Key;

    /// Mutable access, needed by `rename`.
    fn key_mut(&mut self) -> &mut Key;

    /// Remote key name.
    fn name(&self) -> &str {
        self.key().name()
    }

    /// Fetches the value type stored at this key.
    async fn key_type(&self) -> KitResult<KeyType> {
        let text = self.key().call("TYPE", &[]).await?.into_text()?;
        Ok(KeyType::parse(&text))
    }

    /// Fetches the remaining time to live.
    async fn ttl(&self) -> KitResult<Ttl> {
        let seconds = self.key().call("TTL", &[]).await?.into_integer()?;
        Ttl::from_seconds(seconds)
    }

    /// True when the key exists.
    async fn exists(&self) -> KitResult<bool> {
        Ok(self.key().call("EXISTS", &[]).await?.into_integer()? > 0)
    }

    /// Sets an expiry in seconds. Returns true when the timeout was set.
    async fn expire(&self, seconds: u64) -> KitResult<bool> {
        let reply = self.key().call("EXPIRE", &[Arg::from(seconds)]).await?;
        Ok(reply.into_integer()? == 1)
    }

    /// Deletes the key. Returns true when something was removed.
    async fn destroy(&self) -> KitResult<bool> {
        Ok(self.key().call("DEL", &[]).await?.into_integer()? > 0)
    }

    /// Renames the key; the handle follows the new name only on success.
    async fn rename(&mut self, new_name: &str) -> KitResult<()> {
        if new_name.is_empty() {
            return Err(KitError::InvalidKey);
        }
        match self.key().call("RENAME", &[Arg::from(new_name)]).await? {
            Reply::Simple(_) => {}
            _ => return Err(KitError::UnexpectedResponse),
        }
        let key = self.key_mut();
        debug!(from = %key.name, to = new_name, "renamed key");
        key.name = new_name.to_string();
        Ok(())
    }

    /// Starts a fresh SORT over this key.
    fn sort(&self) -> SortBuilder<'_> {
        SortBuilder::new(self.key())
    }
}

impl KeyOperations for Key {
    fn key(&self) -> &Key {
        self
    }

    fn key_mut(&mut self) -> &mut Key {
        self
    }
}
