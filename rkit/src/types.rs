//! Typed wrappers. Each one composes a `Key` and inherits its lifecycle
//! operations through `KeyOperations`; per-type commands are not modelled.

use std::sync::Arc;

use rkit_common::{CommandChannel, KitResult};

use crate::key::{Key, KeyOperations};

macro_rules! key_wrapper {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            key: Key,
        }

        impl $name {
            /// Creates a handle. Empty names are rejected.
            pub fn new(name: impl Into<String>, channel: Arc<dyn CommandChannel>) -> KitResult<Self> {
                Ok($name {
                    key: Key::new(name, channel)?,
                })
            }
        }

        impl From<Key> for $name {
            fn from(key: Key) -> Self {
                $name { key }
            }
        }

        impl KeyOperations for $name {
            fn key(&self) -> &Key {
                &self.key
            }

            fn key_mut(&mut self) -> &mut Key {
                &mut self.key
            }
        }
    };
}

key_wrapper!(
    /// Handle on a list key.
    List
);
key_wrapper!(
    /// Handle on a hash key.
    Hash
);
key_wrapper!(
    /// Handle on a string key.
    Str
);
key_wrapper!(
    /// Handle on a set key.
    Set
);
key_wrapper!(
    /// Handle on a sorted-set key.
    ZSet
);
