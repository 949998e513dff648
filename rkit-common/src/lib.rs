// rkit-common - Shared reply, argument and error types for rkit
//
// This crate defines the boundary between the RESP transport and the object model

pub mod channel;
pub mod error;
pub mod reply;

// Re-export for convenience
pub use channel::*;
pub use error::*;
pub use reply::*;
