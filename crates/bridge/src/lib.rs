//! Typed bridge between a client and its backend process.
//!
//! * [`Transport`] is the seam to the backend: commands with one reply each,
//!   plus named event streams. [`MemoryTransport`] runs a backend in-process,
//!   [`ProcessTransport`] talks to a child process over stdio.
//! * [`Invoker`] sends commands and validates replies against a
//!   [`kaboom_schema::Schema`].
//! * [`Cache`] shares command results and event payloads between
//!   [`Subscription`]s, with request deduplication and read-after-write
//!   ordering for local mutations.

#![warn(missing_docs)]

mod cache;
mod error;
mod fanout;
mod invoker;
mod key;
mod memory;
mod process;
mod transport;

pub use cache::{Cache, CacheConfig, CacheValue, EntryState, Subscription};
pub use error::{BridgeError, Result, TransportError};
pub use invoker::Invoker;
pub use key::{CacheKey, CommandDescriptor, canonical_json};
pub use memory::MemoryTransport;
pub use process::ProcessTransport;
pub use transport::{Listener, Registration, Transport};

#[cfg(test)]
mod tests;
