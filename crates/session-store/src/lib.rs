//! Session storage for the callback gateway
//!
//! Sessions are opaque key-value maps addressed by a rotatable `SessionId`.
//! The `SessionStore` trait is the boundary the callback engine talks to; the
//! bundled `MemorySessionStore` keeps everything in process behind a tokio
//! `RwLock` and expires idle sessions.
//!
//! Session lifecycle:
//! 1. A writer asks the store to `create()` a session (lazily, on first write)
//! 2. Attributes are read and written with `get` / `set` / `remove`
//! 3. After login the identifier is rotated with `renew()`, which moves every
//!    attribute to a fresh identifier and invalidates the old one atomically
//! 4. Idle sessions are dropped by the sweeper (`spawn_sweep_task`)

pub mod error;
pub mod id;
pub mod memory;
pub mod store;
pub mod sweep;

pub use error::{Result, SessionError};
pub use id::SessionId;
pub use memory::MemorySessionStore;
pub use store::{BoxFuture, SessionStore};
pub use sweep::spawn_sweep_task;
