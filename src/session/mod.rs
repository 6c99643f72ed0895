//! Session state, registry, and lifecycle management
//!
//! Provides the per-client session record, the concurrent store keyed by
//! session identifier, and the controller that drives creation, teardown,
//! and shutdown.

pub mod lifecycle;
pub mod record;
pub mod store;

pub use lifecycle::{LifecycleController, SessionMode};
pub use record::{SessionRecord, SessionState, StreamLease, StreamTakeError};
pub use store::{InMemorySessionStore, SessionStore};
