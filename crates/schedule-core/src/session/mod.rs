//! Session storage module
//!
//! Provides the session record, the id allocator and the shared in-memory store.

mod allocator;
mod store;
mod types;

pub use allocator::IdAllocator;
pub use store::SessionStore;
pub use types::Session;
