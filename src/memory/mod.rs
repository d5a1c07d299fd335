//! Thread-scoped memory: append-only history with retention and search.

pub mod search;
pub mod store;
pub mod types;

pub use search::{SearchStrategy, TokenOverlap};
pub use store::MemoryStore;
pub use types::{MemoryItem, Origin};
