//! Link group storage and operations

pub mod actions;
pub mod deeplink;
pub mod kv;
pub mod model;
pub mod queue;
pub mod store;

// Re-exports for library consumers
pub use actions::{AddLinksResult, EditLinksResult, LinkGroupActions};
pub use kv::{FileKv, KeyValueStore, MemoryKv};
pub use model::{Browser, Database, LinkGroup, LinkItem};
pub use store::LinkStore;
