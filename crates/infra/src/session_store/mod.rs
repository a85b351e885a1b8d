//! Session-continuity record storage.

pub mod file;
pub mod in_memory;

pub use file::JsonFileSessionStore;
pub use in_memory::InMemorySessionStore;
