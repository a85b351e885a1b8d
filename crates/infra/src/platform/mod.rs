//! Backing-platform adapters (auth + row reads).

pub mod in_memory;

pub use in_memory::{InMemoryPlatform, PlatformFailures};
