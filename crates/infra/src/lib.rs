//! Infrastructure layer: backing-platform adapters, local session storage,
//! configuration.

pub mod config;
pub mod platform;
pub mod session_store;
pub mod wiring;

pub use config::AccessConfig;
pub use platform::{InMemoryPlatform, PlatformFailures};
pub use session_store::{InMemorySessionStore, JsonFileSessionStore};
pub use wiring::{InMemoryAccessControl, in_memory_access_control};
