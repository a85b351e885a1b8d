//! `posgate-session`: stateful, async side of the access-control core.
//!
//! Resolves identity from sessions, tracks business-type and branch scope,
//! and exposes snapshots for the pure guards in `posgate-auth`.

pub mod access;
pub mod error;
pub mod ports;
pub mod record;
pub mod resolver;
pub mod scope;

pub use access::{AccessControl, AccessSnapshot};
pub use error::{SessionError, SessionResult};
pub use ports::{
    AuthProvider, BusinessRow, ProfileDirectory, ProfileRow, RoleAssignmentRow, Session,
    SessionStore,
};
pub use record::SessionRecord;
pub use resolver::{BusinessTypeSource, IdentityResolver, ResolverOptions, ResolverSnapshot};
pub use scope::ScopeProvider;
