//! `posgate-auth`: pure access-control decisions.
//!
//! Role evaluation, business-type gating and route guards over an already
//! resolved identity. This crate is intentionally decoupled from sessions,
//! storage and async runtimes.

pub mod assignment;
pub mod authorize;
pub mod branch;
pub mod business;
pub mod guard;
pub mod identity;
pub mod navigation;
pub mod roles;

pub use assignment::{BranchScope, RoleAssignment};
pub use authorize::{
    GrantSource, RoleDecision, RoleDenialKind, assignable_roles, explain_role_decision, has_role,
    is_super,
};
pub use branch::{Branch, BranchRow, select_initial_branch};
pub use business::{
    BusinessType, BusinessTypeId, default_catalog, guess_business_type_from_email,
    resolve_business_type,
};
pub use guard::{
    AccessContext, AuthGuard, BusinessTypeGuard, DenialKind, DenialPanel, Guard, GuardOutcome,
    GuardStack, Locations, RoleGuard,
};
pub use identity::{ActorIdentity, AuthState};
pub use navigation::{Navigation, NavigationState};
pub use roles::{Role, RoleCatalogEntry, RoleHierarchy, get_role_hierarchy_level};
