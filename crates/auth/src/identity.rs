//! Actor identity as seen by the access-control core.

use serde::{Deserialize, Serialize};

use posgate_core::{BranchId, BusinessId, UserId};

use crate::{Role, RoleAssignment};

/// Authentication lifecycle of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No session.
    #[default]
    Unauthenticated,
    /// A session exists but the profile has not loaded (or failed to load).
    Authenticating,
    /// Session and profile are both resolved.
    Authenticated,
}

impl AuthState {
    /// Both `Authenticating` and `Authenticated` count as signed in.
    pub fn is_authenticated(self) -> bool {
        !matches!(self, AuthState::Unauthenticated)
    }

    pub fn is_pending(self) -> bool {
        matches!(self, AuthState::Authenticating)
    }
}

/// The resolved identity of the current actor.
///
/// Every field is optional so a pending profile is representable; a fully
/// cleared identity equals `ActorIdentity::default()`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorIdentity {
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    pub primary_role: Option<Role>,
    pub secondary_roles: Vec<RoleAssignment>,
    pub branch_id: Option<BranchId>,
    pub business_id: Option<BusinessId>,
}

impl ActorIdentity {
    /// Identity known only from a session (profile still pending).
    pub fn from_session(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn is_cleared(&self) -> bool {
        *self == Self::default()
    }

    /// Active secondary grants only.
    pub fn active_assignments(&self) -> impl Iterator<Item = &RoleAssignment> {
        self.secondary_roles.iter().filter(|a| a.is_active)
    }
}
