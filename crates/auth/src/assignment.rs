use serde::{Deserialize, Serialize};

use posgate_core::BranchId;

use crate::Role;

/// Branch restriction of a secondary role grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "branch_id", rename_all = "snake_case")]
pub enum BranchScope {
    /// The grant applies in every branch of the actor's business.
    Unrestricted,
    /// The grant applies in one branch only.
    ScopedTo(BranchId),
}

impl BranchScope {
    /// Map the nullable branch column of an assignment row.
    pub fn from_nullable(branch_id: Option<BranchId>) -> Self {
        match branch_id {
            Some(id) => Self::ScopedTo(id),
            None => Self::Unrestricted,
        }
    }

    /// Whether a grant with this scope covers `requested`.
    ///
    /// `None` means the caller asked without a branch, which every scope covers.
    pub fn covers(&self, requested: Option<&BranchId>) -> bool {
        match (self, requested) {
            (_, None) => true,
            (BranchScope::Unrestricted, Some(_)) => true,
            (BranchScope::ScopedTo(own), Some(requested)) => own == requested,
        }
    }
}

/// A secondary role grant.
///
/// An inactive assignment never grants access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: Role,
    pub scope: BranchScope,
    pub is_active: bool,
}

impl RoleAssignment {
    pub fn unrestricted(role: Role) -> Self {
        Self {
            role,
            scope: BranchScope::Unrestricted,
            is_active: true,
        }
    }

    pub fn scoped(role: Role, branch_id: BranchId) -> Self {
        Self {
            role,
            scope: BranchScope::ScopedTo(branch_id),
            is_active: true,
        }
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn grants(&self, role: &Role, requested: Option<&BranchId>) -> bool {
        self.is_active && &self.role == role && self.scope.covers(requested)
    }
}
