//! Role evaluation over a resolved [`ActorIdentity`].
//!
//! - No IO
//! - No panics
//! - No state beyond the inputs

use serde::Serialize;

use posgate_core::BranchId;

use crate::{ActorIdentity, BranchScope, Role, RoleHierarchy};

/// Does `identity` hold `role`, optionally within `branch`?
///
/// The primary role is global: the branch argument is not checked against it.
/// Secondary grants must be active, and scoped grants only cover their branch.
pub fn has_role(identity: &ActorIdentity, role: &Role, branch: Option<&BranchId>) -> bool {
    if identity.primary_role.as_ref() == Some(role) {
        return true;
    }

    identity
        .secondary_roles
        .iter()
        .any(|assignment| assignment.grants(role, branch))
}

/// Whether the actor holds either of the hierarchy's super roles.
pub fn is_super(identity: &ActorIdentity, hierarchy: &RoleHierarchy) -> bool {
    super_role_held(identity, hierarchy).is_some()
}

fn super_role_held(identity: &ActorIdentity, hierarchy: &RoleHierarchy) -> Option<Role> {
    hierarchy
        .super_roles()
        .into_iter()
        .find(|role| has_role(identity, role, None))
        .cloned()
}

/// Roles the actor may hand out to a new employee.
///
/// Uses the actor's primary role; an actor without one may assign nothing.
pub fn assignable_roles(identity: &ActorIdentity, hierarchy: &RoleHierarchy) -> Vec<Role> {
    match &identity.primary_role {
        Some(role) => hierarchy
            .assignable_roles(role)
            .into_iter()
            .map(|entry| entry.name.clone())
            .collect(),
        None => Vec::new(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// How a role check was satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum GrantSource {
    Primary { role: Role },
    Secondary { role: Role, scope: BranchScope },
    SuperBypass { role: Role },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleDenialKind {
    MissingRole,
    WrongBranch,
}

/// Detailed explanation of a role decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDecision {
    pub allowed_roles: Vec<Role>,
    pub required_branch: Option<BranchId>,
    pub granted: bool,
    pub grant: Option<GrantSource>,
    pub denial: Option<RoleDenialKind>,
    /// Human-readable reason for the decision.
    pub reason: String,
}

/// Explain whether `identity` passes a role check for `allowed` within
/// `required_branch`.
///
/// Super roles bypass both the role set and the branch match. Otherwise the
/// actor needs one allowed role (in the required branch) and its home branch
/// must equal the required branch.
pub fn explain_role_decision(
    identity: &ActorIdentity,
    hierarchy: &RoleHierarchy,
    allowed: &[Role],
    required_branch: Option<&BranchId>,
) -> RoleDecision {
    let decision = |granted, grant, denial, reason: String| RoleDecision {
        allowed_roles: allowed.to_vec(),
        required_branch: required_branch.cloned(),
        granted,
        grant,
        denial,
        reason,
    };

    if let Some(role) = super_role_held(identity, hierarchy) {
        let reason = format!("'{role}' is a super role and bypasses role and branch checks");
        return decision(true, Some(GrantSource::SuperBypass { role }), None, reason);
    }

    let Some(grant) = find_grant(identity, allowed, required_branch) else {
        let held: Vec<&str> = identity
            .primary_role
            .iter()
            .chain(identity.active_assignments().map(|a| &a.role))
            .map(|r| r.as_str())
            .collect();
        let reason = format!("none of {allowed:?} is held (held: {held:?})");
        return decision(false, None, Some(RoleDenialKind::MissingRole), reason);
    };

    if let Some(required) = required_branch {
        if identity.branch_id.as_ref() != Some(required) {
            let reason = match &identity.branch_id {
                Some(own) => format!("actor belongs to branch '{own}', not '{required}'"),
                None => format!("actor has no home branch, '{required}' required"),
            };
            return decision(false, Some(grant), Some(RoleDenialKind::WrongBranch), reason);
        }
    }

    let reason = match &grant {
        GrantSource::Primary { role } => format!("primary role '{role}' is allowed"),
        GrantSource::Secondary { role, .. } => format!("secondary role '{role}' is allowed"),
        GrantSource::SuperBypass { role } => format!("'{role}' is a super role"),
    };
    decision(true, Some(grant), None, reason)
}

fn find_grant(
    identity: &ActorIdentity,
    allowed: &[Role],
    branch: Option<&BranchId>,
) -> Option<GrantSource> {
    if let Some(primary) = &identity.primary_role {
        if allowed.contains(primary) {
            return Some(GrantSource::Primary {
                role: primary.clone(),
            });
        }
    }

    allowed.iter().find_map(|role| {
        identity
            .secondary_roles
            .iter()
            .find(|a| a.grants(role, branch))
            .map(|a| GrantSource::Secondary {
                role: a.role.clone(),
                scope: a.scope.clone(),
            })
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
