//! Route guards.
//!
//! Each guard is a pure decision over an [`AccessContext`]. Denials are values,
//! never errors: a guard either renders, waits for a pending profile, redirects,
//! or produces an inline [`DenialPanel`].

use serde::{Deserialize, Serialize};

use posgate_core::BranchId;

use crate::authorize::{RoleDenialKind, explain_role_decision};
use crate::{ActorIdentity, AuthState, BusinessType, BusinessTypeId, Role, RoleHierarchy};

/// Well-known locations guards redirect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locations {
    pub login: String,
    pub dashboard: String,
}

impl Default for Locations {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            dashboard: "/".to_string(),
        }
    }
}

/// Everything a guard may consult for one navigation.
#[derive(Debug, Clone, Copy)]
pub struct AccessContext<'a> {
    pub auth_state: AuthState,
    pub identity: &'a ActorIdentity,
    pub hierarchy: &'a RoleHierarchy,
    pub business_type: Option<&'a BusinessType>,
    pub locations: &'a Locations,
    /// Location currently being displayed.
    pub location: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    SignInRequired,
    AccessRestricted,
    WrongBranch,
    BusinessNotSelected,
    NotAvailableForBusinessType,
}

/// Inline "access denied" presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialPanel {
    pub kind: DenialKind,
    pub message: String,
    /// Optional way out (e.g. back to the dashboard).
    pub link: Option<String>,
}

impl DenialPanel {
    pub fn new(kind: DenialKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Result of evaluating a guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GuardOutcome {
    /// Show the wrapped view.
    Render,
    /// Profile still loading; show a loading affordance.
    Pending,
    /// Navigate elsewhere. `panel` is what to show instead if the redirect
    /// cannot be followed without looping.
    Redirect { to: String, panel: DenialPanel },
    /// Show an inline denial.
    Denied { panel: DenialPanel },
}

impl GuardOutcome {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardOutcome::Render)
    }
}

/// A navigation gate.
pub trait Guard: Send + Sync {
    fn check(&self, ctx: &AccessContext<'_>) -> GuardOutcome;
}

fn redirect_to_login(ctx: &AccessContext<'_>) -> GuardOutcome {
    GuardOutcome::Redirect {
        to: ctx.locations.login.clone(),
        panel: DenialPanel::new(DenialKind::SignInRequired, "Please sign in to continue.")
            .with_link(ctx.locations.login.clone()),
    }
}

/// Permits the wrapped view only for signed-in actors.
#[derive(Debug, Clone, Default)]
pub struct AuthGuard;

impl Guard for AuthGuard {
    fn check(&self, ctx: &AccessContext<'_>) -> GuardOutcome {
        if ctx.auth_state.is_authenticated() {
            GuardOutcome::Render
        } else {
            redirect_to_login(ctx)
        }
    }
}

/// Permits actors holding one of `allowed` (optionally within a branch).
///
/// Super roles always pass. Denials redirect to the fallback location unless
/// the actor is already there, in which case an inline panel is shown.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    allowed: Vec<Role>,
    required_branch: Option<BranchId>,
    fallback: Option<String>,
}

impl RoleGuard {
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            required_branch: None,
            fallback: None,
        }
    }

    pub fn in_branch(mut self, branch_id: BranchId) -> Self {
        self.required_branch = Some(branch_id);
        self
    }

    /// Defaults to the dashboard location.
    pub fn with_fallback(mut self, location: impl Into<String>) -> Self {
        self.fallback = Some(location.into());
        self
    }

    fn deny(&self, ctx: &AccessContext<'_>, panel: DenialPanel) -> GuardOutcome {
        if ctx.auth_state.is_pending() {
            return GuardOutcome::Pending;
        }

        let fallback = self
            .fallback
            .clone()
            .unwrap_or_else(|| ctx.locations.dashboard.clone());

        tracing::debug!(
            location = ctx.location,
            fallback = %fallback,
            kind = ?panel.kind,
            "role guard denied navigation"
        );

        if ctx.location == fallback {
            GuardOutcome::Denied { panel }
        } else {
            GuardOutcome::Redirect { to: fallback, panel }
        }
    }
}

impl Guard for RoleGuard {
    fn check(&self, ctx: &AccessContext<'_>) -> GuardOutcome {
        if !ctx.auth_state.is_authenticated() {
            return redirect_to_login(ctx);
        }

        let decision = explain_role_decision(
            ctx.identity,
            ctx.hierarchy,
            &self.allowed,
            self.required_branch.as_ref(),
        );

        match decision.denial {
            None => GuardOutcome::Render,
            Some(RoleDenialKind::MissingRole) => self.deny(
                ctx,
                DenialPanel::new(
                    DenialKind::AccessRestricted,
                    "You do not have permission to view this page.",
                ),
            ),
            Some(RoleDenialKind::WrongBranch) => self.deny(
                ctx,
                DenialPanel::new(
                    DenialKind::WrongBranch,
                    "This page belongs to a different branch.",
                ),
            ),
        }
    }
}

/// Permits the wrapped view only for the listed business verticals.
#[derive(Debug, Clone)]
pub struct BusinessTypeGuard {
    allowed: Vec<BusinessTypeId>,
}

impl BusinessTypeGuard {
    pub fn new(allowed: impl IntoIterator<Item = BusinessTypeId>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl Guard for BusinessTypeGuard {
    fn check(&self, ctx: &AccessContext<'_>) -> GuardOutcome {
        let Some(selected) = ctx.business_type else {
            return GuardOutcome::Denied {
                panel: DenialPanel::new(
                    DenialKind::BusinessNotSelected,
                    "Select a business before opening this page.",
                ),
            };
        };

        if self.allowed.contains(&selected.id) {
            return GuardOutcome::Render;
        }

        if crate::is_super(ctx.identity, ctx.hierarchy) {
            return GuardOutcome::Render;
        }

        GuardOutcome::Denied {
            panel: DenialPanel::new(
                DenialKind::NotAvailableForBusinessType,
                format!("This page is not available for {} businesses.", selected.name),
            )
            .with_link(ctx.locations.dashboard.clone()),
        }
    }
}

/// Guards evaluated in order; the first non-render outcome wins.
#[derive(Default)]
pub struct GuardStack {
    guards: Vec<Box<dyn Guard>>,
}

impl GuardStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl Guard for GuardStack {
    fn check(&self, ctx: &AccessContext<'_>) -> GuardOutcome {
        for guard in &self.guards {
            let outcome = guard.check(ctx);
            if !outcome.is_render() {
                return outcome;
            }
        }
        GuardOutcome::Render
    }
}

impl core::fmt::Debug for GuardStack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GuardStack")
            .field("guards", &self.guards.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
