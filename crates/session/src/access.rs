//! Session-scoped access-control state handed to screens.
//!
//! `AccessControl` wires the resolver to the scope provider and produces
//! owned snapshots that guards evaluate against.

use std::sync::Arc;

use tokio::sync::mpsc;

use posgate_auth::{
    AccessContext, ActorIdentity, AuthState, Branch, BusinessType, Guard, GuardOutcome, Locations,
    RoleHierarchy,
};

use crate::error::SessionResult;
use crate::ports::{AuthProvider, ProfileDirectory, Session, SessionStore};
use crate::resolver::IdentityResolver;
use crate::scope::ScopeProvider;

/// Everything guards need, captured at one instant.
#[derive(Debug, Clone)]
pub struct AccessSnapshot {
    pub auth_state: AuthState,
    pub identity: ActorIdentity,
    pub hierarchy: RoleHierarchy,
    pub business_type: Option<BusinessType>,
    pub selected_branch: Option<Branch>,
    pub locations: Locations,
}

impl AccessSnapshot {
    pub fn context<'a>(&'a self, location: &'a str) -> AccessContext<'a> {
        AccessContext {
            auth_state: self.auth_state,
            identity: &self.identity,
            hierarchy: &self.hierarchy,
            business_type: self.business_type.as_ref(),
            locations: &self.locations,
            location,
        }
    }

    pub fn check(&self, guard: &dyn Guard, location: &str) -> GuardOutcome {
        guard.check(&self.context(location))
    }
}

pub struct AccessControl<A, D, S> {
    resolver: Arc<IdentityResolver<A, D, S>>,
    scope: Arc<ScopeProvider<D, S>>,
    locations: Locations,
}

impl<A, D, S> AccessControl<A, D, S>
where
    A: AuthProvider,
    D: ProfileDirectory,
    S: SessionStore,
{
    pub fn new(
        resolver: Arc<IdentityResolver<A, D, S>>,
        scope: Arc<ScopeProvider<D, S>>,
        locations: Locations,
    ) -> Self {
        Self {
            resolver,
            scope,
            locations,
        }
    }

    pub fn resolver(&self) -> &IdentityResolver<A, D, S> {
        &self.resolver
    }

    pub fn scope(&self) -> &ScopeProvider<D, S> {
        &self.scope
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    /// Load both catalogs and resolve the current session.
    pub async fn start(&self) {
        self.resolver.load_role_catalog().await;
        self.scope.load_catalog().await;
        self.resolver
            .set_business_type_catalog(self.scope.business_type_catalog());
        self.resolver.restore().await;
        self.refresh_scope().await;
    }

    /// Apply one session change and bring the scope in line with it.
    pub async fn on_session_change(&self, session: Option<Session>) {
        self.resolver.resolve_from_session(session).await;
        self.refresh_scope().await;
    }

    /// Apply session changes in delivery order, refreshing the scope after
    /// each one, until the sender is dropped.
    pub async fn listen(&self, mut changes: mpsc::Receiver<Option<Session>>) {
        while let Some(session) = changes.recv().await {
            self.on_session_change(session).await;
        }
        tracing::debug!("session change stream closed");
    }

    pub async fn login(&self, email: &str) -> SessionResult<()> {
        self.resolver.login(email).await
    }

    pub async fn demo_login(&self, email: &str) -> SessionResult<()> {
        self.resolver.demo_login(email).await?;
        self.refresh_scope().await;
        Ok(())
    }

    pub async fn logout(&self) {
        self.resolver.logout().await;
        self.scope.clear();
    }

    /// Re-derive business type and branches from the current identity.
    pub async fn refresh_scope(&self) {
        let snapshot = self.resolver.snapshot();
        self.scope.set_business_type_id(snapshot.business_type_id);
        if snapshot.auth_state.is_authenticated() {
            self.scope
                .load_branches(
                    snapshot.identity.business_id.as_ref(),
                    snapshot.identity.branch_id.as_ref(),
                )
                .await;
        } else {
            self.scope.clear();
        }
    }

    pub fn snapshot(&self) -> AccessSnapshot {
        let resolved = self.resolver.snapshot();
        AccessSnapshot {
            auth_state: resolved.auth_state,
            identity: resolved.identity,
            hierarchy: self.resolver.hierarchy(),
            business_type: self.scope.selected_business_type(),
            selected_branch: self.scope.selected_branch(),
            locations: self.locations.clone(),
        }
    }

    /// Evaluate `guard` for `location` against the current state.
    pub fn check(&self, guard: &dyn Guard, location: &str) -> GuardOutcome {
        self.snapshot().check(guard, location)
    }
}
