use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use posgate_auth::{BranchRow, BusinessType, RoleCatalogEntry};
use posgate_core::{BusinessId, UserId};
use posgate_session::{
    AuthProvider, BusinessRow, ProfileDirectory, ProfileRow, RoleAssignmentRow, Session,
    SessionError, SessionResult,
};

/// Calls that should fail with a backend error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformFailures {
    pub current_session: bool,
    pub sign_in: bool,
    pub sign_out: bool,
    pub profiles: bool,
    pub role_assignments: bool,
    pub businesses: bool,
    pub branches: bool,
    pub catalogs: bool,
}

#[derive(Debug, Default)]
struct PlatformData {
    session: Option<Session>,
    profiles: HashMap<UserId, ProfileRow>,
    assignments: Vec<RoleAssignmentRow>,
    businesses: HashMap<BusinessId, BusinessRow>,
    branches: Vec<BranchRow>,
    role_catalog: Vec<RoleCatalogEntry>,
    business_types: Vec<BusinessType>,
    sign_in_requests: Vec<String>,
    failures: PlatformFailures,
}

/// In-memory backing platform.
///
/// Intended for tests/dev. Session changes are pushed to the channel returned
/// by [`InMemoryPlatform::subscribe`] in the order they happen.
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    data: RwLock<PlatformData>,
    changes: Mutex<Option<mpsc::Sender<Option<Session>>>>,
    profile_gate: Mutex<Option<Arc<Notify>>>,
    profile_fetch_started: Notify,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Seeding
    // ─────────────────────────────────────────────────────────────────────────

    pub fn insert_profile(&self, profile: ProfileRow) {
        self.write(|data| {
            data.profiles.insert(profile.user_id.clone(), profile);
        });
    }

    pub fn insert_role_assignment(&self, row: RoleAssignmentRow) {
        self.write(|data| data.assignments.push(row));
    }

    pub fn insert_business(&self, business: BusinessRow) {
        self.write(|data| {
            data.businesses.insert(business.id.clone(), business);
        });
    }

    pub fn insert_branch(&self, branch: BranchRow) {
        self.write(|data| data.branches.push(branch));
    }

    pub fn set_role_catalog(&self, catalog: Vec<RoleCatalogEntry>) {
        self.write(|data| data.role_catalog = catalog);
    }

    pub fn set_business_type_catalog(&self, catalog: Vec<BusinessType>) {
        self.write(|data| data.business_types = catalog);
    }

    pub fn set_failures(&self, failures: PlatformFailures) {
        self.write(|data| data.failures = failures);
    }

    /// Emails passwordless sign-in was requested for.
    pub fn sign_in_requests(&self) -> Vec<String> {
        self.read(|data| data.sign_in_requests.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session control
    // ─────────────────────────────────────────────────────────────────────────

    /// Channel of session changes. Replaces any previous subscriber.
    pub fn subscribe(&self) -> mpsc::Receiver<Option<Session>> {
        let (tx, rx) = mpsc::channel(16);
        *self
            .changes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(tx);
        rx
    }

    /// Drop the subscriber's sender so its stream ends after buffered changes.
    pub fn unsubscribe(&self) {
        *self
            .changes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// Complete a sign-in (as the magic link would) and announce it.
    pub fn complete_sign_in(&self, session: Session) {
        self.write(|data| data.session = Some(session.clone()));
        self.announce(Some(session));
    }

    fn announce(&self, change: Option<Session>) {
        let sender = self
            .changes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some(sender) = sender {
            if let Err(err) = sender.try_send(change) {
                tracing::warn!(error = %err, "dropped session change notification");
            }
        }
    }

    /// Hold every profile-by-id fetch until the returned gate is notified.
    pub fn hold_profile_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self
            .profile_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(gate.clone());
        gate
    }

    /// Resolves once a held profile fetch has started.
    pub async fn profile_fetch_started(&self) {
        self.profile_fetch_started.notified().await;
    }

    fn profile_gate(&self) -> Option<Arc<Notify>> {
        self.profile_gate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn read<T>(&self, f: impl FnOnce(&PlatformData) -> T) -> T {
        let data = self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&data)
    }

    fn write<T>(&self, f: impl FnOnce(&mut PlatformData) -> T) -> T {
        let mut data = self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut data)
    }

    fn check(
        &self,
        failing: impl FnOnce(&PlatformFailures) -> bool,
        what: &str,
    ) -> SessionResult<()> {
        if self.read(|data| failing(&data.failures)) {
            Err(SessionError::backend(format!("{what} unavailable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AuthProvider for InMemoryPlatform {
    async fn current_session(&self) -> SessionResult<Option<Session>> {
        self.check(|f| f.current_session, "session")?;
        Ok(self.read(|data| data.session.clone()))
    }

    async fn sign_out(&self) -> SessionResult<()> {
        self.check(|f| f.sign_out, "sign-out")?;
        let had_session = self.write(|data| data.session.take().is_some());
        if had_session {
            self.announce(None);
        }
        Ok(())
    }

    async fn sign_in_passwordless(&self, email: &str) -> SessionResult<()> {
        self.check(|f| f.sign_in, "sign-in")?;
        self.write(|data| data.sign_in_requests.push(email.to_string()));
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryPlatform {
    async fn profile_by_user_id(&self, user_id: &UserId) -> SessionResult<Option<ProfileRow>> {
        if let Some(gate) = self.profile_gate() {
            self.profile_fetch_started.notify_one();
            gate.notified().await;
        }
        self.check(|f| f.profiles, "profiles")?;
        Ok(self.read(|data| data.profiles.get(user_id).cloned()))
    }

    async fn profile_by_email(&self, email: &str) -> SessionResult<Option<ProfileRow>> {
        self.check(|f| f.profiles, "profiles")?;
        Ok(self.read(|data| {
            data.profiles
                .values()
                .find(|p| p.email.eq_ignore_ascii_case(email))
                .cloned()
        }))
    }

    async fn active_role_assignments(
        &self,
        user_id: &UserId,
    ) -> SessionResult<Vec<RoleAssignmentRow>> {
        self.check(|f| f.role_assignments, "role assignments")?;
        Ok(self.read(|data| {
            data.assignments
                .iter()
                .filter(|row| &row.user_id == user_id && row.is_active)
                .cloned()
                .collect()
        }))
    }

    async fn business_by_id(&self, business_id: &BusinessId) -> SessionResult<Option<BusinessRow>> {
        self.check(|f| f.businesses, "businesses")?;
        Ok(self.read(|data| data.businesses.get(business_id).cloned()))
    }

    async fn branches_by_business(
        &self,
        business_id: &BusinessId,
    ) -> SessionResult<Vec<BranchRow>> {
        self.check(|f| f.branches, "branches")?;
        Ok(self.read(|data| {
            data.branches
                .iter()
                .filter(|row| row.business_id.as_ref() == Some(business_id))
                .cloned()
                .collect()
        }))
    }

    async fn role_catalog(&self) -> SessionResult<Vec<RoleCatalogEntry>> {
        self.check(|f| f.catalogs, "role catalog")?;
        Ok(self.read(|data| data.role_catalog.clone()))
    }

    async fn business_type_catalog(&self) -> SessionResult<Vec<BusinessType>> {
        self.check(|f| f.catalogs, "business-type catalog")?;
        Ok(self.read(|data| data.business_types.clone()))
    }
}
