//! Identity resolution: session → actor identity.
//!
//! The resolver is the single writer of the actor identity. Every session
//! change bumps a generation counter; profile fetches carry the generation
//! they were dispatched under and are discarded if it has moved on.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use posgate_auth::{
    ActorIdentity, AuthState, BusinessType, BusinessTypeId, Role, RoleAssignment, RoleHierarchy,
    default_catalog, guess_business_type_from_email,
};
use posgate_core::{BranchId, BusinessId, UserId};

use crate::error::{SessionError, SessionResult};
use crate::ports::{AuthProvider, ProfileDirectory, ProfileRow, Session, SessionStore};
use crate::record::SessionRecord;

/// Knobs for the synthetic identity used by `demo_login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    pub demo_branch: BranchId,
    pub demo_role: Role,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            demo_branch: BranchId::new("demo-branch"),
            demo_role: Role::MANAGER,
        }
    }
}

/// Where the current business-type id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessTypeSource {
    #[default]
    Unknown,
    /// Guessed from the email text while the profile loads.
    EmailGuess,
    /// Restored from the session-continuity record.
    SessionRecord,
    /// Read from the actor's business row.
    Profile,
}

/// Point-in-time copy of the resolver state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResolverSnapshot {
    pub auth_state: AuthState,
    pub identity: ActorIdentity,
    pub business_type_id: Option<BusinessTypeId>,
    pub business_type_source: BusinessTypeSource,
    pub generation: u64,
}

impl ResolverSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.auth_state.is_authenticated()
    }
}

pub struct IdentityResolver<A, D, S> {
    auth: A,
    directory: D,
    store: S,
    options: ResolverOptions,
    catalog: RwLock<Vec<BusinessType>>,
    hierarchy: RwLock<RoleHierarchy>,
    state: RwLock<ResolverSnapshot>,
}

impl<A, D, S> IdentityResolver<A, D, S>
where
    A: AuthProvider,
    D: ProfileDirectory,
    S: SessionStore,
{
    pub fn new(auth: A, directory: D, store: S) -> Self {
        Self::with_options(auth, directory, store, ResolverOptions::default())
    }

    pub fn with_options(auth: A, directory: D, store: S, options: ResolverOptions) -> Self {
        Self {
            auth,
            directory,
            store,
            options,
            catalog: RwLock::new(default_catalog()),
            hierarchy: RwLock::new(RoleHierarchy::default()),
            state: RwLock::new(ResolverSnapshot::default()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Readers
    // ─────────────────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> ResolverSnapshot {
        self.read_state().clone()
    }

    pub fn auth_state(&self) -> AuthState {
        self.read_state().auth_state
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_state().is_authenticated()
    }

    pub fn identity(&self) -> ActorIdentity {
        self.read_state().identity.clone()
    }

    pub fn business_type_id(&self) -> Option<BusinessTypeId> {
        self.read_state().business_type_id.clone()
    }

    pub fn hierarchy(&self) -> RoleHierarchy {
        self.hierarchy
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn has_role(&self, role: &Role, branch: Option<&BranchId>) -> bool {
        posgate_auth::has_role(&self.read_state().identity, role, branch)
    }

    pub fn is_super(&self) -> bool {
        posgate_auth::is_super(&self.read_state().identity, &self.hierarchy())
    }

    /// Replace the catalog used for email-based business-type guesses.
    pub fn set_business_type_catalog(&self, catalog: Vec<BusinessType>) {
        *self
            .catalog
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = catalog;
    }

    /// Load the remote role catalog; keeps the current hierarchy on failure.
    pub async fn load_role_catalog(&self) {
        match self.directory.role_catalog().await {
            Ok(entries) if entries.is_empty() => {
                tracing::warn!("role catalog is empty; keeping current hierarchy");
            }
            Ok(entries) => {
                *self
                    .hierarchy
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = RoleHierarchy::new(entries);
            }
            Err(err) => tracing::warn!(error = %err, "failed to load role catalog"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session changes
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve the session the auth provider currently holds.
    ///
    /// Provider failures are logged and leave the current state untouched.
    pub async fn restore(&self) {
        match self.auth.current_session().await {
            Ok(session) => self.resolve_from_session(session).await,
            Err(err) => tracing::warn!(error = %err, "failed to read current session"),
        }
    }

    /// Apply session changes in delivery order until the sender is dropped.
    ///
    /// Identity only; `AccessControl::listen` also keeps the scope in step.
    pub async fn listen(&self, mut changes: mpsc::Receiver<Option<Session>>) {
        while let Some(session) = changes.recv().await {
            self.resolve_from_session(session).await;
        }
        tracing::debug!("session change stream closed");
    }

    pub async fn resolve_from_session(&self, session: Option<Session>) {
        match session {
            Some(session) => {
                let guess = self.guess_business_type(&session.email);
                let source = if guess.is_some() {
                    BusinessTypeSource::EmailGuess
                } else {
                    BusinessTypeSource::Unknown
                };
                let generation = self.replace_state(
                    AuthState::Authenticating,
                    ActorIdentity::from_session(session.user_id.clone(), session.email.clone()),
                    guess,
                    source,
                );
                tracing::info!(
                    user_id = %session.user_id,
                    generation,
                    "session established; loading profile"
                );
                self.fetch_profile_tagged(&session.user_id, generation).await;
            }
            None => self.restore_from_record(),
        }
    }

    fn restore_from_record(&self) {
        match self.store.load() {
            Ok(Some(record)) if record.is_authenticated => {
                let identity = ActorIdentity {
                    email: record.email.clone(),
                    branch_id: record.branch_id.clone(),
                    ..Default::default()
                };
                let source = if record.business_type_id.is_some() {
                    BusinessTypeSource::SessionRecord
                } else {
                    BusinessTypeSource::Unknown
                };
                let generation = self.replace_state(
                    AuthState::Authenticated,
                    identity,
                    record.business_type_id,
                    source,
                );
                tracing::info!(generation, "restored session from local record");
            }
            Ok(_) => {
                self.replace_state(
                    AuthState::Unauthenticated,
                    ActorIdentity::default(),
                    None,
                    BusinessTypeSource::Unknown,
                );
            }
            Err(err) => tracing::warn!(error = %err, "failed to read session record"),
        }
    }

    /// Load profile and role assignments for `user_id` under the current
    /// generation.
    pub async fn fetch_profile_and_roles(&self, user_id: &UserId) {
        let generation = self.read_state().generation;
        self.fetch_profile_tagged(user_id, generation).await;
    }

    async fn fetch_profile_tagged(&self, user_id: &UserId, generation: u64) {
        let (profile, assignments) = tokio::join!(
            self.directory.profile_by_user_id(user_id),
            self.directory.active_role_assignments(user_id),
        );

        let profile = match profile {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!(user_id = %user_id, "no profile row for user");
                return;
            }
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "failed to load profile");
                return;
            }
        };

        let assignments = match assignments {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "failed to load role assignments");
                return;
            }
        };

        let business_type = self.lookup_business_type(profile.business_id.as_ref()).await;
        let secondary_roles = assignments.into_iter().map(RoleAssignment::from).collect();

        let applied = self.apply_if_current(generation, |state| {
            state.auth_state = AuthState::Authenticated;
            state.identity = identity_from_profile(profile, secondary_roles);
            state.business_type_source = if business_type.is_some() {
                BusinessTypeSource::Profile
            } else {
                BusinessTypeSource::Unknown
            };
            state.business_type_id = business_type;
        });

        if applied {
            tracing::info!(user_id = %user_id, generation, "profile loaded");
        }
    }

    async fn lookup_business_type(
        &self,
        business_id: Option<&BusinessId>,
    ) -> Option<BusinessTypeId> {
        let business_id = business_id?;
        match self.directory.business_by_id(business_id).await {
            Ok(Some(business)) => business.business_type,
            Ok(None) => {
                tracing::warn!(business_id = %business_id, "business row not found");
                None
            }
            Err(err) => {
                tracing::warn!(business_id = %business_id, error = %err, "failed to load business");
                None
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User actions
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a passwordless sign-in. Identity changes arrive later through the
    /// session-change stream.
    pub async fn login(&self, email: &str) -> SessionResult<()> {
        let email = normalize_email(email)?;
        self.auth
            .sign_in_passwordless(&email)
            .await
            .inspect_err(|err| tracing::warn!(email = %email, error = %err, "sign-in failed"))
    }

    /// Sign in without the auth provider.
    ///
    /// Hydrates from an existing profile when there is one, otherwise
    /// synthesizes an identity on the demo branch, then persists the session
    /// record. If the profile or its roles cannot be fetched the actor stays
    /// `Authenticating` with only the email and nothing is persisted.
    pub async fn demo_login(&self, email: &str) -> SessionResult<()> {
        let email = normalize_email(email)?;
        let guess = self.guess_business_type(&email);
        let generation = self.replace_state(
            AuthState::Authenticating,
            ActorIdentity {
                email: Some(email.clone()),
                ..Default::default()
            },
            guess.clone(),
            BusinessTypeSource::EmailGuess,
        );

        // A failed lookup leaves the actor pending; only a confirmed miss
        // synthesizes an identity.
        let profile = match self.directory.profile_by_email(&email).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(email = %email, error = %err, "demo profile lookup failed");
                return Ok(());
            }
        };

        let (identity, business_type, source) = match profile {
            Some(profile) => {
                let rows = match self
                    .directory
                    .active_role_assignments(&profile.user_id)
                    .await
                {
                    Ok(rows) => rows,
                    Err(err) => {
                        tracing::warn!(
                            email = %email,
                            error = %err,
                            "failed to load role assignments"
                        );
                        return Ok(());
                    }
                };
                let secondary_roles = rows.into_iter().map(RoleAssignment::from).collect();
                let business_type = self.lookup_business_type(profile.business_id.as_ref()).await;
                let source = if business_type.is_some() {
                    BusinessTypeSource::Profile
                } else {
                    BusinessTypeSource::Unknown
                };
                (identity_from_profile(profile, secondary_roles), business_type, source)
            }
            None => {
                tracing::info!(email = %email, "no profile; using synthetic demo identity");
                let identity = ActorIdentity {
                    user_id: Some(UserId::new(Uuid::now_v7().to_string())),
                    email: Some(email.clone()),
                    primary_role: Some(self.options.demo_role.clone()),
                    secondary_roles: Vec::new(),
                    branch_id: Some(self.options.demo_branch.clone()),
                    business_id: None,
                };
                (identity, guess, BusinessTypeSource::EmailGuess)
            }
        };

        let record = SessionRecord {
            is_authenticated: true,
            email: Some(email.clone()),
            business_type_id: business_type.clone(),
            branch_id: identity.branch_id.clone(),
            saved_at: None,
        }
        .stamped(Utc::now());

        let applied = self.apply_if_current(generation, |state| {
            state.auth_state = AuthState::Authenticated;
            state.identity = identity;
            state.business_type_id = business_type;
            state.business_type_source = source;
        });

        if applied {
            if let Err(err) = self.store.save(&record) {
                tracing::warn!(error = %err, "failed to persist session record");
            }
        }
        Ok(())
    }

    /// End the session and clear every identity field. Idempotent.
    pub async fn logout(&self) {
        let generation = self.replace_state(
            AuthState::Unauthenticated,
            ActorIdentity::default(),
            None,
            BusinessTypeSource::Unknown,
        );

        if let Err(err) = self.auth.sign_out().await {
            tracing::warn!(error = %err, "remote sign-out failed");
        }
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to clear session record");
        }
        tracing::info!(generation, "signed out");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn guess_business_type(&self, email: &str) -> Option<BusinessTypeId> {
        let catalog = self
            .catalog
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guess_business_type_from_email(email, &catalog)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ResolverSnapshot> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ResolverSnapshot> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new generation with the given state; returns the generation.
    fn replace_state(
        &self,
        auth_state: AuthState,
        identity: ActorIdentity,
        business_type_id: Option<BusinessTypeId>,
        business_type_source: BusinessTypeSource,
    ) -> u64 {
        let mut state = self.write_state();
        let generation = state.generation + 1;
        *state = ResolverSnapshot {
            auth_state,
            identity,
            business_type_id,
            business_type_source,
            generation,
        };
        generation
    }

    fn apply_if_current(&self, generation: u64, apply: impl FnOnce(&mut ResolverSnapshot)) -> bool {
        let mut state = self.write_state();
        if state.generation != generation {
            tracing::debug!(
                dispatched = generation,
                current = state.generation,
                "discarding stale profile result"
            );
            return false;
        }
        apply(&mut state);
        true
    }
}

fn identity_from_profile(
    profile: ProfileRow,
    secondary_roles: Vec<RoleAssignment>,
) -> ActorIdentity {
    ActorIdentity {
        user_id: Some(profile.user_id),
        email: Some(profile.email),
        primary_role: profile.role,
        secondary_roles,
        branch_id: profile.branch_id,
        business_id: profile.business_id,
    }
}

fn normalize_email(email: &str) -> SessionResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(SessionError::InvalidEmail),
    }
}
