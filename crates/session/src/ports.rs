//! Contracts with the backing platform (auth, rows, local storage).
//!
//! The core only ever reads through these traits; concrete adapters live in
//! `posgate-infra`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use posgate_auth::{
    BranchRow, BranchScope, BusinessType, BusinessTypeId, Role, RoleAssignment, RoleCatalogEntry,
};
use posgate_core::{BranchId, BusinessId, UserId};

use crate::error::SessionResult;
use crate::record::SessionRecord;

/// A live session issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
}

/// Actor profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub user_id: UserId,
    pub email: String,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    #[serde(default)]
    pub business_id: Option<BusinessId>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Role-assignment row (`branch_id = null` means every branch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignmentRow {
    pub user_id: UserId,
    pub role: Role,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    pub is_active: bool,
}

impl From<RoleAssignmentRow> for RoleAssignment {
    fn from(row: RoleAssignmentRow) -> Self {
        Self {
            role: row.role,
            scope: BranchScope::from_nullable(row.branch_id),
            is_active: row.is_active,
        }
    }
}

/// Business row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRow {
    pub id: BusinessId,
    pub name: String,
    #[serde(default)]
    pub business_type: Option<BusinessTypeId>,
}

/// Session lifecycle at the auth provider.
///
/// Session *changes* are delivered separately, through the channel handed to
/// `IdentityResolver::listen`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_session(&self) -> SessionResult<Option<Session>>;
    async fn sign_out(&self) -> SessionResult<()>;
    async fn sign_in_passwordless(&self, email: &str) -> SessionResult<()>;
}

/// Row reads the core needs.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn profile_by_user_id(&self, user_id: &UserId) -> SessionResult<Option<ProfileRow>>;
    async fn profile_by_email(&self, email: &str) -> SessionResult<Option<ProfileRow>>;
    /// Only rows with `is_active = true`.
    async fn active_role_assignments(&self, user_id: &UserId)
    -> SessionResult<Vec<RoleAssignmentRow>>;
    async fn business_by_id(&self, business_id: &BusinessId) -> SessionResult<Option<BusinessRow>>;
    async fn branches_by_business(&self, business_id: &BusinessId) -> SessionResult<Vec<BranchRow>>;
    async fn role_catalog(&self) -> SessionResult<Vec<RoleCatalogEntry>>;
    async fn business_type_catalog(&self) -> SessionResult<Vec<BusinessType>>;
}

/// Local key/value storage for the [`SessionRecord`].
pub trait SessionStore: Send + Sync {
    fn load(&self) -> SessionResult<Option<SessionRecord>>;
    fn save(&self, record: &SessionRecord) -> SessionResult<()>;
    fn clear(&self) -> SessionResult<()>;
}

#[async_trait]
impl<T> AuthProvider for Arc<T>
where
    T: AuthProvider + ?Sized,
{
    async fn current_session(&self) -> SessionResult<Option<Session>> {
        (**self).current_session().await
    }

    async fn sign_out(&self) -> SessionResult<()> {
        (**self).sign_out().await
    }

    async fn sign_in_passwordless(&self, email: &str) -> SessionResult<()> {
        (**self).sign_in_passwordless(email).await
    }
}

#[async_trait]
impl<T> ProfileDirectory for Arc<T>
where
    T: ProfileDirectory + ?Sized,
{
    async fn profile_by_user_id(&self, user_id: &UserId) -> SessionResult<Option<ProfileRow>> {
        (**self).profile_by_user_id(user_id).await
    }

    async fn profile_by_email(&self, email: &str) -> SessionResult<Option<ProfileRow>> {
        (**self).profile_by_email(email).await
    }

    async fn active_role_assignments(
        &self,
        user_id: &UserId,
    ) -> SessionResult<Vec<RoleAssignmentRow>> {
        (**self).active_role_assignments(user_id).await
    }

    async fn business_by_id(&self, business_id: &BusinessId) -> SessionResult<Option<BusinessRow>> {
        (**self).business_by_id(business_id).await
    }

    async fn branches_by_business(
        &self,
        business_id: &BusinessId,
    ) -> SessionResult<Vec<BranchRow>> {
        (**self).branches_by_business(business_id).await
    }

    async fn role_catalog(&self) -> SessionResult<Vec<RoleCatalogEntry>> {
        (**self).role_catalog().await
    }

    async fn business_type_catalog(&self) -> SessionResult<Vec<BusinessType>> {
        (**self).business_type_catalog().await
    }
}

impl<T> SessionStore for Arc<T>
where
    T: SessionStore + ?Sized,
{
    fn load(&self) -> SessionResult<Option<SessionRecord>> {
        (**self).load()
    }

    fn save(&self, record: &SessionRecord) -> SessionResult<()> {
        (**self).save(record)
    }

    fn clear(&self) -> SessionResult<()> {
        (**self).clear()
    }
}
