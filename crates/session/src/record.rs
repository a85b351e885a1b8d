//! Session-continuity record persisted across reloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use posgate_auth::BusinessTypeId;
use posgate_core::BranchId;

/// Flat key/value record consulted only when the live session lookup yields
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub business_type_id: Option<BusinessTypeId>,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn signed_in(email: impl Into<String>) -> Self {
        Self {
            is_authenticated: true,
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        self.saved_at = Some(now);
        self
    }
}
