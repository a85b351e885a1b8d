//! Branches and initial branch selection.

use serde::{Deserialize, Serialize};

use posgate_core::{BranchId, BusinessId};

/// A physical location of a business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
}

/// Branch row as stored remotely (`is_active` may be missing on old rows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRow {
    pub id: BranchId,
    pub business_id: Option<BusinessId>,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            is_active: row.is_active.unwrap_or(true),
        }
    }
}

/// Pick the branch a session starts scoped to.
///
/// Priority: the persisted branch (if loaded and active), then the actor's
/// home branch (if loaded and active), then the first active branch.
pub fn select_initial_branch(
    branches: &[Branch],
    persisted: Option<&BranchId>,
    home: Option<&BranchId>,
) -> Option<Branch> {
    let active = |id: Option<&BranchId>| {
        let id = id?;
        branches.iter().find(|b| &b.id == id && b.is_active)
    };

    active(persisted)
        .or_else(|| active(home))
        .or_else(|| branches.iter().find(|b| b.is_active))
        .cloned()
}
