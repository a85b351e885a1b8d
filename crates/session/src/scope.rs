//! Business-type and branch scope for the current session.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use posgate_auth::{
    Branch, BusinessType, BusinessTypeId, default_catalog, resolve_business_type,
    select_initial_branch,
};
use posgate_core::{BranchId, BusinessId};

use crate::ports::{ProfileDirectory, SessionStore};

#[derive(Debug, Default)]
struct ScopeState {
    catalog: Vec<BusinessType>,
    business_type_id: Option<BusinessTypeId>,
    selected_business_type: Option<BusinessType>,
    business_id: Option<BusinessId>,
    branches: Vec<Branch>,
    selected_branch: Option<Branch>,
    load_generation: u64,
}

impl ScopeState {
    fn reresolve_business_type(&mut self) {
        self.selected_business_type =
            resolve_business_type(&self.catalog, self.business_type_id.as_ref()).cloned();
    }
}

/// Holds the selected business type and branch.
///
/// Single writer; readers get clones.
pub struct ScopeProvider<D, S> {
    directory: D,
    store: S,
    state: RwLock<ScopeState>,
}

impl<D, S> ScopeProvider<D, S>
where
    D: ProfileDirectory,
    S: SessionStore,
{
    /// Starts with the built-in business-type catalog.
    pub fn new(directory: D, store: S) -> Self {
        Self {
            directory,
            store,
            state: RwLock::new(ScopeState {
                catalog: default_catalog(),
                ..Default::default()
            }),
        }
    }

    pub fn business_type_catalog(&self) -> Vec<BusinessType> {
        self.read_state().catalog.clone()
    }

    pub fn selected_business_type(&self) -> Option<BusinessType> {
        self.read_state().selected_business_type.clone()
    }

    pub fn branches(&self) -> Vec<Branch> {
        self.read_state().branches.clone()
    }

    pub fn selected_branch(&self) -> Option<Branch> {
        self.read_state().selected_branch.clone()
    }

    /// Vertical vocabulary for a generic noun.
    pub fn term(&self, noun: &str) -> String {
        match &self.read_state().selected_business_type {
            Some(business_type) => business_type.term(noun).to_string(),
            None => noun.to_string(),
        }
    }

    /// Refresh the catalog from the backend; keeps the current one on failure.
    pub async fn load_catalog(&self) {
        match self.directory.business_type_catalog().await {
            Ok(catalog) if catalog.is_empty() => {
                tracing::debug!("remote business-type catalog is empty; keeping built-in catalog");
            }
            Ok(catalog) => self.set_catalog(catalog),
            Err(err) => tracing::warn!(error = %err, "failed to load business-type catalog"),
        }
    }

    pub fn set_catalog(&self, catalog: Vec<BusinessType>) {
        let mut state = self.write_state();
        state.catalog = catalog;
        state.reresolve_business_type();
    }

    /// Follow the actor's business-type id. `None` deselects.
    pub fn set_business_type_id(&self, id: Option<BusinessTypeId>) {
        let mut state = self.write_state();
        if state.business_type_id == id {
            return;
        }
        state.business_type_id = id;
        state.reresolve_business_type();
        tracing::debug!(
            business_type = ?state.selected_business_type.as_ref().map(|bt| bt.id.as_str()),
            "business type re-resolved"
        );
    }

    /// Load the branches of `business_id` and pick the initial selection.
    ///
    /// A load superseded by a later one (or by `clear`) is discarded.
    pub async fn load_branches(&self, business_id: Option<&BusinessId>, home: Option<&BranchId>) {
        let generation = {
            let mut state = self.write_state();
            state.load_generation += 1;
            state.business_id = business_id.cloned();
            state.load_generation
        };

        let Some(business_id) = business_id else {
            let mut state = self.write_state();
            state.branches.clear();
            state.selected_branch = None;
            return;
        };

        let branches: Vec<Branch> = match self.directory.branches_by_business(business_id).await {
            Ok(rows) => rows.into_iter().map(Branch::from).collect(),
            Err(err) => {
                tracing::warn!(business_id = %business_id, error = %err, "failed to load branches");
                return;
            }
        };

        let persisted = match self.store.load() {
            Ok(record) => record.and_then(|r| r.branch_id),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read persisted branch");
                None
            }
        };
        let selected = select_initial_branch(&branches, persisted.as_ref(), home);

        let mut state = self.write_state();
        if state.load_generation != generation {
            tracing::debug!(business_id = %business_id, "discarding stale branch list");
            return;
        }
        tracing::info!(
            business_id = %business_id,
            branches = branches.len(),
            selected = ?selected.as_ref().map(|b| b.id.as_str()),
            "branches loaded"
        );
        state.branches = branches;
        state.selected_branch = selected;
    }

    /// Select `branch` and persist its id for the next session.
    pub fn set_selected_branch(&self, branch: Branch) {
        let branch_id = branch.id.clone();
        self.write_state().selected_branch = Some(branch);

        let record = match self.store.load() {
            Ok(record) => record.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read session record; starting a new one");
                Default::default()
            }
        };
        let record = crate::SessionRecord {
            branch_id: Some(branch_id),
            ..record
        }
        .stamped(Utc::now());

        if let Err(err) = self.store.save(&record) {
            tracing::warn!(error = %err, "failed to persist selected branch");
        }
    }

    /// Drop branches and selections (on logout). The catalog is kept.
    pub fn clear(&self) {
        let mut state = self.write_state();
        state.load_generation += 1;
        state.business_type_id = None;
        state.selected_business_type = None;
        state.business_id = None;
        state.branches.clear();
        state.selected_branch = None;
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ScopeState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ScopeState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
