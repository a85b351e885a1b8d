//! Configuration loaded from environment variables.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use posgate_auth::{Locations, Role};
use posgate_core::BranchId;
use posgate_session::{ResolverOptions, SessionStore};

use crate::session_store::{InMemorySessionStore, JsonFileSessionStore};

pub const LOGIN_PATH_VAR: &str = "POSGATE_LOGIN_PATH";
pub const DASHBOARD_PATH_VAR: &str = "POSGATE_DASHBOARD_PATH";
pub const SESSION_FILE_VAR: &str = "POSGATE_SESSION_FILE";
pub const DEMO_BRANCH_VAR: &str = "POSGATE_DEMO_BRANCH";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be an absolute app path starting with '/', got {value:?}")]
    InvalidPath { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    pub login_path: String,
    pub dashboard_path: String,
    /// `None` keeps the session record in memory only.
    pub session_file: Option<PathBuf>,
    pub demo_branch: BranchId,
}

impl Default for AccessConfig {
    fn default() -> Self {
        let locations = Locations::default();
        Self {
            login_path: locations.login,
            dashboard_path: locations.dashboard,
            session_file: None,
            demo_branch: ResolverOptions::default().demo_branch,
        }
    }
}

impl AccessConfig {
    /// Read the process environment. Invalid values are logged and replaced
    /// by defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let or_default =
            |result: Result<Option<String>, ConfigError>, default: String| match result {
                Ok(Some(value)) => value,
                Ok(None) => default,
                Err(err) => {
                    tracing::warn!(error = %err, "invalid configuration; using default");
                    default
                }
            };

        let login_path = or_default(
            parse_path(LOGIN_PATH_VAR, lookup(LOGIN_PATH_VAR)),
            defaults.login_path,
        );
        let dashboard_path = or_default(
            parse_path(DASHBOARD_PATH_VAR, lookup(DASHBOARD_PATH_VAR)),
            defaults.dashboard_path,
        );
        let demo_branch = match lookup(DEMO_BRANCH_VAR).map(|raw| raw.parse::<BranchId>()) {
            None => defaults.demo_branch,
            Some(Ok(branch)) => branch,
            Some(Err(err)) => {
                tracing::warn!(
                    var = DEMO_BRANCH_VAR,
                    error = %err,
                    "invalid configuration; using default"
                );
                defaults.demo_branch
            }
        };
        let session_file = lookup(SESSION_FILE_VAR)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        Self {
            login_path,
            dashboard_path,
            session_file,
            demo_branch,
        }
    }

    pub fn locations(&self) -> Locations {
        Locations {
            login: self.login_path.clone(),
            dashboard: self.dashboard_path.clone(),
        }
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            demo_branch: self.demo_branch.clone(),
            demo_role: Role::MANAGER,
        }
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        match &self.session_file {
            Some(path) => Arc::new(JsonFileSessionStore::new(path.clone())),
            None => Arc::new(InMemorySessionStore::new()),
        }
    }
}

fn parse_non_empty(var: &'static str, raw: Option<String>) -> Result<Option<String>, ConfigError> {
    match raw.map(|value| value.trim().to_string()) {
        None => Ok(None),
        Some(value) if value.is_empty() => Err(ConfigError::Empty { var }),
        Some(value) => Ok(Some(value)),
    }
}

fn parse_path(var: &'static str, raw: Option<String>) -> Result<Option<String>, ConfigError> {
    match parse_non_empty(var, raw)? {
        Some(value) if !value.starts_with('/') => Err(ConfigError::InvalidPath { var, value }),
        other => Ok(other),
    }
}
