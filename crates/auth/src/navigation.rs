//! Per-navigation guard state machine.
//!
//! A navigation starts `Unchecked` and settles into `Permitted`, `Pending`,
//! `DeniedRedirectable` or `DeniedTerminal`. At most one redirect is followed
//! per navigation; a second redirectable denial, or one pointing at the
//! current location, collapses to `DeniedTerminal`.

use serde::Serialize;

use crate::guard::{DenialPanel, GuardOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NavigationState {
    Unchecked,
    Permitted,
    Pending,
    DeniedRedirectable { to: String, panel: DenialPanel },
    DeniedTerminal { panel: DenialPanel },
}

/// One user navigation, possibly spanning a followed redirect.
#[derive(Debug, Clone)]
pub struct Navigation {
    location: String,
    redirects_followed: u8,
    state: NavigationState,
}

impl Navigation {
    pub fn start(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            redirects_followed: 0,
            state: NavigationState::Unchecked,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Record the outcome of evaluating the guards for the current location.
    pub fn apply(&mut self, outcome: GuardOutcome) -> &NavigationState {
        self.state = match outcome {
            GuardOutcome::Render => NavigationState::Permitted,
            GuardOutcome::Pending => NavigationState::Pending,
            GuardOutcome::Denied { panel } => NavigationState::DeniedTerminal { panel },
            GuardOutcome::Redirect { to, panel } => {
                if to == self.location || self.redirects_followed >= 1 {
                    tracing::debug!(
                        location = %self.location,
                        target = %to,
                        "redirect would loop; showing inline denial"
                    );
                    NavigationState::DeniedTerminal { panel }
                } else {
                    NavigationState::DeniedRedirectable { to, panel }
                }
            }
        };
        &self.state
    }

    /// Follow a pending redirect, moving to its target and resetting to
    /// `Unchecked`. Returns the new location, or `None` if there is nothing
    /// to follow.
    pub fn follow_redirect(&mut self) -> Option<&str> {
        let NavigationState::DeniedRedirectable { to, .. } = &self.state else {
            return None;
        };

        self.location = to.clone();
        self.redirects_followed += 1;
        self.state = NavigationState::Unchecked;
        Some(&self.location)
    }

    /// Re-run guards after a `Pending` outcome (e.g. once the profile loads)
    /// without counting as a new navigation.
    pub fn recheck(&mut self) {
        if self.state == NavigationState::Pending {
            self.state = NavigationState::Unchecked;
        }
    }
}
