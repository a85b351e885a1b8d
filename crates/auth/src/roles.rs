use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque names (`"Manager"`, `"Cashier"`, ...) compared exactly.
/// Their relative authority comes from a [`RoleHierarchy`], not from the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const SUPER_ADMIN: Role = Role::from_static("SuperAdmin");
    pub const SUPER_MANAGER: Role = Role::from_static("SuperManager");
    pub const MANAGER: Role = Role::from_static("Manager");
    pub const SUPERVISOR: Role = Role::from_static("Supervisor");
    pub const CASHIER: Role = Role::from_static("Cashier");
    pub const EMPLOYEE: Role = Role::from_static("Employee");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row of the remote role catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCatalogEntry {
    pub name: Role,
    pub display_name: String,
    /// Lower number = more authority.
    pub hierarchy_level: u32,
    #[serde(default)]
    pub description: Option<String>,
}

impl RoleCatalogEntry {
    pub fn new(name: Role, display_name: impl Into<String>, hierarchy_level: u32) -> Self {
        Self {
            name,
            display_name: display_name.into(),
            hierarchy_level,
            description: None,
        }
    }
}

/// Look up the configured hierarchy level of `role` in a reference role list.
pub fn get_role_hierarchy_level(role: &Role, all_roles: &[RoleCatalogEntry]) -> Option<u32> {
    all_roles
        .iter()
        .find(|entry| &entry.name == role)
        .map(|entry| entry.hierarchy_level)
}

/// Total order over role names.
///
/// Entries are kept sorted by level (then name, for a stable order among
/// roles that share a level).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHierarchy {
    entries: Vec<RoleCatalogEntry>,
}

impl RoleHierarchy {
    pub fn new(mut entries: Vec<RoleCatalogEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.hierarchy_level
                .cmp(&b.hierarchy_level)
                .then_with(|| a.name.cmp(&b.name))
        });
        // A role listed twice keeps its highest-authority entry.
        let mut seen = HashSet::new();
        entries.retain(|entry| seen.insert(entry.name.clone()));
        Self { entries }
    }

    pub fn entries(&self) -> &[RoleCatalogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn level_of(&self, role: &Role) -> Option<u32> {
        get_role_hierarchy_level(role, &self.entries)
    }

    /// Roles occupying the two highest-authority levels.
    pub fn super_roles(&self) -> Vec<&Role> {
        let mut levels: Vec<u32> = self.entries.iter().map(|e| e.hierarchy_level).collect();
        levels.dedup();
        let cutoff = match levels.get(1).or_else(|| levels.first()) {
            Some(level) => *level,
            None => return Vec::new(),
        };

        self.entries
            .iter()
            .filter(|e| e.hierarchy_level <= cutoff)
            .map(|e| &e.name)
            .collect()
    }

    pub fn is_super_role(&self, role: &Role) -> bool {
        self.super_roles().into_iter().any(|r| r == role)
    }

    /// Roles an actor holding `actor_role` may grant: strictly lower authority.
    ///
    /// Unknown actor roles may grant nothing.
    pub fn assignable_roles(&self, actor_role: &Role) -> Vec<&RoleCatalogEntry> {
        let Some(actor_level) = self.level_of(actor_role) else {
            return Vec::new();
        };

        self.entries
            .iter()
            .filter(|e| e.hierarchy_level > actor_level)
            .collect()
    }

    pub fn can_assign(&self, actor_role: &Role, target: &Role) -> bool {
        match (self.level_of(actor_role), self.level_of(target)) {
            (Some(actor), Some(target)) => target > actor,
            _ => false,
        }
    }
}

impl Default for RoleHierarchy {
    /// The stock catalog seeded for new businesses.
    fn default() -> Self {
        Self::new(vec![
            RoleCatalogEntry::new(Role::SUPER_ADMIN, "Super Admin", 1),
            RoleCatalogEntry::new(Role::SUPER_MANAGER, "Super Manager", 2),
            RoleCatalogEntry::new(Role::MANAGER, "Manager", 3),
            RoleCatalogEntry::new(Role::SUPERVISOR, "Supervisor", 4),
            RoleCatalogEntry::new(Role::CASHIER, "Cashier", 5),
            RoleCatalogEntry::new(Role::EMPLOYEE, "Employee", 6),
        ])
    }
}
