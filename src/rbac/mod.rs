pub mod errors;
pub mod evaluator;
pub mod loader;
pub mod policy;
pub mod types;
pub mod web;

use std::collections::HashMap;
use types::{Role, RouteRequirement};

/// Level a user with no role is treated as holding. Never satisfies a requirement.
pub const MISSING_USER_LEVEL: u32 = 0;

/// Level a required role absent from the table is treated as needing.
pub const UNKNOWN_REQUIRED_LEVEL: u32 = u32::MAX;

/// Compiled role hierarchy: role -> privilege level, plus protected route prefixes.
/// Immutable after construction; built once at start-up and shared by reference.
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    levels: HashMap<Role, u32>,
    /// Sorted by descending prefix length so the first match is the most specific.
    routes: Vec<RouteRequirement>,
}

impl RoleHierarchy {
    /// Builds a hierarchy from already-validated parts. Use `loader::compile_hierarchy`
    /// for untrusted input.
    pub(crate) fn from_parts(levels: HashMap<Role, u32>, mut routes: Vec<RouteRequirement>) -> Self {
        routes.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });
        Self { levels, routes }
    }

    /// The built-in table.
    ///
    /// Investor and ProjectOwner share the base level; ComplianceOfficer sits
    /// strictly above Support and AccountingOperator.
    pub fn canonical() -> Self {
        let levels = HashMap::from([
            (Role::Investor, 1),
            (Role::ProjectOwner, 1),
            (Role::Support, 2),
            (Role::AccountingOperator, 2),
            (Role::ComplianceOfficer, 3),
            (Role::Admin, 4),
            (Role::SuperAdmin, 5),
        ]);
        let routes = vec![
            RouteRequirement::new("/dashboard/investor", Role::Investor),
            RouteRequirement::new("/dashboard/owner", Role::ProjectOwner),
            RouteRequirement::new("/support", Role::Support),
            RouteRequirement::new("/accounting", Role::AccountingOperator),
            RouteRequirement::new("/compliance", Role::ComplianceOfficer),
            RouteRequirement::new("/admin", Role::Admin),
            RouteRequirement::new("/admin/system", Role::SuperAdmin),
        ];
        Self::from_parts(levels, routes)
    }

    pub fn level(&self, role: Role) -> Option<u32> {
        self.levels.get(&role).copied()
    }

    /// Table entries ordered by level, then by declaration order of the role.
    pub fn roles(&self) -> Vec<(Role, u32)> {
        let mut entries: Vec<(Role, u32)> = self.levels.iter().map(|(r, l)| (*r, *l)).collect();
        entries.sort_by_key(|(role, level)| (*level, *role));
        entries
    }

    pub fn routes(&self) -> &[RouteRequirement] {
        &self.routes
    }
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::canonical()
    }
}
