use miette::Diagnostic;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Closed set of platform roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(alias = "investor")]
    Investor,
    #[serde(alias = "project_owner")]
    ProjectOwner,
    #[serde(alias = "support")]
    Support,
    #[serde(alias = "accounting_operator")]
    AccountingOperator,
    #[serde(alias = "compliance_officer")]
    ComplianceOfficer,
    #[serde(alias = "admin")]
    Admin,
    #[serde(alias = "super_admin")]
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Investor,
        Role::ProjectOwner,
        Role::Support,
        Role::AccountingOperator,
        Role::ComplianceOfficer,
        Role::Admin,
        Role::SuperAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Investor => "Investor",
            Role::ProjectOwner => "ProjectOwner",
            Role::Support => "Support",
            Role::AccountingOperator => "AccountingOperator",
            Role::ComplianceOfficer => "ComplianceOfficer",
            Role::Admin => "Admin",
            Role::SuperAdmin => "SuperAdmin",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Investor" | "investor" => Ok(Role::Investor),
            "ProjectOwner" | "project_owner" => Ok(Role::ProjectOwner),
            "Support" | "support" => Ok(Role::Support),
            "AccountingOperator" | "accounting_operator" => Ok(Role::AccountingOperator),
            "ComplianceOfficer" | "compliance_officer" => Ok(Role::ComplianceOfficer),
            "Admin" | "admin" => Ok(Role::Admin),
            "SuperAdmin" | "super_admin" => Ok(Role::SuperAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("unknown role `{0}`")]
#[diagnostic(
    code(fundgate::rbac::unknown_role),
    help("Valid roles: Investor, ProjectOwner, Support, AccountingOperator, ComplianceOfficer, Admin, SuperAdmin")
)]
pub struct UnknownRole(pub String);

/// Anything that carries an optional role: users, sessions, raw roles.
pub trait Subject {
    fn role(&self) -> Option<Role>;
}

impl Subject for Role {
    fn role(&self) -> Option<Role> {
        Some(*self)
    }
}

impl Subject for Option<Role> {
    fn role(&self) -> Option<Role> {
        *self
    }
}

impl<T: Subject + ?Sized> Subject for &T {
    fn role(&self) -> Option<Role> {
        (**self).role()
    }
}

/// Minimal view of a platform user as resolved by the identity layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    /// Unrecognised role strings deserialize to `None`.
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,
}

impl User {
    pub fn with_role(role: Role) -> Self {
        Self {
            id: None,
            role: Some(role),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl Subject for User {
    fn role(&self) -> Option<Role> {
        self.role
    }
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// A protected path prefix and the role it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRequirement {
    pub prefix: String,
    pub role: Role,
}

impl RouteRequirement {
    pub fn new(prefix: &str, role: Role) -> Self {
        Self {
            prefix: prefix.to_string(),
            role,
        }
    }

    /// Prefix match on a path-segment boundary: `/admin` covers `/admin` and
    /// `/admin/users` but not `/administrator`.
    pub fn matches(&self, path: &str) -> bool {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return path.starts_with('/');
        }
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

// ---------- Hierarchy file types ----------

#[derive(Debug, Clone, PartialEq)]
pub struct RoleLevelDef {
    /// Raw role name as written in the file; resolved during compilation.
    pub name: String,
    pub level: i128,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteDef {
    pub prefix: String,
    pub requires: String,
}

/// Intermediate result from parsing a hierarchy file.
#[derive(Debug, Clone, Default)]
pub struct ParsedHierarchy {
    pub roles: Vec<RoleLevelDef>,
    pub routes: Vec<RouteDef>,
}

// ---------- API request/response types ----------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCheckRequest {
    #[serde(default)]
    pub user: User,
    /// Kept as a string so that roles outside the closed set fail closed
    /// instead of being rejected by the extractor.
    pub required_role: String,
}

#[derive(Debug, Serialize)]
pub struct RoleCheckResponse {
    pub allowed: bool,
}

#[derive(Debug, Deserialize)]
pub struct RouteAuthorizeRequest {
    pub path: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAuthorizeResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct RoleLevel {
    pub role: Role,
    pub level: u32,
}
