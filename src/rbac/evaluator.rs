use crate::rbac::errors::RbacError;
use crate::rbac::types::{Role, Subject};
use crate::rbac::{RoleHierarchy, MISSING_USER_LEVEL, UNKNOWN_REQUIRED_LEVEL};

/// True iff the subject's role level is at or above the level of `required`.
///
/// A subject without a role never passes, whatever the table says. A required
/// role missing from the table needs `UNKNOWN_REQUIRED_LEVEL` and never passes.
pub fn has_role<S: Subject + ?Sized>(hierarchy: &RoleHierarchy, subject: &S, required: Role) -> bool {
    let Some(role) = subject.role() else {
        return false;
    };
    let user_level = hierarchy.level(role).unwrap_or(MISSING_USER_LEVEL);
    let required_level = hierarchy.level(required).unwrap_or(UNKNOWN_REQUIRED_LEVEL);
    user_level >= required_level
}

/// `has_role` for a required role given as a raw string. Strings outside the
/// closed role set fail closed.
pub fn has_role_named<S: Subject + ?Sized>(hierarchy: &RoleHierarchy, subject: &S, required: &str) -> bool {
    match required.parse::<Role>() {
        Ok(role) => has_role(hierarchy, subject, role),
        Err(_) => false,
    }
}

pub fn authorize<S: Subject + ?Sized>(
    hierarchy: &RoleHierarchy,
    subject: &S,
    required: Role,
) -> Result<(), RbacError> {
    if has_role(hierarchy, subject, required) {
        Ok(())
    } else {
        tracing::debug!(role = ?subject.role(), %required, "role check denied");
        Err(RbacError::AuthorizationDenied { required })
    }
}

/// Role required by the most specific protected prefix covering `path`, if any.
pub fn required_for_path(hierarchy: &RoleHierarchy, path: &str) -> Option<Role> {
    hierarchy
        .routes()
        .iter()
        .find(|r| r.matches(path))
        .map(|r| r.role)
}

/// Authorize access to `path`. Unprotected paths are open to everyone.
pub fn authorize_path<S: Subject + ?Sized>(
    hierarchy: &RoleHierarchy,
    subject: &S,
    path: &str,
) -> Result<Option<Role>, RbacError> {
    match required_for_path(hierarchy, path) {
        Some(required) => authorize(hierarchy, subject, required).map(|_| Some(required)),
        None => Ok(None),
    }
}
