use std::collections::HashMap;
use std::path::Path;

use crate::rbac::errors::RbacError;
use crate::rbac::policy::parse_kdl_document;
use crate::rbac::types::*;
use crate::rbac::RoleHierarchy;

/// Load a KDL hierarchy file and compile it into an immutable `RoleHierarchy`.
pub fn load_hierarchy(path: &Path) -> Result<RoleHierarchy, RbacError> {
    let contents =
        std::fs::read_to_string(path).map_err(|source| RbacError::HierarchyLoadError {
            path: path.display().to_string(),
            source,
        })?;
    let parsed = parse_kdl_document(&contents)?;
    let hierarchy = compile_hierarchy(parsed)?;

    tracing::info!(
        path = %path.display(),
        roles = hierarchy.roles().len(),
        routes = hierarchy.routes().len(),
        "Loaded role hierarchy"
    );

    Ok(hierarchy)
}

/// Resolve role names, check levels and route references.
pub fn compile_hierarchy(parsed: ParsedHierarchy) -> Result<RoleHierarchy, RbacError> {
    let mut levels: HashMap<Role, u32> = HashMap::new();

    for def in parsed.roles {
        let role: Role = def
            .name
            .parse()
            .map_err(|_| RbacError::UnknownRole(def.name.clone()))?;

        let level = u32::try_from(def.level)
            .ok()
            .filter(|l| *l > 0 && *l < crate::rbac::UNKNOWN_REQUIRED_LEVEL)
            .ok_or_else(|| RbacError::InvalidLevel {
                role: def.name.clone(),
                level: def.level.to_string(),
            })?;

        if levels.insert(role, level).is_some() {
            return Err(RbacError::InvalidHierarchy(format!(
                "role `{role}` is defined more than once"
            )));
        }
    }

    if levels.is_empty() {
        return Err(RbacError::InvalidHierarchy(
            "hierarchy defines no roles".into(),
        ));
    }

    let mut routes = Vec::with_capacity(parsed.routes.len());
    for def in parsed.routes {
        if !def.prefix.starts_with('/') {
            return Err(RbacError::InvalidHierarchy(format!(
                "route `{}` must start with `/`",
                def.prefix
            )));
        }
        let role: Role = def
            .requires
            .parse()
            .map_err(|_| RbacError::UnknownRole(def.requires.clone()))?;
        if !levels.contains_key(&role) {
            return Err(RbacError::InvalidHierarchy(format!(
                "route `{}` requires `{role}`, which has no level in this hierarchy",
                def.prefix
            )));
        }
        let key = def.prefix.trim_end_matches('/');
        if routes
            .iter()
            .any(|r: &RouteRequirement| r.prefix.trim_end_matches('/') == key)
        {
            return Err(RbacError::InvalidHierarchy(format!(
                "route `{}` is defined more than once",
                def.prefix
            )));
        }
        routes.push(RouteRequirement {
            prefix: def.prefix,
            role,
        });
    }

    Ok(RoleHierarchy::from_parts(levels, routes))
}
