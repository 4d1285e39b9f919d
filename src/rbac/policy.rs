use crate::rbac::errors::RbacError;
use crate::rbac::types::*;
use kdl::KdlDocument;

/// Parse a KDL hierarchy document into its raw role and route definitions.
/// Names are resolved and levels checked later, in `loader::compile_hierarchy`.
pub fn parse_kdl_document(source: &str) -> Result<ParsedHierarchy, RbacError> {
    let doc: KdlDocument = source
        .parse()
        .map_err(|e: kdl::KdlError| RbacError::KdlParse(e.to_string()))?;

    let mut parsed = ParsedHierarchy::default();

    for node in doc.nodes() {
        match node.name().value() {
            "role" => {
                let name = first_string_arg(node).ok_or_else(|| {
                    RbacError::InvalidHierarchy(
                        "role node requires a string argument (e.g. role \"Admin\" level=4)".into(),
                    )
                })?;

                let value = node.get("level").ok_or_else(|| {
                    RbacError::InvalidHierarchy(format!(
                        "role `{name}` missing `level` property (e.g. level=4)"
                    ))
                })?;

                let level = value.as_integer().ok_or_else(|| RbacError::InvalidLevel {
                    role: name.clone(),
                    level: value.to_string(),
                })?;

                parsed.roles.push(RoleLevelDef { name, level });
            }
            "route" => {
                let prefix = first_string_arg(node).ok_or_else(|| {
                    RbacError::InvalidHierarchy(
                        "route node requires a path argument (e.g. route \"/admin\" requires=\"Admin\")"
                            .into(),
                    )
                })?;

                let requires = node
                    .get("requires")
                    .and_then(|v| v.as_string())
                    .ok_or_else(|| {
                        RbacError::InvalidHierarchy(format!(
                            "route `{prefix}` missing `requires` property (e.g. requires=\"Admin\")"
                        ))
                    })?
                    .to_string();

                parsed.routes.push(RouteDef { prefix, requires });
            }
            other => {
                tracing::warn!("ignoring unknown top-level KDL node `{other}`");
            }
        }
    }

    Ok(parsed)
}

/// Extract the first string argument from a KDL node.
fn first_string_arg(node: &kdl::KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}
