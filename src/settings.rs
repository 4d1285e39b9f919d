use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::rbac::types::Role;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub server: Server,
    #[serde(default)]
    pub rbac: Rbac,
    pub approval: Approval,
    pub engine: Engine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Header carrying the caller's role, set by the identity layer in front of us.
    pub role_header: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Rbac {
    /// KDL file overriding the built-in role table. Unset: canonical table.
    pub hierarchy_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Approval {
    /// Minimum caller role for the approval endpoint.
    pub required_role: Role,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Engine {
    /// Flow endpoint of the decision engine, e.g. http://127.0.0.1:3400/autoApprovalFlow
    pub endpoint: String,
    pub timeout_ms: u64,
    /// Sent as a bearer token when set
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("endpoint", &self.endpoint)
            .field("timeout_ms", &self.timeout_ms)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            role_header: "x-user-role".to_string(),
        }
    }
}

impl Default for Approval {
    fn default() -> Self {
        Self {
            required_role: Role::ComplianceOfficer,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3400/autoApprovalFlow".to_string(),
            timeout_ms: 10_000,
            api_key: None,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("server.host", Server::default().host)
            .into_diagnostic()?
            .set_default("server.port", Server::default().port)
            .into_diagnostic()?
            .set_default("server.role_header", Server::default().role_header)
            .into_diagnostic()?
            .set_default(
                "approval.required_role",
                Approval::default().required_role.as_str(),
            )
            .into_diagnostic()?
            .set_default("engine.endpoint", Engine::default().endpoint)
            .into_diagnostic()?
            .set_default("engine.timeout_ms", Engine::default().timeout_ms)
            .into_diagnostic()?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: FUNDGATE__SERVER__PORT=9090, etc.
        builder = builder.add_source(config::Environment::with_prefix("FUNDGATE").separator("__"));

        let cfg = builder.build().into_diagnostic()?;
        let mut s: Settings = cfg.try_deserialize().into_diagnostic()?;

        if let Some(p) = &s.rbac.hierarchy_path {
            if p.is_relative() {
                s.rbac.hierarchy_path = Some(std::env::current_dir().into_diagnostic()?.join(p));
            }
        }

        s.validate()?;
        Ok(s)
    }

    fn validate(&self) -> Result<()> {
        if self.engine.timeout_ms == 0 {
            return Err(miette::miette!(
                help = "set engine.timeout_ms to a positive number of milliseconds",
                "engine.timeout_ms must be greater than 0"
            ));
        }
        reqwest::Url::parse(&self.engine.endpoint).map_err(|e| {
            miette::miette!("engine.endpoint `{}` is not a valid URL: {e}", self.engine.endpoint)
        })?;
        axum::http::HeaderName::from_bytes(self.server.role_header.as_bytes()).map_err(|e| {
            miette::miette!(
                "server.role_header `{}` is not a valid header name: {e}",
                self.server.role_header
            )
        })?;
        Ok(())
    }

    pub fn engine_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.engine.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_settings_load_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nonexistent.toml");

        let settings = Settings::load(config_path.to_str().unwrap())
            .expect("Failed to load settings");

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.role_header, "x-user-role");
        assert!(settings.rbac.hierarchy_path.is_none());
        assert_eq!(settings.approval.required_role, Role::ComplianceOfficer);
        assert_eq!(settings.engine.endpoint, "http://127.0.0.1:3400/autoApprovalFlow");
        assert_eq!(settings.engine.timeout_ms, 10_000);
        assert_eq!(settings.engine_timeout(), std::time::Duration::from_secs(10));
    }

    #[test]
    fn test_settings_load_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        let config_content = r#"
[server]
host = "127.0.0.1"
port = 9090
role_header = "x-platform-role"

[rbac]
hierarchy_path = "/etc/fundgate/roles.kdl"

[approval]
required_role = "admin"

[engine]
endpoint = "https://flows.example.com/autoApprovalFlow"
timeout_ms = 2500
api_key = "secret"
"#;
        fs::write(&config_path, config_content).expect("Failed to write config");

        let settings = Settings::load(config_path.to_str().unwrap())
            .expect("Failed to load settings");

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.role_header, "x-platform-role");
        assert_eq!(
            settings.rbac.hierarchy_path,
            Some(PathBuf::from("/etc/fundgate/roles.kdl"))
        );
        assert_eq!(settings.approval.required_role, Role::Admin);
        assert_eq!(settings.engine.endpoint, "https://flows.example.com/autoApprovalFlow");
        assert_eq!(settings.engine.timeout_ms, 2500);
    }

    #[test]
    fn test_settings_env_override() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        let config_content = r#"
[server]
host = "127.0.0.1"
port = 8080
"#;
        fs::write(&config_path, config_content).expect("Failed to write config");

        // Only touch a key the other tests don't assert on; tests share the process env.
        env::set_var("FUNDGATE__ENGINE__API_KEY", "from-env");

        let settings = Settings::load(config_path.to_str().unwrap())
            .expect("Failed to load settings");

        env::remove_var("FUNDGATE__ENGINE__API_KEY");

        assert_eq!(settings.engine.api_key.as_deref(), Some("from-env"));
        assert_eq!(settings.server.port, 8080);
        assert!(!format!("{settings:?}").contains("from-env"));
    }

    #[test]
    fn test_settings_hierarchy_path_normalization() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        fs::write(
            &config_path,
            r#"
[rbac]
hierarchy_path = "policies/roles.kdl"
"#,
        )
        .expect("Failed to write config");

        let settings = Settings::load(config_path.to_str().unwrap())
            .expect("Failed to load settings");

        let path = settings.rbac.hierarchy_path.unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("policies/roles.kdl"));
    }

    #[test]
    fn test_settings_reject_zero_timeout() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");
        fs::write(&config_path, "[engine]\ntimeout_ms = 0\n").expect("Failed to write config");

        assert!(Settings::load(config_path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_settings_reject_bad_endpoint() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");
        fs::write(&config_path, "[engine]\nendpoint = \"not a url\"\n")
            .expect("Failed to write config");

        assert!(Settings::load(config_path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_settings_reject_unknown_required_role() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");
        fs::write(&config_path, "[approval]\nrequired_role = \"Overlord\"\n")
            .expect("Failed to write config");

        assert!(Settings::load(config_path.to_str().unwrap()).is_err());
    }
}
