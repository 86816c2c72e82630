use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::auth::Role;

const DEFAULT_VELERO_BIN: &str = "/usr/local/bin/velero";
const DEFAULT_KUBECONFIG: &str = "/tmp/config";
const DEFAULT_SESSION_LIFETIME_DAYS: u32 = 365;
const DEFAULT_CLIENT_SECRETS: &str = "client_secrets.json";
const DEFAULT_SCOPES: &str = "openid email profile";
const DEFAULT_REALM: &str = "master";
const DEFAULT_MAIL_FROM: &str = "admin@localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Oidc,
    None,
}

impl AuthMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "oidc" => Some(Self::Oidc),
            "none" | "off" | "disabled" => Some(Self::None),
            _ => None,
        }
    }
}

/// Optional JSON file with the same settings, for deployments that mount config instead
/// of setting env vars. Env vars win over the file.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigOverrides {
    #[serde(default)]
    velero_bin: Option<String>,
    #[serde(default)]
    kubeconfig: Option<String>,
    #[serde(default)]
    session_lifetime_days: Option<u32>,
    #[serde(default)]
    auth_mode: Option<String>,
    #[serde(default)]
    oidc_client_secrets: Option<String>,
    #[serde(default)]
    oidc_scopes: Option<Vec<String>>,
    #[serde(default)]
    oidc_realm: Option<String>,
    #[serde(default)]
    oidc_redirect_uri: Option<String>,
    #[serde(default)]
    mail_from: Option<String>,
    #[serde(default)]
    static_root: Option<String>,
}

fn load_overrides(path: Option<PathBuf>) -> ConfigOverrides {
    let Some(path) = path else {
        return ConfigOverrides::default();
    };
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read dashboard config file; using env defaults"
            );
            return ConfigOverrides::default();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse dashboard config file; using env defaults"
            );
            ConfigOverrides::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub velero_bin: PathBuf,
    pub kubeconfig: PathBuf,
    pub session_secret: String,
    pub session_lifetime_days: u32,
    pub auth_mode: AuthMode,
    pub oidc_client_secrets: PathBuf,
    pub oidc_scopes: Vec<String>,
    pub oidc_realm: String,
    pub oidc_redirect_uri: Option<String>,
    pub oidc_admin_groups: Vec<String>,
    pub oidc_operator_groups: Vec<String>,
    pub default_role: Role,
    pub cookie_secure: bool,
    pub mail_from: String,
    pub static_root: Option<PathBuf>,
    pub debug: bool,
}

impl DashboardConfig {
    pub fn from_env(cli_static_root: Option<PathBuf>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_static_root)
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cli_static_root: Option<PathBuf>,
    ) -> Result<Self> {
        let env = Env(&lookup);
        let overrides = load_overrides(env.optional_path("DASHBOARD_CONFIG_PATH"));

        let debug = env.bool("DASHBOARD_DEBUG", false);
        let velero_bin = env.path_or(
            "DASHBOARD_VELERO_BIN",
            overrides.velero_bin.as_deref(),
            DEFAULT_VELERO_BIN,
        )?;
        let kubeconfig = env.path_or(
            "DASHBOARD_KUBECONFIG",
            overrides.kubeconfig.as_deref(),
            DEFAULT_KUBECONFIG,
        )?;

        let session_secret = match env.optional_string("DASHBOARD_SESSION_SECRET") {
            Some(secret) => secret,
            None if debug => {
                tracing::warn!("DASHBOARD_SESSION_SECRET not set; using a random secret (debug)");
                random_secret()
            }
            None => anyhow::bail!("DASHBOARD_SESSION_SECRET must be set"),
        };
        let session_lifetime_days = env
            .u32("DASHBOARD_SESSION_LIFETIME_DAYS")
            .or(overrides.session_lifetime_days)
            .unwrap_or(DEFAULT_SESSION_LIFETIME_DAYS);

        let auth_mode_value = env
            .optional_string("DASHBOARD_AUTH_MODE")
            .or(overrides.auth_mode.clone())
            .unwrap_or_else(|| "oidc".to_string());
        let auth_mode = AuthMode::parse(&auth_mode_value)
            .with_context(|| format!("unknown DASHBOARD_AUTH_MODE {auth_mode_value:?}"))?;

        let oidc_client_secrets = env.path_or(
            "DASHBOARD_OIDC_CLIENT_SECRETS",
            overrides.oidc_client_secrets.as_deref(),
            DEFAULT_CLIENT_SECRETS,
        )?;
        let oidc_scopes = env
            .list("DASHBOARD_OIDC_SCOPES")
            .or(overrides.oidc_scopes.clone())
            .unwrap_or_else(|| split_list(DEFAULT_SCOPES));
        let oidc_realm = env
            .optional_string("DASHBOARD_OIDC_REALM")
            .or(overrides.oidc_realm.clone())
            .unwrap_or_else(|| DEFAULT_REALM.to_string());
        let oidc_redirect_uri = env
            .optional_string("DASHBOARD_OIDC_REDIRECT_URI")
            .or(overrides.oidc_redirect_uri.clone());
        let oidc_admin_groups = env.list("DASHBOARD_OIDC_ADMIN_GROUPS").unwrap_or_default();
        let oidc_operator_groups = env
            .list("DASHBOARD_OIDC_OPERATOR_GROUPS")
            .unwrap_or_default();
        let default_role_value = env
            .optional_string("DASHBOARD_DEFAULT_ROLE")
            .unwrap_or_else(|| "admin".to_string());
        let default_role = Role::parse(&default_role_value)
            .with_context(|| format!("unknown DASHBOARD_DEFAULT_ROLE {default_role_value:?}"))?;
        let cookie_secure = env.bool("DASHBOARD_COOKIE_SECURE", true);

        let mail_from = env
            .optional_string("DASHBOARD_MAIL_FROM")
            .or(overrides.mail_from.clone())
            .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());
        let static_root = cli_static_root
            .or_else(|| env.optional_path("DASHBOARD_STATIC_ROOT"))
            .or_else(|| overrides.static_root.as_deref().map(PathBuf::from));

        Ok(Self {
            velero_bin,
            kubeconfig,
            session_secret,
            session_lifetime_days,
            auth_mode,
            oidc_client_secrets,
            oidc_scopes,
            oidc_realm,
            oidc_redirect_uri,
            oidc_admin_groups,
            oidc_operator_groups,
            default_role,
            cookie_secure,
            mail_from,
            static_root,
            debug,
        })
    }
}

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn optional_string(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn bool(&self, key: &str, default: bool) -> bool {
        match self.optional_string(key).map(|value| value.to_lowercase()) {
            Some(value) if value == "1" || value == "true" || value == "yes" => true,
            Some(value) if value == "0" || value == "false" || value == "no" => false,
            _ => default,
        }
    }

    fn u32(&self, key: &str) -> Option<u32> {
        self.optional_string(key)
            .and_then(|value| value.parse::<u32>().ok())
    }

    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.optional_string(key).map(|value| split_list(&value))
    }

    fn optional_path(&self, key: &str) -> Option<PathBuf> {
        self.optional_string(key).map(PathBuf::from)
    }

    fn path_or(&self, key: &str, file_value: Option<&str>, default: &str) -> Result<PathBuf> {
        let value = self
            .optional_string(key)
            .or_else(|| {
                file_value
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| default.to_string());
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            anyhow::bail!("{key} resolved to an empty path");
        }
        Ok(path)
    }
}

/// Splits on commas and whitespace, so both `openid,email` and `openid email` work.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn random_secret() -> String {
    use base64::Engine;
    use rand::RngCore;

    let mut buf = [0u8; 48];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    base64::engine::general_purpose::STANDARD.encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn config_from(vars: &[(&str, &str)]) -> Result<DashboardConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DashboardConfig::from_lookup(|key| vars.get(key).cloned(), None)
    }

    #[test]
    fn defaults_match_the_stock_deployment() {
        let config = config_from(&[("DASHBOARD_SESSION_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.velero_bin, PathBuf::from("/usr/local/bin/velero"));
        assert_eq!(config.kubeconfig, PathBuf::from("/tmp/config"));
        assert_eq!(config.session_lifetime_days, 365);
        assert_eq!(config.auth_mode, AuthMode::Oidc);
        assert_eq!(config.oidc_client_secrets, PathBuf::from("client_secrets.json"));
        assert_eq!(config.oidc_scopes, vec!["openid", "email", "profile"]);
        assert_eq!(config.oidc_realm, "master");
        assert_eq!(config.default_role, Role::Admin);
        assert!(config.cookie_secure);
        assert_eq!(config.mail_from, "admin@localhost");
        assert!(config.static_root.is_none());
    }

    #[test]
    fn session_secret_is_required_outside_debug() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DASHBOARD_SESSION_SECRET"));

        let config = config_from(&[("DASHBOARD_DEBUG", "true")]).unwrap();
        assert!(config.debug);
        assert!(!config.session_secret.is_empty());
    }

    #[test]
    fn env_values_are_trimmed_and_typed() {
        let config = config_from(&[
            ("DASHBOARD_SESSION_SECRET", "s3cret"),
            ("DASHBOARD_VELERO_BIN", "  /opt/velero  "),
            ("DASHBOARD_SESSION_LIFETIME_DAYS", "7"),
            ("DASHBOARD_AUTH_MODE", "none"),
            ("DASHBOARD_OIDC_SCOPES", "openid, email groups"),
            ("DASHBOARD_OIDC_ADMIN_GROUPS", "velero-admins"),
            ("DASHBOARD_DEFAULT_ROLE", "viewer"),
            ("DASHBOARD_COOKIE_SECURE", "no"),
        ])
        .unwrap();
        assert_eq!(config.velero_bin, PathBuf::from("/opt/velero"));
        assert_eq!(config.session_lifetime_days, 7);
        assert_eq!(config.auth_mode, AuthMode::None);
        assert_eq!(config.oidc_scopes, vec!["openid", "email", "groups"]);
        assert_eq!(config.oidc_admin_groups, vec!["velero-admins"]);
        assert_eq!(config.default_role, Role::Viewer);
        assert!(!config.cookie_secure);
    }

    #[test]
    fn unknown_auth_mode_is_rejected() {
        let err = config_from(&[
            ("DASHBOARD_SESSION_SECRET", "s3cret"),
            ("DASHBOARD_AUTH_MODE", "ldap"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("ldap"));
    }

    #[test]
    fn config_file_fills_gaps_but_env_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"velero_bin": "/srv/velero", "kubeconfig": "/srv/kubeconfig", "mail_from": "ops@example.com", "oidc_scopes": ["openid"]}}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();
        let config = config_from(&[
            ("DASHBOARD_SESSION_SECRET", "s3cret"),
            ("DASHBOARD_CONFIG_PATH", path.as_str()),
            ("DASHBOARD_KUBECONFIG", "/etc/kubeconfig"),
        ])
        .unwrap();
        assert_eq!(config.velero_bin, PathBuf::from("/srv/velero"));
        assert_eq!(config.kubeconfig, PathBuf::from("/etc/kubeconfig"));
        assert_eq!(config.mail_from, "ops@example.com");
        assert_eq!(config.oidc_scopes, vec!["openid"]);
    }

    #[test]
    fn unreadable_config_file_is_ignored() {
        let config = config_from(&[
            ("DASHBOARD_SESSION_SECRET", "s3cret"),
            ("DASHBOARD_CONFIG_PATH", "/nonexistent/dashboard.json"),
        ])
        .unwrap();
        assert_eq!(config.velero_bin, PathBuf::from("/usr/local/bin/velero"));
    }
}
