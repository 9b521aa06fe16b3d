//! Configuration Management
//!
//! This module loads the server address and the role → database account
//! table, and resolves each account's secret at the moment it is needed.
//!
//! # Configuration Locations
//! - Explicit: `--config <PATH>`
//! - Local: `.closetly/config.json` (per-project)
//! - Global: `~/.config/closetly/config.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Command-line overrides (highest priority)
//! 2. Explicit config file
//! 3. Local config file
//! 4. Global config file
//! 5. Built-in defaults
//!
//! # Secrets
//! No secret is compiled into the client. A role's password comes from the
//! environment variable named by `password_env`, then from a literal
//! `password` in a config file, then from `CLOSETLY_<ACCOUNT>_PASSWORD`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{DbCredential, ServerAddress};
use crate::error::{ClosetlyError, Result};
use crate::role::RoleTag;

/// Credential entry for one role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Database account name (defaults to the role's built-in account)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Literal password
    /// WARNING: Sensitive data, prefer `password_env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl StoredCredential {
    /// Layer `other` over `self`, field by field
    fn merge(&mut self, other: Self) {
        if other.user.is_some() {
            self.user = other.user;
        }
        if other.password.is_some() {
            self.password = other.password;
        }
        if other.password_env.is_some() {
            self.password_env = other.password_env;
        }
    }
}

/// Server fields a config file may override
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// On-disk configuration file format
///
/// Every field is optional; missing fields keep the value from a lower
/// precedence layer.
///
/// ```json
/// {
///   "server": { "host": "localhost", "port": 8889, "database": "closetly" },
///   "bootstrap_role": "admin",
///   "credentials": {
///     "personal": { "user": "personal", "password_env": "CLOSETLY_PERSONAL_PASSWORD" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerOverrides>,

    /// Role whose account is used before login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_role: Option<RoleTag>,

    /// Show detailed connection errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub credentials: BTreeMap<RoleTag, StoredCredential>,
}

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server every session connects to
    pub server: ServerAddress,

    /// Role whose account checks usernames and passwords before login
    pub bootstrap_role: RoleTag,

    /// Show detailed connection errors
    pub debug: bool,

    /// Per-role credential entries
    pub credentials: BTreeMap<RoleTag, StoredCredential>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerAddress::default(),
            bootstrap_role: RoleTag::Admin,
            debug: false,
            credentials: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Layer a config file over this configuration
    pub fn merge(&mut self, file: ConfigFile) {
        if let Some(server) = file.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(database) = server.database {
                self.server.database = database;
            }
        }

        if let Some(role) = file.bootstrap_role {
            self.bootstrap_role = role;
        }

        if let Some(debug) = file.debug {
            self.debug = debug;
        }

        for (role, entry) in file.credentials {
            self.credentials.entry(role).or_default().merge(entry);
        }
    }

    /// Database credential for the bootstrap role
    pub fn bootstrap_credential(&self) -> Result<DbCredential> {
        self.credential_for(self.bootstrap_role)
    }

    /// Database credential for `role`, reading secrets through `env`
    pub fn credential_for_with<F>(&self, role: RoleTag, env: F) -> Result<DbCredential>
    where
        F: Fn(&str) -> Option<String>,
    {
        let entry = self.credentials.get(&role).cloned().unwrap_or_default();
        let user = entry.user.unwrap_or_else(|| role.default_account().to_string());

        // An explicit password_env must resolve; it is never silently skipped
        if let Some(var) = &entry.password_env {
            return env(var).map(|password| DbCredential::new(user, password)).ok_or_else(|| {
                ClosetlyError::config_error(format!(
                    "Environment variable {var} not found for the {role} account"
                ))
            });
        }

        if let Some(password) = entry.password {
            return Ok(DbCredential::new(user, password));
        }

        let var = default_password_env(&user);
        env(&var).map(|password| DbCredential::new(user, password)).ok_or_else(|| {
            ClosetlyError::config_error(format!(
                "No secret configured for the {role} account (set {var} or add it to the config file)"
            ))
        })
    }
}

/// Source of database credentials per role
pub trait CredentialSource {
    /// Database credential backing sessions for `role`
    fn credential_for(&self, role: RoleTag) -> Result<DbCredential>;
}

impl CredentialSource for ClientConfig {
    fn credential_for(&self, role: RoleTag) -> Result<DbCredential> {
        self.credential_for_with(role, |name| std::env::var(name).ok())
    }
}

/// Default environment variable for an account's password
///
/// `appadmin` → `CLOSETLY_APPADMIN_PASSWORD`
#[must_use]
pub fn default_password_env(account: &str) -> String {
    let upper: String = account
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("CLOSETLY_{upper}_PASSWORD")
}

/// Get path to local config file (`.closetly/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        ClosetlyError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".closetly").join("config.json"))
}

/// Get path to global config file (`~/.config/closetly/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ClosetlyError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("closetly").join("config.json"))
}

/// Load one config file
pub fn load_file(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ClosetlyError::config_error(format!("Could not read config file {}: {e}", path.display()))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        ClosetlyError::config_error(format!("Invalid config file format in {}: {e}", path.display()))
    })
}

/// Load configuration with precedence (global, then local, then explicit)
///
/// Missing local and global files are skipped; a missing explicit file is an error.
pub fn load_with_precedence(explicit: Option<&Path>) -> Result<ClientConfig> {
    let mut config = ClientConfig::default();

    for path in [global_config_path()?, local_config_path()?] {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config file");
            config.merge(load_file(&path)?);
        }
    }

    if let Some(path) = explicit {
        tracing::debug!(path = %path.display(), "loading explicit config file");
        config.merge(load_file(path)?);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_password_env() {
        assert_eq!(default_password_env("appadmin"), "CLOSETLY_APPADMIN_PASSWORD");
        assert_eq!(default_password_env("store-owner"), "CLOSETLY_STORE_OWNER_PASSWORD");
    }

    #[test]
    fn test_default_account_from_environment() {
        let config = ClientConfig::default();
        let env = env_of(&[("CLOSETLY_APPADMIN_PASSWORD", "s3cret")]);

        let cred = config.credential_for_with(RoleTag::Admin, env).unwrap();
        assert_eq!(cred, DbCredential::new("appadmin", "s3cret"));
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let config = ClientConfig::default();
        let err = config.credential_for_with(RoleTag::Personal, env_of(&[])).unwrap_err();

        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("CLOSETLY_PERSONAL_PASSWORD"));
    }

    #[test]
    fn test_password_env_takes_precedence() {
        let mut config = ClientConfig::default();
        config.credentials.insert(
            RoleTag::Stylist,
            StoredCredential {
                user: Some("stylist_rw".to_string()),
                password: Some("literal".to_string()),
                password_env: Some("MY_STYLIST_PW".to_string()),
            },
        );

        let cred = config
            .credential_for_with(RoleTag::Stylist, env_of(&[("MY_STYLIST_PW", "from-env")]))
            .unwrap();
        assert_eq!(cred, DbCredential::new("stylist_rw", "from-env"));
    }

    #[test]
    fn test_unset_password_env_is_not_skipped() {
        let mut config = ClientConfig::default();
        config.credentials.insert(
            RoleTag::Stylist,
            StoredCredential {
                user: None,
                password: Some("literal".to_string()),
                password_env: Some("NONEXISTENT_VAR".to_string()),
            },
        );

        let result = config.credential_for_with(RoleTag::Stylist, env_of(&[]));
        assert!(result.unwrap_err().to_string().contains("NONEXISTENT_VAR"));
    }

    #[test]
    fn test_literal_password() {
        let mut config = ClientConfig::default();
        config.credentials.insert(
            RoleTag::AppClient,
            StoredCredential { password: Some("clientpw".to_string()), ..Default::default() },
        );

        let cred = config.credential_for_with(RoleTag::AppClient, env_of(&[])).unwrap();
        assert_eq!(cred, DbCredential::new("appclient", "clientpw"));
    }

    #[test]
    fn test_merge_layers() {
        let mut config = ClientConfig::default();

        let global: ConfigFile = serde_json::from_str(
            r#"{
                "server": { "host": "db.internal", "port": 3306 },
                "credentials": { "personal": { "user": "personal_g", "password_env": "G_PW" } }
            }"#,
        )
        .unwrap();
        let local: ConfigFile = serde_json::from_str(
            r#"{
                "server": { "database": "closetly_dev" },
                "bootstrap_role": "appclient",
                "debug": true,
                "credentials": { "personal": { "password_env": "L_PW" } }
            }"#,
        )
        .unwrap();

        config.merge(global);
        config.merge(local);

        assert_eq!(
            config.server,
            ServerAddress {
                host: "db.internal".to_string(),
                port: 3306,
                database: "closetly_dev".to_string(),
            }
        );
        assert_eq!(config.bootstrap_role, RoleTag::AppClient);
        assert!(config.debug);

        let personal = &config.credentials[&RoleTag::Personal];
        assert_eq!(personal.user.as_deref(), Some("personal_g"));
        assert_eq!(personal.password_env.as_deref(), Some("L_PW"));
    }

    #[test]
    fn test_load_file_round_trip() {
        let path = std::env::temp_dir().join(format!("closetly_config_{}.json", std::process::id()));
        let mut file = ConfigFile { bootstrap_role: Some(RoleTag::Admin), ..Default::default() };
        file.credentials.insert(
            RoleTag::StoreOwner,
            StoredCredential { password_env: Some("SO_PW".to_string()), ..Default::default() },
        );
        fs::write(&path, serde_json::to_string_pretty(&file).unwrap()).unwrap();

        let loaded = load_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, file);
    }

    #[test]
    fn test_load_invalid_file() {
        let path = std::env::temp_dir().join(format!("closetly_bad_{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();

        let result = load_file(&path);
        let _ = fs::remove_file(&path);

        assert!(result.unwrap_err().to_string().contains("Invalid config file format"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let path = std::env::temp_dir().join("closetly_definitely_missing_config.json");
        assert!(load_with_precedence(Some(&path)).is_err());
    }
}
