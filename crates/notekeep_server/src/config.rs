//! Server configuration from environment variables and the users file.
//!
//! # Responsibility
//! - Read bind address, database location and logging settings.
//! - Load user credentials and role grants from a TOML users file.
//!
//! # Invariants
//! - Every configured user has at least one valid role.
//! - Credentials end up in the HTTP auth layer only; the core receives a
//!   role store and nothing else.

use crate::auth::CredentialStore;
use notekeep_core::{parse_role, InMemoryRoleStore, RoleSet};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const BIND: &str = "NOTEKEEP_BIND";
    pub const PORT: &str = "NOTEKEEP_PORT";
    /// File path, or `:memory:` for a throwaway database.
    pub const DATABASE_URL: &str = "NOTEKEEP_DATABASE_URL";
    pub const USERS_FILE: &str = "NOTEKEEP_USERS_FILE";
    pub const LOG_LEVEL: &str = "NOTEKEEP_LOG_LEVEL";
    /// Absolute directory for rolling log files. Unset logs to stderr.
    pub const LOG_DIR: &str = "NOTEKEEP_LOG_DIR";
}

/// Default values
pub mod defaults {
    pub const BIND: &str = "127.0.0.1";
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/notekeep.db";
    pub const USERS_FILE: &str = "config/users.toml";
}

/// Database location marker for an in-memory store.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub database_url: String,
    pub users_file: PathBuf,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match non_empty(env_vars::PORT) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: env_vars::PORT,
                    value: raw,
                })?,
            None => defaults::PORT,
        };

        Ok(Self {
            bind: non_empty(env_vars::BIND).unwrap_or_else(|| defaults::BIND.to_string()),
            port,
            database_url: non_empty(env_vars::DATABASE_URL)
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            users_file: non_empty(env_vars::USERS_FILE)
                .map_or_else(|| PathBuf::from(defaults::USERS_FILE), PathBuf::from),
            log_level: non_empty(env_vars::LOG_LEVEL)
                .unwrap_or_else(|| notekeep_core::default_log_level().to_string()),
            log_dir: non_empty(env_vars::LOG_DIR),
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url == IN_MEMORY_DATABASE
    }
}

/// One `[[users]]` entry of the users file.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub name: String,
    pub password_sha256: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersFile {
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// Credentials for the auth layer plus roles for the core.
#[derive(Debug, Clone)]
pub struct UserRegistry {
    pub credentials: CredentialStore,
    pub roles: InMemoryRoleStore,
}

impl UsersFile {
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|err| ConfigError::UsersFile(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::parse(&source)
    }

    /// Validates entries and splits them into credentials and roles.
    pub fn into_registry(self) -> Result<UserRegistry, ConfigError> {
        let mut credentials = CredentialStore::new();
        let mut roles = InMemoryRoleStore::new();
        let mut seen = HashSet::new();

        for user in self.users {
            let name = user.name.trim().to_string();
            if name.is_empty() || name.contains(':') {
                return Err(ConfigError::InvalidUser {
                    name,
                    reason: "user name must be non-empty and must not contain `:`".to_string(),
                });
            }
            if !seen.insert(name.clone()) {
                return Err(ConfigError::InvalidUser {
                    name,
                    reason: "duplicate user".to_string(),
                });
            }

            let granted = user
                .roles
                .iter()
                .map(|value| parse_role(value))
                .collect::<Result<RoleSet, _>>()
                .map_err(|err| ConfigError::InvalidUser {
                    name: name.clone(),
                    reason: err.to_string(),
                })?;
            if granted.is_empty() {
                return Err(ConfigError::InvalidUser {
                    name,
                    reason: "at least one role is required".to_string(),
                });
            }

            credentials
                .insert_digest_hex(name.clone(), &user.password_sha256)
                .map_err(|reason| ConfigError::InvalidUser {
                    name: name.clone(),
                    reason,
                })?;
            roles.insert(name, granted);
        }

        Ok(UserRegistry { credentials, roles })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
    Io { path: PathBuf, message: String },
    UsersFile(String),
    InvalidUser { name: String, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
            Self::Io { path, message } => {
                write!(f, "failed to read `{}`: {message}", path.display())
            }
            Self::UsersFile(message) => write!(f, "invalid users file: {message}"),
            Self::InvalidUser { name, reason } => write!(f, "invalid user `{name}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}
