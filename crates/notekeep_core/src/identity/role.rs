//! Role declarations for note access.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Role granted to an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Default authenticated role; sees and mutates own notes only.
    Owner,
    /// Elevated role; bypasses ownership checks.
    Admin,
}

/// Config string value for the owner role.
pub const ROLE_OWNER: &str = "owner";
/// Legacy alias accepted for the owner role.
pub const ROLE_NOTE_OWNER: &str = "note-owner";
/// Config string value for the admin role.
pub const ROLE_ADMIN: &str = "admin";

impl Role {
    /// Stable string id used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => ROLE_OWNER,
            Self::Admin => ROLE_ADMIN,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of roles held by one principal.
pub type RoleSet = BTreeSet<Role>;

/// Parses one role from its configuration string.
pub fn parse_role(value: &str) -> Result<Role, RoleParseError> {
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(RoleParseError::EmptyRole);
    }

    match normalized.as_str() {
        ROLE_OWNER | ROLE_NOTE_OWNER => Ok(Role::Owner),
        ROLE_ADMIN => Ok(Role::Admin),
        _ => Err(RoleParseError::UnsupportedRole(value.trim().to_string())),
    }
}

/// Role parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleParseError {
    EmptyRole,
    UnsupportedRole(String),
}

impl Display for RoleParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRole => write!(f, "role value must not be empty"),
            Self::UnsupportedRole(value) => write!(f, "role is unsupported: {value}"),
        }
    }
}

impl Error for RoleParseError {}
