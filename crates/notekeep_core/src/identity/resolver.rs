//! Role store contract and principal role resolution.

use super::role::{Role, RoleSet};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backing store for principal roles.
///
/// Implementations are injected by the host; the in-memory store below is
/// the default built from configuration.
pub trait RoleStore {
    /// Returns the role set of a registered principal, `None` when unknown.
    fn roles_of(&self, name: &str) -> Option<RoleSet>;

    /// Returns whether a registered principal holds `role`.
    fn has_role(&self, name: &str, role: Role) -> bool {
        self.roles_of(name)
            .is_some_and(|roles| roles.contains(&role))
    }
}

impl<T: RoleStore + ?Sized> RoleStore for std::sync::Arc<T> {
    fn roles_of(&self, name: &str) -> Option<RoleSet> {
        (**self).roles_of(name)
    }
}

/// Identity resolution failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Principal has no registered role record.
    UnknownPrincipal(String),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPrincipal(name) => write!(f, "unknown principal: `{name}`"),
        }
    }
}

impl Error for IdentityError {}

/// Authenticated identity together with its resolved roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub roles: RoleSet,
}

impl Principal {
    pub fn new(name: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            name: name.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Resolves principal names to role sets.
pub struct RoleResolver<S: RoleStore> {
    store: S,
}

impl<S: RoleStore> RoleResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the role set for `name`.
    ///
    /// # Errors
    /// - `UnknownPrincipal` when the store has no record for `name`.
    pub fn resolve_roles(&self, name: &str) -> Result<RoleSet, IdentityError> {
        self.store
            .roles_of(name)
            .ok_or_else(|| IdentityError::UnknownPrincipal(name.to_string()))
    }

    /// Resolves `name` into a [`Principal`] carrying its role set.
    pub fn resolve(&self, name: &str) -> Result<Principal, IdentityError> {
        let roles = self.resolve_roles(name)?;
        Ok(Principal {
            name: name.to_string(),
            roles,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Map-backed role store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoleStore {
    roles: HashMap<String, RoleSet>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a principal's role set.
    pub fn insert(&mut self, name: impl Into<String>, roles: impl IntoIterator<Item = Role>) {
        self.roles.insert(name.into(), roles.into_iter().collect());
    }

    /// Builder-style variant of [`InMemoryRoleStore::insert`].
    pub fn with_principal(
        mut self,
        name: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.insert(name, roles);
        self
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleStore for InMemoryRoleStore {
    fn roles_of(&self, name: &str) -> Option<RoleSet> {
        self.roles.get(name).cloned()
    }
}
