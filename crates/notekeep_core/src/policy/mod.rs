//! Access policy for note reads, writes and listings.
//!
//! # Responsibility
//! - Map a resolved principal to the set of notes it may see (`Scope`).
//! - Decide single-note access by querying inside that scope.
//!
//! # Invariants
//! - Ownership is enforced at the query boundary, never as a post-fetch
//!   filter, so listing counts and ordering cover the visible set only.
//! - "Exists but not yours" and "does not exist" produce the same `Deny`.

use crate::identity::resolver::Principal;
use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::{NoteRepository, RepoResult};

/// Subset of notes visible to one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every note in the store.
    AllOwners,
    /// Only notes whose owner equals the contained name.
    OnlyOwner(String),
}

impl Scope {
    /// Owner filter to apply, `None` for unrestricted scope.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::AllOwners => None,
            Self::OnlyOwner(owner) => Some(owner.as_str()),
        }
    }
}

/// Outcome of a single-note access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow(Note),
    Deny,
}

impl Decision {
    pub fn into_note(self) -> Option<Note> {
        match self {
            Self::Allow(note) => Some(note),
            Self::Deny => None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Admins see every note; everyone else sees only their own.
pub fn scope_listing(principal: &Principal) -> Scope {
    if principal.is_admin() {
        Scope::AllOwners
    } else {
        Scope::OnlyOwner(principal.name.clone())
    }
}

/// Decides whether `principal` may read note `id`.
///
/// Admins look up by id alone; other principals look up by `(id, owner)`.
pub fn authorize_read<R: NoteRepository + ?Sized>(
    repo: &R,
    principal: &Principal,
    id: NoteId,
) -> RepoResult<Decision> {
    let found = match scope_listing(principal) {
        Scope::AllOwners => repo.get_note(id)?,
        Scope::OnlyOwner(owner) => repo.get_note_owned(id, owner.as_str())?,
    };
    Ok(found.map_or(Decision::Deny, Decision::Allow))
}
