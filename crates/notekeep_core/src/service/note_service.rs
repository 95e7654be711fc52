//! Note use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/update use-cases for an authenticated principal.
//! - Wire role resolution, access policy, reconciliation and the store.
//!
//! # Invariants
//! - Every use-case resolves the principal's roles before touching storage.
//! - Reads and updates share one scope, so a note outside it is reported as
//!   `NotFound` exactly like a missing note.
//! - Validation failures on create persist nothing.

use crate::identity::resolver::{IdentityError, Principal, RoleResolver, RoleStore};
use crate::model::note::{now_utc, NewNote, Note, NoteDraft, NoteId, NoteValidationError, UpdateRequest};
use crate::policy::{authorize_read, scope_listing, Decision};
use crate::repo::note_repo::{NoteListQuery, NoteRepository, RepoError, SortParseError};
use crate::service::listing::{NotePage, PageRequest};
use crate::service::reconcile::{reconcile, ChangedFields};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Clock used to stamp creation and modification times.
pub type Clock = fn() -> DateTime<Utc>;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Creation request is missing a required field.
    Validation(NoteValidationError),
    /// Listing sort expression is not supported.
    InvalidSort(SortParseError),
    /// Note is absent or not visible to the caller.
    NotFound(NoteId),
    /// Caller has no role record.
    UnknownPrincipal(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl NoteServiceError {
    /// Whether the error is the caller's fault rather than the server's.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidSort(_) | Self::NotFound(_)
        )
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidSort(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::UnknownPrincipal(name) => write!(f, "unknown principal: `{name}`"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidSort(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<IdentityError> for NoteServiceError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::UnknownPrincipal(name) => Self::UnknownPrincipal(name),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SortParseError> for NoteServiceError {
    fn from(value: SortParseError) -> Self {
        Self::InvalidSort(value)
    }
}

/// Result of an update use-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Note state after the update.
    pub note: Note,
    /// Fields that actually changed. Empty means no write happened.
    pub changed: ChangedFields,
}

/// Note service facade over a repository and a role store.
pub struct NoteService<R: NoteRepository, S: RoleStore> {
    repo: R,
    roles: RoleResolver<S>,
    clock: Clock,
}

impl<R: NoteRepository, S: RoleStore> NoteService<R, S> {
    /// Creates a service using the system clock.
    pub fn new(repo: R, role_store: S) -> Self {
        Self {
            repo,
            roles: RoleResolver::new(role_store),
            clock: now_utc,
        }
    }

    /// Replaces the clock, mainly for deterministic tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn roles(&self) -> &RoleResolver<S> {
        &self.roles
    }

    /// Resolves `name` into a principal with roles.
    pub fn principal(&self, name: &str) -> Result<Principal, NoteServiceError> {
        self.roles.resolve(name).map_err(|err| {
            warn!("event=principal_resolve module=service status=error error_code=unknown_principal");
            err.into()
        })
    }

    /// Creates one note owned by `principal_name`.
    ///
    /// # Errors
    /// - `Validation` when title or body is missing/blank; nothing is stored.
    pub fn create_note(
        &self,
        principal_name: &str,
        request: NewNote,
    ) -> Result<Note, NoteServiceError> {
        let started_at = Instant::now();
        let principal = self.principal(principal_name)?;
        let draft = NoteDraft::from_request(request, &principal.name, (self.clock)())?;

        let id = self.repo.insert_note(&draft)?;
        let created = self
            .repo
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(
                "created note not found in read-back",
            ))?;

        info!(
            "event=note_create module=service status=ok note_id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        Ok(created)
    }

    /// Gets one note visible to `principal_name`.
    pub fn get_note(&self, principal_name: &str, id: NoteId) -> Result<Note, NoteServiceError> {
        let principal = self.principal(principal_name)?;
        match authorize_read(&self.repo, &principal, id)? {
            Decision::Allow(note) => Ok(note),
            Decision::Deny => Err(NoteServiceError::NotFound(id)),
        }
    }

    /// Lists one page of the notes visible to `principal_name`.
    pub fn list_notes(
        &self,
        principal_name: &str,
        request: &PageRequest,
    ) -> Result<NotePage, NoteServiceError> {
        let started_at = Instant::now();
        let principal = self.principal(principal_name)?;
        let scope = scope_listing(&principal);
        let size = request.applied_size();
        let query = NoteListQuery {
            scope,
            sort: request.applied_sort(),
            limit: size,
            offset: request.offset(),
        };

        let items = self.repo.list_notes(&query)?;
        let total = self.repo.count_notes(&query.scope)?;

        info!(
            "event=note_list module=service status=ok admin={} page={} size={} returned={} total={} duration_ms={}",
            principal.is_admin(),
            request.page,
            size,
            items.len(),
            total,
            started_at.elapsed().as_millis()
        );
        Ok(NotePage {
            items,
            page: request.page,
            size,
            total,
        })
    }

    /// Applies a reconciled update to a note visible to `principal_name`.
    ///
    /// The read, reconciliation and write run inside one store transaction.
    /// When nothing changes no write is issued and `modified_on` is kept.
    pub fn update_note(
        &self,
        principal_name: &str,
        id: NoteId,
        request: &UpdateRequest,
    ) -> Result<UpdateOutcome, NoteServiceError> {
        let started_at = Instant::now();
        let principal = self.principal(principal_name)?;
        let scope = scope_listing(&principal);
        let now = (self.clock)();

        let mut changed = ChangedFields::default();
        let mut apply = |existing: &Note| {
            let reconciled = reconcile(existing, request, now);
            changed = reconciled.changed;
            reconciled.into_write()
        };

        let write = self
            .repo
            .modify_note(id, &scope, &mut apply)?
            .ok_or(NoteServiceError::NotFound(id))?;

        info!(
            "event=note_update module=service status=ok note_id={} written={} title_changed={} body_changed={} duration_ms={}",
            id,
            write.written,
            changed.title,
            changed.body,
            started_at.elapsed().as_millis()
        );
        Ok(UpdateOutcome {
            note: write.note,
            changed,
        })
    }
}
