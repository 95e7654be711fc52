//! Core domain logic for NoteKeep.
//! This crate is the single source of truth for note access invariants.

pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;

pub use identity::resolver::{
    IdentityError, InMemoryRoleStore, Principal, RoleResolver, RoleStore,
};
pub use identity::role::{parse_role, Role, RoleParseError, RoleSet};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::note::{NewNote, Note, NoteDraft, NoteId, NoteValidationError, UpdateRequest};
pub use policy::{authorize_read, scope_listing, Decision, Scope};
pub use repo::note_repo::{
    NoteListQuery, NoteRepository, NoteWrite, RepoError, RepoResult, SortDirection, SortField,
    SortOrder, SortParseError, SqliteNoteRepository,
};
pub use service::listing::{NotePage, PageRequest};
pub use service::note_service::{NoteService, NoteServiceError, UpdateOutcome};
pub use service::reconcile::{reconcile, ChangedFields, ReconciledNote};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
