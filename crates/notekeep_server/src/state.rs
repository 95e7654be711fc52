use crate::auth::CredentialStore;
use notekeep_core::{InMemoryRoleStore, NoteService, SqliteNoteRepository};
use std::sync::Arc;

/// Note service wired to SQLite and the configured role store.
pub type NotesService = NoteService<SqliteNoteRepository, InMemoryRoleStore>;

/// Shared state handed to every actix worker.
#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<NotesService>,
    pub credentials: Arc<CredentialStore>,
}

impl AppState {
    pub fn new(notes: NotesService, credentials: CredentialStore) -> Self {
        Self {
            notes: Arc::new(notes),
            credentials: Arc::new(credentials),
        }
    }
}
