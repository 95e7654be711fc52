//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide id, `(id, owner)` and scoped paged lookups over `notes`.
//! - Own the per-note read-modify-write transaction used by updates.
//!
//! # Invariants
//! - Write paths call `NoteDraft::validate()` or `Note::validate()` before
//!   SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Scope is applied in the `WHERE` clause before ordering and paging.
//! - `id`, `owner` and `created_on` are never part of an `UPDATE`.

use crate::db::{DbError, DbPool, PooledConn};
use crate::model::note::{Note, NoteDraft, NoteId, NoteValidationError};
use crate::policy::Scope;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    created_on,
    modified_on,
    owner
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<r2d2::Error> for RepoError {
    fn from(value: r2d2::Error) -> Self {
        Self::Db(DbError::Pool(value))
    }
}

/// Sortable note columns, named as in the JSON representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Body,
    CreatedOn,
    ModifiedOn,
    Owner,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Body => "body",
            Self::CreatedOn => "created_on",
            Self::ModifiedOn => "modified_on",
            Self::Owner => "owner",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "body" => Some(Self::Body),
            "createdOn" => Some(Self::CreatedOn),
            "modifiedOn" => Some(Self::ModifiedOn),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Ordering for note listings. Ties always break on `id ASC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    /// Newest notes first.
    fn default() -> Self {
        Self {
            field: SortField::CreatedOn,
            direction: SortDirection::Desc,
        }
    }
}

impl SortOrder {
    /// Parses `field[,asc|desc]`. Direction defaults to ascending.
    pub fn parse(value: &str) -> Result<Self, SortParseError> {
        let mut parts = value.split(',').map(str::trim);
        let field_name = parts.next().unwrap_or_default();
        let field = SortField::parse(field_name)
            .ok_or_else(|| SortParseError::UnknownField(field_name.to_string()))?;

        let direction = match parts.next() {
            None => SortDirection::Asc,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                _ => return Err(SortParseError::UnknownDirection(raw.to_string())),
            },
        };

        if let Some(extra) = parts.next() {
            return Err(SortParseError::UnknownDirection(extra.to_string()));
        }

        Ok(Self { field, direction })
    }

    fn order_by_clause(self) -> String {
        let mut clause = format!(" ORDER BY {} {}", self.field.column(), self.direction.keyword());
        if self.field != SortField::Id {
            clause.push_str(", id ASC");
        }
        clause
    }
}

/// Sort expression parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortParseError {
    UnknownField(String),
    UnknownDirection(String),
}

impl Display for SortParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(value) => write!(f, "unsupported sort field: `{value}`"),
            Self::UnknownDirection(value) => write!(f, "unsupported sort direction: `{value}`"),
        }
    }
}

impl Error for SortParseError {}

/// Scoped, ordered, paged listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListQuery {
    pub scope: Scope,
    pub sort: SortOrder,
    pub limit: u32,
    pub offset: u64,
}

/// Result of a scoped read-modify-write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteWrite {
    /// Note state after the transaction.
    pub note: Note,
    /// Whether an `UPDATE` was issued.
    pub written: bool,
}

/// Repository interface for note persistence.
pub trait NoteRepository {
    /// Inserts a validated draft and returns the store-assigned id.
    fn insert_note(&self, draft: &NoteDraft) -> RepoResult<NoteId>;
    /// Gets one note by id regardless of owner.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Gets one note by id only if `owner` matches.
    fn get_note_owned(&self, id: NoteId, owner: &str) -> RepoResult<Option<Note>>;
    /// Lists notes inside `query.scope`, ordered then paged.
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Counts notes inside `scope`.
    fn count_notes(&self, scope: &Scope) -> RepoResult<u64>;
    /// Persists `title`, `body` and `modified_on` of an existing note.
    fn update_note(&self, note: &Note) -> RepoResult<()>;
    /// Reads note `id` within `scope`, passes it to `apply`, and writes the
    /// returned note if any, all in one write-locked transaction.
    ///
    /// Returns `None` when the note is absent or outside `scope`.
    fn modify_note(
        &self,
        id: NoteId,
        scope: &Scope,
        apply: &mut dyn FnMut(&Note) -> Option<Note>,
    ) -> RepoResult<Option<NoteWrite>>;
}

/// SQLite-backed note repository over a shared connection pool.
#[derive(Clone)]
pub struct SqliteNoteRepository {
    pool: DbPool,
}

impl SqliteNoteRepository {
    /// Constructs a repository from a migrated pool.
    pub fn try_new(pool: DbPool) -> RepoResult<Self> {
        let conn = pool.get()?;
        ensure_notes_table_ready(&conn)?;
        drop(conn);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn conn(&self) -> RepoResult<PooledConn> {
        Ok(self.pool.get()?)
    }
}

impl NoteRepository for SqliteNoteRepository {
    fn insert_note(&self, draft: &NoteDraft) -> RepoResult<NoteId> {
        draft.validate()?;
        let created_on = to_micros(draft.created_on);
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO notes (title, body, created_on, modified_on, owner)
             VALUES (?1, ?2, ?3, ?3, ?4);",
            params![
                draft.title.as_str(),
                draft.body.as_str(),
                created_on,
                draft.owner.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let conn = self.conn()?;
        select_note(&conn, id, None)
    }

    fn get_note_owned(&self, id: NoteId, owner: &str) -> RepoResult<Option<Note>> {
        let conn = self.conn()?;
        select_note(&conn, id, Some(owner))
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = String::from(NOTE_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(owner) = query.scope.owner() {
            sql.push_str(" WHERE owner = ?");
            bind_values.push(Value::Text(owner.to_string()));
        }

        sql.push_str(&query.sort.order_by_clause());
        sql.push_str(" LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(
            i64::try_from(query.offset).unwrap_or(i64::MAX),
        ));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }

        Ok(notes)
    }

    fn count_notes(&self, scope: &Scope) -> RepoResult<u64> {
        let conn = self.conn()?;
        let count: i64 = match scope.owner() {
            Some(owner) => conn.query_row(
                "SELECT COUNT(*) FROM notes WHERE owner = ?1;",
                [owner],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?,
        };
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative note count `{count}`")))
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        let conn = self.conn()?;
        write_note(&conn, note)
    }

    fn modify_note(
        &self,
        id: NoteId,
        scope: &Scope,
        apply: &mut dyn FnMut(&Note) -> Option<Note>,
    ) -> RepoResult<Option<NoteWrite>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(existing) = select_note(&tx, id, scope.owner())? else {
            return Ok(None);
        };

        let outcome = match apply(&existing) {
            Some(updated) => {
                ensure_identity_unchanged(&existing, &updated)?;
                write_note(&tx, &updated)?;
                NoteWrite {
                    note: updated,
                    written: true,
                }
            }
            None => NoteWrite {
                note: existing,
                written: false,
            },
        };

        tx.commit()?;
        Ok(Some(outcome))
    }
}

fn select_note(conn: &Connection, id: NoteId, owner: Option<&str>) -> RepoResult<Option<Note>> {
    let note = match owner {
        Some(owner) => conn
            .query_row(
                &format!("{NOTE_SELECT_SQL} WHERE id = ?1 AND owner = ?2;"),
                params![id, owner],
                parse_note_row_raw,
            )
            .optional()?,
        None => conn
            .query_row(
                &format!("{NOTE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_note_row_raw,
            )
            .optional()?,
    };

    note.map(finish_note).transpose()
}

fn write_note(conn: &Connection, note: &Note) -> RepoResult<()> {
    note.validate()?;

    let changed = conn.execute(
        "UPDATE notes
         SET
            title = ?2,
            body = ?3,
            modified_on = ?4
         WHERE id = ?1;",
        params![
            note.id,
            note.title.as_str(),
            note.body.as_str(),
            to_micros(note.modified_on),
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound(note.id));
    }

    Ok(())
}

fn ensure_identity_unchanged(existing: &Note, updated: &Note) -> RepoResult<()> {
    if existing.id != updated.id
        || existing.owner != updated.owner
        || existing.created_on != updated.created_on
    {
        return Err(RepoError::InvalidData(format!(
            "update attempted to change immutable fields of note {}",
            existing.id
        )));
    }
    Ok(())
}

/// Row shape before timestamp decoding, so decode failures surface as
/// `InvalidData` instead of a generic SQLite error.
struct RawNoteRow {
    id: NoteId,
    title: String,
    body: String,
    created_on: i64,
    modified_on: i64,
    owner: String,
}

fn parse_note_row_raw(row: &Row<'_>) -> rusqlite::Result<RawNoteRow> {
    Ok(RawNoteRow {
        id: row.get("id")?,
        title: row.get("title")?,
        body: row.get("body")?,
        created_on: row.get("created_on")?,
        modified_on: row.get("modified_on")?,
        owner: row.get("owner")?,
    })
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    finish_note(parse_note_row_raw(row)?)
}

fn finish_note(raw: RawNoteRow) -> RepoResult<Note> {
    let note = Note {
        id: raw.id,
        title: raw.title,
        body: raw.body,
        created_on: from_micros(raw.created_on, "created_on")?,
        modified_on: from_micros(raw.modified_on, "modified_on")?,
        owner: raw.owner,
    };
    note.validate().map_err(|err| {
        RepoError::InvalidData(format!("note {} failed validation: {err}", note.id))
    })?;
    Ok(note)
}

fn to_micros(value: DateTime<Utc>) -> i64 {
    value.timestamp_micros()
}

fn from_micros(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid timestamp `{value}` in notes.{column}")))
}

fn ensure_notes_table_ready(conn: &Connection) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'notes'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::InvalidData(
            "notes table is missing; run migrations first".to_string(),
        ));
    }
    Ok(())
}
