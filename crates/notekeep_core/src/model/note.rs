//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted `Note` record and its JSON representation.
//! - Define creation/update request shapes with explicit optional fields.
//!
//! # Invariants
//! - `title`, `body` and `owner` are never blank at rest.
//! - `modified_on >= created_on`.
//! - Notes are never deleted; there is no tombstone state.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned note identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type NoteId = i64;

/// Canonical persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Assigned once by the store on insert.
    pub id: NoteId,
    pub title: String,
    pub body: String,
    /// Set once at creation.
    pub created_on: DateTime<Utc>,
    /// Advanced only when a reconciled update changes `title` or `body`.
    pub modified_on: DateTime<Utc>,
    /// Principal that created the note.
    pub owner: String,
}

impl Note {
    /// Checks the at-rest invariants of a note record.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if is_blank(&self.title) {
            return Err(NoteValidationError::MissingTitle);
        }
        if is_blank(&self.body) {
            return Err(NoteValidationError::MissingBody);
        }
        if is_blank(&self.owner) {
            return Err(NoteValidationError::MissingOwner);
        }
        if self.modified_on < self.created_on {
            return Err(NoteValidationError::ModifiedBeforeCreated);
        }
        Ok(())
    }
}

/// Creation request. Fields are optional so absence and blankness are
/// reported the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewNote {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
        }
    }
}

/// Validated creation payload ready for insert. The store assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
    pub owner: String,
    pub created_on: DateTime<Utc>,
}

impl NoteDraft {
    /// Validates a creation request and stamps ownership and creation time.
    ///
    /// # Errors
    /// - `MissingTitle` / `MissingBody` when the field is absent or blank
    ///   after trimming. Title is checked first.
    pub fn from_request(
        request: NewNote,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, NoteValidationError> {
        let title = request
            .title
            .filter(|value| !is_blank(value))
            .ok_or(NoteValidationError::MissingTitle)?;
        let body = request
            .body
            .filter(|value| !is_blank(value))
            .ok_or(NoteValidationError::MissingBody)?;
        if is_blank(owner) {
            return Err(NoteValidationError::MissingOwner);
        }

        Ok(Self {
            title,
            body,
            owner: owner.to_string(),
            created_on: now,
        })
    }

    /// Same at-rest rules as `Note::validate()` for a note not yet stored.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if is_blank(&self.title) {
            return Err(NoteValidationError::MissingTitle);
        }
        if is_blank(&self.body) {
            return Err(NoteValidationError::MissingBody);
        }
        if is_blank(&self.owner) {
            return Err(NoteValidationError::MissingOwner);
        }
        Ok(())
    }
}

/// Update request. Only `title` and `body` are read; any other field a
/// client sends is ignored during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl UpdateRequest {
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            body: None,
        }
    }

    pub fn body(value: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(value.into()),
        }
    }
}

/// Validation failures for note records and creation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    MissingTitle,
    MissingBody,
    MissingOwner,
    ModifiedBeforeCreated,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "note title is required"),
            Self::MissingBody => write!(f, "note body is required"),
            Self::MissingOwner => write!(f, "note owner is required"),
            Self::ModifiedBeforeCreated => {
                write!(f, "note modified timestamp precedes its creation timestamp")
            }
        }
    }
}

impl Error for NoteValidationError {}

/// Current time at the store's microsecond resolution.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Returns whether the value is empty or whitespace-only.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
