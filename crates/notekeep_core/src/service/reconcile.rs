//! Update reconciliation.
//!
//! # Responsibility
//! - Decide which fields of an update request are genuine changes.
//! - Produce the resulting note and its new `modified_on`.
//!
//! # Invariants
//! - A field changes only when the request carries a non-blank value that
//!   differs from the stored one by exact string comparison.
//! - `id`, `owner` and `created_on` are copied through untouched.
//! - `modified_on` moves only when something changed, and then strictly
//!   forward even if the supplied clock reads earlier than the stored value.

use crate::model::note::{is_blank, Note, UpdateRequest};
use chrono::{DateTime, Duration, Utc};

/// Fields changed by a reconciled update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangedFields {
    pub title: bool,
    pub body: bool,
}

impl ChangedFields {
    pub fn any(self) -> bool {
        self.title || self.body
    }
}

/// Outcome of reconciling one update request against a stored note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledNote {
    pub note: Note,
    pub changed: ChangedFields,
}

impl ReconciledNote {
    /// The note to persist, or `None` when the update is a no-op.
    pub fn into_write(self) -> Option<Note> {
        self.changed.any().then_some(self.note)
    }
}

/// Reconciles `request` against `existing` at time `now`.
pub fn reconcile(existing: &Note, request: &UpdateRequest, now: DateTime<Utc>) -> ReconciledNote {
    let mut note = existing.clone();
    let mut changed = ChangedFields::default();

    if let Some(title) = candidate(request.title.as_deref(), &existing.title) {
        note.title = title.to_string();
        changed.title = true;
    }
    if let Some(body) = candidate(request.body.as_deref(), &existing.body) {
        note.body = body.to_string();
        changed.body = true;
    }

    if changed.any() {
        note.modified_on = next_modified_on(existing.modified_on, now);
    }

    ReconciledNote { note, changed }
}

fn candidate<'a>(requested: Option<&'a str>, current: &str) -> Option<&'a str> {
    requested.filter(|value| !is_blank(value) && *value != current)
}

fn next_modified_on(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous + Duration::microseconds(1);
    now.max(floor)
}
