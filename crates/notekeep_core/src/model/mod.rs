//! Domain model for per-user notes.
//!
//! # Responsibility
//! - Define the canonical `Note` record and its request shapes.
//! - Own the at-rest validation rules shared by store and service layers.
//!
//! # Invariants
//! - Every note is identified by a store-assigned `NoteId`.
//! - `id`, `owner` and `created_on` never change after creation.

pub mod note;
