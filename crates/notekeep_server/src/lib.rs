//! HTTP surface for NoteKeep.
//!
//! # Responsibility
//! - Expose the note use-cases of `notekeep_core` over actix-web.
//! - Authenticate callers and hand the principal name to the core.
//!
//! # Invariants
//! - Handlers never touch SQLite directly; all storage goes through
//!   `NoteService` on the blocking pool.

pub mod auth;
pub mod config;
pub mod controllers;
pub mod error;
pub mod state;

pub use state::AppState;
