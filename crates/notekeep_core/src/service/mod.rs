//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate role resolution, policy and repository calls into
//!   use-case level APIs.
//! - Keep HTTP layers decoupled from storage details.

pub mod listing;
pub mod note_service;
pub mod reconcile;
