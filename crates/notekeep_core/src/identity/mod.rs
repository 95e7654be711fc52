//! Principal identity and role resolution.
//!
//! # Responsibility
//! - Define the closed set of roles understood by the access policy.
//! - Resolve a principal name to its role set through an injected store.
//!
//! # Invariants
//! - Core never owns credentials; role stores only answer role queries.
//! - Unknown principals are an error, never an empty role set.

pub mod resolver;
pub mod role;
