//! Repository layer over the notes store.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep SQL inside the persistence boundary.
//!
//! # Invariants
//! - Decode failures on read surface as `RepoError::Integrity`, never as
//!   defaulted values.

pub mod note_repo;
