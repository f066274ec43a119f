//! Domain model for persisted and synced notes.
//!
//! # Responsibility
//! - Define the closed enums stored as integer codes.
//! - Define the `Note` record shared by storage and sync.
//!
//! # Invariants
//! - Enum codes are fixed once released; see `crate::convert::code`.
//! - A note's pinned state always agrees with its status.

pub mod note;
pub mod pinned_status;
