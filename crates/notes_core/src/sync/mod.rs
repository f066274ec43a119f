//! Sync wire format for notes.
//!
//! # Responsibility
//! - Encode and decode the versioned JSON payload exchanged with the sync
//!   backend.
//! - Bridge payloads to and from a `NoteRepository`.

pub mod payload;

pub use payload::{
    decode_notes, encode_notes, export_notes, import_notes, SyncError, SYNC_PAYLOAD_VERSION,
};
