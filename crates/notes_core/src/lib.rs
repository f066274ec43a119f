//! Local-data core of the notes application.
//! Owns value conversion, persistence and sync encoding for notes.

pub mod config;
pub mod convert;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sync;

pub use config::CoreConfig;
pub use convert::{
    decode_code, encode_code, format_timestamp, parse_timestamp, ConvertError, ConvertResult,
    PrimitiveKind, StoredCode, Timestamp, WireDescriptor,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteId, NoteStatus, NoteType, NoteValidationError};
pub use model::pinned_status::PinnedStatus;
pub use repo::note_repo::{
    NoteListQuery, NoteRepository, RepoError, RepoResult, SqliteNoteRepository,
};
pub use sync::{decode_notes, encode_notes, export_notes, import_notes, SyncError};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
