//! Versioned JSON payload of notes.
//!
//! Payload shape:
//! `{ "version": 1, "notes": [ { "uuid", "type", "title", "content",
//! "added", "modified", "status", "pinned" } ] }`
//!
//! Enum fields travel as integer codes and dates as canonical ISO-8601
//! strings, both through the `crate::convert` shims.
//!
//! # Invariants
//! - The envelope version is checked before any note is decoded.
//! - Every decoded note has passed `Note::validate()`.

use crate::model::note::{Note, NoteValidationError};
use crate::repo::note_repo::{NoteListQuery, NoteRepository, RepoError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Envelope version written by this build.
pub const SYNC_PAYLOAD_VERSION: u32 = 1;

/// Sync encode/decode failure.
#[derive(Debug)]
pub enum SyncError {
    /// Payload is not well-formed JSON or is truncated.
    Json(serde_json::Error),
    /// A field value was rejected: an unrecognized code, a malformed date,
    /// a wrong primitive type or a note that breaks its invariants.
    Data(serde_json::Error),
    /// A note handed to `encode_notes` breaks its invariants.
    Validation(NoteValidationError),
    UnsupportedVersion(i64),
    Repo(RepoError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed sync payload: {err}"),
            Self::Data(err) => write!(f, "invalid value in sync payload: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnsupportedVersion(version) => write!(
                f,
                "sync payload version {version} is not supported (expected {SYNC_PAYLOAD_VERSION})"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) | Self::Data(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::UnsupportedVersion(_) => None,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(value: serde_json::Error) -> Self {
        match value.classify() {
            Category::Data => Self::Data(value),
            Category::Io | Category::Syntax | Category::Eof => Self::Json(value),
        }
    }
}

impl From<NoteValidationError> for SyncError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

#[derive(Serialize)]
struct PayloadOut<'a> {
    version: u32,
    notes: &'a [Note],
}

#[derive(Deserialize)]
struct PayloadIn {
    /// Wider than `SYNC_PAYLOAD_VERSION` so any integer reaches the version check.
    version: i64,
    notes: serde_json::Value,
}

/// Serializes `notes` into a sync payload.
///
/// # Errors
/// - `SyncError::Validation` when any note breaks its invariants.
pub fn encode_notes(notes: &[Note]) -> Result<String, SyncError> {
    for note in notes {
        note.validate()?;
    }
    let payload = PayloadOut {
        version: SYNC_PAYLOAD_VERSION,
        notes,
    };
    Ok(serde_json::to_string(&payload)?)
}

/// Parses a sync payload.
///
/// # Errors
/// - `SyncError::UnsupportedVersion` for an unknown envelope version.
/// - `SyncError::Data` when any note field fails to decode or validate.
/// - `SyncError::Json` for syntax errors.
pub fn decode_notes(payload: &str) -> Result<Vec<Note>, SyncError> {
    let envelope: PayloadIn = serde_json::from_str(payload)?;
    if envelope.version != i64::from(SYNC_PAYLOAD_VERSION) {
        return Err(SyncError::UnsupportedVersion(envelope.version));
    }

    let notes = Vec::<Note>::deserialize(envelope.notes).map_err(|err| {
        warn!("event=sync_decode module=sync status=error error_code=invalid_note error={err}");
        SyncError::from(err)
    })?;
    Ok(notes)
}

/// Exports every stored note, in listing order, as a sync payload.
pub fn export_notes(repo: &impl NoteRepository) -> Result<String, SyncError> {
    let notes = repo.list_notes(&NoteListQuery::default())?;
    let payload = encode_notes(&notes)?;
    info!(
        "event=sync_export module=sync status=ok count={}",
        notes.len()
    );
    Ok(payload)
}

/// Replaces every stored note with the payload contents.
///
/// Nothing is written unless the whole payload decodes.
pub fn import_notes(repo: &mut impl NoteRepository, payload: &str) -> Result<usize, SyncError> {
    let notes = decode_notes(payload)?;
    repo.replace_all(&notes)?;
    info!(
        "event=sync_import module=sync status=ok count={}",
        notes.len()
    );
    Ok(notes.len())
}
