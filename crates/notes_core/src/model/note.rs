//! Note domain model.
//!
//! # Responsibility
//! - Define the record persisted in `notes` and carried by sync payloads.
//! - Keep `status` and `pinned` consistent across lifecycle changes.
//!
//! # Invariants
//! - `uuid` is never nil and never reused for another note.
//! - `added_date <= modified_date`.
//! - Active notes are `Pinned` or `Unpinned`; other notes are `CantPin`.

use crate::convert::code::impl_stored_code_adapters;
use crate::convert::{PrimitiveKind, StoredCode, Timestamp, WireDescriptor};
use crate::model::pinned_status::PinnedStatus;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a note across devices.
pub type NoteId = Uuid;

/// Lifecycle bucket a note is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteStatus {
    Active,
    Archived,
    /// In the trash, pending permanent removal.
    Deleted,
}

impl StoredCode for NoteStatus {
    const DESCRIPTOR: WireDescriptor = WireDescriptor::new("NoteStatus", PrimitiveKind::Int);
    const VARIANTS: &'static [Self] = &[Self::Active, Self::Archived, Self::Deleted];

    fn code(self) -> i32 {
        match self {
            Self::Active => 0,
            Self::Archived => 1,
            Self::Deleted => 2,
        }
    }
}

impl_stored_code_adapters!(NoteStatus);

/// Body layout of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteType {
    Text,
    /// One item per content line.
    List,
}

impl StoredCode for NoteType {
    const DESCRIPTOR: WireDescriptor = WireDescriptor::new("NoteType", PrimitiveKind::Int);
    const VARIANTS: &'static [Self] = &[Self::Text, Self::List];

    fn code(self) -> i32 {
        match self {
            Self::Text => 0,
            Self::List => 1,
        }
    }
}

impl_stored_code_adapters!(NoteType);

/// Validation error for note invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    NilUuid,
    DatesOutOfOrder {
        added: Timestamp,
        modified: Timestamp,
    },
    PinnedWhileInactive {
        status: NoteStatus,
        pinned: PinnedStatus,
    },
    UnpinnableWhileActive,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "uuid must not be nil"),
            Self::DatesOutOfOrder { added, modified } => write!(
                f,
                "modified date ({modified}) must be >= added date ({added})"
            ),
            Self::PinnedWhileInactive { status, pinned } => write!(
                f,
                "note with status {status:?} must be CantPin, found {pinned:?}"
            ),
            Self::UnpinnableWhileActive => {
                write!(f, "active note must be Pinned or Unpinned, found CantPin")
            }
        }
    }
}

impl Error for NoteValidationError {}

/// Canonical note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NoteWire")]
pub struct Note {
    pub uuid: NoteId,
    /// Serialized as `type` to match the sync schema.
    #[serde(rename = "type")]
    pub kind: NoteType,
    pub title: String,
    pub content: String,
    #[serde(rename = "added")]
    pub added_date: Timestamp,
    #[serde(rename = "modified")]
    pub modified_date: Timestamp,
    pub status: NoteStatus,
    pub pinned: PinnedStatus,
}

/// Unchecked wire shape; `Note` deserializes through it to run `validate()`.
#[derive(Deserialize)]
struct NoteWire {
    uuid: NoteId,
    #[serde(rename = "type")]
    kind: NoteType,
    title: String,
    content: String,
    #[serde(rename = "added")]
    added_date: Timestamp,
    #[serde(rename = "modified")]
    modified_date: Timestamp,
    status: NoteStatus,
    pinned: PinnedStatus,
}

impl TryFrom<NoteWire> for Note {
    type Error = NoteValidationError;

    fn try_from(wire: NoteWire) -> Result<Self, Self::Error> {
        let note = Self {
            uuid: wire.uuid,
            kind: wire.kind,
            title: wire.title,
            content: wire.content,
            added_date: wire.added_date,
            modified_date: wire.modified_date,
            status: wire.status,
            pinned: wire.pinned,
        };
        note.validate()?;
        Ok(note)
    }
}

impl Note {
    /// Creates an active, unpinned note with a generated id.
    pub fn new(
        kind: NoteType,
        title: impl Into<String>,
        content: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            title: title.into(),
            content: content.into(),
            added_date: now,
            modified_date: now,
            status: NoteStatus::Active,
            pinned: PinnedStatus::Unpinned,
        }
    }

    /// Creates an active, unpinned note with a caller-provided id.
    ///
    /// Used by import paths where identity already exists elsewhere.
    ///
    /// # Errors
    /// - `NoteValidationError::NilUuid` when `uuid` is nil.
    pub fn with_id(
        uuid: NoteId,
        kind: NoteType,
        title: impl Into<String>,
        content: impl Into<String>,
        now: Timestamp,
    ) -> Result<Self, NoteValidationError> {
        let mut note = Self::new(kind, title, content, now);
        note.uuid = uuid;
        note.validate()?;
        Ok(note)
    }

    /// Checks every record invariant.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.uuid.is_nil() {
            return Err(NoteValidationError::NilUuid);
        }
        if self.modified_date < self.added_date {
            return Err(NoteValidationError::DatesOutOfOrder {
                added: self.added_date,
                modified: self.modified_date,
            });
        }
        match (self.status, self.pinned) {
            (NoteStatus::Active, PinnedStatus::CantPin) => {
                Err(NoteValidationError::UnpinnableWhileActive)
            }
            (NoteStatus::Active, _) | (_, PinnedStatus::CantPin) => Ok(()),
            (status, pinned) => Err(NoteValidationError::PinnedWhileInactive { status, pinned }),
        }
    }

    /// Moves the note to `status`, keeping `pinned` valid for it.
    ///
    /// Re-activated notes come back unpinned.
    pub fn change_status(&mut self, status: NoteStatus, now: Timestamp) {
        if status == self.status {
            return;
        }
        self.status = status;
        self.pinned = if status == NoteStatus::Active {
            PinnedStatus::Unpinned
        } else {
            PinnedStatus::CantPin
        };
        self.touch(now);
    }

    /// Pins or unpins an active note.
    ///
    /// # Errors
    /// - `PinnedWhileInactive` when the note is not active.
    /// - `UnpinnableWhileActive` when `pinned` is `CantPin`.
    pub fn set_pinned(
        &mut self,
        pinned: PinnedStatus,
        now: Timestamp,
    ) -> Result<(), NoteValidationError> {
        if self.status != NoteStatus::Active {
            return Err(NoteValidationError::PinnedWhileInactive {
                status: self.status,
                pinned,
            });
        }
        if pinned == PinnedStatus::CantPin {
            return Err(NoteValidationError::UnpinnableWhileActive);
        }
        if pinned != self.pinned {
            self.pinned = pinned;
            self.touch(now);
        }
        Ok(())
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned == PinnedStatus::Pinned
    }

    fn touch(&mut self, now: Timestamp) {
        self.modified_date = self.modified_date.max(now);
    }
}
