//! Pinned state of a note.

use crate::convert::code::impl_stored_code_adapters;
use crate::convert::{PrimitiveKind, StoredCode, WireDescriptor};

/// Whether a note is pinned to the top of its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinnedStatus {
    /// Archived and deleted notes cannot be pinned.
    CantPin,
    Unpinned,
    Pinned,
}

impl StoredCode for PinnedStatus {
    const DESCRIPTOR: WireDescriptor = WireDescriptor::new("PinnedStatus", PrimitiveKind::Int);
    const VARIANTS: &'static [Self] = &[Self::CantPin, Self::Unpinned, Self::Pinned];

    fn code(self) -> i32 {
        match self {
            Self::CantPin => 0,
            Self::Unpinned => 1,
            Self::Pinned => 2,
        }
    }
}

impl_stored_code_adapters!(PinnedStatus);
