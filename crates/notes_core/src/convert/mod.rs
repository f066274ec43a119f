//! Persisted-value conversion layer.
//!
//! # Responsibility
//! - Map typed domain values to primitive storage and wire values.
//! - Share one mapping per type between the SQLite column adapters and the
//!   serde adapters.
//!
//! # Invariants
//! - Every converter is pure: no I/O, no shared mutable state.
//! - Decoding never repairs or defaults; unknown input is a `ConvertError`.
//!
//! # See also
//! - `crate::repo` (storage consumer) and `crate::sync` (wire consumer).

use rusqlite::types::ValueRef;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod code;
pub mod timestamp;

pub use code::{decode_code, encode_code, StoredCode};
pub use timestamp::{format_timestamp, parse_timestamp, Timestamp, TIMESTAMP_FORMAT};

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Decode failure raised by the conversion layer.
///
/// Both kinds mean stored or transmitted data cannot be trusted; callers
/// report them as integrity faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Integer has no matching enum variant.
    UnrecognizedCode { kind: &'static str, code: i64 },
    /// Code column holds a value of another storage class, e.g. `TEXT`.
    NonIntegerCode {
        kind: &'static str,
        storage: &'static str,
    },
    /// Text is not in the canonical `YYYY-MM-DDTHH:MM:SS.mmmZ` form.
    MalformedTimestamp { value: String },
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedCode { kind, code } => {
                write!(f, "unrecognized {kind} code: {code}")
            }
            Self::NonIntegerCode { kind, storage } => {
                write!(f, "{kind} code stored as {storage}; expected an integer")
            }
            Self::MalformedTimestamp { value } => write!(
                f,
                "malformed timestamp `{value}`; expected YYYY-MM-DDTHH:MM:SS.mmmZ"
            ),
        }
    }
}

impl Error for ConvertError {}

/// SQLite storage class name of a raw column value.
pub(crate) fn storage_class(value: ValueRef<'_>) -> &'static str {
    match value {
        ValueRef::Null => "NULL",
        ValueRef::Integer(_) => "INTEGER",
        ValueRef::Real(_) => "REAL",
        ValueRef::Text(_) => "TEXT",
        ValueRef::Blob(_) => "BLOB",
    }
}

/// Primitive shape a converted value takes on the wire and in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Int,
    String,
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::String => f.write_str("string"),
        }
    }
}

/// Named primitive-kind descriptor exposed to the serialization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireDescriptor {
    pub name: &'static str,
    pub kind: PrimitiveKind,
}

impl WireDescriptor {
    pub const fn new(name: &'static str, kind: PrimitiveKind) -> Self {
        Self { name, kind }
    }
}

impl Display for WireDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} encoded as {}", self.name, self.kind)
    }
}
