//! Closed-enum to integer code mapping.
//!
//! # Responsibility
//! - Define the single code table per enum (`StoredCode`).
//! - Provide the rusqlite and serde shims that forward to that table.
//!
//! # Invariants
//! - `code` is total and injective over `VARIANTS`.
//! - Codes are never reassigned once released.
//! - Storage and wire shims never keep their own table.

use super::{storage_class, ConvertError, ConvertResult, WireDescriptor};
use rusqlite::types::{FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt::Formatter;
use std::marker::PhantomData;

/// Closed enumeration persisted and transmitted as a stable integer code.
pub trait StoredCode: Copy + Eq + 'static {
    /// Name and primitive kind announced to the serialization layer.
    const DESCRIPTOR: WireDescriptor;
    /// Every declared variant. Decoding searches this table.
    const VARIANTS: &'static [Self];

    /// Returns the fixed code for this variant.
    fn code(self) -> i32;

    /// Looks up the variant for `code`.
    ///
    /// # Errors
    /// - `ConvertError::UnrecognizedCode` when no variant declares `code`.
    fn from_code(code: i32) -> ConvertResult<Self> {
        Self::from_stored(i64::from(code))
    }

    /// Same as `from_code`, for integers read from 64-bit storage.
    ///
    /// Values outside the `i32` range are unrecognized rather than truncated.
    fn from_stored(code: i64) -> ConvertResult<Self> {
        i32::try_from(code)
            .ok()
            .and_then(|narrow| {
                Self::VARIANTS
                    .iter()
                    .copied()
                    .find(|variant| variant.code() == narrow)
            })
            .ok_or(ConvertError::UnrecognizedCode {
                kind: Self::DESCRIPTOR.name,
                code,
            })
    }
}

/// Encodes a variant into its stored code.
pub fn encode_code<T: StoredCode>(value: T) -> i32 {
    value.code()
}

/// Decodes a stored code into its variant.
pub fn decode_code<T: StoredCode>(code: i32) -> ConvertResult<T> {
    T::from_code(code)
}

pub(crate) fn code_to_sql<T: StoredCode>(value: T) -> ToSqlOutput<'static> {
    ToSqlOutput::from(value.code())
}

pub(crate) fn code_from_sql<T: StoredCode>(value: ValueRef<'_>) -> FromSqlResult<T> {
    let decoded = match value {
        ValueRef::Integer(stored) => T::from_stored(stored),
        other => Err(ConvertError::NonIntegerCode {
            kind: T::DESCRIPTOR.name,
            storage: storage_class(other),
        }),
    };
    decoded.map_err(|err| FromSqlError::Other(Box::new(err)))
}

pub(crate) fn serialize_code<T: StoredCode, S: Serializer>(
    value: T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_i32(value.code())
}

pub(crate) fn deserialize_code<'de, T: StoredCode, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<T, D::Error> {
    deserializer.deserialize_i64(CodeVisitor(PhantomData))
}

struct CodeVisitor<T>(PhantomData<T>);

impl<'de, T: StoredCode> Visitor<'de> for CodeVisitor<T> {
    type Value = T;

    fn expecting(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", T::DESCRIPTOR)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<T, E> {
        T::from_stored(value).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<T, E> {
        match i64::try_from(value) {
            Ok(signed) => self.visit_i64(signed),
            Err(_) => Err(E::custom(format_args!(
                "unrecognized {} code: {value}",
                T::DESCRIPTOR.name
            ))),
        }
    }
}

/// Implements `ToSql`, `FromSql`, `Serialize` and `Deserialize` for a
/// `StoredCode` enum by forwarding to its code table.
macro_rules! impl_stored_code_adapters {
    ($ty:ty) => {
        impl ::rusqlite::types::ToSql for $ty {
            fn to_sql(&self) -> ::rusqlite::Result<::rusqlite::types::ToSqlOutput<'_>> {
                Ok($crate::convert::code::code_to_sql(*self))
            }
        }

        impl ::rusqlite::types::FromSql for $ty {
            fn column_result(
                value: ::rusqlite::types::ValueRef<'_>,
            ) -> ::rusqlite::types::FromSqlResult<Self> {
                $crate::convert::code::code_from_sql(value)
            }
        }

        impl ::serde::Serialize for $ty {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                $crate::convert::code::serialize_code(*self, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                $crate::convert::code::deserialize_code(deserializer)
            }
        }
    };
}

pub(crate) use impl_stored_code_adapters;
