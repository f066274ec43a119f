//! Millisecond UTC timestamps and their canonical ISO-8601 text form.
//!
//! # Responsibility
//! - Render and parse `YYYY-MM-DDTHH:MM:SS.mmmZ`.
//! - Provide the TEXT column and JSON string shims for `Timestamp`.
//!
//! # Invariants
//! - Rendering is always UTC, whatever zone the source value came from.
//! - Parsing accepts only the canonical form; anything else is rejected.
//! - Values carry millisecond precision and a four-digit year.

use super::{storage_class, ConvertError, ConvertResult, PrimitiveKind, WireDescriptor};
use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// `chrono` format string of the canonical text form.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// `0000-01-01T00:00:00.000Z`
const MIN_MILLIS: i64 = -62_167_219_200_000;
/// `9999-12-31T23:59:59.999Z`
const MAX_MILLIS: i64 = 253_402_300_799_999;

/// Point in time with millisecond precision, always held in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub const DESCRIPTOR: WireDescriptor = WireDescriptor::new("Timestamp", PrimitiveKind::String);

    /// Builds a timestamp from Unix epoch milliseconds.
    ///
    /// Returns `None` outside years `0000..=9999`.
    pub fn from_millis(millis: i64) -> Option<Self> {
        if !(MIN_MILLIS..=MAX_MILLIS).contains(&millis) {
            return None;
        }
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    /// Builds a timestamp from a date-time in any zone, truncating to the
    /// millisecond.
    pub fn from_datetime<Tz: TimeZone>(value: &DateTime<Tz>) -> Option<Self> {
        Self::from_millis(value.timestamp_millis())
    }

    /// Current wall-clock time, truncated to the millisecond.
    pub fn now() -> Self {
        let now = Utc::now();
        let sub_milli = i64::from(now.nanosecond() % 1_000_000);
        Self(now - chrono::Duration::nanoseconds(sub_milli))
    }

    /// Unix epoch milliseconds.
    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Renders `value` in the canonical form, e.g. `2020-04-18T17:14:31.650Z`.
pub fn format_timestamp(value: &Timestamp) -> String {
    value.0.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses the canonical form produced by `format_timestamp`.
///
/// # Errors
/// - `ConvertError::MalformedTimestamp` on any deviation: wrong field count,
///   non-numeric or out-of-range component, missing `Z`, a millisecond part
///   other than three digits, or trailing input.
pub fn parse_timestamp(value: &str) -> ConvertResult<Timestamp> {
    let malformed = || ConvertError::MalformedTimestamp {
        value: value.to_string(),
    };

    let naive = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| malformed())?;
    // chrono encodes a leap second as nanosecond >= 1e9; the canonical form has none.
    if naive.nanosecond() >= 1_000_000_000 {
        return Err(malformed());
    }

    let parsed = Timestamp::from_datetime(&naive.and_utc()).ok_or_else(malformed)?;
    // Lenient chrono inputs (signed years, short fractions) do not survive re-rendering.
    if format_timestamp(&parsed) != value {
        return Err(malformed());
    }
    Ok(parsed)
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_timestamp(s)
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(format_timestamp(self)))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let decoded = match value {
            ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => parse_timestamp(text),
                Err(_) => Err(ConvertError::MalformedTimestamp {
                    value: String::from_utf8_lossy(bytes).into_owned(),
                }),
            },
            ValueRef::Integer(stored) => Err(ConvertError::MalformedTimestamp {
                value: stored.to_string(),
            }),
            ValueRef::Real(stored) => Err(ConvertError::MalformedTimestamp {
                value: stored.to_string(),
            }),
            other => Err(ConvertError::MalformedTimestamp {
                value: format!("<{}>", storage_class(other)),
            }),
        };
        decoded.map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(self))
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(TimestampVisitor)
    }
}

struct TimestampVisitor;

impl Visitor<'_> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", Timestamp::DESCRIPTOR)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Timestamp, E> {
        parse_timestamp(value).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, parse_timestamp, Timestamp, MAX_MILLIS, MIN_MILLIS};
    use crate::convert::ConvertError;
    use chrono::{FixedOffset, TimeZone, Utc};

    const SAMPLE_MILLIS: i64 = 1_587_230_071_650;
    const SAMPLE_TEXT: &str = "2020-04-18T17:14:31.650Z";

    fn sample() -> Timestamp {
        Timestamp::from_millis(SAMPLE_MILLIS).expect("sample should be in range")
    }

    #[test]
    fn formats_known_instant() {
        assert_eq!(format_timestamp(&sample()), SAMPLE_TEXT);
        assert_eq!(sample().to_string(), SAMPLE_TEXT);
    }

    #[test]
    fn parses_known_instant() {
        assert_eq!(parse_timestamp(SAMPLE_TEXT), Ok(sample()));
        assert_eq!(SAMPLE_TEXT.parse::<Timestamp>(), Ok(sample()));
    }

    #[test]
    fn round_trips_at_millisecond_granularity() {
        for millis in [
            MIN_MILLIS,
            -1,
            0,
            1,
            999,
            SAMPLE_MILLIS,
            1_700_000_000_001,
            MAX_MILLIS,
        ] {
            let value = Timestamp::from_millis(millis).expect("millis should be in range");
            let decoded = parse_timestamp(&format_timestamp(&value)).expect("should parse back");
            assert_eq!(decoded, value);
            assert_eq!(decoded.as_millis(), millis);
        }
    }

    #[test]
    fn renders_range_bounds_with_four_digit_years() {
        let min = Timestamp::from_millis(MIN_MILLIS).unwrap();
        let max = Timestamp::from_millis(MAX_MILLIS).unwrap();
        assert_eq!(min.to_string(), "0000-01-01T00:00:00.000Z");
        assert_eq!(max.to_string(), "9999-12-31T23:59:59.999Z");
        assert_eq!(Timestamp::from_millis(MIN_MILLIS - 1), None);
        assert_eq!(Timestamp::from_millis(MAX_MILLIS + 1), None);
    }

    #[test]
    fn source_zone_does_not_change_encoding() {
        let east = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        let west = FixedOffset::west_opt(8 * 3600).unwrap();
        let utc = Utc.timestamp_millis_opt(SAMPLE_MILLIS).unwrap();

        let from_east = Timestamp::from_datetime(&utc.with_timezone(&east)).unwrap();
        let from_west = Timestamp::from_datetime(&utc.with_timezone(&west)).unwrap();

        assert_eq!(format_timestamp(&from_east), SAMPLE_TEXT);
        assert_eq!(format_timestamp(&from_west), SAMPLE_TEXT);
        assert_eq!(from_east, from_west);
    }

    #[test]
    fn truncates_sub_millisecond_precision() {
        let precise = Utc.timestamp_opt(1_587_230_071, 650_999_999).unwrap();
        let value = Timestamp::from_datetime(&precise).unwrap();
        assert_eq!(value.as_millis(), SAMPLE_MILLIS);

        let now = Timestamp::now();
        assert_eq!(now.as_datetime().timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn rejects_malformed_text() {
        for input in [
            "not-a-date",
            "2020-13-40T99:99:99.999Z",
            "",
            "2020-04-18",
            "2020-04-18T17:14:31Z",
            "2020-04-18T17:14:31.65Z",
            "2020-04-18T17:14:31.6500Z",
            "2020-04-18T17:14:31.650",
            "2020-04-18T17:14:31.650+00:00",
            "2020-04-18 17:14:31.650Z",
            "2020-04-18T17:14:31.650Zjunk",
            "2020-02-30T00:00:00.000Z",
            "2016-12-31T23:59:60.000Z",
            "+2020-04-18T17:14:31.650Z",
            "20x0-04-18T17:14:31.650Z",
        ] {
            assert_eq!(
                parse_timestamp(input),
                Err(ConvertError::MalformedTimestamp {
                    value: input.to_string(),
                }),
                "input `{input}` should be rejected"
            );
        }
    }

    #[test]
    fn json_literal_is_canonical_string() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, format!("\"{SAMPLE_TEXT}\""));

        let decoded: Timestamp = serde_json::from_str("\"2020-04-18T17:14:31.650Z\"").unwrap();
        assert_eq!(decoded, sample());

        let err = serde_json::from_str::<Timestamp>("\"2020-13-40T99:99:99.999Z\"").unwrap_err();
        assert!(err.to_string().contains("malformed timestamp"), "{err}");

        let err = serde_json::from_str::<Timestamp>("1587230071650").unwrap_err();
        assert!(err.to_string().contains("Timestamp encoded as string"), "{err}");
    }

    #[test]
    fn sql_shim_stores_canonical_text() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (at TEXT);").unwrap();
        conn.execute("INSERT INTO t (at) VALUES (?1);", [sample()])
            .unwrap();

        let raw: String = conn.query_row("SELECT at FROM t;", [], |row| row.get(0)).unwrap();
        assert_eq!(raw, SAMPLE_TEXT);

        let decoded: Timestamp = conn.query_row("SELECT at FROM t;", [], |row| row.get(0)).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn sql_shim_reports_non_text_storage_as_malformed() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        for (sql, rendered) in [
            ("SELECT X'0102';", "<BLOB>"),
            ("SELECT NULL;", "<NULL>"),
            ("SELECT 1587230071650;", "1587230071650"),
            ("SELECT 1.5;", "1.5"),
        ] {
            let err = conn
                .query_row(sql, [], |row| row.get::<_, Timestamp>(0))
                .unwrap_err();
            match err {
                rusqlite::Error::FromSqlConversionFailure(_, _, source) => {
                    assert_eq!(
                        source.downcast_ref::<ConvertError>(),
                        Some(&ConvertError::MalformedTimestamp {
                            value: rendered.to_string(),
                        })
                    );
                }
                other => panic!("unexpected error for `{sql}`: {other}"),
            }
        }
    }
}
