//! Semantic field types and storage value coercion.
//!
//! # Responsibility
//! - Map semantic type tags to storage column type names.
//! - Convert raw stored scalars into typed domain values.
//!
//! # Invariants
//! - `coerce` maps a stored NULL to [`FieldValue::Null`] under every tag.
//! - The write direction performs no coercion: values pass through to the
//!   parameter binder as-is.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for coercion helpers.
pub type CoerceResult<T> = Result<T, CoerceError>;

/// Conversion failure from a stored scalar to its declared semantic type.
#[derive(Debug)]
pub enum CoerceError {
    /// A textual timestamp could not be parsed.
    Timestamp { value: String },
    /// A blob declared as text is not valid UTF-8.
    InvalidUtf8 { target: FieldType },
    /// The stored scalar has no sensible conversion to the declared type.
    Incompatible {
        target: FieldType,
        found: &'static str,
    },
}

impl Display for CoerceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timestamp { value } => write!(f, "unparseable timestamp `{value}`"),
            Self::InvalidUtf8 { target } => {
                write!(f, "stored blob is not valid UTF-8 for {target} field")
            }
            Self::Incompatible { target, found } => {
                write!(f, "cannot convert stored {found} value to {target}")
            }
        }
    }
}

impl Error for CoerceError {}

/// Semantic type tag declared per schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Binary,
    Date,
    DateTime,
}

impl FieldType {
    /// Storage column type name used in column declarations.
    pub fn storage_type(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "DOUBLE",
            Self::Text => "TEXT",
            Self::Binary => "BLOB",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Date => "date",
            Self::DateTime => "datetime",
        };
        write!(f, "{name}")
    }
}

/// One typed field value carried by a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts to the raw storage representation for parameter binding.
    ///
    /// Temporal values are stored as text: RFC 3339 for datetimes and
    /// `YYYY-MM-DD` for dates, so they read back through [`coerce`] intact.
    pub fn to_storage(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(v) => Value::Integer(*v),
            Self::Real(v) => Value::Real(*v),
            Self::Text(v) => Value::Text(v.clone()),
            Self::Blob(v) => Value::Blob(v.clone()),
            Self::Date(v) => Value::Text(v.format("%Y-%m-%d").to_string()),
            Self::DateTime(v) => Value::Text(v.to_rfc3339()),
        }
    }
}

impl From<Value> for FieldValue {
    /// Untyped pass-through for schema fields with no declared tag.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Integer(v) => Self::Integer(v),
            Value::Real(v) => Self::Real(v),
            Value::Text(v) => Self::Text(v),
            Value::Blob(v) => Self::Blob(v),
        }
    }
}

/// Converts a raw stored scalar into the declared semantic type.
///
/// A stored NULL short-circuits to [`FieldValue::Null`] for every tag.
pub fn coerce(raw: Value, tag: FieldType) -> CoerceResult<FieldValue> {
    if matches!(raw, Value::Null) {
        return Ok(FieldValue::Null);
    }
    match tag {
        FieldType::Integer => coerce_integer(raw),
        FieldType::Real => coerce_real(raw),
        FieldType::Text => coerce_text(raw),
        FieldType::Binary => coerce_binary(raw),
        FieldType::Date => {
            let instant = coerce_instant(raw, FieldType::Date)?;
            Ok(FieldValue::Date(instant.date_naive()))
        }
        FieldType::DateTime => {
            let instant = coerce_instant(raw, FieldType::DateTime)?;
            Ok(FieldValue::DateTime(instant))
        }
    }
}

fn coerce_integer(raw: Value) -> CoerceResult<FieldValue> {
    match raw {
        Value::Null => Ok(FieldValue::Null),
        Value::Integer(v) => Ok(FieldValue::Integer(v)),
        Value::Real(v) => Ok(FieldValue::Integer(v as i64)),
        Value::Text(v) => v
            .trim()
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| CoerceError::Incompatible {
                target: FieldType::Integer,
                found: "text",
            }),
        Value::Blob(_) => Err(CoerceError::Incompatible {
            target: FieldType::Integer,
            found: "blob",
        }),
    }
}

fn coerce_real(raw: Value) -> CoerceResult<FieldValue> {
    match raw {
        Value::Null => Ok(FieldValue::Null),
        Value::Integer(v) => Ok(FieldValue::Real(v as f64)),
        Value::Real(v) => Ok(FieldValue::Real(v)),
        Value::Text(v) => v
            .trim()
            .parse::<f64>()
            .map(FieldValue::Real)
            .map_err(|_| CoerceError::Incompatible {
                target: FieldType::Real,
                found: "text",
            }),
        Value::Blob(_) => Err(CoerceError::Incompatible {
            target: FieldType::Real,
            found: "blob",
        }),
    }
}

fn coerce_text(raw: Value) -> CoerceResult<FieldValue> {
    match raw {
        Value::Null => Ok(FieldValue::Null),
        Value::Text(v) => Ok(FieldValue::Text(v)),
        Value::Blob(bytes) => String::from_utf8(bytes)
            .map(FieldValue::Text)
            .map_err(|_| CoerceError::InvalidUtf8 {
                target: FieldType::Text,
            }),
        Value::Integer(v) => Ok(FieldValue::Text(v.to_string())),
        Value::Real(v) => Ok(FieldValue::Text(v.to_string())),
    }
}

fn coerce_binary(raw: Value) -> CoerceResult<FieldValue> {
    match raw {
        Value::Null => Ok(FieldValue::Null),
        Value::Blob(v) => Ok(FieldValue::Blob(v)),
        Value::Text(v) => Ok(FieldValue::Blob(v.into_bytes())),
        Value::Integer(_) => Err(CoerceError::Incompatible {
            target: FieldType::Binary,
            found: "integer",
        }),
        Value::Real(_) => Err(CoerceError::Incompatible {
            target: FieldType::Binary,
            found: "real",
        }),
    }
}

fn coerce_instant(raw: Value, target: FieldType) -> CoerceResult<DateTime<Utc>> {
    match raw {
        Value::Text(v) => parse_timestamp(&v),
        Value::Null => Err(CoerceError::Timestamp {
            value: String::new(),
        }),
        Value::Integer(_) => Err(CoerceError::Incompatible {
            target,
            found: "integer",
        }),
        Value::Real(_) => Err(CoerceError::Incompatible {
            target,
            found: "real",
        }),
        Value::Blob(_) => Err(CoerceError::Incompatible {
            target,
            found: "blob",
        }),
    }
}

// Date part, optional time part, optional UTC offset. Fractional seconds
// capped at nine digits (nanosecond precision).
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[ T](\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?)?\s*(Z|z|[+-]\d{2}:?\d{2})?$",
    )
    .expect("timestamp pattern compiles")
});

/// Parses a free-form textual timestamp into an absolute UTC instant.
///
/// Accepts RFC 3339 plus looser `YYYY-MM-DD[ HH:MM[:SS[.frac]]][offset]`
/// forms; missing time components default to midnight, a missing offset
/// means UTC.
pub fn parse_timestamp(text: &str) -> CoerceResult<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoerceError::Timestamp {
            value: text.to_string(),
        });
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let captures = TIMESTAMP_RE
        .captures(trimmed)
        .ok_or_else(|| CoerceError::Timestamp {
            value: text.to_string(),
        })?;

    let invalid = || CoerceError::Timestamp {
        value: text.to_string(),
    };

    let year: i32 = captures[1].parse().map_err(|_| invalid())?;
    let month: u32 = captures[2].parse().map_err(|_| invalid())?;
    let day: u32 = captures[3].parse().map_err(|_| invalid())?;
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

    let hour: u32 = capture_or_zero(&captures, 4)?;
    let minute: u32 = capture_or_zero(&captures, 5)?;
    let second: u32 = capture_or_zero(&captures, 6)?;
    let nanos = captures
        .get(7)
        .map(|frac| {
            let digits = frac.as_str();
            // Right-pad to nanoseconds: ".5" means 500ms.
            let padded = format!("{digits:0<9}");
            padded.parse::<u32>().map_err(|_| invalid())
        })
        .transpose()?
        .unwrap_or(0);

    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos).ok_or_else(invalid)?;
    let naive = NaiveDateTime::new(date, time);

    match captures.get(8).map(|m| m.as_str()) {
        None | Some("Z") | Some("z") => Ok(Utc.from_utc_datetime(&naive)),
        Some(offset) => {
            let offset = parse_utc_offset(offset).ok_or_else(invalid)?;
            offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(invalid)
        }
    }
}

fn capture_or_zero(captures: &regex::Captures<'_>, index: usize) -> CoerceResult<u32> {
    captures
        .get(index)
        .map(|m| {
            m.as_str().parse::<u32>().map_err(|_| CoerceError::Timestamp {
                value: m.as_str().to_string(),
            })
        })
        .transpose()
        .map(|parsed| parsed.unwrap_or(0))
}

fn parse_utc_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match text.split_at(1) {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let digits = rest.replace(':', "");
    if digits.len() != 4 {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::{coerce, parse_timestamp, CoerceError, FieldType, FieldValue};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rusqlite::types::Value;

    const ALL_TAGS: [FieldType; 6] = [
        FieldType::Integer,
        FieldType::Real,
        FieldType::Text,
        FieldType::Binary,
        FieldType::Date,
        FieldType::DateTime,
    ];

    #[test]
    fn null_coerces_to_null_for_every_tag() {
        for tag in ALL_TAGS {
            assert_eq!(coerce(Value::Null, tag).unwrap(), FieldValue::Null);
        }
    }

    #[test]
    fn text_tag_decodes_blobs_and_stringifies_numbers() {
        assert_eq!(
            coerce(Value::Blob(b"hi".to_vec()), FieldType::Text).unwrap(),
            FieldValue::Text("hi".to_string())
        );
        assert_eq!(
            coerce(Value::Integer(42), FieldType::Text).unwrap(),
            FieldValue::Text("42".to_string())
        );
    }

    #[test]
    fn binary_tag_encodes_text_and_rejects_numbers() {
        assert_eq!(
            coerce(Value::Text("hi".to_string()), FieldType::Binary).unwrap(),
            FieldValue::Blob(b"hi".to_vec())
        );
        assert!(coerce(Value::Integer(1), FieldType::Binary).is_err());
    }

    #[test]
    fn integer_tag_parses_numeric_text() {
        assert_eq!(
            coerce(Value::Text(" 17 ".to_string()), FieldType::Integer).unwrap(),
            FieldValue::Integer(17)
        );
        assert!(coerce(Value::Text("seventeen".to_string()), FieldType::Integer).is_err());
    }

    #[test]
    fn temporal_errors_name_the_requested_tag() {
        let err = coerce(Value::Integer(1), FieldType::Date).unwrap_err();
        assert!(matches!(
            err,
            CoerceError::Incompatible {
                target: FieldType::Date,
                found: "integer",
            }
        ));

        let err = coerce(Value::Blob(vec![0]), FieldType::DateTime).unwrap_err();
        assert!(matches!(
            err,
            CoerceError::Incompatible {
                target: FieldType::DateTime,
                found: "blob",
            }
        ));
    }

    #[test]
    fn date_tag_truncates_to_calendar_day() {
        let value = Value::Text("2024-06-15T22:30:00+00:00".to_string());
        assert_eq!(
            coerce(value, FieldType::Date).unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
        );
    }

    #[test]
    fn parse_timestamp_accepts_loose_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-06-15").unwrap(), expected);

        let with_time = Utc.with_ymd_and_hms(2024, 6, 15, 9, 5, 0).unwrap();
        assert_eq!(parse_timestamp("2024-06-15 09:05").unwrap(), with_time);

        let offset = Utc.with_ymd_and_hms(2024, 6, 15, 7, 5, 0).unwrap();
        assert_eq!(parse_timestamp("2024-06-15 09:05+02:00").unwrap(), offset);
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("not a date").is_err());
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("2024-13-40").is_err());
    }

    #[test]
    fn storage_round_trip_for_temporal_values() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 15, 9, 5, 3).unwrap();
        let stored = FieldValue::DateTime(instant).to_storage();
        assert_eq!(
            coerce(stored, FieldType::DateTime).unwrap(),
            FieldValue::DateTime(instant)
        );

        let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let stored = FieldValue::Date(day).to_storage();
        assert_eq!(coerce(stored, FieldType::Date).unwrap(), FieldValue::Date(day));
    }
}
