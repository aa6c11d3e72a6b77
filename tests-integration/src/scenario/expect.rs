//! Expected cell values and how they compare with what Trino returns.
//!
//! Trino encodes DECIMAL, temporal types and UUID as JSON strings,
//! VARBINARY as base64, ROW as a positional array and MAP as an object.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

pub const UUID_PATTERN: &str = "^[0-9a-f]{8}-([0-9a-f]{4}-){3}[0-9a-f]{12}$";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Zone names that all denote UTC.
const UTC_ALIASES: &[&str] = &[
    "UTC",
    "GMT",
    "UCT",
    "Z",
    "Zulu",
    "Universal",
    "Greenwich",
    "GMT0",
    "Etc/UTC",
    "Etc/GMT",
    "Etc/UCT",
    "Etc/Zulu",
    "Etc/Universal",
    "Etc/Greenwich",
    "Etc/GMT0",
];

static UUID_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(UUID_PATTERN).ok());

#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    Integer(i64),
    Boolean(bool),
    /// Compared at `f32` precision
    Real(f64),
    Double(f64),
    /// Numerically equal and carrying the column's declared scale
    Decimal { value: &'static str, scale: u32 },
    Varchar(String),
    /// Right-padded with spaces to `length` characters
    Char { value: String, length: usize },
    Varbinary(Vec<u8>),
    IntegerArray(Vec<i64>),
    /// Key order does not matter
    IntegerMap(BTreeMap<String, i64>),
    Row(Vec<(&'static str, Expected)>),
    Uuid(Uuid),
    Time(&'static str),
    Timestamp(&'static str),
    /// Local time in `zone`; the returned instant must match and its zone
    /// must be `zone`, a UTC alias of it, or UTC
    TimestampTz { local: &'static str, zone: Tz },
    Date(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, got {actual}")]
pub struct Mismatch {
    pub expected: String,
    pub actual: String,
}

impl Expected {
    pub fn verify(&self, actual: &Value) -> Result<(), Mismatch> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(Mismatch {
                expected: self.to_string(),
                actual: actual.to_string(),
            })
        }
    }

    fn matches(&self, actual: &Value) -> bool {
        match self {
            Expected::Integer(n) => actual.as_i64() == Some(*n),
            Expected::Boolean(b) => actual.as_bool() == Some(*b),
            Expected::Real(v) => actual.as_f64().is_some_and(|a| a as f32 == *v as f32),
            Expected::Double(v) => actual.as_f64() == Some(*v),
            Expected::Decimal { value, scale } => {
                let expected = Decimal::from_str(value).ok();
                actual
                    .as_str()
                    .and_then(|s| Decimal::from_str(s).ok())
                    .is_some_and(|a| a.scale() == *scale && Some(a) == expected)
            }
            Expected::Varchar(s) => actual.as_str() == Some(s.as_str()),
            Expected::Char { value, length } => {
                actual.as_str() == Some(format!("{value:<width$}", width = *length).as_str())
            }
            Expected::Varbinary(bytes) => actual
                .as_str()
                .and_then(|s| STANDARD.decode(s).ok())
                .is_some_and(|a| a == *bytes),
            Expected::IntegerArray(items) => actual.as_array().is_some_and(|values| {
                values.len() == items.len()
                    && values.iter().zip(items).all(|(v, n)| v.as_i64() == Some(*n))
            }),
            Expected::IntegerMap(map) => actual.as_object().is_some_and(|object| {
                object.len() == map.len()
                    && map
                        .iter()
                        .all(|(k, n)| object.get(k).and_then(Value::as_i64) == Some(*n))
            }),
            Expected::Row(fields) => match actual {
                Value::Array(values) => {
                    values.len() == fields.len()
                        && fields.iter().zip(values).all(|((_, e), v)| e.matches(v))
                }
                Value::Object(object) => {
                    object.len() == fields.len()
                        && fields
                            .iter()
                            .all(|(name, e)| object.get(*name).is_some_and(|v| e.matches(v)))
                }
                _ => false,
            },
            Expected::Uuid(uuid) => actual.as_str().is_some_and(|s| {
                UUID_RE.as_ref().is_some_and(|re| re.is_match(s))
                    && Uuid::parse_str(s).is_ok_and(|a| a == *uuid)
            }),
            Expected::Time(t) => same(
                actual
                    .as_str()
                    .and_then(|s| NaiveTime::parse_from_str(s, TIME_FORMAT).ok()),
                NaiveTime::parse_from_str(t, TIME_FORMAT).ok(),
            ),
            Expected::Timestamp(ts) => same(
                actual
                    .as_str()
                    .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()),
                NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok(),
            ),
            Expected::TimestampTz { local, zone } => {
                let expected = NaiveDateTime::parse_from_str(local, TIMESTAMP_FORMAT)
                    .ok()
                    .and_then(|naive| zone.from_local_datetime(&naive).single())
                    .map(|dt| dt.with_timezone(&Utc));
                actual
                    .as_str()
                    .and_then(parse_zoned)
                    .is_some_and(|(instant, actual_zone)| {
                        Some(instant) == expected
                            && actual_zone.is_none_or(|z| z.is_utc() || z.same_as(zone))
                    })
            }
            Expected::Date(d) => same(
                actual
                    .as_str()
                    .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok()),
                NaiveDate::parse_from_str(d, DATE_FORMAT).ok(),
            ),
        }
    }
}

fn same<T: PartialEq>(actual: Option<T>, expected: Option<T>) -> bool {
    actual.is_some() && actual == expected
}

/// Named zone of a returned timestamp.
struct ZoneName(String);

impl ZoneName {
    fn is_utc(&self) -> bool {
        is_utc_alias(&self.0)
    }

    fn same_as(&self, zone: &Tz) -> bool {
        self.0 == zone.name() || (self.is_utc() && is_utc_alias(zone.name()))
    }
}

fn is_utc_alias(name: &str) -> bool {
    UTC_ALIASES.contains(&name)
}

/// Parses `YYYY-MM-DD HH:MM:SS[.f] <zone>` where zone is an IANA name or
/// an offset. Offsets carry no zone name.
fn parse_zoned(raw: &str) -> Option<(DateTime<Utc>, Option<ZoneName>)> {
    let (local, zone) = raw.rsplit_once(' ')?;
    if let Ok(tz) = zone.parse::<Tz>() {
        let naive = NaiveDateTime::parse_from_str(local, TIMESTAMP_FORMAT).ok()?;
        let instant = tz.from_local_datetime(&naive).single()?.with_timezone(&Utc);
        return Some((instant, Some(ZoneName(zone.to_string()))));
    }
    let instant = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f %:z").ok()?;
    Some((instant.with_timezone(&Utc), None))
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Integer(n) => write!(f, "{n}"),
            Expected::Boolean(b) => write!(f, "{b}"),
            Expected::Real(v) => write!(f, "REAL {}", *v as f32),
            Expected::Double(v) => write!(f, "DOUBLE {v}"),
            Expected::Decimal { value, scale } => write!(f, "DECIMAL {value} (scale {scale})"),
            Expected::Varchar(s) => write!(f, "{s:?}"),
            Expected::Char { value, length } => write!(f, "CHAR({length}) {value:?}"),
            Expected::Varbinary(bytes) => write!(f, "X'{}'", hex::encode_upper(bytes)),
            Expected::IntegerArray(items) => write!(f, "{items:?}"),
            Expected::IntegerMap(map) => write!(f, "{map:?}"),
            Expected::Row(fields) => {
                f.write_str("ROW(")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str(")")
            }
            Expected::Uuid(uuid) => write!(f, "UUID {uuid}"),
            Expected::Time(t) => write!(f, "TIME {t}"),
            Expected::Timestamp(ts) => write!(f, "TIMESTAMP {ts}"),
            Expected::TimestampTz { local, zone } => write!(f, "TIMESTAMP {local} {}", zone.name()),
            Expected::Date(d) => write!(f, "DATE {d}"),
        }
    }
}
