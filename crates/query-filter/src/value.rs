//! Filter values: scalars and lists, with textual inference and ordering.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Format used for date-only values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used when rendering date-time values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Accepted date-time layouts, tried in order before RFC 3339.
const DATETIME_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A filter value.
///
/// Lists hold scalars only; nested lists are never produced by the parser or
/// the caster.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
    List(Vec<Value>),
}

impl Value {
    /// Infers a typed scalar from unquoted filter text.
    ///
    /// Tries, in order: `null`, booleans, integers, floats, date-times,
    /// dates and hyphenated UUIDs. Anything else stays a string.
    ///
    /// ```
    /// use query_filter_rs::Value;
    ///
    /// assert_eq!(Value::infer("18"), Value::Int(18));
    /// assert_eq!(Value::infer("TRUE"), Value::Bool(true));
    /// assert_eq!(Value::infer("active"), Value::String("active".into()));
    /// ```
    pub fn infer(text: &str) -> Value {
        if text.eq_ignore_ascii_case("null") {
            return Value::Null;
        }
        if let Some(b) = parse_bool(text) {
            return Value::Bool(b);
        }
        if let Ok(i) = text.parse::<i64>() {
            return Value::Int(i);
        }
        if looks_like_float(text) {
            if let Ok(f) = text.parse::<f64>() {
                return Value::Float(f);
            }
        }
        if let Some(dt) = parse_datetime(text) {
            return Value::DateTime(dt);
        }
        if let Some(d) = parse_date(text) {
            return Value::Date(d);
        }
        if text.len() == 36 {
            if let Ok(u) = Uuid::parse_str(text) {
                return Value::Uuid(u);
            }
        }
        Value::String(text.to_string())
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the list items, or `None` for scalars.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a short name of the value's kind, for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Uuid(_) => "uuid",
            Value::List(_) => "list",
        }
    }

    /// Renders the value in filter-string syntax.
    ///
    /// Strings are always quoted so that re-parsing yields a string again;
    /// floats always carry a decimal point or exponent.
    pub fn to_filter_text(&self) -> String {
        match self {
            Value::String(s) => quote(s),
            Value::Float(f) => format!("{f:?}"),
            Value::List(items) => items
                .iter()
                .map(Value::to_filter_text)
                .collect::<Vec<_>>()
                .join(","),
            other => other.to_string(),
        }
    }

    /// Compares two values, coercing across compatible kinds.
    ///
    /// Integers and floats compare numerically; dates compare with
    /// date-times at midnight; strings are parsed on the fly when compared
    /// with temporal or UUID values. Returns `None` for incomparable kinds
    /// and whenever either side is null.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;

        match (self, other) {
            (Null, _) | (_, Null) | (List(_), _) | (_, List(_)) => None,
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
            (Date(a), DateTime(b)) => Some(midnight(*a).cmp(b)),
            (DateTime(a), Date(b)) => Some(a.cmp(&midnight(*b))),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            (String(s), Date(d)) => parse_date(s)
                .or_else(|| parse_datetime(s).map(|dt| dt.date()))
                .map(|parsed| parsed.cmp(d)),
            (String(s), DateTime(dt)) => parse_datetime(s)
                .or_else(|| parse_date(s).map(midnight))
                .map(|parsed| parsed.cmp(dt)),
            (String(s), Uuid(u)) => uuid::Uuid::parse_str(s).ok().map(|parsed| parsed.cmp(u)),
            (Date(_) | DateTime(_) | Uuid(_), String(_)) => {
                other.compare(self).map(Ordering::reverse)
            }
            _ => None,
        }
    }

    /// Returns true if the values compare equal under [`Value::compare`].
    pub fn loosely_equals(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Value {
    /// Plain text form, without quoting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

/// Parses `true`/`false` in any case.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parses an ISO-8601 date-time; offsets are normalized to UTC.
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Parses an ISO-8601 calendar date.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

pub(crate) fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn looks_like_float(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text.chars().any(|c| matches!(c, '.' | 'e' | 'E'))
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
}

/// Wraps `s` in whichever quote character the lexer can read back verbatim.
///
/// Text that fits neither quote style (a trailing backslash, or both quote
/// characters) is left bare when it reads back as the same string.
fn quote(s: &str) -> String {
    for q in ['"', '\''] {
        if fits_in_quotes(s, q) {
            return format!("{q}{s}{q}");
        }
    }
    if reads_back_bare(s) {
        return s.to_string();
    }
    format!("\"{s}\"")
}

/// Returns true if `s`, written unquoted as a value, lexes and infers back
/// to the string `s`.
fn reads_back_bare(s: &str) -> bool {
    if s.is_empty() || s.trim() != s || s.contains(',') {
        return false;
    }
    if matches!(s.find('='), Some(eq) if s[..eq].contains("__")) {
        return false;
    }
    let mut at_item_start = true;
    for c in s.chars() {
        match c {
            '"' | '\'' if at_item_start => return false,
            '=' => at_item_start = true,
            c if c.is_whitespace() => {}
            _ => at_item_start = false,
        }
    }
    Value::infer(s) == Value::String(s.to_string())
}

fn fits_in_quotes(s: &str, q: char) -> bool {
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if chars.next().is_none() {
                return false;
            }
        } else if c == q {
            return false;
        }
    }
    true
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = String;

    /// Converts JSON data; objects are rejected, strings stay strings.
    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| format!("unrepresentable number {n}")),
            },
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            serde_json::Value::Object(_) => Err("objects are not valid filter values".to_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(_) | Value::DateTime(_) | Value::Uuid(_) => {
                serializer.serialize_str(&self.to_string())
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::try_from(json).map_err(D::Error::custom)
    }
}
