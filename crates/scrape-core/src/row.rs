//! Driver-neutral query result rows.

use crate::error::{Result, ScrapeError};

/// One decoded cell.
///
/// Drivers map their column types onto these variants. Fixed-point values
/// (MySQL `DECIMAL`, e.g. the result of `SUM()`) arrive as [`Value::Text`]
/// and are parsed on demand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }
}

/// Conversion from a [`Value`] into a typed column.
///
/// The error is a bare reason; [`Row::get`] attaches the column index.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> std::result::Result<Self, String>;
}

fn mismatch<T>(value: &Value, target: &str) -> std::result::Result<T, String> {
    Err(format!("cannot decode {} as {}", value.type_name(), target))
}

fn unexpected_null<T>() -> std::result::Result<T, String> {
    Err("unexpected null".to_string())
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::UInt(v) => Ok(*v),
            Value::Int(v) => u64::try_from(*v).map_err(|_| format!("{} is negative", v)),
            Value::Text(s) => parse_unsigned(s),
            Value::Null => unexpected_null(),
            Value::Float(_) => mismatch(value, "u64"),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::UInt(v) => i64::try_from(*v).map_err(|_| format!("{} overflows i64", v)),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid integer {:?}: {}", s, e)),
            Value::Null => unexpected_null(),
            Value::Float(_) => mismatch(value, "i64"),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::UInt(v) => Ok(*v as f64),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid number {:?}: {}", s, e)),
            Value::Null => unexpected_null(),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Int(v) => Ok(v.to_string()),
            Value::UInt(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            Value::Null => unexpected_null(),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Unsigned parse that also accepts integral decimals such as `"3.0"`.
fn parse_unsigned(s: &str) -> std::result::Result<u64, String> {
    let trimmed = s.trim();
    if let Ok(v) = trimmed.parse::<u64>() {
        return Ok(v);
    }
    match trimmed.split_once('.') {
        Some((int, frac)) if frac.chars().all(|c| c == '0') => int
            .parse::<u64>()
            .map_err(|e| format!("invalid unsigned integer {:?}: {}", s, e)),
        _ => Err(format!("invalid unsigned integer {:?}", s)),
    }
}

/// One row of a query result, columns in projection order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Decode column `idx` into `T`.
    pub fn get<T: FromValue>(&self, idx: usize) -> Result<T> {
        let value = self.values.get(idx).ok_or_else(|| {
            ScrapeError::decode(
                idx,
                format!("column out of range, row has {} columns", self.values.len()),
            )
        })?;
        T::from_value(value).map_err(|reason| ScrapeError::decode(idx, reason))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Build a [`Row`] from heterogeneous cells.
///
/// ```
/// use scrape_core::row;
///
/// let r = row!["i-1", 12.5_f64, 3.0_f64];
/// assert_eq!(r.len(), 3);
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::row::Row::new(vec![$($crate::row::Value::from($value)),*])
    };
}
