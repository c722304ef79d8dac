//! SQL values and conversion traits.
//!
//! `SqlValue` is the runtime representation of anything bound to a
//! statement parameter. All values travel as parameters; the inline
//! rendering exists for sequence literals and diagnostics only.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, Result};

/// A SQL value that can be bound as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Timestamp value (UTC).
    DateTime(DateTime<Utc>),
    /// JSON document value.
    Json(serde_json::Value),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: Prefer parameterized binding; this is used for
    /// diagnostics and the rare literal the synthesizer emits itself.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::DateTime(dt) => format!("'{}'", dt.to_rfc3339()),
            Self::Json(v) => {
                let escaped = v.to_string().replace('\'', "''");
                format!("'{escaped}'")
            }
        }
    }

    /// Returns whether this value equals its type's default.
    ///
    /// This is the sentinel heuristic the save orchestrator uses to
    /// decide whether a non-optional primary key "has a value": `0` and
    /// `-1` integers, empty strings, `false`, the Unix epoch and empty
    /// blobs all count as "absent". `Option` key fields make the check
    /// unambiguous (`Null` = absent) and are the recommended shape; the
    /// sentinel rules are a compatibility shim for non-nullable keys.
    #[must_use]
    pub fn is_type_default(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(n) => *n == 0 || *n == -1,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => s.is_empty(),
            Self::Blob(b) => b.is_empty(),
            Self::DateTime(dt) => dt.timestamp() == 0 && dt.timestamp_subsec_nanos() == 0,
            Self::Json(v) => v.is_null(),
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i8 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u8 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::DateTime(self)
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Json(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

/// Trait for types a generated key can be converted back into.
///
/// Used when assigning a database-generated primary key onto the
/// entity's key field, converting to the field's declared type.
pub trait FromSqlValue: Sized {
    /// Converts a `SqlValue` into `Self`.
    fn from_sql_value(value: &SqlValue) -> Result<Self>;
}

fn conversion_error<T>(value: &SqlValue) -> CoreError {
    CoreError::KeyConversion {
        value: value.to_sql_inline(),
        target: std::any::type_name::<T>(),
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Int(n) => Ok(*n),
            // Some drivers surface SCOPE_IDENTITY()-style scalars as numeric
            SqlValue::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            SqlValue::Text(s) => s.parse().map_err(|_| conversion_error::<Self>(value)),
            _ => Err(conversion_error::<Self>(value)),
        }
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        let wide = i64::from_sql_value(value)?;
        Self::try_from(wide).map_err(|_| conversion_error::<Self>(value))
    }
}

impl FromSqlValue for i16 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        let wide = i64::from_sql_value(value)?;
        Self::try_from(wide).map_err(|_| conversion_error::<Self>(value))
    }
}

impl FromSqlValue for u32 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        let wide = i64::from_sql_value(value)?;
        Self::try_from(wide).map_err(|_| conversion_error::<Self>(value))
    }
}

impl FromSqlValue for u64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        let wide = i64::from_sql_value(value)?;
        Self::try_from(wide).map_err(|_| conversion_error::<Self>(value))
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Float(f) => Ok(*f),
            SqlValue::Int(n) => Ok(*n as Self),
            _ => Err(conversion_error::<Self>(value)),
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Int(n) => Ok(*n != 0),
            _ => Err(conversion_error::<Self>(value)),
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Text(s) => Ok(s.clone()),
            SqlValue::Int(n) => Ok(n.to_string()),
            _ => Err(conversion_error::<Self>(value)),
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::DateTime(dt) => Ok(*dt),
            SqlValue::Text(s) => s
                .parse()
                .map_err(|_| conversion_error::<Self>(value)),
            _ => Err(conversion_error::<Self>(value)),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sql_value_inline_null() {
        assert_eq!(SqlValue::Null.to_sql_inline(), "NULL");
    }

    #[test]
    fn test_sql_value_inline_text_escaping() {
        // Single quotes are escaped by doubling
        assert_eq!(
            SqlValue::Text(String::from("O'Brien")).to_sql_inline(),
            "'O''Brien'"
        );
    }

    #[test]
    fn test_sql_value_inline_blob() {
        assert_eq!(
            SqlValue::Blob(vec![0x48, 0x45, 0x4C]).to_sql_inline(),
            "X'48454C'"
        );
    }

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(2.5_f64.to_sql_value(), SqlValue::Float(2.5));
        assert_eq!("hi".to_sql_value(), SqlValue::Text(String::from("hi")));
        assert_eq!(None::<i32>.to_sql_value(), SqlValue::Null);
        assert_eq!(Some(42_i32).to_sql_value(), SqlValue::Int(42));
    }

    #[test]
    fn test_type_default_sentinels() {
        assert!(SqlValue::Null.is_type_default());
        assert!(SqlValue::Int(0).is_type_default());
        assert!(SqlValue::Int(-1).is_type_default());
        assert!(!SqlValue::Int(7).is_type_default());
        assert!(SqlValue::Text(String::new()).is_type_default());
        assert!(!SqlValue::Text(String::from("x")).is_type_default());
        assert!(SqlValue::Bool(false).is_type_default());
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert!(SqlValue::DateTime(epoch).is_type_default());
        let real = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(!SqlValue::DateTime(real).is_type_default());
    }

    #[test]
    fn test_from_sql_value_narrowing() {
        assert_eq!(i32::from_sql_value(&SqlValue::Int(41)).unwrap(), 41);
        assert!(i16::from_sql_value(&SqlValue::Int(1 << 40)).is_err());
        assert_eq!(
            i64::from_sql_value(&SqlValue::Float(12.0)).unwrap(),
            12
        );
        assert_eq!(
            Option::<i64>::from_sql_value(&SqlValue::Null).unwrap(),
            None
        );
        assert_eq!(
            Option::<i64>::from_sql_value(&SqlValue::Int(3)).unwrap(),
            Some(3)
        );
    }
}
