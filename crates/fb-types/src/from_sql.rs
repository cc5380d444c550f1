//! Trait for converting from SQL values to Rust types.

use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::TypeError;
use crate::value::SqlValue;

/// Trait for types that can be converted from SQL values.
///
/// This trait is implemented for common Rust types to enable
/// type-safe extraction of values from rows.
pub trait FromSql: Sized {
    /// Convert from a SQL value to this type.
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError>;

    /// Convert from an optional SQL value.
    ///
    /// Returns `None` if the value is NULL.
    fn from_sql_nullable(value: &SqlValue) -> Result<Option<Self>, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            Self::from_sql(value).map(Some)
        }
    }
}

fn mismatch(expected: &'static str, value: &SqlValue) -> TypeError {
    match value {
        SqlValue::Null => TypeError::UnexpectedNull,
        other => TypeError::TypeMismatch {
            expected,
            actual: other.type_name(),
        },
    }
}

impl FromSql for bool {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Boolean(v) => Ok(*v),
            SqlValue::SmallInt(v) => Ok(*v != 0),
            SqlValue::Integer(v) => Ok(*v != 0),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl FromSql for i16 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::SmallInt(v) => Ok(*v),
            SqlValue::Integer(v) => i16::try_from(*v).map_err(|_| TypeError::OutOfRange {
                target_type: "i16",
            }),
            _ => Err(mismatch("i16", value)),
        }
    }
}

impl FromSql for i32 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::BigInt(v) => i32::try_from(*v).map_err(|_| TypeError::OutOfRange {
                target_type: "i32",
            }),
            _ => value.as_i32().ok_or_else(|| mismatch("i32", value)),
        }
    }
}

impl FromSql for i64 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        value.as_i64().ok_or_else(|| mismatch("i64", value))
    }
}

impl FromSql for f32 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Float(v) => Ok(*v),
            _ => Err(mismatch("f32", value)),
        }
    }
}

impl FromSql for f64 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }
}

impl FromSql for String {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Text(v) => Ok(v.clone()),
            SqlValue::Blob(b) => String::from_utf8(b.to_vec())
                .map_err(|e| TypeError::InvalidEncoding(e.to_string())),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromSql for Vec<u8> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Blob(v) => Ok(v.to_vec()),
            SqlValue::Text(v) => Ok(v.as_bytes().to_vec()),
            _ => Err(mismatch("Vec<u8>", value)),
        }
    }
}

impl FromSql for Bytes {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Blob(v) => Ok(v.clone()),
            _ => Err(mismatch("Bytes", value)),
        }
    }
}

impl FromSql for NaiveDate {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Date(v) => Ok(*v),
            SqlValue::Timestamp(v) => Ok(v.date()),
            _ => Err(mismatch("NaiveDate", value)),
        }
    }
}

impl FromSql for NaiveTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Time(v) => Ok(*v),
            _ => Err(mismatch("NaiveTime", value)),
        }
    }
}

impl FromSql for NaiveDateTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Timestamp(v) => Ok(*v),
            SqlValue::Date(v) => Ok(v.and_time(NaiveTime::MIN)),
            _ => Err(mismatch("NaiveDateTime", value)),
        }
    }
}

impl<T: FromSql> FromSql for Option<T> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        T::from_sql_nullable(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sql_i32() {
        assert_eq!(i32::from_sql(&SqlValue::Integer(42)).unwrap(), 42);
        assert_eq!(i32::from_sql(&SqlValue::SmallInt(7)).unwrap(), 7);
        assert_eq!(
            i32::from_sql(&SqlValue::BigInt(i64::MAX)).unwrap_err(),
            TypeError::OutOfRange { target_type: "i32" }
        );
    }

    #[test]
    fn test_from_sql_string() {
        let value = SqlValue::Text("Firebird".into());
        assert_eq!(String::from_sql(&value).unwrap(), "Firebird");
        assert!(matches!(
            i64::from_sql(&value),
            Err(TypeError::TypeMismatch {
                expected: "i64",
                actual: "VARCHAR"
            })
        ));
    }

    #[test]
    fn test_from_sql_null() {
        assert_eq!(
            i32::from_sql(&SqlValue::Null).unwrap_err(),
            TypeError::UnexpectedNull
        );
    }

    #[test]
    fn test_from_sql_option() {
        assert_eq!(Option::<i32>::from_sql(&SqlValue::Null).unwrap(), None);
        assert_eq!(
            Option::<i32>::from_sql(&SqlValue::Integer(1)).unwrap(),
            Some(1)
        );
    }

    #[test]
    fn test_date_into_timestamp() {
        let date = NaiveDate::from_ymd_opt(2001, 9, 1).unwrap();
        let ts = NaiveDateTime::from_sql(&SqlValue::Date(date)).unwrap();
        assert_eq!(ts.date(), date);
    }
}
