//! `Literal` - typed values that can be embedded in DB2 statements

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// A typed literal value
///
/// Covers the kinds a column default or catalog parameter can take. Rendering
/// rules live in [`crate::value::format_literal`].
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// SQL `NULL`
    Null,
    /// Character data
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Timestamp without time zone
    DateTime(NaiveDateTime),
    /// Boolean, stored by DB2 as a small integer
    Bool(bool),
    /// UUID, stored in its textual form
    Uuid(Uuid),
    /// Binary data
    Bytes(Vec<u8>),
    /// Interval, stored as a floating-point number of seconds
    Duration(TimeDelta),
    /// Any integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// Exact numeric value
    Decimal(Decimal),
}

impl Literal {
    /// Shorthand for [`Literal::Text`]
    pub fn text(value: impl Into<String>) -> Self {
        Literal::Text(value.into())
    }

    /// Returns `true` for [`Literal::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Borrow the value as a string when it is textual
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Interpret the value as an integer
    ///
    /// Catalog drivers report `MAX()` results as integers, decimals or text
    /// depending on the column type, so all three are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Integer(v) => Some(*v),
            Literal::Decimal(d) => d.trunc().to_i64(),
            Literal::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Literal::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Integer(i64::from(value))
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<Decimal> for Literal {
    fn from(value: Decimal) -> Self {
        Literal::Decimal(value)
    }
}

impl From<Uuid> for Literal {
    fn from(value: Uuid) -> Self {
        Literal::Uuid(value)
    }
}

impl From<Vec<u8>> for Literal {
    fn from(value: Vec<u8>) -> Self {
        Literal::Bytes(value)
    }
}

impl From<NaiveDate> for Literal {
    fn from(value: NaiveDate) -> Self {
        Literal::Date(value)
    }
}

impl From<NaiveTime> for Literal {
    fn from(value: NaiveTime) -> Self {
        Literal::Time(value)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(value: NaiveDateTime) -> Self {
        Literal::DateTime(value)
    }
}

impl From<TimeDelta> for Literal {
    fn from(value: TimeDelta) -> Self {
        Literal::Duration(value)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Literal::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_from_conversions() {
        assert_eq!(Literal::from("abc"), Literal::Text("abc".to_string()));
        assert_eq!(Literal::from(7i32), Literal::Integer(7));
        assert_eq!(Literal::from(true), Literal::Bool(true));
        assert_eq!(Literal::from(None::<i64>), Literal::Null);
        assert_eq!(Literal::from(Some(3i64)), Literal::Integer(3));
    }

    #[test]
    fn test_as_i64_accepts_catalog_representations() {
        assert_eq!(Literal::Integer(41).as_i64(), Some(41));
        assert_eq!(Literal::Decimal(Decimal::from_str("41").unwrap()).as_i64(), Some(41));
        assert_eq!(Literal::text(" 41 ").as_i64(), Some(41));
        assert_eq!(Literal::Null.as_i64(), None);
        assert_eq!(Literal::Bool(true).as_i64(), None);
    }

    #[test]
    fn test_as_str() {
        assert_eq!(Literal::text("SCHEMA").as_str(), Some("SCHEMA"));
        assert_eq!(Literal::Integer(1).as_str(), None);
        assert!(Literal::Null.is_null());
    }
}
