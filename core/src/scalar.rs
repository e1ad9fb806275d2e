//! Scalar value representations for qparity datasets.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Error as SerdeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::ScalarType;

/// A single cell value.
///
/// Typed variants carry an `Option` so a null that came out of a typed column
/// keeps its type; [`Scalar::Null`] is the untyped null. All nulls compare the
/// same way regardless of how they are spelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Scalar {
    Null,
    Boolean {
        value: Option<bool>,
    },
    Int64 {
        value: Option<i64>,
    },
    UInt64 {
        value: Option<u64>,
    },
    Float32 {
        value: Option<f32>,
    },
    Float64 {
        value: Option<f64>,
    },
    Decimal128 {
        precision: u8,
        scale: i8,
        #[serde(
            serialize_with = "serialize_optional",
            deserialize_with = "deserialize_optional"
        )]
        value: Option<i128>,
    },
    Utf8 {
        value: Option<String>,
    },
    Date {
        value: Option<NaiveDate>,
    },
    Timestamp {
        value: Option<DateTime<Utc>>,
    },
}

fn serialize_optional<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_some(&v.to_string()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_optional<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    value
        .map(|s| s.parse::<T>().map_err(D::Error::custom))
        .transpose()
}

impl Scalar {
    /// The typed null for a declared column type.
    pub fn null_of(data_type: &ScalarType) -> Scalar {
        match data_type {
            ScalarType::Null => Scalar::Null,
            ScalarType::Boolean => Scalar::Boolean { value: None },
            ScalarType::Int64 => Scalar::Int64 { value: None },
            ScalarType::UInt64 => Scalar::UInt64 { value: None },
            ScalarType::Float32 => Scalar::Float32 { value: None },
            ScalarType::Float64 => Scalar::Float64 { value: None },
            ScalarType::Decimal128 { precision, scale } => Scalar::Decimal128 {
                precision: *precision,
                scale: *scale,
                value: None,
            },
            ScalarType::Utf8 => Scalar::Utf8 { value: None },
            ScalarType::Date => Scalar::Date { value: None },
            ScalarType::Timestamp => Scalar::Timestamp { value: None },
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Boolean { value } => value.is_none(),
            Scalar::Int64 { value } => value.is_none(),
            Scalar::UInt64 { value } => value.is_none(),
            Scalar::Float32 { value } => value.is_none(),
            Scalar::Float64 { value } => value.is_none(),
            Scalar::Decimal128 { value, .. } => value.is_none(),
            Scalar::Utf8 { value } => value.is_none(),
            Scalar::Date { value } => value.is_none(),
            Scalar::Timestamp { value } => value.is_none(),
        }
    }

    /// The type this value was produced as.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::Null => ScalarType::Null,
            Scalar::Boolean { .. } => ScalarType::Boolean,
            Scalar::Int64 { .. } => ScalarType::Int64,
            Scalar::UInt64 { .. } => ScalarType::UInt64,
            Scalar::Float32 { .. } => ScalarType::Float32,
            Scalar::Float64 { .. } => ScalarType::Float64,
            Scalar::Decimal128 {
                precision, scale, ..
            } => ScalarType::Decimal128 {
                precision: *precision,
                scale: *scale,
            },
            Scalar::Utf8 { .. } => ScalarType::Utf8,
            Scalar::Date { .. } => ScalarType::Date,
            Scalar::Timestamp { .. } => ScalarType::Timestamp,
        }
    }

    /// Whether the value may appear in a column declared as `data_type`.
    ///
    /// Nulls fit every column. Decimal values must share the declared scale;
    /// precision is not checked.
    pub fn conforms_to(&self, data_type: &ScalarType) -> bool {
        if self.is_null() {
            return true;
        }
        match (self, data_type) {
            (Scalar::Decimal128 { scale, .. }, ScalarType::Decimal128 { scale: declared, .. }) => {
                scale == declared
            }
            _ => std::mem::discriminant(&self.scalar_type()) == std::mem::discriminant(data_type),
        }
    }

    pub fn decimal(value: i128, precision: u8, scale: i8) -> Scalar {
        Scalar::Decimal128 {
            precision,
            scale,
            value: Some(value),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean { value: Some(value) }
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int64 {
            value: Some(i64::from(value)),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int64 { value: Some(value) }
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::UInt64 { value: Some(value) }
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Float32 { value: Some(value) }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float64 { value: Some(value) }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Utf8 {
            value: Some(value.to_string()),
        }
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Utf8 { value: Some(value) }
    }
}

impl From<NaiveDate> for Scalar {
    fn from(value: NaiveDate) -> Self {
        Scalar::Date { value: Some(value) }
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(value: DateTime<Utc>) -> Self {
        Scalar::Timestamp { value: Some(value) }
    }
}

impl<T> From<Option<T>> for Scalar
where
    T: Into<Scalar>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Scalar::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_creation() {
        assert_eq!(Scalar::from(42i64), Scalar::Int64 { value: Some(42) });
        assert_eq!(Scalar::from(7i32), Scalar::Int64 { value: Some(7) });
        assert_eq!(
            Scalar::from("hello"),
            Scalar::Utf8 {
                value: Some("hello".to_string())
            }
        );
        assert_eq!(Scalar::from(None::<i64>), Scalar::Null);
        assert_eq!(Scalar::from(Some(true)), Scalar::Boolean { value: Some(true) });
    }

    #[test]
    fn test_typed_nulls() {
        for data_type in [
            ScalarType::Null,
            ScalarType::Boolean,
            ScalarType::Int64,
            ScalarType::UInt64,
            ScalarType::Float32,
            ScalarType::Float64,
            ScalarType::Decimal128 {
                precision: 10,
                scale: 2,
            },
            ScalarType::Utf8,
            ScalarType::Date,
            ScalarType::Timestamp,
        ] {
            let null = Scalar::null_of(&data_type);
            assert!(null.is_null(), "{data_type} null should be null");
            assert_eq!(null.scalar_type(), data_type);
            assert!(null.conforms_to(&ScalarType::Utf8));
        }
    }

    #[test]
    fn test_empty_string_is_not_null() {
        assert!(!Scalar::from("").is_null());
        assert!(!Scalar::from("null").is_null());
        assert!(!Scalar::from(0i64).is_null());
    }

    #[test]
    fn test_conformance() {
        assert!(Scalar::from(1i64).conforms_to(&ScalarType::Int64));
        assert!(!Scalar::from(1i64).conforms_to(&ScalarType::Float64));
        assert!(!Scalar::from("1").conforms_to(&ScalarType::Int64));

        let decimal = Scalar::decimal(1250, 10, 2);
        assert!(decimal.conforms_to(&ScalarType::Decimal128 {
            precision: 38,
            scale: 2
        }));
        assert!(!decimal.conforms_to(&ScalarType::Decimal128 {
            precision: 10,
            scale: 3
        }));
    }

    #[test]
    fn test_decimal_serialization() {
        let decimal = Scalar::decimal(i128::MAX, 38, 0);
        let json = serde_json::to_string(&decimal).unwrap();
        assert!(json.contains(&format!("\"{}\"", i128::MAX)));
        let back: Scalar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, decimal);

        let null_decimal = Scalar::null_of(&ScalarType::Decimal128 {
            precision: 5,
            scale: 1,
        });
        let json = serde_json::to_string(&null_decimal).unwrap();
        let back: Scalar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, null_decimal);
    }

    #[test]
    fn test_temporal_serialization() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let value = Scalar::from(date);
        let json = serde_json::to_string(&value).unwrap();
        let back: Scalar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);

        let ts = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let value = Scalar::from(ts);
        let json = serde_json::to_string(&value).unwrap();
        let back: Scalar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
