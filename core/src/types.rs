//! Data type system for qparity datasets
//!
//! Every column of a [`crate::Dataset`] declares one [`ScalarType`]; values are
//! canonicalized according to that declaration when tables are compared.

use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ScalarType {
    /// A column that only ever holds nulls
    Null,
    Boolean,
    Int64,
    UInt64,
    Float32,
    Float64,
    /// 128-bit decimal value
    Decimal128 { precision: u8, scale: i8 },
    Utf8,
    /// Calendar date without time zone
    Date,
    /// Instant in time, normalized to UTC
    Timestamp,
}

impl ScalarType {
    /// Whether values of this type compare by numeric magnitude.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarType::Int64
                | ScalarType::UInt64
                | ScalarType::Float32
                | ScalarType::Float64
                | ScalarType::Decimal128 { .. }
        )
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarType::Null => write!(f, "null"),
            ScalarType::Boolean => write!(f, "boolean"),
            ScalarType::Int64 => write!(f, "int64"),
            ScalarType::UInt64 => write!(f, "uint64"),
            ScalarType::Float32 => write!(f, "float32"),
            ScalarType::Float64 => write!(f, "float64"),
            ScalarType::Decimal128 { precision, scale } => {
                write!(f, "decimal128({precision}, {scale})")
            }
            ScalarType::Utf8 => write!(f, "utf8"),
            ScalarType::Date => write!(f, "date"),
            ScalarType::Timestamp => write!(f, "timestamp"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub data_type: ScalarType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: ScalarType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

pub type FieldRef = Arc<Field>;

/// Immutable, cheaply cloneable list of fields.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Fields(Arc<[FieldRef]>);

impl Fields {
    pub fn empty() -> Self {
        Self(Arc::new([]))
    }
}

impl Default for Fields {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Field> for Fields {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        iter.into_iter().map(Arc::new).collect()
    }
}

impl FromIterator<FieldRef> for Fields {
    fn from_iter<T: IntoIterator<Item = FieldRef>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Field>> for Fields {
    fn from(fields: Vec<Field>) -> Self {
        fields.into_iter().collect()
    }
}

impl Deref for Fields {
    type Target = [FieldRef];

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a FieldRef;
    type IntoIter = std::slice::Iter<'a, FieldRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Ordered column list of a dataset.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct Schema {
    pub fields: Fields,
}

impl Schema {
    pub fn new(fields: impl Into<Fields>) -> Self {
        Self {
            fields: fields.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Position of the first field with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index).map(|f| f.as_ref())
    }
}

impl Serialize for Schema {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields: Vec<&Field> = self.fields.iter().map(|f| f.as_ref()).collect();
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Vec::<Field>::deserialize(deserializer)?;
        Ok(Schema::new(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", ScalarType::Int64, false),
            Field::new("name", ScalarType::Utf8, true),
            Field::new("id", ScalarType::Float64, true),
        ])
    }

    #[test]
    fn test_schema_lookup() {
        let schema = sample_schema();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.field_names(), vec!["id", "name", "id"]);
        assert_eq!(schema.index_of("id"), Some(0));
        assert_eq!(schema.index_of("name"), Some(1));
        assert_eq!(schema.index_of("missing"), None);
        assert_eq!(schema.field(2).map(|f| f.data_type), Some(ScalarType::Float64));
    }

    #[test]
    fn test_numeric_types() {
        assert!(ScalarType::Int64.is_numeric());
        assert!(ScalarType::Float32.is_numeric());
        assert!(
            ScalarType::Decimal128 {
                precision: 10,
                scale: 2
            }
            .is_numeric()
        );
        assert!(!ScalarType::Utf8.is_numeric());
        assert!(!ScalarType::Null.is_numeric());
        assert!(!ScalarType::Timestamp.is_numeric());
    }

    #[test]
    fn test_schema_serde() {
        let schema = sample_schema();
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("\"dataType\":\"int64\""));
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ScalarType::Decimal128 {
                precision: 12,
                scale: 3
            }
            .to_string(),
            "decimal128(12, 3)"
        );
        assert_eq!(ScalarType::Utf8.to_string(), "utf8");
    }
}
