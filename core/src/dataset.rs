//! In-memory tabular result sets.

use qparity_common::error::{CommonError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scalar::Scalar;
use crate::types::{Field, ScalarType, Schema};

/// One row of a dataset, one value per column in schema order.
pub type Row = Vec<Scalar>;

/// A query result: named, typed columns and rows in execution order.
///
/// Row order and column order carry no meaning for comparison. A dataset is
/// never mutated once built; comparisons work on derived data only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Row>,
}

impl Dataset {
    /// Create a dataset without checking row arity.
    ///
    /// Ragged rows are representable so that consumers can reject them with a
    /// precise error; see [`Dataset::validate`].
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    /// A dataset with the given columns and no rows.
    pub fn empty(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.field_names()
    }

    /// Values of the first column with the given name, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Scalar>> {
        let index = self.schema.index_of(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(index)).collect())
    }

    /// Check that every row has exactly one value per declared column.
    pub fn validate(&self) -> Result<()> {
        let arity = self.schema.len();
        match self.rows.iter().position(|row| row.len() != arity) {
            Some(index) => Err(CommonError::malformed_input(format!(
                "row {index} has {} values but the dataset declares {arity} columns",
                self.rows[index].len()
            ))),
            None => Ok(()),
        }
    }

    /// Build a dataset from untyped JSON records.
    ///
    /// Column types are inferred from the non-null values of each column:
    /// booleans give `Boolean`, integers that fit `i64` give `Int64`,
    /// non-negative integers with at least one above `i64::MAX` give `UInt64`,
    /// integers mixed with fractional numbers give `Float64`, strings give
    /// `Utf8` and all-null columns give `Null`. Strings are kept as text even
    /// when they look numeric. Columns mixing kinds, holding arrays or objects,
    /// or whose integers cannot be held exactly by the inferred type are
    /// rejected.
    pub fn from_json_records(columns: &[&str], records: &[Vec<Value>]) -> Result<Dataset> {
        if let Some(index) = records.iter().position(|r| r.len() != columns.len()) {
            return Err(CommonError::malformed_input(format!(
                "record {index} has {} values but {} columns were named",
                records[index].len(),
                columns.len()
            )));
        }

        let fields = columns
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let data_type = infer_column_type(name, records.iter().map(|r| &r[index]))?;
                Ok(Field::new(*name, data_type, true))
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = records
            .iter()
            .map(|record| {
                record
                    .iter()
                    .zip(&fields)
                    .map(|(value, field)| json_to_scalar(&field.name, value, &field.data_type))
                    .collect::<Result<Row>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Dataset::new(Schema::new(fields), rows))
    }
}

/// Largest integer magnitude below which every integer is exact in an `f64`.
const MAX_EXACT_FLOAT_INTEGER: u64 = 1 << 53;

fn json_kind(value: &Value) -> Option<ScalarType> {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        Value::Bool(_) => Some(ScalarType::Boolean),
        Value::Number(n) if n.is_i64() => Some(ScalarType::Int64),
        Value::Number(n) if n.is_u64() => Some(ScalarType::UInt64),
        Value::Number(_) => Some(ScalarType::Float64),
        Value::String(_) => Some(ScalarType::Utf8),
    }
}

fn infer_column_type<'a>(
    column: &str,
    values: impl Iterator<Item = &'a Value>,
) -> Result<ScalarType> {
    let mut inferred = ScalarType::Null;
    for value in values {
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            return Err(CommonError::type_error(format!(
                "column `{column}` holds nested JSON values, which cannot be compared"
            )));
        }
        let Some(kind) = json_kind(value) else {
            continue;
        };
        inferred = match (inferred, kind) {
            (ScalarType::Null, kind) => kind,
            (current, kind) if current == kind => current,
            (ScalarType::Int64, ScalarType::Float64) | (ScalarType::Float64, ScalarType::Int64) => {
                ScalarType::Float64
            }
            // negative integers are rejected when the values are converted
            (ScalarType::Int64, ScalarType::UInt64) | (ScalarType::UInt64, ScalarType::Int64) => {
                ScalarType::UInt64
            }
            (current, kind) => {
                return Err(CommonError::type_error(format!(
                    "column `{column}` mixes {current} and {kind} values; declare its type explicitly"
                )));
            }
        };
    }
    Ok(inferred)
}

fn json_to_scalar(column: &str, value: &Value, data_type: &ScalarType) -> Result<Scalar> {
    let scalar = match (value, data_type) {
        (Value::Null, data_type) => Scalar::null_of(data_type),
        (Value::Bool(b), ScalarType::Boolean) => Scalar::from(*b),
        (Value::Number(n), ScalarType::Int64) => Scalar::Int64 { value: n.as_i64() },
        (Value::Number(n), ScalarType::UInt64) => match n.as_u64() {
            Some(v) => Scalar::from(v),
            None => {
                return Err(CommonError::type_error(format!(
                    "column `{column}` mixes negative integers with integers above {}",
                    i64::MAX
                )));
            }
        },
        (Value::Number(n), ScalarType::Float64) => {
            if let Some(v) = n.as_i64().filter(|v| v.unsigned_abs() > MAX_EXACT_FLOAT_INTEGER) {
                return Err(CommonError::type_error(format!(
                    "column `{column}` mixes fractional numbers with integer {v}, \
                     which float64 cannot hold exactly"
                )));
            }
            Scalar::Float64 { value: n.as_f64() }
        }
        (Value::String(s), ScalarType::Utf8) => Scalar::from(s.as_str()),
        (value, data_type) => {
            return Err(CommonError::internal_error(format!(
                "column `{column}` inferred as {data_type} but holds {value}"
            )));
        }
    };
    Ok(scalar)
}
