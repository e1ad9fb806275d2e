//! Conversion from arrow record batches.
//!
//! Query engines hand back results as arrow [`RecordBatch`]es. Integer widths
//! up to 32 bits are widened to `Int64`, temporal values are normalized to UTC,
//! and types with no comparable scalar form are rejected by column name.

use arrow::array::{Array, ArrayRef, ArrowPrimitiveType, AsArray, PrimitiveArray};
use arrow::datatypes::{
    DataType as ArrowDataType, Date32Type, Date64Type, Decimal128Type, Float32Type, Float64Type,
    Int8Type, Int16Type, Int32Type, Int64Type, Schema as ArrowSchema, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, Utc};
use qparity_common::error::{CommonError, Result};

use crate::dataset::{Dataset, Row};
use crate::scalar::Scalar;
use crate::types::{Field, ScalarType, Schema};

/// Map an arrow type onto the declared type of a column.
pub fn scalar_type_from_arrow(column: &str, data_type: &ArrowDataType) -> Result<ScalarType> {
    let scalar_type = match data_type {
        ArrowDataType::Null => ScalarType::Null,
        ArrowDataType::Boolean => ScalarType::Boolean,
        ArrowDataType::Int8
        | ArrowDataType::Int16
        | ArrowDataType::Int32
        | ArrowDataType::Int64
        | ArrowDataType::UInt8
        | ArrowDataType::UInt16
        | ArrowDataType::UInt32 => ScalarType::Int64,
        ArrowDataType::UInt64 => ScalarType::UInt64,
        ArrowDataType::Float32 => ScalarType::Float32,
        ArrowDataType::Float64 => ScalarType::Float64,
        ArrowDataType::Decimal128(precision, scale) => ScalarType::Decimal128 {
            precision: *precision,
            scale: *scale,
        },
        ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 | ArrowDataType::Utf8View => {
            ScalarType::Utf8
        }
        ArrowDataType::Date32 | ArrowDataType::Date64 => ScalarType::Date,
        ArrowDataType::Timestamp(_, _) => ScalarType::Timestamp,
        other => {
            return Err(CommonError::type_error(format!(
                "column `{column}` has unsupported type {other}"
            )));
        }
    };
    Ok(scalar_type)
}

pub fn schema_from_arrow(schema: &ArrowSchema) -> Result<Schema> {
    let fields = schema
        .fields()
        .iter()
        .map(|field| {
            let data_type = scalar_type_from_arrow(field.name(), field.data_type())?;
            Ok(Field::new(field.name(), data_type, field.is_nullable()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::new(fields))
}

/// Collect a query result into one dataset, rows in batch order.
pub fn dataset_from_batches(schema: &ArrowSchema, batches: &[RecordBatch]) -> Result<Dataset> {
    let target = schema_from_arrow(schema)?;
    let total_rows = batches.iter().map(RecordBatch::num_rows).sum();
    let mut rows: Vec<Row> = Vec::with_capacity(total_rows);

    for batch in batches {
        if batch.num_columns() != target.len() {
            return Err(CommonError::malformed_input(format!(
                "record batch has {} columns but the result schema declares {}",
                batch.num_columns(),
                target.len()
            )));
        }
        let mut columns = target
            .fields
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| column_values(&field.name, array).map(Vec::into_iter))
            .collect::<Result<Vec<_>>>()?;
        for _ in 0..batch.num_rows() {
            // Arrays of a record batch always share one length.
            rows.push(
                columns
                    .iter_mut()
                    .map(|values| values.next().unwrap_or(Scalar::Null))
                    .collect(),
            );
        }
    }

    Ok(Dataset::new(target, rows))
}

impl TryFrom<&RecordBatch> for Dataset {
    type Error = CommonError;

    fn try_from(batch: &RecordBatch) -> Result<Self> {
        dataset_from_batches(&batch.schema(), std::slice::from_ref(batch))
    }
}

fn widened<T>(array: &PrimitiveArray<T>) -> Vec<Scalar>
where
    T: ArrowPrimitiveType,
    T::Native: Into<i64>,
{
    array
        .iter()
        .map(|value| Scalar::Int64 {
            value: value.map(Into::into),
        })
        .collect()
}

fn temporal<T, V>(
    column: &str,
    array: &PrimitiveArray<T>,
    convert: impl Fn(T::Native) -> Option<V>,
    wrap: impl Fn(Option<V>) -> Scalar,
) -> Result<Vec<Scalar>>
where
    T: ArrowPrimitiveType,
{
    array
        .iter()
        .map(|value| match value {
            None => Ok(wrap(None)),
            Some(raw) => convert(raw).map(|v| wrap(Some(v))).ok_or_else(|| {
                CommonError::conversion_error(format!(
                    "column `{column}` holds a temporal value outside the supported range"
                ))
            }),
        })
        .collect()
}

fn date(value: Option<NaiveDate>) -> Scalar {
    Scalar::Date { value }
}

fn timestamp(value: Option<DateTime<Utc>>) -> Scalar {
    Scalar::Timestamp { value }
}

fn column_values(column: &str, array: &ArrayRef) -> Result<Vec<Scalar>> {
    let values = match array.data_type() {
        ArrowDataType::Null => vec![Scalar::Null; array.len()],
        ArrowDataType::Boolean => array
            .as_boolean()
            .iter()
            .map(|value| Scalar::Boolean { value })
            .collect(),
        ArrowDataType::Int8 => widened(array.as_primitive::<Int8Type>()),
        ArrowDataType::Int16 => widened(array.as_primitive::<Int16Type>()),
        ArrowDataType::Int32 => widened(array.as_primitive::<Int32Type>()),
        ArrowDataType::Int64 => widened(array.as_primitive::<Int64Type>()),
        ArrowDataType::UInt8 => widened(array.as_primitive::<UInt8Type>()),
        ArrowDataType::UInt16 => widened(array.as_primitive::<UInt16Type>()),
        ArrowDataType::UInt32 => widened(array.as_primitive::<UInt32Type>()),
        ArrowDataType::UInt64 => array
            .as_primitive::<UInt64Type>()
            .iter()
            .map(|value| Scalar::UInt64 { value })
            .collect(),
        ArrowDataType::Float32 => array
            .as_primitive::<Float32Type>()
            .iter()
            .map(|value| Scalar::Float32 { value })
            .collect(),
        ArrowDataType::Float64 => array
            .as_primitive::<Float64Type>()
            .iter()
            .map(|value| Scalar::Float64 { value })
            .collect(),
        ArrowDataType::Decimal128(precision, scale) => array
            .as_primitive::<Decimal128Type>()
            .iter()
            .map(|value| Scalar::Decimal128 {
                precision: *precision,
                scale: *scale,
                value,
            })
            .collect(),
        ArrowDataType::Utf8 => array
            .as_string::<i32>()
            .iter()
            .map(|value| Scalar::Utf8 {
                value: value.map(str::to_string),
            })
            .collect(),
        ArrowDataType::LargeUtf8 => array
            .as_string::<i64>()
            .iter()
            .map(|value| Scalar::Utf8 {
                value: value.map(str::to_string),
            })
            .collect(),
        ArrowDataType::Utf8View => array
            .as_string_view()
            .iter()
            .map(|value| Scalar::Utf8 {
                value: value.map(str::to_string),
            })
            .collect(),
        ArrowDataType::Date32 => temporal(
            column,
            array.as_primitive::<Date32Type>(),
            |days| {
                DateTime::from_timestamp(i64::from(days) * 86_400, 0).map(|dt| dt.date_naive())
            },
            date,
        )?,
        ArrowDataType::Date64 => temporal(
            column,
            array.as_primitive::<Date64Type>(),
            |millis| DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive()),
            date,
        )?,
        ArrowDataType::Timestamp(TimeUnit::Second, _) => temporal(
            column,
            array.as_primitive::<TimestampSecondType>(),
            |secs| DateTime::from_timestamp(secs, 0),
            timestamp,
        )?,
        ArrowDataType::Timestamp(TimeUnit::Millisecond, _) => temporal(
            column,
            array.as_primitive::<TimestampMillisecondType>(),
            DateTime::from_timestamp_millis,
            timestamp,
        )?,
        ArrowDataType::Timestamp(TimeUnit::Microsecond, _) => temporal(
            column,
            array.as_primitive::<TimestampMicrosecondType>(),
            DateTime::from_timestamp_micros,
            timestamp,
        )?,
        ArrowDataType::Timestamp(TimeUnit::Nanosecond, _) => temporal(
            column,
            array.as_primitive::<TimestampNanosecondType>(),
            |nanos| Some(DateTime::from_timestamp_nanos(nanos)),
            timestamp,
        )?,
        other => {
            return Err(CommonError::type_error(format!(
                "column `{column}` has unsupported type {other}"
            )));
        }
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        BooleanArray, Date32Array, Decimal128Array, Float64Array, Int32Array, ListArray,
        StringArray, TimestampMillisecondArray, UInt64Array,
    };
    use arrow::datatypes::Field as ArrowField;
    use std::sync::Arc;

    #[test]
    fn test_batch_to_dataset() {
        let schema = Arc::new(ArrowSchema::new(vec![
            ArrowField::new("id", ArrowDataType::Int32, false),
            ArrowField::new("name", ArrowDataType::Utf8, true),
            ArrowField::new("score", ArrowDataType::Float64, true),
            ArrowField::new("active", ArrowDataType::Boolean, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("ada"), None])),
                Arc::new(Float64Array::from(vec![Some(1.5), None])),
                Arc::new(BooleanArray::from(vec![Some(true), Some(false)])),
            ],
        )
        .unwrap();

        let dataset = Dataset::try_from(&batch).unwrap();
        assert_eq!(dataset.column_names(), vec!["id", "name", "score", "active"]);
        assert_eq!(dataset.schema().fields[0].data_type, ScalarType::Int64);
        assert_eq!(
            dataset.rows()[0],
            vec![
                Scalar::from(1i64),
                Scalar::from("ada"),
                Scalar::from(1.5f64),
                Scalar::from(true),
            ]
        );
        assert!(dataset.rows()[1][1].is_null());
        assert!(dataset.rows()[1][2].is_null());
    }

    #[test]
    fn test_multiple_batches_concatenate() {
        let schema = Arc::new(ArrowSchema::new(vec![ArrowField::new(
            "n",
            ArrowDataType::UInt64,
            false,
        )]));
        let first =
            RecordBatch::try_new(schema.clone(), vec![Arc::new(UInt64Array::from(vec![1, 2]))])
                .unwrap();
        let second =
            RecordBatch::try_new(schema.clone(), vec![Arc::new(UInt64Array::from(vec![3]))])
                .unwrap();
        let dataset = dataset_from_batches(&schema, &[first, second]).unwrap();
        assert_eq!(dataset.num_rows(), 3);
        assert_eq!(dataset.rows()[2][0], Scalar::from(3u64));
    }

    #[test]
    fn test_temporal_and_decimal_columns() {
        let decimals = Decimal128Array::from(vec![Some(1250), None])
            .with_precision_and_scale(10, 2)
            .unwrap();
        let schema = Arc::new(ArrowSchema::new(vec![
            ArrowField::new("day", ArrowDataType::Date32, true),
            ArrowField::new(
                "at",
                ArrowDataType::Timestamp(TimeUnit::Millisecond, Some("+02:00".into())),
                true,
            ),
            ArrowField::new("amount", ArrowDataType::Decimal128(10, 2), true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Date32Array::from(vec![Some(19_723), None])),
                Arc::new(
                    TimestampMillisecondArray::from(vec![Some(1_000), None])
                        .with_timezone("+02:00"),
                ),
                Arc::new(decimals),
            ],
        )
        .unwrap();

        let dataset = Dataset::try_from(&batch).unwrap();
        assert_eq!(
            dataset.rows()[0][0],
            Scalar::from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(
            dataset.rows()[0][1],
            Scalar::from(DateTime::from_timestamp(1, 0).unwrap())
        );
        assert_eq!(dataset.rows()[0][2], Scalar::decimal(1250, 10, 2));
        assert!(dataset.rows()[1].iter().all(Scalar::is_null));
    }

    #[test]
    fn test_unsupported_type_names_column() {
        let list_type = ArrowDataType::List(Arc::new(ArrowField::new(
            "item",
            ArrowDataType::Int32,
            true,
        )));
        let err = scalar_type_from_arrow("tags", &list_type).unwrap_err();
        assert!(matches!(err, CommonError::TypeError { .. }));
        assert!(err.to_string().contains("`tags`"));

        let schema = Arc::new(ArrowSchema::new(vec![ArrowField::new(
            "tags", list_type, true,
        )]));
        let lists = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![Some(1)])]);
        let batch = RecordBatch::try_new(schema, vec![Arc::new(lists)]).unwrap();
        assert!(matches!(
            Dataset::try_from(&batch),
            Err(CommonError::TypeError { .. })
        ));
    }
}
