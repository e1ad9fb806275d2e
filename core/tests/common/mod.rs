//! Common test utilities and helpers for integration tests

use qparity_core::{Dataset, Field, Fields, Row, Scalar, ScalarType, Schema};

/// Build a dataset from `(name, type)` column declarations and rows.
pub fn dataset(columns: &[(&str, ScalarType)], rows: Vec<Row>) -> Dataset {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, data_type)| Field::new(*name, *data_type, true))
        .collect();
    Dataset::new(Schema::new(fields), rows)
}

/// Rows reordered so that row `k` of the result is row `order[k]` of the input.
#[allow(dead_code)]
pub fn permute_rows(dataset: &Dataset, order: &[usize]) -> Dataset {
    let rows = order.iter().map(|&i| dataset.rows()[i].clone()).collect();
    Dataset::new(dataset.schema().clone(), rows)
}

/// Columns reordered so that column `k` of the result is column `order[k]` of the input.
#[allow(dead_code)]
pub fn permute_columns(dataset: &Dataset, order: &[usize]) -> Dataset {
    let fields: Fields = order
        .iter()
        .map(|&i| dataset.schema().fields[i].clone())
        .collect();
    let rows = dataset
        .rows()
        .iter()
        .map(|row| order.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Dataset::new(Schema::new(fields), rows)
}

/// `n` distinct rows over `(id: int64, label: utf8, weight: float64)`.
#[allow(dead_code)]
pub fn numbered_rows(n: usize) -> Dataset {
    let rows = (0..n)
        .map(|i| {
            vec![
                Scalar::from(i as i64),
                Scalar::from(format!("row-{i}")),
                Scalar::from(i as f64 * 0.5),
            ]
        })
        .collect();
    dataset(
        &[
            ("id", ScalarType::Int64),
            ("label", ScalarType::Utf8),
            ("weight", ScalarType::Float64),
        ],
        rows,
    )
}
