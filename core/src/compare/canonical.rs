//! Canonical row encoding.
//!
//! Each value is reduced to a type tag plus a canonical text. All numeric
//! kinds share one tag, so `1`, `1.0` and `1.00` (decimal) encode the same.
//! Nulls have their own tag and no text, so no string can collide with them.
//! A row digest is the BLAKE3 hash of the length-prefixed encodings of its
//! values in column-plan order.

use std::fmt;

use chrono::SecondsFormat;
use qparity_common::error::{CommonError, Result};

use crate::dataset::Row;
use crate::scalar::Scalar;
use crate::types::ScalarType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ValueTag {
    Null = 0,
    Boolean = 1,
    Number = 2,
    Text = 3,
    Date = 4,
    Timestamp = 5,
}

/// Canonical form of a single value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalValue {
    pub tag: ValueTag,
    pub text: String,
}

impl CanonicalValue {
    fn new(tag: ValueTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }

    fn null() -> Self {
        Self::new(ValueTag::Null, String::new())
    }
}

impl ValueTag {
    /// Tag shared by every non-null value of a declared type.
    pub fn for_type(data_type: &ScalarType) -> ValueTag {
        if data_type.is_numeric() {
            return ValueTag::Number;
        }
        match data_type {
            ScalarType::Boolean => ValueTag::Boolean,
            ScalarType::Utf8 => ValueTag::Text,
            ScalarType::Date => ValueTag::Date,
            ScalarType::Timestamp => ValueTag::Timestamp,
            _ => ValueTag::Null,
        }
    }
}

pub fn canonicalize(value: &Scalar) -> CanonicalValue {
    let text = match value {
        Scalar::Boolean { value: Some(v) } => v.to_string(),
        Scalar::Int64 { value: Some(v) } => v.to_string(),
        Scalar::UInt64 { value: Some(v) } => v.to_string(),
        // widened so both float kinds of one magnitude share a text
        Scalar::Float32 { value: Some(v) } => float64_text(f64::from(*v)),
        Scalar::Float64 { value: Some(v) } => float64_text(*v),
        Scalar::Decimal128 {
            scale,
            value: Some(v),
            ..
        } => decimal_text(*v, *scale),
        Scalar::Utf8 { value: Some(v) } => v.clone(),
        Scalar::Date { value: Some(v) } => v.format("%Y-%m-%d").to_string(),
        Scalar::Timestamp { value: Some(v) } => v.to_rfc3339_opts(SecondsFormat::Nanos, true),
        _ => return CanonicalValue::null(),
    };
    CanonicalValue::new(ValueTag::for_type(&value.scalar_type()), text)
}

fn float64_text(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let sign = if v > 0.0 { "" } else { "-" };
        format!("{sign}inf")
    } else if v == 0.0 {
        // folds -0.0
        "0".to_string()
    } else {
        // Display is the shortest round-trip form and never uses exponents.
        v.to_string()
    }
}

/// Decimal text with trailing fractional zeros removed.
fn decimal_text(value: i128, scale: i8) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let digits = value.unsigned_abs().to_string();
    let mut text = if scale <= 0 {
        let zeros = usize::from(scale.unsigned_abs());
        format!("{digits}{}", "0".repeat(zeros))
    } else {
        let scale = usize::from(scale.unsigned_abs());
        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            int_part.to_string()
        } else {
            format!("{int_part}.{frac_part}")
        }
    };
    if value < 0 {
        text.insert(0, '-');
    }
    text
}

/// 256-bit digest of a canonicalized row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowDigest([u8; 32]);

impl RowDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for RowDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowDigest({})", hex::encode(self.0))
    }
}

impl fmt::Display for RowDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A column taking part in a comparison, in canonical position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedColumn {
    /// Position in the source dataset's rows.
    pub index: usize,
    pub name: String,
    pub data_type: ScalarType,
}

/// Digest one row over the planned columns, checking each value against its
/// column's declared type.
pub fn digest_row(row: &Row, plan: &[PlannedColumn]) -> Result<RowDigest> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(plan.len() as u64).to_le_bytes());
    for column in plan {
        let value = row.get(column.index).ok_or_else(|| {
            CommonError::malformed_input(format!(
                "row has no value for column `{}` at position {}",
                column.name, column.index
            ))
        })?;
        if !value.conforms_to(&column.data_type) {
            return Err(CommonError::type_error(format!(
                "column `{}` is declared {} but holds a {} value",
                column.name,
                column.data_type,
                value.scalar_type()
            )));
        }
        let canonical = canonicalize(value);
        hasher.update(&[canonical.tag as u8]);
        hasher.update(&(canonical.text.len() as u64).to_le_bytes());
        hasher.update(canonical.text.as_bytes());
    }
    Ok(RowDigest(*hasher.finalize().as_bytes()))
}
