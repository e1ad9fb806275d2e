//! Order-insensitive table equality.
//!
//! Both datasets are validated, their columns reconciled under the configured
//! [`ComparisonPolicy`], every row reduced to a [`RowDigest`] and the two digest
//! sequences sorted and compared. Inputs are never modified.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Display;

use qparity_common::error::{CommonError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::canonical::{PlannedColumn, RowDigest, digest_row};
use super::policy::ComparisonPolicy;
use crate::dataset::Dataset;
use crate::types::Schema;

/// Row count at which digesting and sorting move onto the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 16_384;

/// Configuration for table comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorConfig {
    /// Column reconciliation policy.
    pub policy: ComparisonPolicy,
    /// Datasets with at least this many rows are digested in parallel.
    pub parallel_threshold: usize,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            policy: ComparisonPolicy::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Builder for creating comparators.
pub struct ComparatorBuilder {
    config: ComparatorConfig,
}

impl ComparatorBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: ComparatorConfig::default(),
        }
    }

    /// Set the column reconciliation policy.
    pub fn policy(mut self, policy: ComparisonPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Set the row count at which work moves onto the rayon pool.
    pub fn parallel_threshold(mut self, rows: usize) -> Self {
        self.config.parallel_threshold = rows;
        self
    }

    pub fn build(self) -> TableComparator {
        TableComparator::new(self.config)
    }
}

impl Default for ComparatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Why two datasets were judged equal or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Outcome {
    Equal,
    /// Column names differ; each list holds the names missing from the other side.
    ColumnMismatch {
        left_only: Vec<String>,
        right_only: Vec<String>,
    },
    /// Same column names in a different order, under [`ComparisonPolicy::Strict`].
    ColumnOrderMismatch,
    /// No column is shared and at least one side has rows.
    NoCommonColumns,
    /// Rows differ; counts of rows with no partner on the other side.
    RowMismatch {
        unmatched_left: usize,
        unmatched_right: usize,
    },
}

/// Result of comparing two datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub policy: ComparisonPolicy,
    /// Compared columns in canonical order; empty if columns failed to reconcile.
    pub columns: Vec<String>,
    pub left_rows: usize,
    pub right_rows: usize,
    pub outcome: Outcome,
}

impl ComparisonReport {
    pub fn is_equal(&self) -> bool {
        self.outcome == Outcome::Equal
    }
}

impl Display for ComparisonReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            Outcome::Equal => write!(
                f,
                "equal ({} rows over {} columns, policy {})",
                self.left_rows,
                self.columns.len(),
                self.policy
            ),
            Outcome::ColumnMismatch {
                left_only,
                right_only,
            } => write!(
                f,
                "column sets differ: left only [{}], right only [{}]",
                left_only.join(", "),
                right_only.join(", ")
            ),
            Outcome::ColumnOrderMismatch => write!(f, "column order differs"),
            Outcome::NoCommonColumns => write!(f, "no common columns"),
            Outcome::RowMismatch {
                unmatched_left,
                unmatched_right,
            } => write!(
                f,
                "rows differ: {unmatched_left} of {} left rows and {unmatched_right} of {} right rows unmatched",
                self.left_rows, self.right_rows
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

enum Reconciled {
    Plans(Vec<PlannedColumn>, Vec<PlannedColumn>),
    Rejected(Outcome),
}

/// Decides whether two datasets hold the same multiset of rows.
#[derive(Debug, Clone, Default)]
pub struct TableComparator {
    config: ComparatorConfig,
}

impl TableComparator {
    pub fn new(config: ComparatorConfig) -> Self {
        Self { config }
    }

    pub fn builder() -> ComparatorBuilder {
        ComparatorBuilder::new()
    }

    pub fn with_policy(policy: ComparisonPolicy) -> Self {
        Self::builder().policy(policy).build()
    }

    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    pub fn equals(&self, left: &Dataset, right: &Dataset) -> Result<bool> {
        Ok(self.compare(left, right)?.is_equal())
    }

    /// Compare two datasets and explain the verdict.
    ///
    /// Fails with `MalformedInput` if either dataset has a row whose arity
    /// differs from its schema, and with `TypeError` if a compared value does
    /// not fit its column's declared type.
    pub fn compare(&self, left: &Dataset, right: &Dataset) -> Result<ComparisonReport> {
        let policy = self.config.policy;
        validate(left, Side::Left)?;
        validate(right, Side::Right)?;

        let report = |columns: Vec<String>, outcome: Outcome| ComparisonReport {
            policy,
            columns,
            left_rows: left.num_rows(),
            right_rows: right.num_rows(),
            outcome,
        };

        let (left_plan, right_plan) = match reconcile(left.schema(), right.schema(), policy) {
            Reconciled::Plans(l, r) => (l, r),
            Reconciled::Rejected(outcome) => {
                debug!(%policy, ?outcome, "columns did not reconcile");
                return Ok(report(Vec::new(), outcome));
            }
        };

        // Disjoint column sets under projection: nothing left to compare.
        if left_plan.is_empty() && !(left.schema().is_empty() && right.schema().is_empty()) {
            let outcome = if left.num_rows() == 0 && right.num_rows() == 0 {
                Outcome::Equal
            } else {
                Outcome::NoCommonColumns
            };
            return Ok(report(Vec::new(), outcome));
        }

        let columns: Vec<String> = left_plan.iter().map(|c| c.name.clone()).collect();
        debug!(%policy, ?columns, left_rows = left.num_rows(), right_rows = right.num_rows(), "comparing rows");

        let left_digests = self.sorted_digests(left, &left_plan, Side::Left)?;
        let right_digests = self.sorted_digests(right, &right_plan, Side::Right)?;

        let outcome = if left_digests == right_digests {
            Outcome::Equal
        } else {
            let (unmatched_left, unmatched_right) = count_unmatched(&left_digests, &right_digests);
            Outcome::RowMismatch {
                unmatched_left,
                unmatched_right,
            }
        };
        debug!(?outcome, "row comparison finished");
        Ok(report(columns, outcome))
    }

    fn sorted_digests(
        &self,
        dataset: &Dataset,
        plan: &[PlannedColumn],
        side: Side,
    ) -> Result<Vec<RowDigest>> {
        let rows = dataset.rows();
        let with_side = |e: CommonError| match e {
            CommonError::TypeError { message, source } => CommonError::TypeError {
                message: format!("{side} dataset: {message}"),
                source,
            },
            other => other,
        };

        if rows.len() >= self.config.parallel_threshold {
            let mut digests = rows
                .par_iter()
                .map(|row| digest_row(row, plan))
                .collect::<Result<Vec<_>>>()
                .map_err(with_side)?;
            digests.par_sort_unstable();
            Ok(digests)
        } else {
            let mut digests = rows
                .iter()
                .map(|row| digest_row(row, plan))
                .collect::<Result<Vec<_>>>()
                .map_err(with_side)?;
            digests.sort_unstable();
            Ok(digests)
        }
    }
}

/// Decide whether two datasets hold the same multiset of rows under `policy`.
pub fn equals(left: &Dataset, right: &Dataset, policy: ComparisonPolicy) -> Result<bool> {
    TableComparator::with_policy(policy).equals(left, right)
}

fn validate(dataset: &Dataset, side: Side) -> Result<()> {
    dataset
        .validate()
        .map_err(|e| CommonError::malformed_input(format!("{side} dataset: {}", e.message())))
}

fn plan_for(schema: &Schema, indices: impl IntoIterator<Item = usize>) -> Vec<PlannedColumn> {
    indices
        .into_iter()
        .filter_map(|index| {
            schema.field(index).map(|field| PlannedColumn {
                index,
                name: field.name.clone(),
                data_type: field.data_type,
            })
        })
        .collect()
}

/// Column positions sorted by name; equal names keep their original order.
fn name_sorted_indices(schema: &Schema) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..schema.len()).collect();
    indices.sort_by(|a, b| schema.fields[*a].name.cmp(&schema.fields[*b].name));
    indices
}

/// Name -> positions, positions in schema order.
fn positions_by_name(schema: &Schema) -> BTreeMap<&str, Vec<usize>> {
    let mut positions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, field) in schema.fields.iter().enumerate() {
        positions.entry(field.name.as_str()).or_default().push(index);
    }
    positions
}

/// Names occurring more often on one side than the other, with multiplicity.
fn column_differences(left: &Schema, right: &Schema) -> (Vec<String>, Vec<String>) {
    let left_positions = positions_by_name(left);
    let right_positions = positions_by_name(right);
    let surplus = |this: &BTreeMap<&str, Vec<usize>>, other: &BTreeMap<&str, Vec<usize>>| {
        this.iter()
            .flat_map(|(name, positions)| {
                let other_count = other.get(name).map_or(0, Vec::len);
                std::iter::repeat_n(name.to_string(), positions.len().saturating_sub(other_count))
            })
            .collect::<Vec<_>>()
    };
    (
        surplus(&left_positions, &right_positions),
        surplus(&right_positions, &left_positions),
    )
}

fn reconcile(left: &Schema, right: &Schema, policy: ComparisonPolicy) -> Reconciled {
    if policy.projects_common_columns() {
        let right_positions = positions_by_name(right);
        let mut left_indices = Vec::new();
        let mut right_indices = Vec::new();
        // BTreeMap iteration yields names in ascending order.
        for (name, positions) in positions_by_name(left) {
            if let Some(other) = right_positions.get(name) {
                for (l, r) in positions.iter().zip(other) {
                    left_indices.push(*l);
                    right_indices.push(*r);
                }
            }
        }
        return Reconciled::Plans(plan_for(left, left_indices), plan_for(right, right_indices));
    }

    if !policy.reorders_columns() && left.field_names() == right.field_names() {
        return Reconciled::Plans(
            plan_for(left, 0..left.len()),
            plan_for(right, 0..right.len()),
        );
    }

    let (left_only, right_only) = column_differences(left, right);
    match (left_only.is_empty() && right_only.is_empty(), policy.reorders_columns()) {
        (true, true) => Reconciled::Plans(
            plan_for(left, name_sorted_indices(left)),
            plan_for(right, name_sorted_indices(right)),
        ),
        (true, false) => Reconciled::Rejected(Outcome::ColumnOrderMismatch),
        (false, _) => Reconciled::Rejected(Outcome::ColumnMismatch {
            left_only,
            right_only,
        }),
    }
}

/// Rows on each side with no equal partner on the other, by a merge walk
/// over two sorted digest sequences.
fn count_unmatched(left: &[RowDigest], right: &[RowDigest]) -> (usize, usize) {
    let (mut i, mut j) = (0, 0);
    let (mut unmatched_left, mut unmatched_right) = (0, 0);
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                unmatched_left += 1;
                i += 1;
            }
            Ordering::Greater => {
                unmatched_right += 1;
                j += 1;
            }
        }
    }
    (
        unmatched_left + (left.len() - i),
        unmatched_right + (right.len() - j),
    )
}
