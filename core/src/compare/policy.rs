//! Column reconciliation policies.

use std::fmt::Display;
use std::str::FromStr;

use qparity_common::error::CommonError;
use serde::{Deserialize, Serialize};

/// How column sets and column order are reconciled before rows are compared.
///
/// Row order is ignored under every policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPolicy {
    /// Columns must match by name and position.
    Strict,
    /// Columns must match by name in any order.
    ColumnSorted,
    /// Columns must match by name in any order. Same verdicts as `ColumnSorted`;
    /// kept as a selector because callers spell both.
    #[default]
    RowAndColumnSorted,
    /// Only columns present on both sides are compared.
    CommonColumnsOnly,
}

impl ComparisonPolicy {
    pub const ALL: [ComparisonPolicy; 4] = [
        ComparisonPolicy::Strict,
        ComparisonPolicy::ColumnSorted,
        ComparisonPolicy::RowAndColumnSorted,
        ComparisonPolicy::CommonColumnsOnly,
    ];

    /// Whether columns are put into name order before comparing.
    pub fn reorders_columns(&self) -> bool {
        !matches!(self, ComparisonPolicy::Strict)
    }

    /// Whether columns present on only one side are dropped instead of failing the match.
    pub fn projects_common_columns(&self) -> bool {
        matches!(self, ComparisonPolicy::CommonColumnsOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonPolicy::Strict => "strict",
            ComparisonPolicy::ColumnSorted => "column_sorted",
            ComparisonPolicy::RowAndColumnSorted => "row_and_column_sorted",
            ComparisonPolicy::CommonColumnsOnly => "common_columns_only",
        }
    }
}

impl Display for ComparisonPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ComparisonPolicy {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ComparisonPolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == normalized)
            .ok_or_else(|| {
                CommonError::configuration_error(format!("unknown comparison policy: {s}"))
            })
    }
}
