//! Order-insensitive comparison of query results.
//!
//! Two datasets are equal when they hold the same multiset of rows once their
//! columns are reconciled under a [`ComparisonPolicy`]. Row order never matters;
//! column order matters only under [`ComparisonPolicy::Strict`].

pub mod canonical;
pub mod comparator;
pub mod policy;

pub use canonical::{CanonicalValue, RowDigest, ValueTag, canonicalize};
pub use comparator::{
    ComparatorBuilder, ComparatorConfig, ComparisonReport, DEFAULT_PARALLEL_THRESHOLD, Outcome,
    TableComparator, equals,
};
pub use policy::ComparisonPolicy;
