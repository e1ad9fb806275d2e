//! qparity core - order-insensitive result comparison for SQL queries
//!
//! This crate decides whether two query results hold the same rows regardless
//! of row order and column order, and drives the check/optimize/compare
//! pipeline that uses that verdict to judge rewritten queries.

pub mod advisor;
pub mod batch;
pub mod compare;
pub mod dataset;
pub mod scalar;
pub mod types;

pub use advisor::{
    Advice, AdvisorBuilder, AdvisorConfig, CompletionService, CortexCompletion, DataFusionExecutor,
    Performance, QueryAdvisor, QueryComparer, QueryComparison, QueryExecutor, QueryRun,
};
pub use batch::{dataset_from_batches, schema_from_arrow};
pub use compare::{
    ComparatorBuilder, ComparatorConfig, ComparisonPolicy, ComparisonReport, Outcome,
    TableComparator, equals,
};
pub use dataset::{Dataset, Row};
pub use scalar::Scalar;
pub use types::{Field, FieldRef, Fields, ScalarType, Schema};
