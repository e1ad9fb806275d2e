//! Query advisor pipeline.
//!
//! A query is sent to a completion service to be checked and then optimized,
//! after which both the original and the optimized query are run and their
//! results compared with [`crate::compare::TableComparator`].

pub mod executor;
pub mod extract;
pub mod prompt;
pub mod rewrite;
pub mod service;
pub mod workflow;

pub use executor::DataFusionExecutor;
pub use extract::{extract_code, extract_code_with_language, first_fenced_block};
pub use rewrite::{
    escape_sql_literal, strip_single_quotes, widen_equality_predicate, widen_tag_value_predicate,
};
pub use service::{CompletionService, CortexCompletion, DEFAULT_CORTEX_MODEL, QueryExecutor};
pub use workflow::{
    Advice, AdvisorBuilder, AdvisorConfig, Performance, QueryAdvisor, QueryComparer,
    QueryComparison, QueryRun,
};
