//! Check, optimize and verify a query.

use std::fmt::Display;
use std::time::{Duration, Instant};

use qparity_common::error::{CommonError, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::extract::{extract_code_with_language, first_fenced_block};
use super::prompt::{checker_prompt, optimize_prompt};
use super::rewrite::strip_single_quotes;
use super::service::{CompletionService, QueryExecutor};
use crate::compare::{ComparisonReport, TableComparator};
use crate::dataset::Dataset;

/// Configuration for the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Fence tag preferred when pulling code out of a response.
    pub preferred_language: String,
    /// Whether responses are reduced to the code they contain.
    pub extract_code: bool,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            preferred_language: "sql".to_string(),
            extract_code: true,
        }
    }
}

/// Builder for creating advisors.
pub struct AdvisorBuilder {
    config: AdvisorConfig,
}

impl AdvisorBuilder {
    pub fn new() -> Self {
        Self {
            config: AdvisorConfig::default(),
        }
    }

    pub fn preferred_language(mut self, language: impl Into<String>) -> Self {
        self.config.preferred_language = language.into();
        self
    }

    pub fn extract_code(mut self, enabled: bool) -> Self {
        self.config.extract_code = enabled;
        self
    }

    pub fn build<C: CompletionService>(self, completion: C) -> QueryAdvisor<C> {
        QueryAdvisor::with_config(completion, self.config)
    }
}

impl Default for AdvisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of a full advisor pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub original: String,
    pub checked: String,
    pub optimized: String,
}

/// Sends queries through a completion service for checking and optimization.
pub struct QueryAdvisor<C> {
    completion: C,
    config: AdvisorConfig,
}

impl<C: CompletionService> QueryAdvisor<C> {
    pub fn new(completion: C) -> Self {
        Self::with_config(completion, AdvisorConfig::default())
    }

    pub fn with_config(completion: C, config: AdvisorConfig) -> Self {
        Self { completion, config }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Ask for the query to be checked for common mistakes.
    pub async fn check(&self, query: &str) -> Result<String> {
        let query = non_empty(query)?;
        info!("checking query for common mistakes");
        let response = self.completion.complete(&checker_prompt(query)).await?;
        self.reduce_response(&response)
    }

    /// Ask for an optimized version of the query.
    pub async fn optimize(&self, query: &str) -> Result<String> {
        let query = non_empty(query)?;
        info!("optimizing query");
        let response = self.completion.complete(&optimize_prompt(query)).await?;
        self.reduce_response(&response)
    }

    /// Check the query, then optimize the checked version.
    pub async fn advise(&self, query: &str) -> Result<Advice> {
        let checked = self.check(query).await?;
        let optimized = self.optimize(&checked).await?;
        Ok(Advice {
            original: query.trim().to_string(),
            checked,
            optimized,
        })
    }

    fn reduce_response(&self, response: &str) -> Result<String> {
        let reduced = if self.config.extract_code {
            extract_code_with_language(response, &self.config.preferred_language)
                .or_else(|| first_fenced_block(response))
                .map(|code| code.trim().to_string())
                .unwrap_or_else(|| response.trim().to_string())
        } else {
            response.trim().to_string()
        };
        if reduced.is_empty() {
            return Err(CommonError::completion_error(
                "completion returned an empty response",
            ));
        }
        Ok(reduced)
    }
}

fn non_empty(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CommonError::malformed_input("query text is empty"));
    }
    Ok(query)
}

/// A query's result and how long it took to produce.
#[derive(Debug, Clone)]
pub struct QueryRun {
    pub sql: String,
    pub dataset: Dataset,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    /// The optimized query took strictly less time.
    Faster,
    NoImprovement,
}

impl Performance {
    pub fn assess(original: Duration, optimized: Duration) -> Self {
        if optimized < original {
            Performance::Faster
        } else {
            Performance::NoImprovement
        }
    }
}

impl Display for Performance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Performance::Faster => write!(f, "the optimized query is faster"),
            Performance::NoImprovement => {
                write!(f, "the optimized query is slower or has no improvement")
            }
        }
    }
}

/// Outcome of running an original query against its optimized version.
#[derive(Debug, Clone)]
pub struct QueryComparison {
    pub original: QueryRun,
    pub optimized: QueryRun,
    pub results_match: bool,
    pub report: ComparisonReport,
    pub performance: Performance,
}

/// Runs two queries and compares their results and timings.
pub struct QueryComparer<E> {
    executor: E,
    comparator: TableComparator,
    strip_quotes: bool,
}

impl<E: QueryExecutor> QueryComparer<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            comparator: TableComparator::default(),
            strip_quotes: false,
        }
    }

    pub fn with_comparator(mut self, comparator: TableComparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Remove single quotes from the optimized query before running it.
    pub fn strip_single_quotes(mut self, enabled: bool) -> Self {
        self.strip_quotes = enabled;
        self
    }

    pub fn comparator(&self) -> &TableComparator {
        &self.comparator
    }

    pub async fn run_timed(&self, sql: &str) -> Result<QueryRun> {
        let start = Instant::now();
        let dataset = self.executor.execute(sql).await?;
        let elapsed = start.elapsed();
        info!(
            rows = dataset.num_rows(),
            elapsed_ms = elapsed.as_millis() as u64,
            "query finished"
        );
        Ok(QueryRun {
            sql: sql.to_string(),
            dataset,
            elapsed,
        })
    }

    pub async fn compare(&self, original: &str, optimized: &str) -> Result<QueryComparison> {
        let optimized = if self.strip_quotes {
            strip_single_quotes(optimized)
        } else {
            optimized.to_string()
        };

        let original = self.run_timed(original).await?;
        let optimized = self.run_timed(&optimized).await?;
        let report = self
            .comparator
            .compare(&original.dataset, &optimized.dataset)?;
        let results_match = report.is_equal();
        if !results_match {
            warn!(%report, "optimized query returned different results");
        }
        let performance = Performance::assess(original.elapsed, optimized.elapsed);
        info!(%performance, results_match, "query comparison finished");

        Ok(QueryComparison {
            original,
            optimized,
            results_match,
            report,
            performance,
        })
    }
}
