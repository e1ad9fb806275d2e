//! Collaborator traits for query execution and text completion.

use std::sync::Arc;

use async_trait::async_trait;
use qparity_common::error::{CommonError, Result};
use tracing::{debug, info};

use super::rewrite::escape_sql_literal;
use crate::dataset::Dataset;
use crate::scalar::Scalar;

/// Runs SQL and returns its full result.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Dataset>;
}

#[async_trait]
impl<T: QueryExecutor + ?Sized> QueryExecutor for Arc<T> {
    async fn execute(&self, sql: &str) -> Result<Dataset> {
        (**self).execute(sql).await
    }
}

/// Maps a prompt to a model response.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T: CompletionService + ?Sized> CompletionService for Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt).await
    }
}

pub const DEFAULT_CORTEX_MODEL: &str = "snowflake-arctic";

/// Completion served by the warehouse itself through `SNOWFLAKE.CORTEX.COMPLETE`.
///
/// The prompt is embedded as a string literal in a single-row query; the
/// response is the first cell of that row.
pub struct CortexCompletion<E> {
    executor: E,
    model: String,
}

impl<E: QueryExecutor> CortexCompletion<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            model: DEFAULT_CORTEX_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The SQL text issued for a prompt.
    pub fn completion_sql(&self, prompt: &str) -> String {
        format!(
            "SELECT SNOWFLAKE.CORTEX.COMPLETE('{}', '{}')",
            escape_sql_literal(&self.model),
            escape_sql_literal(prompt)
        )
    }
}

#[async_trait]
impl<E: QueryExecutor> CompletionService for CortexCompletion<E> {
    async fn complete(&self, prompt: &str) -> Result<String> {
        info!(model = %self.model, prompt_len = prompt.len(), "requesting completion");
        let sql = self.completion_sql(prompt);
        let dataset = self
            .executor
            .execute(&sql)
            .await
            .map_err(|e| CommonError::completion_error_with_source("completion query failed", e))?;

        match dataset.rows().first().and_then(|row| row.first()) {
            Some(Scalar::Utf8 { value: Some(text) }) => {
                debug!(response_len = text.len(), "completion received");
                Ok(text.clone())
            }
            Some(other) if other.is_null() => Err(CommonError::completion_error(
                "completion returned a null response",
            )),
            Some(other) => Err(CommonError::completion_error(format!(
                "completion returned a {} value instead of text",
                other.scalar_type()
            ))),
            None => Err(CommonError::completion_error(
                "completion query returned no rows",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, ScalarType, Schema};
    use std::sync::Mutex;

    struct ScriptedExecutor {
        reply: Dataset,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        fn replying(values: Vec<Scalar>, data_type: ScalarType) -> Self {
            let schema = Schema::new(vec![Field::new("response", data_type, true)]);
            let rows = values.into_iter().map(|v| vec![v]).collect();
            Self {
                reply: Dataset::new(schema, rows),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QueryExecutor for ScriptedExecutor {
        async fn execute(&self, sql: &str) -> Result<Dataset> {
            self.seen.lock().unwrap().push(sql.to_string());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_completion_sql_escapes_quotes() {
        let cortex = CortexCompletion::new(ScriptedExecutor::replying(vec![], ScalarType::Utf8));
        assert_eq!(
            cortex.completion_sql("it's fine"),
            "SELECT SNOWFLAKE.CORTEX.COMPLETE('snowflake-arctic', 'it''s fine')"
        );
        let cortex = cortex.with_model("mistral-large");
        assert_eq!(cortex.model(), "mistral-large");
    }

    #[tokio::test]
    async fn test_complete_reads_first_cell() {
        let executor = Arc::new(ScriptedExecutor::replying(
            vec![Scalar::from("SELECT 1"), Scalar::from("ignored")],
            ScalarType::Utf8,
        ));
        let cortex = CortexCompletion::new(executor.clone());
        let response = cortex.complete("Optimize the following query: x").await.unwrap();
        assert_eq!(response, "SELECT 1");

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("'Optimize the following query: x'"));
    }

    #[tokio::test]
    async fn test_complete_rejects_non_text() {
        let empty = CortexCompletion::new(ScriptedExecutor::replying(vec![], ScalarType::Utf8));
        assert!(matches!(
            empty.complete("p").await,
            Err(CommonError::CompletionError { .. })
        ));

        let null = CortexCompletion::new(ScriptedExecutor::replying(
            vec![Scalar::null_of(&ScalarType::Utf8)],
            ScalarType::Utf8,
        ));
        assert!(matches!(
            null.complete("p").await,
            Err(CommonError::CompletionError { .. })
        ));

        let number = CortexCompletion::new(ScriptedExecutor::replying(
            vec![Scalar::from(7i64)],
            ScalarType::Int64,
        ));
        let err = number.complete("p").await.unwrap_err();
        assert!(err.to_string().contains("int64"));
    }
}
