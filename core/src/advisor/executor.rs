//! Local query execution on DataFusion.

use async_trait::async_trait;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::execution::context::SessionContext;
use qparity_common::error::{ErrorContext, Result};
use tracing::debug;

use super::service::QueryExecutor;
use crate::batch::dataset_from_batches;
use crate::dataset::Dataset;

/// [`QueryExecutor`] backed by an in-process DataFusion session.
pub struct DataFusionExecutor {
    context: SessionContext,
}

impl DataFusionExecutor {
    pub fn new() -> Self {
        Self::with_context(SessionContext::new())
    }

    pub fn with_context(context: SessionContext) -> Self {
        Self { context }
    }

    /// Get the underlying DataFusion session context
    pub fn session_context(&self) -> &SessionContext {
        &self.context
    }

    /// Register a record batch as an in-memory table.
    pub fn register_batch(&self, name: &str, batch: RecordBatch) -> Result<()> {
        self.context
            .register_batch(name, batch)
            .with_execution_context(|| format!("failed to register table `{name}`"))?;
        Ok(())
    }
}

impl Default for DataFusionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryExecutor for DataFusionExecutor {
    async fn execute(&self, sql: &str) -> Result<Dataset> {
        debug!(sql, "executing query");
        let df = self
            .context
            .sql(sql)
            .await
            .with_execution_context(|| format!("failed to plan query: {sql}"))?;
        let schema = df.schema().inner().clone();
        let batches = df
            .collect()
            .await
            .with_execution_context(|| format!("failed to execute query: {sql}"))?;
        dataset_from_batches(&schema, &batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::Scalar;
    use datafusion::arrow::array::{Int64Array, StringArray};
    use datafusion::arrow::datatypes::{DataType, Field, Schema};
    use qparity_common::error::CommonError;
    use std::sync::Arc;

    fn orders() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("region", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec![Some("emea"), Some("apac"), None])),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_execute_registered_table() {
        let executor = DataFusionExecutor::new();
        executor.register_batch("orders", orders()).unwrap();

        let dataset = executor
            .execute("SELECT id, region FROM orders WHERE id > 1 ORDER BY id")
            .await
            .unwrap();
        assert_eq!(dataset.column_names(), vec!["id", "region"]);
        assert_eq!(dataset.num_rows(), 2);
        assert_eq!(dataset.rows()[0][0], Scalar::from(2i64));
        assert!(dataset.rows()[1][1].is_null());
    }

    #[tokio::test]
    async fn test_execution_errors_are_wrapped() {
        let executor = DataFusionExecutor::default();
        let err = executor.execute("SELECT * FROM missing").await.unwrap_err();
        assert!(matches!(err, CommonError::ExecutionError { .. }));
        assert!(err.to_string().contains("missing"));
    }
}
