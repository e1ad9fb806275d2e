//! Demonstration of comparing an original query with a rewritten one
//!
//! An in-memory table is registered with DataFusion, a canned completion
//! service plays the model, and the rewritten query is checked for identical
//! results under each comparison policy.

use std::sync::Arc;

use async_trait::async_trait;
use datafusion::arrow::array::{Float64Array, Int64Array, StringArray};
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use qparity_common::Result;
use qparity_core::{
    CompletionService, ComparisonPolicy, DataFusionExecutor, QueryAdvisor, QueryComparer,
    TableComparator,
};

/// Always suggests the same rewrite.
struct CannedModel;

#[async_trait]
impl CompletionService for CannedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if prompt.starts_with("Optimize") {
            Ok("Here is the optimized query:\n```sql\n\
                SELECT region, id, amount FROM orders WHERE amount >= 100.0\n```"
                .to_string())
        } else {
            Ok("```sql\nSELECT id, region, amount FROM orders WHERE amount >= 100\n```".to_string())
        }
    }
}

fn orders() -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("region", DataType::Utf8, true),
        Field::new("amount", DataType::Float64, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])),
            Arc::new(StringArray::from(vec![
                Some("emea"),
                Some("apac"),
                None,
                Some("emea"),
                Some("amer"),
            ])),
            Arc::new(Float64Array::from(vec![250.0, 99.5, 100.0, 410.25, 12.0])),
        ],
    )
    .map_err(|e| qparity_common::CommonError::conversion_error_with_source("bad demo batch", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== qparity: Query Comparison Demo ===\n");

    let original = "SELECT id, region, amount FROM orders WHERE amount >= 100";

    println!("1. Asking the model for advice:");
    let advisor = QueryAdvisor::new(CannedModel);
    let advice = advisor.advise(original).await?;
    println!("   Original:  {}", advice.original);
    println!("   Checked:   {}", advice.checked);
    println!("   Optimized: {}", advice.optimized);

    println!("\n2. Running both queries:");
    let executor = Arc::new(DataFusionExecutor::new());
    executor.register_batch("orders", orders()?)?;

    for policy in ComparisonPolicy::ALL {
        let comparer = QueryComparer::new(executor.clone())
            .with_comparator(TableComparator::with_policy(policy));
        let comparison = comparer.compare(&advice.original, &advice.optimized).await?;
        println!(
            "   {policy:<22} match={:<5} {} ({:?} vs {:?})",
            comparison.results_match,
            comparison.report,
            comparison.original.elapsed,
            comparison.optimized.elapsed
        );
    }

    println!("\n=== Demo completed ===");
    Ok(())
}
