//! Prompt text sent to the completion service.

/// Ask for the query to be checked against a list of common mistakes and
/// rewritten if any are found.
pub fn checker_prompt(query: &str) -> String {
    format!(
        "{query}
Double check the query above for common mistakes, including:
- Using NOT IN with NULL values
- Using UNION when UNION ALL should have been used
- Using BETWEEN for exclusive ranges
- Data type mismatch in predicates
- Properly quoting identifiers
- Using the correct number of arguments for functions
- Casting to the correct data type
- Using the proper columns for joins
If there are any mistakes, rewrite the query. Output the final SQL query only."
    )
}

pub fn optimize_prompt(query: &str) -> String {
    format!("Optimize the following query: {query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_query() {
        let checker = checker_prompt("SELECT a FROM t");
        assert!(checker.starts_with("SELECT a FROM t\n"));
        assert!(checker.contains("UNION ALL"));
        assert!(checker.ends_with("Output the final SQL query only."));

        assert_eq!(
            optimize_prompt("SELECT 1"),
            "Optimize the following query: SELECT 1"
        );
    }
}
