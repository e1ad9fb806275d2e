//! Textual SQL rewrites.
//!
//! These operate on SQL text, not on a parsed query.

use std::sync::LazyLock;

use qparity_common::error::{CommonError, Result};
use regex::{Captures, Regex};

static TAG_VALUE_PREDICATE: LazyLock<Regex> = LazyLock::new(|| {
    equality_pattern("tag_value").expect("tag_value predicate pattern is valid")
});

fn equality_pattern(column: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(
        r#"(?i)(\b{}\s*=\s*)(['"]?)(\w+)(['"]?)"#,
        regex::escape(column)
    ))
}

fn widen(pattern: &Regex, sql: &str) -> String {
    pattern
        .replace_all(sql, |caps: &Captures| {
            format!("{}{}%{}%{}", &caps[1], &caps[2], &caps[3], &caps[4])
        })
        .into_owned()
}

/// Turn `column = value` predicates into `column = '%value%'`-style wildcards.
///
/// The column name matches case-insensitively with any spacing around `=`.
/// Quotes around the value are kept and the `%` markers go inside them; an
/// unquoted value stays unquoted.
pub fn widen_equality_predicate(sql: &str, column: &str) -> Result<String> {
    if column.trim().is_empty() {
        return Err(CommonError::configuration_error(
            "column name for predicate rewrite is empty",
        ));
    }
    let pattern = equality_pattern(column).map_err(|e| {
        CommonError::configuration_error(format!("cannot match column `{column}`: {e}"))
    })?;
    Ok(widen(&pattern, sql))
}

/// [`widen_equality_predicate`] for the `tag_value` column.
pub fn widen_tag_value_predicate(sql: &str) -> String {
    widen(&TAG_VALUE_PREDICATE, sql)
}

/// Remove every single quote.
pub fn strip_single_quotes(sql: &str) -> String {
    sql.replace('\'', "")
}

/// Escape text for embedding inside a single-quoted SQL literal.
pub fn escape_sql_literal(text: &str) -> String {
    text.replace('\'', "''")
}
