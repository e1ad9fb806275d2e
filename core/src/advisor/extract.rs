//! Pulling code out of free-form model responses.

use std::sync::LazyLock;

use regex::Regex;

const FENCE: &str = "```";

static TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:optimise|optimized|optimisation|optimization)\b")
        .expect("trigger pattern is valid")
});

/// Extract the SQL that follows an "optimized"-style phrase in a response.
///
/// Same as [`extract_code_with_language`] with `sql` as the preferred fence tag.
pub fn extract_code(text: &str) -> Option<String> {
    extract_code_with_language(text, "sql")
}

/// Extract code following the first trigger word (`optimise`, `optimized`,
/// `optimisation` or `optimization`, matched case-insensitively as whole
/// words).
///
/// Returns `None` when no trigger word is present. After the trigger, the
/// first fence tagged with `language` wins, then the first plain fence; an
/// unclosed fence runs to the end of the text. With no fence after
/// the trigger the whole input is returned.
pub fn extract_code_with_language(text: &str, language: &str) -> Option<String> {
    let trigger = TRIGGER.find(text)?;
    let after = &text[trigger.end()..];

    let tagged = format!("{FENCE}{language}");
    if let Some(start) = after.find(&tagged) {
        return Some(fenced_body(&after[start + tagged.len()..]).trim().to_string());
    }
    if let Some(start) = after.find(FENCE) {
        let body = fenced_body(&after[start + FENCE.len()..]);
        return Some(strip_language_tag(body).trim().to_string());
    }
    Some(text.to_string())
}

/// The first fenced block anywhere in `text`, without its language tag.
pub fn first_fenced_block(text: &str) -> Option<String> {
    let start = text.find(FENCE)? + FENCE.len();
    let body = fenced_body(&text[start..]);
    Some(strip_language_tag(body).trim().to_string())
}

/// Body of a fence whose opening marker has been consumed.
fn fenced_body(rest: &str) -> &str {
    match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

fn strip_language_tag(body: &str) -> &str {
    match body.split_once('\n') {
        Some((tag, code)) if is_language_tag(tag.trim()) => code,
        _ => body,
    }
}

fn is_language_tag(tag: &str) -> bool {
    tag.len() <= 16
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_trigger_word() {
        assert_eq!(extract_code("```sql\nSELECT 1\n```"), None);
        // only whole words count
        assert_eq!(extract_code("the optimizedness of ```sql SELECT 1```"), None);
    }

    #[test]
    fn test_prefers_tagged_fence() {
        let response = "Here is the OPTIMIZED query:\n```text\nnotes\n```\n```sql\nSELECT a FROM t\n```";
        assert_eq!(extract_code(response).unwrap(), "SELECT a FROM t");
    }

    #[test]
    fn test_unclosed_tagged_fence_runs_to_end() {
        let response = "Optimisation:\n```sql\nSELECT a\nFROM t\n";
        assert_eq!(extract_code(response).unwrap(), "SELECT a\nFROM t");
    }

    #[test]
    fn test_generic_fence() {
        let response = "After optimization:\n```\nSELECT b FROM t\n```\ntrailing";
        assert_eq!(extract_code(response).unwrap(), "SELECT b FROM t");

        let unclosed = "optimise this ```\nSELECT c FROM t";
        assert_eq!(extract_code(unclosed).unwrap(), "SELECT c FROM t");
    }

    #[test]
    fn test_fence_before_trigger_is_ignored() {
        let response = "```sql\nSELECT old\n```\nOptimized version follows.";
        assert_eq!(extract_code(response).unwrap(), response);
    }

    #[test]
    fn test_preferred_language() {
        let response = "optimized:\n```python\nprint(1)\n```";
        assert_eq!(
            extract_code_with_language(response, "python").unwrap(),
            "print(1)"
        );
    }

    #[test]
    fn test_first_fenced_block() {
        assert_eq!(
            first_fenced_block("text\n```sql\nSELECT 1\n```\n```sql\nSELECT 2\n```").unwrap(),
            "SELECT 1"
        );
        assert_eq!(
            first_fenced_block("```SELECT * FROM t\nWHERE x = 1```").unwrap(),
            "SELECT * FROM t\nWHERE x = 1"
        );
        assert_eq!(first_fenced_block("no fences here"), None);
    }
}
