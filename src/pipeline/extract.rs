//! Lenient parsing of model output
//!
//! Nothing here fails: a response without the expected markup still yields a
//! usable result.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::store::split_statements;

static SQL_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```sql\b\s*([\s\S]*?)```").unwrap());

static HTML_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```html\b\s*([\s\S]*?)```").unwrap());

static DOCUMENT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!DOCTYPE html[\s\S]*</html>").unwrap());

/// How the report document was found in the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// Contents of a ```html fenced block
    Fenced,
    /// Span from `<!DOCTYPE html` through the last `</html>`
    DocumentSpan,
    /// The whole response, trimmed
    Verbatim,
}

impl Extraction {
    pub fn name(&self) -> &'static str {
        match self {
            Extraction::Fenced => "fenced",
            Extraction::DocumentSpan => "document-span",
            Extraction::Verbatim => "verbatim",
        }
    }
}

/// Split a planning response into blueprint text and statements
///
/// Statements come from every ```sql block in order. The blueprint is the
/// response with those blocks removed.
///
/// The tag must be exactly `sql` (any case). Fences such as ```sqlite or
/// ```sql2 are left in the blueprint and contribute no statements, since their
/// dialect may not be what the store runs.
pub fn extract_queries(response: &str) -> (String, Vec<String>) {
    let statements = SQL_FENCE
        .captures_iter(response)
        .filter_map(|caps| caps.get(1))
        .flat_map(|block| split_statements(block.as_str()))
        .collect();

    let blueprint = SQL_FENCE.replace_all(response, "").trim().to_string();

    (blueprint, statements)
}

/// Pull the report document out of a synthesis response
pub fn extract_document(response: &str) -> (String, Extraction) {
    if let Some(body) = HTML_FENCE.captures(response).and_then(|caps| caps.get(1)) {
        return (body.as_str().trim().to_string(), Extraction::Fenced);
    }

    if let Some(span) = DOCUMENT_SPAN.find(response) {
        return (span.as_str().to_string(), Extraction::DocumentSpan);
    }

    (response.trim().to_string(), Extraction::Verbatim)
}
