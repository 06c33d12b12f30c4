//! Report synthesis: one model call over the blueprint and query results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{PipelineError, PipelineResult};
use super::extract::{Extraction, extract_document};
use super::query::{QueryOutcome, QueryResult};
use super::state::RunState;
use crate::llm::LlmClient;
use crate::prompt::{PromptTemplate, REPORT_SYSTEM_INSTRUCTION, report_prompt};

/// Line sent in place of results when the planner proposed no queries
pub const NO_QUERIES_LINE: &str = "(No queries were run against the dataset.)";

/// The finished report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    html: String,
    extraction: Extraction,
    queries_run: usize,
    queries_failed: usize,
    generated_at: DateTime<Utc>,
}

impl Report {
    /// The self-contained HTML document
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    /// How the document was found in the model response
    pub fn extraction(&self) -> Extraction {
        self.extraction
    }

    pub fn queries_run(&self) -> usize {
        self.queries_run
    }

    pub fn queries_failed(&self) -> usize {
        self.queries_failed
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

/// Render query results as the text block shown to the model
///
/// Each entry is headed `-- Query N: <statement>` and followed by the rows as
/// pretty JSON or by `ERROR: <message>`.
pub fn render_results(results: &[QueryResult]) -> String {
    if results.is_empty() {
        return NO_QUERIES_LINE.to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let body = match &result.outcome {
                QueryOutcome::Rows(output) => output.to_json_pretty(),
                QueryOutcome::Error { message } => format!("ERROR: {message}"),
            };
            format!("-- Query {}: {}\n{}", i + 1, result.statement, body)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Asks the model to turn the blueprint and results into one HTML document
pub struct ReportSynthesizer<'a> {
    client: &'a dyn LlmClient,
    template: &'a PromptTemplate,
}

impl<'a> ReportSynthesizer<'a> {
    pub fn new(client: &'a dyn LlmClient, template: &'a PromptTemplate) -> Self {
        Self { client, template }
    }

    pub async fn synthesize(&self, blueprint: &str, results: &[QueryResult]) -> PipelineResult<Report> {
        let prompt = report_prompt(self.template, blueprint, &render_results(results));
        debug!(
            template = %self.template.name,
            template_version = %self.template.version,
            prompt_chars = prompt.len(),
            "Requesting report"
        );

        let response = self
            .client
            .complete(&prompt, Some(REPORT_SYSTEM_INSTRUCTION))
            .await
            .map_err(|e| PipelineError::transport(RunState::Synthesizing, e))?;

        let (html, extraction) = extract_document(&response);
        if extraction == Extraction::Verbatim {
            warn!("Report response had no fenced block or document span, using it verbatim");
        }
        info!(
            extraction = extraction.name(),
            html_chars = html.len(),
            "Report received"
        );

        Ok(Report {
            html,
            extraction,
            queries_run: results.len(),
            queries_failed: results.iter().filter(|r| !r.is_ok()).count(),
            generated_at: Utc::now(),
        })
    }
}
