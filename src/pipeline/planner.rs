//! Blueprint planning: one model call over the dataset sample

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{PipelineError, PipelineResult};
use super::extract::extract_queries;
use super::state::RunState;
use crate::dataset::Sample;
use crate::llm::LlmClient;
use crate::prompt::{PromptTemplate, blueprint_prompt};

/// Ordered SQL statements proposed by the planner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuerySet(Vec<String>);

impl QuerySet {
    pub fn new(statements: Vec<String>) -> Self {
        Self(statements)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for QuerySet {
    fn from(statements: Vec<String>) -> Self {
        Self(statements)
    }
}

impl<'a> IntoIterator for &'a QuerySet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Planner output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Response text with the SQL blocks removed
    pub blueprint: String,
    pub queries: QuerySet,
}

impl Plan {
    /// Parse a raw planning response
    pub fn parse(response: &str) -> Self {
        let (blueprint, statements) = extract_queries(response);
        Self {
            blueprint,
            queries: QuerySet::new(statements),
        }
    }
}

/// Asks the model for an analysis blueprint and the queries behind it
pub struct BlueprintPlanner<'a> {
    client: &'a dyn LlmClient,
    template: &'a PromptTemplate,
}

impl<'a> BlueprintPlanner<'a> {
    pub fn new(client: &'a dyn LlmClient, template: &'a PromptTemplate) -> Self {
        Self { client, template }
    }

    /// Brief the model with the sample and parse its answer
    ///
    /// A response without SQL blocks gives an empty query set, not an error.
    pub async fn plan(&self, sample: &Sample) -> PipelineResult<Plan> {
        let prompt = blueprint_prompt(self.template, sample)?;
        debug!(
            template = %self.template.name,
            template_version = %self.template.version,
            prompt_chars = prompt.len(),
            "Requesting blueprint"
        );

        let response = self
            .client
            .complete(&prompt, None)
            .await
            .map_err(|e| PipelineError::transport(RunState::Planning, e))?;

        let plan = Plan::parse(&response);
        if plan.queries.is_empty() {
            warn!("Planner response contained no SQL statements");
        }
        info!(
            queries = plan.queries.len(),
            blueprint_chars = plan.blueprint.len(),
            "Blueprint received"
        );

        Ok(plan)
    }
}
