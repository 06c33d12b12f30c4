//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use tabular_report::Dataset;
use tabular_report::llm::{LlmClient, LlmError, LlmResult};

/// LLM client answering from a script and recording every request
pub struct ScriptedClient {
    replies: Mutex<VecDeque<LlmResult<String>>>,
    calls: Mutex<Vec<Call>>,
    gate: Option<Arc<Semaphore>>,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub prompt: String,
    pub system: Option<String>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<LlmResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    /// Every call consumes one gate permit before answering
    pub fn gated(replies: Vec<LlmResult<String>>, gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            gate: Some(gate),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> LlmResult<String> {
        self.calls.lock().unwrap().push(Call {
            prompt: prompt.to_string(),
            system: system.map(str::to_string),
        });

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".to_string())))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn is_ready(&self) -> bool {
        true
    }
}

/// 23 rows of id,name,amount,date
pub fn sales_dataset() -> Arc<Dataset> {
    let names = ["ada", "bob", "cy", "dee", "eve"];
    let rows = (1..=23)
        .map(|i| {
            vec![
                i.to_string(),
                names[i % names.len()].to_string(),
                format!("{}.25", i * 10),
                format!("2024-01-{:02}", i),
            ]
        })
        .collect();
    Arc::new(
        Dataset::new(
            vec![
                "id".to_string(),
                "name".to_string(),
                "amount".to_string(),
                "date".to_string(),
            ],
            rows,
        )
        .unwrap(),
    )
}

pub fn html_reply(body: &str) -> String {
    format!("Here is your report:\n```html\n<!DOCTYPE html><html><body>{body}</body></html>\n```\nLet me know!")
}
