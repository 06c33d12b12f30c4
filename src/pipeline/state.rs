//! Run states and progress records

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::PipelineError;
use super::synthesizer::Report;

/// Step shown while the report is written out
pub const FINALIZING_STEP: &str = "Finalizing report...";

/// Percent reported just before a run completes
pub const FINALIZING_PERCENT: u8 = 99;

/// Step shown once a run has failed
pub const FAILURE_STEP: &str = "Error occurred during report generation";

/// Lifecycle of one report run
///
/// `Idle -> Planning -> Executing -> Synthesizing -> Done`, with `Failed`
/// reachable from every non-idle, non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run started
    Idle,
    /// Asking the model for a blueprint and queries
    Planning,
    /// Running queries against the full dataset
    Executing,
    /// Asking the model for the report document
    Synthesizing,
    /// Report available
    Done,
    /// Run ended with an error
    Failed,
}

impl RunState {
    /// Get the state name
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Planning => "planning",
            RunState::Executing => "executing",
            RunState::Synthesizing => "synthesizing",
            RunState::Done => "done",
            RunState::Failed => "failed",
        }
    }

    /// Step description shown on entering the state
    pub fn description(&self) -> &'static str {
        match self {
            RunState::Idle => "Waiting for data",
            RunState::Planning => "Reviewing dataset structure and planning analysis...",
            RunState::Executing => "Running queries against the full dataset...",
            RunState::Synthesizing => "Generating final comprehensive report...",
            RunState::Done => "Report generated successfully!",
            RunState::Failed => FAILURE_STEP,
        }
    }

    /// Percent reported on entering the state
    ///
    /// `None` for `Failed`, which keeps the last reported value.
    pub fn percent(&self) -> Option<u8> {
        match self {
            RunState::Idle => Some(0),
            RunState::Planning => Some(10),
            RunState::Executing => Some(40),
            RunState::Synthesizing => Some(60),
            RunState::Done => Some(100),
            RunState::Failed => None,
        }
    }

    /// True for `Done` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }

    /// True while a run is between `Idle` and a terminal state
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunState::Planning | RunState::Executing | RunState::Synthesizing
        )
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: RunState) -> bool {
        match (self, next) {
            (RunState::Idle, RunState::Planning) => true,
            (RunState::Planning, RunState::Executing) => true,
            (RunState::Executing, RunState::Synthesizing) => true,
            (RunState::Synthesizing, RunState::Done) => true,
            (from, RunState::Failed) => from.is_active(),
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RunState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(RunState::Idle),
            "planning" => Ok(RunState::Planning),
            "executing" => Ok(RunState::Executing),
            "synthesizing" => Ok(RunState::Synthesizing),
            "done" => Ok(RunState::Done),
            "failed" => Ok(RunState::Failed),
            _ => Err(format!("Unknown run state: {s}")),
        }
    }
}

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub state: RunState,
    pub step: String,
    pub percent: u8,
    pub at: DateTime<Utc>,
}

/// Everything an observer can see about a run at one moment
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub state: RunState,
    pub step: String,
    pub percent: u8,
    /// Present only in `Done`
    pub report: Option<Arc<Report>>,
    /// Present in `Failed`, or in `Idle` for a rejected request
    pub error: Option<PipelineError>,
    /// Every progress notification so far, oldest first
    pub history: Vec<Progress>,
}

impl RunSnapshot {
    pub(crate) fn idle(run_id: Uuid) -> Self {
        let mut snapshot = Self {
            run_id,
            state: RunState::Idle,
            step: String::new(),
            percent: 0,
            report: None,
            error: None,
            history: Vec::new(),
        };
        snapshot.record(RunState::Idle, RunState::Idle.description(), 0);
        snapshot
    }

    /// True once nothing more will change
    pub fn is_settled(&self) -> bool {
        self.state.is_terminal() || self.error.is_some()
    }

    /// Apply a progress update, keeping percent non-decreasing
    pub(crate) fn record(&mut self, state: RunState, step: impl Into<String>, percent: u8) {
        self.state = state;
        self.step = step.into();
        self.percent = self.percent.max(percent);
        self.history.push(Progress {
            state,
            step: self.step.clone(),
            percent: self.percent,
            at: Utc::now(),
        });
    }
}
