//! Report run orchestration
//!
//! [`ReportPipeline::start_run`] spawns one run on the current tokio runtime
//! and returns a [`RunHandle`] immediately. Progress is published through a
//! `watch` channel; the handle reads it, waits on it and can cancel the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::watch;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use super::config::PipelineConfig;
use super::error::{PipelineError, PipelineResult};
use super::planner::BlueprintPlanner;
use super::query::QueryExecutor;
use super::state::{FINALIZING_PERCENT, FINALIZING_STEP, Progress, RunSnapshot, RunState};
use super::synthesizer::{Report, ReportSynthesizer};
use crate::dataset::{Dataset, project};
use crate::llm::LlmClient;
use crate::prompt::{BLUEPRINT_TEMPLATE, REPORT_TEMPLATE, TemplateLibrary};

/// Entry point for report runs
///
/// At most one run is active per pipeline; further requests are rejected until
/// it settles.
pub struct ReportPipeline {
    client: Arc<dyn LlmClient>,
    templates: Arc<TemplateLibrary>,
    config: PipelineConfig,
    active: Arc<AtomicBool>,
}

impl ReportPipeline {
    /// Create a pipeline with the built-in templates and default settings
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            templates: Arc::new(TemplateLibrary::builtin()),
            config: PipelineConfig::default(),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use a different template library
    pub fn with_templates(mut self, templates: TemplateLibrary) -> Self {
        self.templates = Arc::new(templates);
        self
    }

    /// Use different settings
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// True while a run started by this pipeline has not settled
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a run over `dataset`
    ///
    /// Never fails directly: a rejected request returns a handle that stays
    /// `Idle` and already carries the error. Must be called from within a
    /// tokio runtime.
    pub fn start_run(&self, dataset: Arc<Dataset>) -> RunHandle {
        let run_id = Uuid::new_v4();

        if dataset.is_empty() {
            warn!(run_id = %run_id, "Rejecting run over empty dataset");
            return RunHandle::rejected(run_id, PipelineError::EmptyDataset);
        }
        if dataset.columns().is_empty() {
            return RunHandle::rejected(
                run_id,
                PipelineError::InvalidDataset("dataset has no columns".to_string()),
            );
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                return RunHandle::rejected(
                    run_id,
                    PipelineError::ConfigError(format!("no tokio runtime: {e}")),
                );
            }
        };

        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(run_id = %run_id, "Rejecting run, another run is in progress");
            return RunHandle::rejected(run_id, PipelineError::RunInProgress);
        }

        let mut initial = RunSnapshot::idle(run_id);
        initial.record(
            RunState::Planning,
            RunState::Planning.description(),
            RunState::Planning.percent().unwrap_or(0),
        );
        let (tx, rx) = watch::channel(initial);
        let cancel = Arc::new(AtomicBool::new(false));

        let run = Run {
            client: self.client.clone(),
            templates: self.templates.clone(),
            config: self.config.clone(),
            dataset,
            tracker: RunTracker::new(tx, self.active.clone()),
            cancel: cancel.clone(),
        };

        let span = info_span!("report_run", run_id = %run_id);
        runtime.spawn(
            async move {
                run.execute().await;
            }
            .instrument(span),
        );

        RunHandle { run_id, rx, cancel }
    }

    /// Start a run and wait for its outcome
    pub async fn generate(&self, dataset: Arc<Dataset>) -> PipelineResult<Arc<Report>> {
        self.start_run(dataset).wait().await
    }
}

/// Publishes state transitions of one run
///
/// Settling the run releases the pipeline's single-flight flag before
/// observers are woken. Dropping an unsettled tracker (a panicked or aborted
/// task) releases it too.
pub(crate) struct RunTracker {
    tx: watch::Sender<RunSnapshot>,
    active: Arc<AtomicBool>,
    released: AtomicBool,
}

impl RunTracker {
    fn new(tx: watch::Sender<RunSnapshot>, active: Arc<AtomicBool>) -> Self {
        Self {
            tx,
            active,
            released: AtomicBool::new(false),
        }
    }

    /// Clear the single-flight flag, at most once per run
    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.active.store(false, Ordering::SeqCst);
        }
    }

    /// Move to `next`, emitting its step and percent
    ///
    /// Illegal transitions are ignored.
    pub fn enter(&self, next: RunState) {
        self.tx.send_modify(|snapshot| {
            if !snapshot.state.can_transition_to(next) {
                warn!(from = %snapshot.state, to = %next, "Ignoring illegal state transition");
                return;
            }
            let percent = next.percent().unwrap_or(snapshot.percent);
            snapshot.record(next, next.description(), percent);
        });
    }

    /// Report progress within the current state
    pub fn step(&self, step: &str, percent: u8) {
        self.tx.send_modify(|snapshot| {
            let state = snapshot.state;
            snapshot.record(state, step, percent);
        });
    }

    /// Settle as `Done` with the report
    pub fn complete(&self, report: Report) {
        self.tx.send_modify(|snapshot| {
            self.release();
            if !snapshot.state.can_transition_to(RunState::Done) {
                warn!(from = %snapshot.state, "Ignoring completion outside synthesis");
                return;
            }
            snapshot.report = Some(Arc::new(report));
            snapshot.record(RunState::Done, RunState::Done.description(), 100);
        });
    }

    /// Settle as `Failed` with the error
    pub fn fail(&self, err: PipelineError) {
        self.tx.send_modify(|snapshot| {
            self.release();
            if !snapshot.state.can_transition_to(RunState::Failed) {
                return;
            }
            let percent = snapshot.percent;
            snapshot.report = None;
            snapshot.error = Some(err);
            snapshot.record(RunState::Failed, RunState::Failed.description(), percent);
        });
    }

    pub fn state(&self) -> RunState {
        self.tx.borrow().state
    }
}

impl Drop for RunTracker {
    fn drop(&mut self) {
        self.release();
    }
}

struct Run {
    client: Arc<dyn LlmClient>,
    templates: Arc<TemplateLibrary>,
    config: PipelineConfig,
    dataset: Arc<Dataset>,
    tracker: RunTracker,
    cancel: Arc<AtomicBool>,
}

impl Run {
    async fn execute(self) {
        let start = Instant::now();
        info!(
            rows = self.dataset.len(),
            columns = self.dataset.columns().len(),
            model = self.client.model_name(),
            "Starting report run"
        );

        match self.stages().await {
            Ok(report) => {
                info!(
                    queries = report.queries_run(),
                    failed = report.queries_failed(),
                    extraction = report.extraction().name(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Report run completed"
                );
                self.tracker.complete(report);
            }
            Err(e) => {
                error!(
                    state = %self.tracker.state(),
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Report run failed"
                );
                self.tracker.fail(e);
            }
        }
    }

    fn checkpoint(&self) -> PipelineResult<()> {
        if self.cancel.load(Ordering::SeqCst) {
            info!(state = %self.tracker.state(), "Cancellation requested");
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }

    async fn stages(&self) -> PipelineResult<Report> {
        // Planning was entered when the run was accepted
        self.checkpoint()?;
        let template = self.templates.get(BLUEPRINT_TEMPLATE)?;
        let sample = project(&self.dataset);
        info!(stage = "planning", sample_rows = sample.rows.len(), "Stage started");
        let plan = BlueprintPlanner::new(self.client.as_ref(), template)
            .plan(&sample)
            .await?;
        self.checkpoint()?;

        self.tracker.enter(RunState::Executing);
        info!(stage = "executing", queries = plan.queries.len(), "Stage started");
        let results = QueryExecutor::new(&self.config).execute(&self.dataset, &plan.queries)?;
        self.checkpoint()?;

        self.tracker.enter(RunState::Synthesizing);
        let template = self.templates.get(REPORT_TEMPLATE)?;
        info!(stage = "synthesizing", results = results.len(), "Stage started");
        let report = ReportSynthesizer::new(self.client.as_ref(), template)
            .synthesize(&plan.blueprint, &results)
            .await?;
        self.checkpoint()?;

        self.tracker.step(FINALIZING_STEP, FINALIZING_PERCENT);
        Ok(report)
    }
}

/// Caller's view of one run
pub struct RunHandle {
    run_id: Uuid,
    rx: watch::Receiver<RunSnapshot>,
    cancel: Arc<AtomicBool>,
}

impl RunHandle {
    fn rejected(run_id: Uuid, err: PipelineError) -> Self {
        let mut snapshot = RunSnapshot::idle(run_id);
        snapshot.step = format!("Run rejected: {err}");
        snapshot.error = Some(err);
        let (_tx, rx) = watch::channel(snapshot);
        Self {
            run_id,
            rx,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.rx.borrow().state
    }

    /// Current step description
    pub fn step(&self) -> String {
        self.rx.borrow().step.clone()
    }

    pub fn percent(&self) -> u8 {
        self.rx.borrow().percent
    }

    /// The report, once `Done`
    pub fn report(&self) -> Option<Arc<Report>> {
        self.rx.borrow().report.clone()
    }

    /// The error, once `Failed` or for a rejected request
    pub fn error(&self) -> Option<PipelineError> {
        self.rx.borrow().error.clone()
    }

    /// Progress notifications so far, oldest first
    pub fn history(&self) -> Vec<Progress> {
        self.rx.borrow().history.clone()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.rx.borrow().clone()
    }

    /// A receiver for observing progress
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.rx.clone()
    }

    /// Ask the run to stop at its next checkpoint
    ///
    /// A model call already in flight completes; its result is discarded.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Wait until the run settles and return its outcome
    pub async fn wait(&self) -> PipelineResult<Arc<Report>> {
        let mut rx = self.rx.clone();
        let outcome = rx
            .wait_for(RunSnapshot::is_settled)
            .await
            .map(|snapshot| (*snapshot).clone());
        // Sender gone before settling: take whatever was published last
        let settled = match outcome {
            Ok(snapshot) => snapshot,
            Err(_) => rx.borrow().clone(),
        };

        match (settled.report, settled.error) {
            (Some(report), _) => Ok(report),
            (None, Some(err)) => Err(err),
            (None, None) => Err(PipelineError::Aborted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};

    const PLAN: &str = "Totals first.\n```sql\nSELECT COUNT(*) AS n FROM data;\n```";
    const REPORT: &str = "```html\n<!DOCTYPE html><html><body>ok</body></html>\n```";

    fn dataset(rows: usize) -> Arc<Dataset> {
        Arc::new(
            Dataset::new(
                vec!["id".into()],
                (0..rows).map(|i| vec![i.to_string()]).collect(),
            )
            .unwrap(),
        )
    }

    fn pipeline(replies: Vec<Result<String, LlmError>>) -> (ReportPipeline, Arc<MockLlmClient>) {
        let client = Arc::new(MockLlmClient::new(replies));
        (ReportPipeline::new(client.clone()), client)
    }

    fn pipeline_failing() -> (ReportPipeline, Arc<MockLlmClient>) {
        pipeline(vec![Err(LlmError::ConnectionError("refused".into()))])
    }

    #[tokio::test]
    async fn test_run_reaches_done() {
        let (pipeline, client) = pipeline(vec![Ok(PLAN.into()), Ok(REPORT.into())]);

        let handle = pipeline.start_run(dataset(7));
        assert_eq!(handle.state(), RunState::Planning);
        assert!(pipeline.is_running());

        let report = handle.wait().await.unwrap();
        assert_eq!(report.html(), "<!DOCTYPE html><html><body>ok</body></html>");
        assert_eq!(handle.state(), RunState::Done);
        assert_eq!(handle.percent(), 100);
        assert!(handle.error().is_none());
        assert_eq!(client.calls().len(), 2);

        let percents: Vec<_> = handle.history().iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![0, 10, 40, 60, 99, 100]);
    }

    #[tokio::test]
    async fn test_empty_dataset_never_plans() {
        let (pipeline, client) = pipeline(vec![Ok(PLAN.into())]);

        let handle = pipeline.start_run(dataset(0));
        assert_eq!(handle.state(), RunState::Idle);
        assert_eq!(handle.error(), Some(PipelineError::EmptyDataset));
        assert_eq!(handle.wait().await.unwrap_err(), PipelineError::EmptyDataset);
        assert!(client.calls().is_empty());
        assert!(!pipeline.is_running());
    }

    #[tokio::test]
    async fn test_second_run_rejected_while_active() {
        let (pipeline, _client) = pipeline(vec![Ok(PLAN.into()), Ok(REPORT.into())]);

        let first = pipeline.start_run(dataset(3));
        let second = pipeline.start_run(dataset(3));
        assert_eq!(second.state(), RunState::Idle);
        assert_eq!(second.error(), Some(PipelineError::RunInProgress));

        first.wait().await.unwrap();
        assert!(!pipeline.is_running());

        let third = pipeline.start_run(dataset(3));
        assert!(third.wait().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_flag_released_when_run_settles() {
        for _ in 0..50 {
            let (pipeline, _client) = pipeline(vec![Ok(PLAN.into()), Ok(REPORT.into())]);
            pipeline.generate(dataset(3)).await.unwrap();
            assert!(!pipeline.is_running());

            let (pipeline, _client) = pipeline_failing();
            assert!(pipeline.generate(dataset(3)).await.is_err());
            assert!(!pipeline.is_running());
        }
    }

    #[test]
    fn test_dropped_tracker_releases_flag() {
        let active = Arc::new(AtomicBool::new(true));
        let (tx, _rx) = watch::channel(RunSnapshot::idle(Uuid::new_v4()));
        drop(RunTracker::new(tx, active.clone()));
        assert!(!active.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_before_planning() {
        let (pipeline, client) = pipeline(vec![Ok(PLAN.into()), Ok(REPORT.into())]);

        let handle = pipeline.start_run(dataset(3));
        handle.cancel();

        assert_eq!(handle.wait().await.unwrap_err(), PipelineError::Cancelled);
        assert_eq!(handle.state(), RunState::Failed);
        assert!(handle.report().is_none());
        assert!(client.calls().is_empty());
        assert_eq!(handle.step(), RunState::Failed.description());
    }

    #[tokio::test]
    async fn test_missing_template_fails_run() {
        let (pipeline, _client) = pipeline(vec![Ok(PLAN.into())]);
        let pipeline = pipeline.with_templates(TemplateLibrary::empty());

        let err = pipeline.start_run(dataset(3)).wait().await.unwrap_err();
        assert_eq!(
            err,
            PipelineError::TemplateNotFound(BLUEPRINT_TEMPLATE.to_string())
        );
    }

    #[test]
    fn test_no_runtime_rejects() {
        let (pipeline, _client) = pipeline(vec![Ok(PLAN.into())]);
        let handle = pipeline.start_run(dataset(3));
        assert!(matches!(handle.error(), Some(PipelineError::ConfigError(_))));
        assert!(!pipeline.is_running());
    }
}
