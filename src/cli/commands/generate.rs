//! The `generate` command: CSV in, HTML report out

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::cli::config::ReportConfig;
use crate::cli::error::CliError;
use crate::cli::output::{RunProgress, format_summary};
use crate::dataset::read_csv_path;
use crate::llm::{LlmClient, LlmConfig, LlmError, LlmProvider};
use crate::pipeline::ReportPipeline;
use crate::prompt::TemplateLibrary;

/// Arguments for the `generate` command
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Input CSV file
    pub input: PathBuf,
    /// Output HTML file
    pub output: PathBuf,
    /// Configuration file
    pub config_file: Option<PathBuf>,
    pub provider: Option<String>,
    pub url: Option<String>,
    pub model: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    pub templates_dir: Option<PathBuf>,
    /// Allow statements that modify the loaded table
    pub allow_mutating_sql: bool,
    /// Hide the progress bar
    pub quiet: bool,
    /// Do not check that the model server is reachable before the run
    pub skip_preflight: bool,
}

/// Merge the configuration file with command-line overrides
pub fn resolve_config(args: &GenerateArgs) -> Result<ReportConfig, CliError> {
    let mut config = match &args.config_file {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };

    if let Some(provider) = &args.provider {
        config.llm.provider = provider
            .parse::<LlmProvider>()
            .map_err(CliError::InvalidArgument)?;
    }
    if let Some(url) = &args.url {
        config.llm.url = Some(url.clone());
    }
    if let Some(model) = &args.model {
        config.llm.model = Some(model.clone());
    }
    if let Some(var) = &args.api_key_env {
        config.llm.api_key_env = var.clone();
    }
    if let Some(dir) = &args.templates_dir {
        config.templates_dir = Some(dir.clone());
    }
    if args.allow_mutating_sql {
        config.pipeline.enforce_read_only = false;
    }

    Ok(config)
}

/// Build the template library, overlaying files from the configured directory
pub fn load_templates(dir: Option<&Path>) -> Result<TemplateLibrary, CliError> {
    let mut library = TemplateLibrary::builtin();
    if let Some(dir) = dir {
        let loaded = library.load_dir(dir)?;
        info!(dir = %dir.display(), templates = ?loaded, "Loaded prompt templates");
    }
    Ok(library)
}

/// Fail fast when the model server is unreachable or lacks the model
pub async fn preflight(client: &dyn LlmClient, config: &LlmConfig) -> Result<(), CliError> {
    if client.is_ready().await {
        debug!(model = client.model_name(), "Model server is ready");
        return Ok(());
    }
    Err(LlmError::ConnectionError(format!(
        "{} server at {} is not reachable or does not serve model '{}' \
         (use --no-preflight to skip this check)",
        config.provider,
        config.effective_url(),
        config.effective_model()
    ))
    .into())
}

/// Handle the `generate` command
pub async fn handle_generate(args: &GenerateArgs) -> Result<(), CliError> {
    let start = Instant::now();
    let config = resolve_config(args)?;

    let dataset = Arc::new(read_csv_path(&args.input)?);
    let templates = load_templates(config.templates_dir.as_deref())?;
    let client = config.llm.build_client()?;
    if !args.skip_preflight {
        preflight(client.as_ref(), &config.llm).await?;
    }

    eprintln!(
        "Generating report for {} ({} rows, {} columns) with {} via {}",
        args.input.display(),
        dataset.len(),
        dataset.columns().len(),
        config.llm.effective_model(),
        config.llm.provider
    );

    let pipeline = ReportPipeline::new(client)
        .with_templates(templates)
        .with_config(config.pipeline.clone());

    let handle = pipeline.start_run(dataset.clone());
    let progress = if args.quiet {
        RunProgress::hidden()
    } else {
        RunProgress::new()
    };

    let mut rx = handle.subscribe();
    loop {
        {
            let snapshot = rx.borrow_and_update();
            progress.update(&snapshot);
            if snapshot.is_settled() {
                break;
            }
        }
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c(), if !handle.is_cancelled() => {
                handle.cancel();
                progress.note("Cancelling after the current step...");
            }
        }
    }

    let report = match handle.wait().await {
        Ok(report) => report,
        Err(e) => {
            progress.finish_error(&e.to_string());
            return Err(e.into());
        }
    };

    write_report(&args.output, report.html())?;
    progress.finish_success("Report generated successfully!");

    println!(
        "{}",
        format_summary(&report, dataset.len(), &args.output, start.elapsed())
    );
    Ok(())
}

fn write_report(path: &Path, html: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| CliError::FileWriteError(parent.to_path_buf(), e.to_string()))?;
    }
    std::fs::write(path, html).map_err(|e| CliError::FileWriteError(path.to_path_buf(), e.to_string()))
}
