//! tabular-report: turn a CSV file into an analytical HTML report

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tabular_report::cli::CliError;
use tabular_report::cli::commands::{
    GenerateArgs, handle_generate, handle_templates_export, handle_templates_list,
};

#[derive(Parser)]
#[command(name = "tabular-report")]
#[command(version)]
#[command(about = "LLM-planned, SQL-executed analytical reports over CSV data")]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a report from a CSV file
    Generate(GenerateCommand),

    /// Inspect or export prompt templates
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },
}

#[derive(Args)]
struct GenerateCommand {
    /// Input CSV file with a header row
    #[arg(short, long)]
    input: PathBuf,

    /// Output HTML file
    #[arg(short, long, default_value = "report.html")]
    output: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LLM provider (ollama, openai-compatible)
    #[arg(long)]
    provider: Option<String>,

    /// LLM base URL
    #[arg(long)]
    url: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Environment variable holding the API key
    #[arg(long)]
    api_key_env: Option<String>,

    /// Directory of <name>.txt prompt templates
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Allow planned statements that modify the loaded table
    #[arg(long)]
    allow_mutating_sql: bool,

    /// Do not draw a progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Skip the model server reachability check
    #[arg(long)]
    no_preflight: bool,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// Write the built-in templates to a directory
    Export {
        #[arg(short, long, default_value = "prompts")]
        dir: PathBuf,
    },

    /// List effective templates
    List {
        /// Directory overlaying the built-in templates
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

impl From<GenerateCommand> for GenerateArgs {
    fn from(cmd: GenerateCommand) -> Self {
        GenerateArgs {
            input: cmd.input,
            output: cmd.output,
            config_file: cmd.config,
            provider: cmd.provider,
            url: cmd.url,
            model: cmd.model,
            api_key_env: cmd.api_key_env,
            templates_dir: cmd.templates_dir,
            allow_mutating_sql: cmd.allow_mutating_sql,
            quiet: cmd.quiet,
            skip_preflight: cmd.no_preflight,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "tabular_report=debug"
    } else {
        "tabular_report=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Generate(cmd) => handle_generate(&cmd.into()).await,
        Command::Templates { command } => match command {
            TemplatesCommand::Export { dir } => handle_templates_export(&dir),
            TemplatesCommand::List { dir } => handle_templates_list(dir.as_deref()),
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}
