use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use pipeline_analyzer::app::{App, Focus};
use pipeline_analyzer::config::{Config, BASE_URL_ENV, TIMEOUT_ENV};
use pipeline_analyzer::{handler, logging, oneshot, tui, ui};
use pipeline_analyzer::{AnalyzerClient, PipelineAnalyzer};

#[derive(Parser)]
#[command(name = "pipeline-analyzer", version)]
#[command(about = "Submit CI/CD pipelines to an analysis service and review the results")]
struct Cli {
    /// Analysis service address (overrides config file and environment)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Tui {
        /// Directory the file picker starts in
        #[arg(long)]
        dir: Option<PathBuf>,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Analyze one pipeline and print the results
    Analyze {
        #[command(flatten)]
        source: RequiredSourceArgs,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Default)]
#[group(multiple = false)]
struct SourceArgs {
    /// Pipeline file to preselect
    #[arg(long)]
    file: Option<PathBuf>,
    /// Pipeline URL to prefill
    #[arg(long)]
    url: Option<String>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct RequiredSourceArgs {
    /// Local pipeline file (.yml/.yaml)
    #[arg(long)]
    file: Option<PathBuf>,
    /// Raw URL of a pipeline file
    #[arg(long)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the resolved configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => run_tui(&cli.base_url, cli.timeout, None, SourceArgs::default()).await,
        Some(Commands::Tui { dir, source }) => {
            run_tui(&cli.base_url, cli.timeout, dir, source).await
        }
        Some(Commands::Analyze { source }) => {
            logging::init_stderr()?;
            let config = resolve_config(&cli.base_url, cli.timeout)?;
            run_analyze(&config, source).await
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Path => {
                println!("{}", Config::config_path()?.display());
                Ok(())
            }
            ConfigAction::Show => {
                let config = resolve_config(&cli.base_url, cli.timeout)?;
                println!("{}", serde_json::to_string_pretty(&config)?);
                println!();
                println!("Environment overrides: {}, {}", BASE_URL_ENV, TIMEOUT_ENV);
                Ok(())
            }
        },
    }
}

/// Config file, then environment, then command line flags
fn resolve_config(base_url: &Option<String>, timeout: Option<u64>) -> Result<Config> {
    let mut config = Config::resolve().context("Invalid configuration")?;
    if let Some(base_url) = base_url {
        config.base_url = base_url.clone();
    }
    if timeout.is_some() {
        config.request_timeout_secs = timeout;
    }
    Ok(config.validated()?)
}

async fn run_tui(
    base_url: &Option<String>,
    timeout: Option<u64>,
    dir: Option<PathBuf>,
    source: SourceArgs,
) -> Result<()> {
    // Logging is best effort; the UI still works without a log file
    let log_path = logging::init_file().ok();

    let config = resolve_config(base_url, timeout)?;
    let client: Arc<dyn PipelineAnalyzer> = Arc::new(AnalyzerClient::from_config(&config)?);
    info!(endpoint = %client.endpoint(), log = ?log_path, "starting TUI");

    let start_dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Could not determine current directory")?,
    };

    let mut app = App::new(client, start_dir);
    if let Some(file) = source.file {
        app.select_file(&file);
        app.focus = Focus::Analyze;
    } else if let Some(url) = source.url {
        app.url_insert_str(&url);
        app.focus = Focus::Analyze;
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    app.cancel_analysis();
    tui::finish(result, tui::restore)
}

async fn run_analyze(config: &Config, source: RequiredSourceArgs) -> Result<()> {
    let client = AnalyzerClient::from_config(config)?;
    let report = oneshot::analyze_once(&client, source.file, source.url).await?;
    if let Some(status) = report.status {
        eprintln!("{}", status);
    }
    print!("{}", report.sections);
    Ok(())
}
