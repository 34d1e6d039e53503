//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use lessonpress_assemble::{AssembleConfig, RendererConfig};
use lessonpress_deploy::{
    DeployConfig, DeploySummary, Deployer, ProgressReporter, RecordOutcome, RecordStatus,
};
use lessonpress_extract::ExtractConfig;
use lessonpress_shared::{
    AppConfig, TranscriptCollection, init_config, load_config, resolve_auth_token,
};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// lessonpress — publish course transcripts.
#[derive(Parser)]
#[command(
    name = "lessonpress",
    version,
    about = "Extract, deploy, and assemble enhanced course transcripts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract lesson transcripts from a course directory into one JSON collection.
    Extract {
        /// Course directory containing a `lessons/` subdirectory.
        directory: String,

        /// Output path for the collection JSON (defaults to config).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Deploy an extracted collection to the remote content API.
    Deploy {
        /// Target domain, including scheme (e.g. https://api.example.com).
        #[arg(short, long)]
        domain: Option<String>,

        /// Collection JSON to deploy (defaults to config).
        #[arg(short, long)]
        collection: Option<String>,

        /// Maximum concurrent records in flight.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Do not rename local files to match resolved slugs.
        #[arg(long)]
        keep_names: bool,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Assemble a combined Markdown document and PDF from a course export.
    Assemble {
        /// Course export JSON (metadata + per-lesson markdown).
        #[arg(short, long)]
        export: String,

        /// Lesson-order file: one slug per line, in course order.
        #[arg(short, long)]
        order: String,

        /// Output root directory (defaults to config).
        #[arg(long)]
        out: Option<String>,

        /// Write the Markdown only, without rendering a PDF.
        #[arg(long)]
        skip_render: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "lessonpress=info",
        1 => "lessonpress=debug",
        _ => "lessonpress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Extract { directory, out } => cmd_extract(&directory, out.as_deref()).await,
        Command::Deploy {
            domain,
            collection,
            concurrency,
            keep_names,
            yes,
        } => {
            cmd_deploy(
                domain.as_deref(),
                collection.as_deref(),
                concurrency,
                keep_names,
                yes,
            )
            .await
        }
        Command::Assemble {
            export,
            order,
            out,
            skip_render,
        } => cmd_assemble(&export, &order, out.as_deref(), skip_render).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_extract(directory: &str, out: Option<&str>) -> Result<()> {
    let config = load_config()?;

    let output_path = PathBuf::from(
        out.unwrap_or(config.defaults.collection_path.as_str()),
    );

    info!(directory, output = %output_path.display(), "extracting transcripts");

    let summary = lessonpress_extract::extract(&ExtractConfig {
        course_dir: PathBuf::from(directory),
        output_path,
    })?;

    println!();
    println!("  Extraction complete!");
    println!("  Records: {}", summary.record_count);
    println!("  Skipped: {}", summary.skipped);
    println!("  Output:  {}", summary.output_path.display());
    println!();

    Ok(())
}

async fn cmd_deploy(
    domain: Option<&str>,
    collection_path: Option<&str>,
    concurrency: Option<usize>,
    keep_names: bool,
    yes: bool,
) -> Result<()> {
    let config = load_config()?;

    // Resolve the token before touching anything remote.
    let auth_token = resolve_auth_token(&config)?;

    let domain = domain
        .map(String::from)
        .or_else(|| config.api.default_domain.clone())
        .ok_or_else(|| eyre!("no target domain: pass --domain or set api.default_domain"))?;
    let domain = Url::parse(&domain).map_err(|e| eyre!("invalid domain '{domain}': {e}"))?;

    let collection_path = PathBuf::from(
        collection_path.unwrap_or(config.defaults.collection_path.as_str()),
    );
    let collection = TranscriptCollection::load(&collection_path)?;

    if collection.transcripts.is_empty() {
        println!("Nothing to deploy: {} has no records.", collection_path.display());
        return Ok(());
    }

    // Destructive-action gate: default is abort.
    if !yes {
        let question = format!(
            "Deploy {} transcript(s) from {} to {domain}? (y/n) ",
            collection.transcripts.len(),
            collection_path.display(),
        );
        if !confirm(&question)? {
            println!("Come back soon!");
            return Ok(());
        }
    }

    let deploy_config = DeployConfig {
        domain,
        auth_token,
        concurrency: concurrency
            .unwrap_or(config.defaults.deploy_concurrency as usize),
        rename_local: !keep_names,
    };

    info!(
        collection = %collection_path.display(),
        records = collection.transcripts.len(),
        "deploying transcripts"
    );

    let deployer = Deployer::new(deploy_config)?;
    let reporter = CliProgress::new(collection.transcripts.len() as u64);
    let summary = deployer.deploy(&collection, &reporter).await?;

    println!();
    println!("  Deploy complete!");
    println!("  Deployed: {}", summary.deployed());
    println!("  Failed:   {}", summary.failed());
    println!("  Renamed:  {}", summary.renamed());
    println!("  Time:     {:.1}s", summary.duration.as_secs_f64());
    for (slug, message) in summary.failures() {
        println!("    ! {slug}: {message}");
    }
    println!();

    // Per-record failures are non-fatal: exit 0 either way.
    Ok(())
}

async fn cmd_assemble(
    export: &str,
    order: &str,
    out: Option<&str>,
    skip_render: bool,
) -> Result<()> {
    let config = load_config()?;

    let output_root = PathBuf::from(out.unwrap_or(config.defaults.output_dir.as_str()));

    let renderer = if skip_render {
        None
    } else {
        Some(RendererConfig {
            command: config.render.command.clone(),
        })
    };

    info!(export, order, "assembling course document");

    let result = lessonpress_assemble::assemble(&AssembleConfig {
        export_path: PathBuf::from(export),
        order_path: PathBuf::from(order),
        output_root,
        renderer,
    })?;

    println!();
    println!("  Assembly complete!");
    println!("  Sections: {}", result.sections_written);
    println!("  Markdown: {}", result.markdown_path.display());
    if let Some(pdf) = &result.rendered_path {
        println!("  PDF:      {}", pdf.display());
    }
    for slug in &result.sections_missing {
        println!("    ! missing transcript: {slug}");
    }
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Confirmation prompt
// ---------------------------------------------------------------------------

/// Ask a y/n question on stdin. Anything but `y`/`Y`/`yes` means no.
fn confirm(question: &str) -> Result<bool> {
    print!("{question}");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;

    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl ProgressReporter for CliProgress {
    fn record_started(&self, slug: &str, _current: usize, _total: usize) {
        self.bar.set_message(format!("Deploying {slug}"));
    }

    fn record_finished(&self, outcome: &RecordOutcome) {
        match &outcome.status {
            RecordStatus::Deployed => {}
            RecordStatus::LookupFailed(msg) | RecordStatus::SubmissionFailed(msg) => {
                self.bar
                    .println(format!("  ! {}: {msg}", outcome.lesson_slug));
            }
        }
        self.bar.inc(1);
    }

    fn done(&self, _summary: &DeploySummary) {
        self.bar.finish_and_clear();
    }
}
