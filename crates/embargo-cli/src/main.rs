#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "embargo: sanctions-entity ingestion and country graph analysis",
    long_about = None
)]
struct Cli {
    /// Path to the sanctions store. Falls back to the EMBARGO_DB
    /// environment variable, then ./embargo.sqlite3.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }

    /// Resolve the store path from the flag, the environment, or the default.
    fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .or_else(|| env::var_os("EMBARGO_DB").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("embargo.sqlite3"))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Batch",
        about = "Sync dataset catalogue metadata",
        long_about = "Fetch per-dataset catalogue metadata, walking backward one day per missed snapshot.",
        after_help = "EXAMPLES:\n    # Sync two named datasets as of today\n    embargo fetch us_ofac_sdn eu_fsf\n\n    # Sync the whole catalogue for a reference date\n    embargo fetch --date 2023-05-10\n\n    # Emit machine-readable output\n    embargo fetch us_ofac_sdn --json"
    )]
    Fetch(cmd::fetch::FetchArgs),

    #[command(
        next_help_heading = "Batch",
        about = "Stream an NDJSON entity export into the store",
        long_about = "Ingest newline-delimited entity records one line at a time, committing in checkpoint batches.",
        after_help = "EXAMPLES:\n    # Ingest a file\n    embargo ingest entities.ftm.json\n\n    # Read from stdin, aborting on the first malformed record\n    curl -s $URL | embargo ingest - --fail-fast"
    )]
    Ingest(cmd::ingest::IngestArgs),

    #[command(
        next_help_heading = "Batch",
        about = "Recompute relation rows",
        long_about = "Join stored entities with dataset publisher metadata into the relation-row table.",
        after_help = "EXAMPLES:\n    # Recompute after an ingest\n    embargo extract"
    )]
    Extract(cmd::extract::ExtractArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Build the country graph and compute metrics",
        long_about = "Build the filtered who-sanctions-whom graph, compute centrality metrics, and lay it out.",
        after_help = "EXAMPLES:\n    # Full analysis over everything\n    embargo analyze\n\n    # Companies only, restricted to three countries\n    embargo analyze --schema Company --country us --country ru --country eu\n\n    # Emit the full result as JSON\n    embargo analyze --json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Search entities by caption",
        after_help = "EXAMPLES:\n    # Find entities whose caption mentions \"bank\"\n    embargo search bank\n\n    # Companies sanctioned by the US\n    embargo search bank --schema Company --sanctioned-by us"
    )]
    Search(cmd::search::SearchArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "List relations pinned to one country",
        after_help = "EXAMPLES:\n    # Who sanctions entities in ru\n    embargo country ru\n\n    # Whom the us sanctions\n    embargo country us --direction from"
    )]
    Country(cmd::country::CountryArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "List country codes present in the relation set"
    )]
    Countries(cmd::countries::CountriesArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Show store row counts and schema tags"
    )]
    Status(cmd::status::StatusArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EMBARGO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "embargo=debug,embargo_core=debug,embargo_graph=debug,info"
        } else {
            "embargo=info,embargo_core=info,embargo_graph=info,warn"
        })
    });

    let format = env::var("EMBARGO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs always go to stderr: stdout is reserved for command payloads.
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let db = cli.db_path();
    let output = cli.output_mode();

    match cli.command {
        Commands::Fetch(ref args) => cmd::fetch::run_fetch(args, output, &db),
        Commands::Ingest(ref args) => cmd::ingest::run_ingest(args, output, &db),
        Commands::Extract(ref args) => cmd::extract::run_extract(args, output, &db),
        Commands::Analyze(ref args) => cmd::analyze::run_analyze(args, output, &db),
        Commands::Search(ref args) => cmd::search::run_search(args, output, &db),
        Commands::Country(ref args) => cmd::country::run_country(args, output, &db),
        Commands::Countries(ref args) => cmd::countries::run_countries(args, output, &db),
        Commands::Status(ref args) => cmd::status::run_status(args, output, &db),
    }
}
