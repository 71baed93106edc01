#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ripple: engagement timeline tracker for snapshotted social posts",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format (pretty, text, json).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, env, and TTY state.
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Initialize a ripple project",
        long_about = "Initialize a ripple project in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    rpl init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        about = "Store one raw snapshot pull",
        long_about = "Validate a raw pull of post objects and store it as a snapshot batch.",
        after_help = "EXAMPLES:\n    # Store a pull for one source, captured now\n    rpl load chaosbird pull.json\n\n    # Backfill with an explicit capture instant\n    rpl load chaosbird pull.json --captured-at 2026-08-29T12:00:00-05:00"
    )]
    Load(cmd::load::LoadArgs),

    #[command(
        about = "Rebuild the merged timeline table",
        long_about = "Load all stored snapshots, merge them chronologically, and replace the merged-table artifact.",
        after_help = "EXAMPLES:\n    # Merge everything under the data directory\n    rpl merge\n\n    # Emit machine-readable output\n    rpl merge --json"
    )]
    Merge(cmd::merge::MergeArgs),

    #[command(
        about = "Shape the tidy engagement series",
        long_about = "Filter and shape the merged table into tidy rows for charting, with synthetic zero origins per post.",
        after_help = "EXAMPLES:\n    # Today's series (local midnight cutoff)\n    rpl series\n\n    # Explicit cutoff\n    rpl series --cutoff 2026-08-29T00:00:00-05:00 --json"
    )]
    Series(cmd::series::SeriesArgs),

    #[command(
        about = "Report partially-consumed API quota categories",
        long_about = "Flatten a quota-status JSON tree and report only the categories that have been dipped into.",
        after_help = "EXAMPLES:\n    # Report from a saved rate-limit status\n    rpl usage status.json"
    )]
    Usage(cmd::usage::UsageArgs),

    #[command(
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    rpl completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Default filter directives when `RIPPLE_LOG` is unset. Targets are the
/// crate names as tracing sees them, underscored.
const fn default_log_directives(debug: bool) -> &'static str {
    if debug {
        "ripple_core=debug,ripple_cli=debug,info"
    } else {
        "ripple_core=info,ripple_cli=info,warn"
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RIPPLE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(default_log_directives(env::var("DEBUG").is_ok()))
    });

    let format = env::var("RIPPLE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = std::env::current_dir()?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, &project_root),
        Commands::Load(ref args) => cmd::load::run_load(args, output, &project_root),
        Commands::Merge(ref args) => cmd::merge::run_merge(args, output, &project_root),
        Commands::Series(ref args) => cmd::series::run_series(args, output, &project_root),
        Commands::Usage(ref args) => cmd::usage::run_usage(args, output),
        Commands::Completions(args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    }
}
