//! repo-trust: repository trustworthiness scoring
//!
//! Scores a GitHub repository on bus factor, correctness, ramp-up,
//! maintainer responsiveness, license, dependency pinning and code review.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use repo_trust::{
    cli::{self, exit_codes, ConfigAction, OutputFormat, ScoreConfig},
    config::{load_or_default, AppConfig},
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "repo-trust")]
#[command(author = "Binarly.io")]
#[command(version)]
#[command(about = "Repository trustworthiness scoring", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  NetScore below --min-score
    3  Error occurred

EXAMPLES:
    # Score a repository
    repo-trust score expressjs/express

    # Score the repository behind an npm package, as a rating record
    repo-trust score https://www.npmjs.com/package/express -o rating

    # CI gate with a time budget
    repo-trust score lodash/lodash --min-score 0.5 --deadline 60")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitHub API token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments for the `score` subcommand
#[derive(Parser)]
struct ScoreArgs {
    /// `owner/repo`, GitHub URL or npm package link
    target: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    output: OutputFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Exit with code 1 if the NetScore is below this value
    #[arg(long)]
    min_score: Option<f64>,

    /// Run the metrics one after another instead of concurrently
    #[arg(long)]
    sequential: bool,

    /// Give up on unfinished metrics after this many seconds
    #[arg(long, value_name = "SECS")]
    deadline: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a repository
    Score(ScoreArgs),

    /// Print the `owner/repo` behind a GitHub or npm link
    Resolve {
        /// GitHub URL or npm package link
        url: String,
    },

    /// Inspect the configuration
    Config {
        #[arg(value_enum)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_codes::ERROR
        }
    };
    if code != exit_codes::SUCCESS {
        std::process::exit(code);
    }
}

/// Config file values, overridden by command-line flags.
fn app_config(cli: &Cli) -> AppConfig {
    let (mut config, source) = load_or_default(cli.config.as_deref());
    if let Some(path) = source {
        tracing::debug!("Using config file {}", path.display());
    }

    let mut overrides = AppConfig::default();
    overrides.hosting.token.clone_from(&cli.token);
    if let Commands::Score(args) = &cli.command {
        overrides.evaluation.parallel = !args.sequential;
        overrides.evaluation.deadline_secs = args.deadline;
    }
    config.merge(&overrides);
    config
}

fn run(cli: Cli) -> Result<i32> {
    let config = app_config(&cli);

    match cli.command {
        Commands::Score(args) => cli::run_score(ScoreConfig {
            target: args.target,
            output: args.output,
            output_file: args.output_file,
            min_score: args.min_score,
            no_color: cli.no_color,
            app: config,
        }),

        Commands::Resolve { url } => cli::run_resolve(&url, &config.hosting),

        Commands::Config { action } => cli::run_config(action, cli.config.as_deref()),

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "repo-trust", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }
    }
}
