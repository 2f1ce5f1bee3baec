//! Mastery tutor - adaptive Mandarin practice
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tutor::cli::practice::PracticeOptions;
use tutor::cli::queue::QueueOptions;
use tutor::cli::status::StatusOptions;
use tutor::cli::topics::TopicsOptions;
use tutor::cli::{PracticeCommand, QueueCommand, StatusCommand, TopicsCommand};
use tutor::config::{tutor_home, Config};
use tutor::error::exit_codes;
use tutor::exercises::ExerciseFamily;
use tutor::storage::{FileContentStore, FileMasteryStore};

// =============================================================================
// CLI Definition
// =============================================================================

/// Mastery tutor - adaptive Mandarin practice
#[derive(Parser)]
#[command(name = "tutor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log scheduling decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive practice session
    Practice {
        /// Drill one topic until it is mastered (e.g. "pronouns")
        #[arg(long)]
        cluster: Option<String>,
        /// Preferred exercise family (mc, fill, reorder)
        #[arg(long)]
        family: Option<ExerciseFamily>,
        /// Print the session summary as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress the session summary
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show the items the next session would cover
    Queue {
        /// Number of items
        #[arg(long, short)]
        size: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show topic progress
    Topics {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show per-item mastery
    Status {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("tutor error: {}", e);
            ExitCode::from(exit_codes::FAILURE as u8)
        }
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise warnings only, or debug with
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.tutor/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("tutor panic: {}", info);

        if let Some(home) = tutor_home() {
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Run the CLI and return the exit code.
fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = Config::load_from_cwd(&cwd);

    match cli.command {
        Commands::Practice {
            cluster,
            family,
            json,
            quiet,
        } => run_practice(
            PracticeOptions {
                json,
                quiet,
                cluster,
                family,
            },
            config,
            &cwd,
        ),
        Commands::Queue { size, json, quiet } => {
            run_queue(QueueOptions { json, quiet, size }, config, &cwd)
        }
        Commands::Topics { json, quiet } => run_topics(TopicsOptions { json, quiet }, config, &cwd),
        Commands::Status { json, quiet } => run_status(StatusOptions { json, quiet }, config, &cwd),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn stores(config: &Config, cwd: &Path) -> (FileContentStore, FileMasteryStore) {
    let content = FileContentStore::with_dir(config.data_dir(cwd));
    let mastery = FileMasteryStore::with_path(config.state_file(cwd));
    tracing::debug!(
        data_dir = %content.data_dir().display(),
        state_file = %mastery.path().display(),
        "resolved stores"
    );
    (content, mastery)
}

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::FAILURE as u8)
    }
}

fn print(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted);
    }
}

fn run_practice(
    options: PracticeOptions,
    config: Config,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (content, mastery) = stores(&config, cwd);
    let cmd = PracticeCommand::new(content, mastery, config);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let output = cmd.run(&options, &mut stdin.lock(), &mut stdout.lock());
    print(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_queue(
    options: QueueOptions,
    config: Config,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (content, mastery) = stores(&config, cwd);
    let cmd = QueueCommand::new(content, mastery, config);

    let output = cmd.run(&options);
    print(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_topics(
    options: TopicsOptions,
    config: Config,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (content, mastery) = stores(&config, cwd);
    let cmd = TopicsCommand::new(content, mastery, config);

    let output = cmd.run(&options);
    print(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_status(
    options: StatusOptions,
    config: Config,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (content, mastery) = stores(&config, cwd);
    let cmd = StatusCommand::new(content, mastery, config);

    let output = cmd.run(&options);
    print(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}
