// linkaudit - review snapshots of a record-linkage pipeline database

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use linkaudit_cli::exit_codes::{
    review_exit_code, EXIT_CONFIG, EXIT_DB_NOT_FOUND, EXIT_SUCCESS, EXIT_USAGE, EXIT_WRITE,
};
use linkaudit_cli::writer::JsonSiteWriter;
use linkaudit_engine::sink::FamilySummary;
use linkaudit_engine::{generate, tally, ReviewConfig, ReviewError};
use linkaudit_store::SqliteSource;

#[derive(Parser)]
#[command(name = "linkaudit")]
#[command(about = "Paginated, status-annotated review snapshots of a record-linkage database")]
#[command(version)]
struct Cli {
    /// Debug logging
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DatasetArgs {
    /// Pipeline SQLite database (opened read-only)
    #[arg(long, env = "LINKAUDIT_DB", default_value = "../alpha.db")]
    db: PathBuf,

    /// Review config (TOML); defaults to <config dir>/linkaudit/review.toml if present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Records per list page (overrides the config)
    #[arg(long)]
    page_size: Option<usize>,

    /// Fail when a configured family's table is missing instead of skipping it
    #[arg(long)]
    require_tables: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the full JSON snapshot: records, list pages, reports and index
    #[command(after_help = "\
Examples:
  linkaudit generate --db ../alpha.db --output ./docs
  linkaudit generate --db pipeline.db --page-size 500 -v")]
    Generate {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Output directory (created if needed)
        #[arg(long, short = 'o', default_value = "./docs")]
        output: PathBuf,

        /// Write compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },

    /// Classify and aggregate only, then print per-family tallies
    Stats {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Print tallies as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the effective review config as TOML
    Config {
        /// Review config (TOML) to load instead of the default
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Generate { dataset, output, compact } => cmd_generate(dataset, output, compact),
        Commands::Stats { dataset, json } => cmd_stats(dataset, json),
        Commands::Config { config } => cmd_config(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Library crates log through `log`; the subscriber's bridge picks those up.
/// Everything goes to stderr so `stats --json` keeps stdout clean.
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self { code: EXIT_DB_NOT_FOUND, message: msg.into(), hint: None }
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self { code: EXIT_WRITE, message: msg.into(), hint: None }
    }

    /// Create error from an engine error with the matching exit code.
    pub fn review(err: ReviewError) -> Self {
        let code = review_exit_code(&err);
        let hint = match &err {
            ReviewError::ConfigParse(_) | ReviewError::ConfigValidation(_) => {
                Some("run `linkaudit config` to print a valid starting point".to_string())
            }
            ReviewError::Fetch { family, .. } => Some(format!(
                "check the '{family}' table, or remove the family from the config"
            )),
            ReviewError::Sink(_) => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Shared loading
// ============================================================================

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("linkaudit").join("review.toml"))
}

fn load_config(explicit: Option<&Path>) -> Result<ReviewConfig, CliError> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::usage(format!("config not found: {}", path.display())));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(ReviewConfig::default()),
        },
    };

    log::debug!("loading review config from {}", path.display());
    let text = std::fs::read_to_string(&path).map_err(|e| CliError {
        code: EXIT_CONFIG,
        message: format!("cannot read {}: {e}", path.display()),
        hint: None,
    })?;
    ReviewConfig::from_toml(&text).map_err(CliError::review)
}

fn prepare(dataset: &DatasetArgs) -> Result<(SqliteSource, ReviewConfig), CliError> {
    let mut config = load_config(dataset.config.as_deref())?;
    if let Some(page_size) = dataset.page_size {
        config.page_size = page_size;
    }
    if dataset.require_tables {
        config.require_tables = true;
    }
    config.validate().map_err(CliError::review)?;

    if !dataset.db.exists() {
        return Err(CliError::database(format!("database not found: {}", dataset.db.display()))
            .with_hint("pass --db <file> or set LINKAUDIT_DB"));
    }
    let source = SqliteSource::open(&dataset.db)
        .map_err(|e| CliError::database(format!("cannot open {}: {e}", dataset.db.display())))?;
    Ok((source, config))
}

// ============================================================================
// generate
// ============================================================================

fn cmd_generate(dataset: DatasetArgs, output: PathBuf, compact: bool) -> Result<(), CliError> {
    let (source, config) = prepare(&dataset)?;

    let mut writer = JsonSiteWriter::new(&output).map_err(|e| CliError::write(e.to_string()))?;
    if compact {
        writer = writer.compact();
    }

    let index = generate(&source, &config, &mut writer).map_err(CliError::review)?;
    log::info!(
        "wrote {} files for {} families to {}",
        writer.files_written(),
        index.families.len(),
        writer.root().display()
    );
    Ok(())
}

// ============================================================================
// stats
// ============================================================================

fn cmd_stats(dataset: DatasetArgs, json: bool) -> Result<(), CliError> {
    let (source, config) = prepare(&dataset)?;
    let summaries: Vec<FamilySummary> = tally(&source, &config)
        .map_err(CliError::review)?
        .iter()
        .map(|r| r.summary())
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let text = serde_json::to_string_pretty(&summaries)
            .map_err(|e| CliError::write(e.to_string()))?;
        writeln!(out, "{}", text).map_err(|e| CliError::write(e.to_string()))?;
    } else {
        write_stats_table(&mut out, &summaries).map_err(|e| CliError::write(e.to_string()))?;
    }
    Ok(())
}

fn write_stats_table(out: &mut impl Write, summaries: &[FamilySummary]) -> io::Result<()> {
    writeln!(
        out,
        "{:<28} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "family", "records", "total", "valid", "invalid", "blocked", "unknown"
    )?;
    for s in summaries {
        writeln!(
            out,
            "{:<28} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            s.display_name,
            s.records,
            s.stats.total,
            s.stats.valid,
            s.stats.invalid,
            s.stats.blocked,
            s.stats.unknown
        )?;
    }
    Ok(())
}

// ============================================================================
// config
// ============================================================================

fn cmd_config(config: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let text = config.to_toml().map_err(CliError::review)?;
    print!("{}", text);
    Ok(())
}
