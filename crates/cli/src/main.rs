// mroute - period-over-period audit of meter-reading routes

mod audit;
mod exit_codes;
mod narrator;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use meterroute_io::IoError;
use meterroute_recon::AuditError;
use tracing_subscriber::EnvFilter;

use exit_codes::{audit_exit_code, io_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "mroute")]
#[command(about = "Compare two billing-period exports route by route")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log more on stderr (-v info, -vv debug). Otherwise MROUTE_LOG / RUST_LOG apply.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where the two exports come from, plus the optional engine config.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Current-period export (P1)
    #[arg(long, requires = "previous", conflicts_with = "dir", required_unless_present = "dir")]
    pub current: Option<PathBuf>,

    /// Previous-period export (P2)
    #[arg(long, requires = "current", conflicts_with = "dir")]
    pub previous: Option<PathBuf>,

    /// Folder holding both exports; file names starting with 1 / 2 mark current / previous
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// TOML config file (thresholds, lookup policy, column names)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full comparison: enriched units, route table, inconsistencies
    #[command(after_help = "\
Examples:
  mroute compare --current 1_marco.csv --previous 2_fevereiro.csv
  mroute compare --dir exports/ --json
  mroute compare --dir exports/ --output result.json --fail-on-inconsistency")]
    Compare {
        #[command(flatten)]
        input: InputArgs,

        /// Print the result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit 7 when any route is tagged
        #[arg(long)]
        fail_on_inconsistency: bool,
    },

    /// Unit rows per route active in the current period
    Routes {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long)]
        json: bool,
    },

    /// Per-unit view with filters and sorting
    #[command(after_help = "\
Examples:
  mroute units --dir exports/ --gd gd --sort variance --desc
  mroute units --dir exports/ --route 101 --reason 'SEM ACESSO'")]
    Units {
        #[command(flatten)]
        input: InputArgs,

        /// Generation filter
        #[arg(long, value_enum, default_value_t = GdArg::All)]
        gd: GdArg,

        /// Only this route code
        #[arg(long)]
        route: Option<String>,

        /// Only this non-read reason (exact text)
        #[arg(long)]
        reason: Option<String>,

        /// Sort column
        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,

        #[arg(long)]
        json: bool,
    },

    /// Units missing from or new to routes still being read
    Divergences {
        #[command(flatten)]
        input: InputArgs,

        /// Only this route code
        #[arg(long)]
        route: Option<String>,

        /// Only this micro-generation flag
        #[arg(long, value_enum, ignore_case = true)]
        mg: Option<FlagArg>,

        #[arg(long)]
        json: bool,
    },

    /// Units with the same non-read reason in both periods
    Recurring {
        #[command(flatten)]
        input: InputArgs,

        /// Only this reason (exact text)
        #[arg(long)]
        reason: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Totals and route highlights for a written report
    #[command(after_help = "\
The command given to --narrate-with receives the brief as JSON on stdin and
must print the narrative on stdout. On failure a placeholder is shown and the
numbers are unaffected.

Examples:
  mroute brief --dir exports/ --json
  mroute brief --dir exports/ --narrate-with './summarize.sh'")]
    Brief {
        #[command(flatten)]
        input: InputArgs,

        /// Shell command that turns the brief into prose
        #[arg(long, value_name = "CMD")]
        narrate_with: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Config file utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Parse and validate a config file without running
    Validate {
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GdArg {
    All,
    Gd,
    Normal,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortArg {
    Unit,
    Consumer,
    Route,
    Variance,
    InjectionVariance,
    Consumption,
    PriorConsumption,
    Injected,
    InjectedPrior,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FlagArg {
    S,
    P,
    X,
    N,
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<AuditError> for CliError {
    fn from(err: AuditError) -> Self {
        let hint = match err.root() {
            AuditError::MissingRequiredColumn { role } => {
                Some(format!("name the column in --config: [columns] {role} = \"<header>\""))
            }
            AuditError::EmptyOrMalformedFile => Some("the export needs a header line and at least one data line".into()),
            _ => None,
        };
        Self { code: audit_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let hint = match &err {
            IoError::MissingPeriod { .. } => Some("name exports 1_<month>.csv (current) and 2_<month>.csv (previous)".into()),
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("MROUTE_COMMIT"), ")",
        "\nengine:  meterroute-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("MROUTE_TARGET"),
        "\njson contract: currentMonth, previousMonth, comparison, inconsistencies",
    )
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => std::env::var("MROUTE_LOG")
            .ok()
            .and_then(|s| EnvFilter::try_new(s).ok())
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compare { input, json, output, fail_on_inconsistency } => {
            audit::cmd_compare(&input, json, output, fail_on_inconsistency)
        }
        Commands::Routes { input, json } => audit::cmd_routes(&input, json),
        Commands::Units { input, gd, route, reason, sort, desc, json } => {
            audit::cmd_units(&input, gd, route, reason, sort, desc, json)
        }
        Commands::Divergences { input, route, mg, json } => audit::cmd_divergences(&input, route, mg, json),
        Commands::Recurring { input, reason, json } => audit::cmd_recurring(&input, reason, json),
        Commands::Brief { input, narrate_with, json } => audit::cmd_brief(&input, narrate_with, json),
        Commands::Config(ConfigCommands::Validate { file }) => audit::cmd_config_validate(&file),
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
