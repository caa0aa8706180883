// skylog CLI - reconcile run logs into per-part sky-condition files

mod exit_codes;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  skylog-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

#[derive(Parser)]
#[command(name = "skylog")]
#[command(about = "Per-data-part sky conditions from observation run logs")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one run log and write a weather file per data part
    #[command(after_help = "\
Examples:
  skylog run y2024m3d14p1.xml
  skylog run y2024m3d14p1.xml -d brtax4 --output-dir /data/weather_files
  skylog run y2024m3d14p1.xml --config skylog.toml --dry-run
  skylog run y2024m3d14p1.xml --json --timeline night.json")]
    Run {
        /// XML run log; its file name must carry year, month and day digit groups
        log: PathBuf,

        /// TOML config file (defaults apply when omitted)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Detector name, overrides the config
        #[arg(long, short = 'd', env = "SKYLOG_DETECTOR")]
        detector: Option<String>,

        /// Root directory for per-part files, overrides the config
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the per-part lines instead of writing files
        #[arg(long)]
        dry_run: bool,

        /// Print the full result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the night's timeline (part boundaries, observation times) as JSON
        #[arg(long)]
        timeline: Option<PathBuf>,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  skylog validate skylog.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run { log, config, detector, output_dir, dry_run, json, timeline } => {
            run::cmd_run(run::RunArgs {
                log,
                config,
                detector,
                output_dir,
                dry_run,
                json,
                timeline,
            })
        }
        Commands::Validate { config } => run::cmd_validate(config),
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

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
