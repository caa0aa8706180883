//! `skylog run` / `skylog validate`.

use std::path::{Path, PathBuf};

use skylog_io::output::{plan_part_files, write_part_files, write_timeline};
use skylog_io::{load_run_log, IoError, LogName};
use skylog_recon::{ReconConfig, ReconError, ReconResult};

use crate::exit_codes::{
    EXIT_INPUT, EXIT_INVALID_CONFIG, EXIT_NO_DATA_PARTS, EXIT_NO_OBSERVATIONS, EXIT_OUTPUT,
};
use crate::CliError;

pub struct RunArgs {
    pub log: PathBuf,
    pub config: Option<PathBuf>,
    pub detector: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub json: bool,
    pub timeline: Option<PathBuf>,
}

fn recon_err(e: ReconError) -> CliError {
    let code = match e {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::UnsupportedAlgorithm(_) => EXIT_INVALID_CONFIG,
        ReconError::NoDataParts => EXIT_NO_DATA_PARTS,
        ReconError::NoObservations => EXIT_NO_OBSERVATIONS,
        ReconError::FormatError(_) => {
            return CliError::general(e.to_string());
        }
    };
    let hint = match e {
        ReconError::NoDataParts => {
            Some("does the log contain <dataNOCUTS parts=\"n\"/> and clock entries?")
        }
        ReconError::NoObservations => Some("no <weather> entry carried a usable 7-digit code"),
        _ => None,
    };
    let err = CliError::new(code, e.to_string());
    match hint {
        Some(h) => err.with_hint(h),
        None => err,
    }
}

fn input_err(e: IoError) -> CliError {
    CliError::new(EXIT_INPUT, e.to_string())
}

fn output_err(e: IoError) -> CliError {
    CliError::new(EXIT_OUTPUT, e.to_string())
}

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::usage(format!("cannot read config {}: {e}", path.display()))
    })?;
    ReconConfig::from_toml(&text).map_err(recon_err)
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "{}: ok (detector {}, mode {}, remote merge {})",
        config_path.display(),
        config.detector,
        config.assign.mode,
        if config.merges_remote() { "on" } else { "off" },
    );
    Ok(())
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ReconConfig::default(),
    };
    if let Some(detector) = args.detector {
        config.detector = detector;
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.to_string_lossy().into_owned();
    }
    config.validate().map_err(recon_err)?;

    // Fail on a bad file name before doing any work.
    let name = LogName::from_path(&args.log).map_err(|e| {
        input_err(e).with_hint("expected a name like y2024m3d14p1.xml")
    })?;
    let events = load_run_log(&args.log).map_err(input_err)?;
    log::info!("{}: {} event(s)", args.log.display(), events.len());

    let result = skylog_recon::run(&config, &events).map_err(recon_err)?;

    let base = PathBuf::from(&config.output.dir);
    if args.dry_run {
        if !args.json {
            for file in plan_part_files(&base, &name, &result) {
                print!("{}\n  {}", file.path.display(), file.contents);
            }
        }
    } else {
        let written = write_part_files(&base, &name, &result).map_err(output_err)?;
        eprintln!("wrote {} file(s) under {}", written.len(), base.display());
    }

    if let Some(path) = &args.timeline {
        write_timeline(path, &result).map_err(output_err)?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    print_summary(&result);
    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "{}: {} part(s), {} observation(s) accepted ({} local, {} remote, {} promoted)",
        result.meta.detector,
        s.parts,
        s.accepted,
        s.local,
        s.remote,
        s.promoted,
    );
    if s.recovered_stops > 0 || s.discarded_parts > 0 {
        eprintln!(
            "stops: {} recovered ({} fallback), {} part(s) discarded",
            s.recovered_stops, s.fallback_stops, s.discarded_parts,
        );
    }
    if s.corrections_dropped > 0 || s.unrecognized > 0 {
        eprintln!(
            "weather: {} correction(s) dropped, {} unrecognized",
            s.corrections_dropped, s.unrecognized,
        );
    }
}
