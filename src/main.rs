//! OmniGen: exhaustive fixed-length string enumeration
//!
//! Usage: omnigen --charset <CHARS> --min <N> --max <N> [OPTIONS]

use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use omnigen::config::{
    Charset, LengthRange, RunConfig, WriteErrorPolicy, DEFAULT_GUARD_INTERVAL,
    DEFAULT_PERIODIC_MIN_MB, DEFAULT_PREFLIGHT_MIN_MB, DEFAULT_PROGRESS_INTERVAL,
};
use omnigen::logging::{init_logging, LogFormat, LoggingConfig};
use omnigen::{
    signal, CancellationFlag, GenError, ResourceGuard, RunDriver, RunPhase, SinkKind,
    StdoutProgress,
};

#[derive(Parser)]
#[command(name = "omnigen")]
#[command(version)]
#[command(about = "OmniGen: enumerate every string over a charset and stream it to txt, md and pdf outputs", long_about = None)]
struct Cli {
    /// Characters to combine, in enumeration order
    #[arg(long)]
    charset: String,

    /// Minimum length
    #[arg(long)]
    min: usize,

    /// Maximum length
    #[arg(long)]
    max: usize,

    /// Directory that receives output.txt, output.md and output.pdf
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Output formats to write (txt, md, pdf); repeatable, defaults to all
    #[arg(short, long = "format", value_delimiter = ',')]
    formats: Vec<SinkKind>,

    /// Free space (MB) required before starting
    #[arg(long, default_value_t = DEFAULT_PREFLIGHT_MIN_MB)]
    min_free_mb: u64,

    /// Free space (MB) required at each periodic check
    #[arg(long, default_value_t = DEFAULT_PERIODIC_MIN_MB)]
    periodic_free_mb: u64,

    /// Print the running count every N candidates
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    progress_every: u64,

    /// Re-check free space every N candidates
    #[arg(long, default_value_t = DEFAULT_GUARD_INTERVAL)]
    check_every: u64,

    /// Stop the run on the first output write failure
    #[arg(long)]
    fail_fast: bool,

    /// Diagnostic log level (trace, debug, info, warn, error, off)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Diagnostic log format (text, json)
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

fn main() {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: cli.log_level.clone(),
        format: cli.log_format,
        color: std::io::stderr().is_terminal(),
    };
    if let Err(e) = init_logging(&logging) {
        eprintln!("ERROR: {}", e);
        process::exit(e.exit_code());
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(e.exit_code());
        }
    };

    println!(
        "Starting generation for lengths {}-{} with charset '{}'",
        config.lengths.min(),
        config.lengths.max(),
        config.charset
    );

    let cancel = CancellationFlag::new();
    if let Err(e) = signal::install(cancel.clone()) {
        eprintln!("ERROR: {}", e);
        process::exit(e.exit_code());
    }

    let guard = ResourceGuard::new(&config.output_dir);
    let mut driver = RunDriver::new(config, guard, cancel);
    let report = driver.run(&mut StdoutProgress::new());

    if let Some(e) = &report.error {
        eprintln!("ERROR: {}", e);
    } else if report.sink_failures > 0 {
        eprintln!(
            "ERROR: {} output writes failed; outputs are incomplete",
            report.sink_failures
        );
    }
    match report.phase {
        RunPhase::Cancelled => eprintln!("Stopped early: {}", report),
        _ => eprintln!("{}", report),
    }

    process::exit(report.exit_code());
}

fn build_config(cli: &Cli) -> Result<RunConfig, GenError> {
    let charset = Charset::new(&cli.charset)?;
    let lengths = LengthRange::new(cli.min, cli.max)?;
    let sinks = if cli.formats.is_empty() {
        SinkKind::ALL.to_vec()
    } else {
        cli.formats.clone()
    };
    let policy = if cli.fail_fast {
        WriteErrorPolicy::Abort
    } else {
        WriteErrorPolicy::Continue
    };

    let config = RunConfig::new(charset, lengths)
        .with_output_dir(&cli.output_dir)
        .with_sinks(sinks)
        .with_thresholds(cli.min_free_mb, cli.periodic_free_mb)
        .with_intervals(cli.progress_every, cli.check_every)
        .with_write_error_policy(policy);
    config.validate()?;
    Ok(config)
}
