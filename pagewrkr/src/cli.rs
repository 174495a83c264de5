use clap::{Args, Parser, Subcommand};
use pagewrkr_core::Preset;
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!(
            "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
        ));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"))?;

    let d = match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Duration::from_secs(value),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => Duration::from_millis(value),
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(format!(
                "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
            ));
        }
    };

    if d.is_zero() {
        return Err(format!("duration '{s}' must be positive"));
    }
    Ok(d)
}

fn parse_preset(input: &str) -> Result<Preset, String> {
    input.trim().parse().map_err(|_| {
        format!("unknown preset '{input}' (expected one of: continuous, concurrent, high-load)")
    })
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// Emit one JSON summary line to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "pagewrkr",
    author,
    version,
    about = "Load test and validate a paginated listing endpoint",
    long_about = "pagewrkr fires concurrent bursts of `GET {endpoint}?page=&size=` requests, checks that every page carries a well-formed `items` list, and gates the run on latency, success-rate and data-validity thresholds.",
    after_help = "Examples:\n  pagewrkr run --preset high-load --base-url http://localhost:5000\n  pagewrkr run run.yaml --workers 50 --requests 10\n  BASE_URL=https://shop.example pagewrkr run --preset concurrent --output json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a load test against the listing endpoint
    #[command(
        long_about = "Run a load test described by an optional YAML run file and/or a preset.\n\nCLI flags override values from the run file; the run file overrides the preset."
    )]
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to a YAML run file
    pub config: Option<PathBuf>,

    /// Built-in load shape: continuous, concurrent or high-load
    #[arg(long, value_parser = parse_preset)]
    pub preset: Option<Preset>,

    /// Base URL of the service under test (e.g. http://localhost:5000)
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Number of concurrent workers
    #[arg(long)]
    pub workers: Option<u64>,

    /// Sequential requests per worker
    #[arg(long = "requests")]
    pub requests_per_worker: Option<u64>,

    /// Page size requested (`size` query parameter)
    #[arg(long)]
    pub size: Option<u64>,

    /// Deadline for the whole run (e.g. 10s, 250ms, 1m)
    #[arg(long, value_parser = parse_duration)]
    pub run_timeout: Option<Duration>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Log filter written to stderr (e.g. info, pagewrkr_core=debug); falls back to RUST_LOG
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}
