// SPDX-License-Identifier: AGPL-3.0-only

//! Butterfly scan over a Farey order.
//!
//! Solves every frequency p/q with q ≤ n and writes one JSON object per
//! frequency (bands mode) or a single JSON array of spectral extremes
//! (`--radius`). Output goes to `--output=FILE` or stdout; progress and the
//! final summary go through `tracing` (`RUST_LOG`, default `info`).
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin butterfly_scan -- \
//!   --order=50 --amplitude=1 --driver=dense --classify=directional --output=farey_50.jsonl
//! ```
//!
//! A JSON config (`--config=FILE`) is loaded first; flags override it.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::process;
use std::time::Instant;

use kohmoto_butterfly::config::ButterflyConfig;
use kohmoto_butterfly::error::{ButterflyError, Result};
use kohmoto_butterfly::pipeline::{self, JsonLinesSink};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct CliArgs {
    config: ButterflyConfig,
    radius: bool,
    output: Option<String>,
}

fn invalid(flag: &str, value: &str, reason: impl std::fmt::Display) -> ButterflyError {
    ButterflyError::InvalidInput(format!("{flag}={value}: {reason}"))
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut config = match args.iter().find_map(|a| a.strip_prefix("--config=")) {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| invalid("--config", path, e))?;
            ButterflyConfig::from_json(&text)?
        }
        None => ButterflyConfig::default(),
    };
    let mut radius = false;
    let mut output = None;

    for arg in &args {
        if let Some(val) = arg.strip_prefix("--order=") {
            config.order = val.parse().map_err(|e| invalid("--order", val, e))?;
        } else if let Some(val) = arg.strip_prefix("--amplitude=") {
            config.amplitude = val.parse().map_err(|e| invalid("--amplitude", val, e))?;
        } else if let Some(val) = arg.strip_prefix("--driver=") {
            config.driver = val.parse()?;
        } else if let Some(val) = arg.strip_prefix("--classify=") {
            config.classification = Some(val.parse()?);
        } else if let Some(val) = arg.strip_prefix("--policy=") {
            config.batch_policy = val.parse()?;
        } else if let Some(val) = arg.strip_prefix("--slack=") {
            config.containment_slack = val.parse().map_err(|e| invalid("--slack", val, e))?;
        } else if let Some(val) = arg.strip_prefix("--output=") {
            output = Some(val.to_string());
        } else if arg == "--descending" {
            config.descending = true;
        } else if arg == "--ends" {
            config.include_ends = true;
        } else if arg == "--radius" {
            radius = true;
        } else if arg == "--sequential" {
            config.parallel = false;
        } else if !arg.starts_with("--config=") {
            return Err(ButterflyError::InvalidInput(format!("unknown argument '{arg}'")));
        }
    }

    config.validate()?;
    Ok(CliArgs {
        config,
        radius,
        output,
    })
}

fn open_output(path: Option<&str>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| invalid("--output", path, e))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let config = &args.config;
    info!(
        order = config.order,
        amplitude = config.amplitude,
        driver = %config.driver,
        frequencies = config.sequence().len(),
        parallel = config.parallel,
        "starting butterfly scan"
    );

    let start = Instant::now();
    let writer = open_output(args.output.as_deref())?;

    if args.radius {
        let points = pipeline::radius_scan(config)?;
        let mut writer = writer;
        serde_json::to_writer_pretty(&mut writer, &points)
            .map_err(|e| ButterflyError::Output(format!("serialize: {e}")))?;
        writeln!(writer).map_err(|e| ButterflyError::Output(format!("write: {e}")))?;
        writer
            .flush()
            .map_err(|e| ButterflyError::Output(format!("flush: {e}")))?;
        info!(points = points.len(), "radius scan written");
    } else {
        let mut sink = JsonLinesSink::new(writer);
        let summary = pipeline::run(config, &mut sink)?;
        sink.into_inner()?;
        info!(
            rows = summary.rows_written,
            skipped = summary.skipped,
            "band scan written"
        );
    }

    info!(wall_s = start.elapsed().as_secs_f64(), "done");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("  {e}");
            eprintln!(
                "  usage: butterfly_scan [--order=N] [--amplitude=V] [--driver=dense|jacobi|lanczos]\n\
                 \x20        [--classify=directional|source] [--slack=S] [--policy=abort|skip]\n\
                 \x20        [--descending] [--ends] [--radius] [--sequential]\n\
                 \x20        [--config=FILE] [--output=FILE]"
            );
            process::exit(2);
        }
    };

    if let Err(e) = run(&args) {
        error!(error = %e, "butterfly scan failed");
        process::exit(1);
    }
}
