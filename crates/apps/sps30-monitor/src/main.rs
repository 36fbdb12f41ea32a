mod config;
mod monitor;
mod output;
mod sensor;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use shdlc::{SerialTransport, Shdlc};

use crate::config::AppConfig;
use crate::output::Printer;
use crate::sensor::{Sensor, SensorKind};

#[derive(Parser, Debug)]
#[command(name = "sps30-monitor", about = "Read Sensirion SHDLC sensors over a serial port", version)]
struct Cli {
    /// TOML file with [serial], [shdlc] and [monitor] tables.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    device: Option<String>,

    #[arg(long)]
    baud_rate: Option<u32>,

    #[arg(long, value_enum)]
    sensor: Option<SensorKind>,

    /// Print one JSON object per line.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Print serial number and version information.
    Info,
    /// Take a fixed number of readings.
    Measure {
        #[arg(long, default_value_t = 10)]
        count: u32,
        #[arg(long, default_value_t = 1_000)]
        interval_ms: u64,
    },
    /// Alternate measuring and idling.
    Monitor {
        #[arg(long)]
        cycles: Option<u64>,
    },
    /// Start manual fan cleaning (SPS30).
    Clean,
    /// Show, or set with --days, the fan auto-cleaning interval (SPS30).
    AutoClean {
        #[arg(long)]
        days: Option<u8>,
    },
    /// Send a soft reset.
    Reset,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("sps30-monitor error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.apply_overrides(cli.device, cli.baud_rate, cli.sensor);

    let mut shdlc = Shdlc::with_config(SerialTransport::new(config.serial.clone()), config.shdlc);
    shdlc
        .open()
        .with_context(|| format!("failed to open serial device {}", config.serial.device))?;

    let mut sensor = Sensor::new(config.monitor.sensor, shdlc);
    let mut printer = Printer::new(io::stdout().lock(), cli.json);

    let result = match cli.command {
        Command::Info => monitor::info(&mut sensor, &mut printer),
        Command::Measure { count, interval_ms } => {
            monitor::measure(&mut sensor, &mut printer, count, Duration::from_millis(interval_ms))
        }
        Command::Monitor { cycles } => {
            monitor::monitor(&mut sensor, &mut printer, &config.monitor, cycles)
        }
        Command::Clean => monitor::clean(&mut sensor, &mut printer),
        Command::AutoClean { days } => monitor::auto_clean(&mut sensor, &mut printer, days),
        Command::Reset => monitor::reset(&mut sensor, &mut printer),
    };

    if let Err(err) = printer.into_inner().flush() {
        log::warn!("failed to flush output: {err}");
    }
    if let Err(err) = sensor.into_inner().close() {
        log::warn!("failed to close serial device: {err}");
    }
    result
}
