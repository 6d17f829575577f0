//! livewatch - live session monitor
//!
//! Runs the monitor against a simulated live set and feeds it host
//! commands read from stdin, one per line.
//!
//! # Usage
//!
//! ```bash
//! # Monitor a simulated 4x4 set (default)
//! livewatch
//!
//! # Larger set with every 5th read failing, JSON status output
//! livewatch run --tracks 8 --clips 8 --flaky 5 --json
//!
//! # Show the effective configuration
//! livewatch config
//! ```
//!
//! Status output goes to stdout; diagnostics go to stderr (`RUST_LOG`).

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use livewatch_core::{default_config_path, Configuration};
use livewatch_protocol::{parse_command, Command, HELP_TEXT};
use livewatchd::monitor::{spawn_monitor, MonitorHandle};
use livewatchd::sim::{perform, SimulatedSession};
use livewatchd::{MonitorError, StdoutSink};

const DEFAULT_SIM_TRACKS: usize = 4;
const DEFAULT_SIM_CLIPS: usize = 4;
const DEFAULT_STEP_MS: u64 = 500;
const DEFAULT_LOG_FILTER: &str = "livewatch=info,livewatchd=info,livewatch_core=info";

const TRACK_NAMES: [&str; 8] = ["Drums", "Bass", "Keys", "Pad", "Lead", "Vox", "FX", "Perc"];

/// livewatch - resilient live session monitor
#[derive(Parser, Debug)]
#[command(name = "livewatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Run the monitor against a simulated set (default)
    Run(RunArgs),
    /// Print the effective configuration and exit
    Config {
        /// Config file (default: <config dir>/livewatch/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Config file (default: <config dir>/livewatch/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of tracks in the simulated set
    #[arg(long, default_value_t = DEFAULT_SIM_TRACKS)]
    tracks: usize,

    /// Clip slots per track in the simulated set
    #[arg(long, default_value_t = DEFAULT_SIM_CLIPS)]
    clips: usize,

    /// Make every Nth session read fail
    #[arg(long, value_name = "N")]
    flaky: Option<u64>,

    /// Override the periodic display interval (ms, minimum 1000)
    #[arg(long, value_name = "MS")]
    interval: Option<u64>,

    /// Override the number of tracks monitored
    #[arg(long)]
    max_tracks: Option<usize>,

    /// Override the clip slots monitored per track
    #[arg(long)]
    max_clips: Option<usize>,

    /// Milliseconds between steps of the simulated performance
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_STEP_MS)]
    step_ms: u64,

    /// Print `status`, `quick` and `config` results as JSON
    #[arg(long)]
    json: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            config: None,
            tracks: DEFAULT_SIM_TRACKS,
            clips: DEFAULT_SIM_CLIPS,
            flaky: None,
            interval: None,
            max_tracks: None,
            max_clips: None,
            step_ms: DEFAULT_STEP_MS,
            json: false,
        }
    }
}

impl RunArgs {
    /// Loads the config file, then applies command line overrides.
    fn configuration(&self) -> Result<Configuration> {
        let mut config = Configuration::load_or_default(self.config.as_deref())
            .context("Failed to load configuration")?;
        if let Some(ms) = self.interval {
            config.set_update_interval_ms(ms);
        }
        if let Some(tracks) = self.max_tracks {
            config.set_max_tracks(tracks);
        }
        if let Some(clips) = self.max_clips {
            config.set_max_clips(clips);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or_else(|| CliCommand::Run(RunArgs::default())) {
        CliCommand::Run(args) => run(args),
        CliCommand::Config { config } => show_config(config),
    }
}

fn show_config(path: Option<PathBuf>) -> Result<()> {
    let config =
        Configuration::load_or_default(path.as_deref()).context("Failed to load configuration")?;

    match path.or_else(default_config_path) {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) => println!("Config file: {} (not found, using defaults)", path.display()),
        None => println!("Config file: none (no config directory)"),
    }
    println!("{config}");
    Ok(())
}

#[tokio::main]
async fn run(args: RunArgs) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = args.configuration()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        tracks = args.tracks,
        clips = args.clips,
        "livewatch starting"
    );

    let session = Arc::new(build_session(&args));
    let handle = spawn_monitor(session.clone(), config, Arc::new(StdoutSink));

    let performance_token = CancellationToken::new();
    let performance = tokio::spawn(perform(
        session,
        performance_token.clone(),
        Duration::from_millis(args.step_ms.max(1)),
    ));

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Error waiting for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C");
        signal_token.cancel();
    });

    let result = command_loop(&handle, &shutdown_token, args.json).await;

    performance_token.cancel();
    if let Err(e) = performance.await {
        error!(error = %e, "Simulated performance task failed");
    }

    handle
        .unload()
        .await
        .context("Monitor stopped before unload")?;
    info!("livewatch stopped");
    result
}

/// Builds the simulated set described by the command line.
fn build_session(args: &RunArgs) -> SimulatedSession {
    let session = SimulatedSession::new();
    for index in 0..args.tracks {
        let name = TRACK_NAMES
            .get(index)
            .map(|name| (*name).to_string())
            .unwrap_or_else(|| format!("Track {}", index + 1));
        session.add_track(&name, args.clips);
    }
    if let Some(every) = args.flaky {
        session.flaky_reads(every);
    }
    session
}

/// Reads command lines until `quit`, EOF or shutdown.
async fn command_loop(
    handle: &MonitorHandle,
    shutdown: &CancellationToken,
    json: bool,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),

            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !dispatch(handle, &line, json).await? {
                        return Ok(());
                    }
                }
                Ok(None) => {
                    debug!("stdin closed");
                    return Ok(());
                }
                Err(e) => {
                    error!(error = %e, "Failed to read command");
                    return Ok(());
                }
            }
        }
    }
}

/// Runs one command line. Returns false when the host asked to quit.
async fn dispatch(handle: &MonitorHandle, line: &str, json: bool) -> Result<bool> {
    if line.trim().is_empty() {
        return Ok(true);
    }
    let command = match parse_command(line) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}");
            return Ok(true);
        }
    };
    debug!(%command, "Dispatching command");

    match command {
        Command::Start => {
            handle.start().await?;
        }
        Command::Stop => {
            handle.stop().await?;
        }
        Command::Restart => handle.restart().await?,
        Command::Status => {
            let status = handle.status().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{status}");
            }
        }
        Command::Help => println!("{HELP_TEXT}"),
        Command::Quick => {
            let snapshot = handle.quick().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
        }
        Command::Health => {
            handle.health().await?;
        }
        Command::ShowConfig => {
            let config = handle.config().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("{config}");
            }
        }
        Command::SetConfig { key, value } => match handle.set_config(key, value).await {
            Ok(_) => {}
            Err(MonitorError::Config(e)) => eprintln!("{e}"),
            Err(e) => return Err(e.into()),
        },
        Command::Quit => return Ok(false),
    }
    Ok(true)
}
