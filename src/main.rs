//! Record Slicer CLI
//!
//! Slices a synthetic digitizer record stream and prints what comes out.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use crossbeam_channel::bounded;
use record_slicer::{
    config::{Config, OutputMode, Waveform},
    core::{DigitizerParams, RunHeader, Slice, SlicerSession},
    emit::{emitter_for_mode, SliceEvent},
    source::{record_channel, ChannelLayout, SyntheticSource},
    worker::SlicerWorker,
    VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "record-slicer")]
#[command(version = VERSION)]
#[command(about = "Cut a digitizer record stream into fixed-length slices", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the configuration file.
#[derive(clap::Args, Debug, Default)]
struct SliceArgs {
    /// Samples per slice
    #[arg(long)]
    slice_length: Option<usize>,

    /// Samples between slice starts (0 = slice length)
    #[arg(long)]
    stride: Option<usize>,

    /// Samples per channel in each record
    #[arg(long)]
    record_length: Option<usize>,

    /// Channel layout (one, separate, interleaved)
    #[arg(long)]
    layout: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Slice a synthetic record stream
    Run {
        #[command(flatten)]
        slicing: SliceArgs,

        /// Number of records to generate
        #[arg(long)]
        records: Option<u64>,

        /// Start a new acquisition every N records (0 = never)
        #[arg(long)]
        acquisition_every: Option<u64>,

        /// Generate a sine of this frequency instead of a ramp
        #[arg(long)]
        sine_hz: Option<f64>,

        /// Output strategy (stream or buffer)
        #[arg(long)]
        mode: Option<String>,

        /// Print slices as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and show the slice geometry
    Check {
        #[command(flatten)]
        slicing: SliceArgs,
    },

    /// Show configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::config_path);

    match cli.command {
        Commands::Run {
            slicing,
            records,
            acquisition_every,
            sine_hz,
            mode,
            json,
        } => {
            let mut config = load_config(&config_path, &slicing)?;
            if let Some(n) = records {
                config.source.n_records = n;
            }
            if let Some(every) = acquisition_every {
                config.source.acquisition_every = every;
            }
            if let Some(frequency_hz) = sine_hz {
                config.source.waveform = Waveform::Sine { frequency_hz };
            }
            if let Some(name) = mode {
                config.output.mode = match OutputMode::from_name(&name) {
                    Some(m) => m,
                    None => bail!("unknown output mode '{name}' (expected stream or buffer)"),
                };
            }
            cmd_run(&config, json)
        }
        Commands::Check { slicing } => {
            let config = load_config(&config_path, &slicing)?;
            cmd_check(&config)
        }
        Commands::Config { init, force } => cmd_config(&config_path, init, force),
    }
}

fn load_config(path: &Path, overrides: &SliceArgs) -> anyhow::Result<Config> {
    let mut config = Config::load_from(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    if let Some(n) = overrides.slice_length {
        config.slicer.slice_length = n;
    }
    if let Some(n) = overrides.stride {
        config.slicer.stride = n;
    }
    if let Some(n) = overrides.record_length {
        config.acquisition.record_length = n;
    }
    if let Some(name) = &overrides.layout {
        config.acquisition.layout = match ChannelLayout::from_name(name) {
            Some(layout) => layout,
            None => bail!("unknown channel layout '{name}' (expected one, separate or interleaved)"),
        };
    }
    Ok(config)
}

fn cmd_run(config: &Config, json: bool) -> anyhow::Result<()> {
    let (event_tx, event_rx) = bounded::<SliceEvent>(config.output.channel_capacity.max(1));
    let emitter = emitter_for_mode(config.output.mode, event_tx);
    let session = SlicerSession::new(&config.slicer, &config.acquisition, emitter)
        .context("invalid slicing configuration")?;

    let (mut sender, receiver) = record_channel(config.output.channel_capacity);
    let worker = SlicerWorker::spawn(session, receiver).context("failed to start slicer worker")?;
    let stats = worker.stats();

    let cancelled = worker.cancel_flag();
    ctrlc_handler(cancelled.clone())?;

    let source = SyntheticSource::new(&config.acquisition, config.source);
    let stop = cancelled.clone();
    let producer = thread::spawn(move || {
        for record in source {
            if stop.load(Ordering::SeqCst) {
                break;
            }
            if let Err(e) = sender.send(record) {
                warn!("Stopping record source: {e}");
                break;
            }
        }
        sender.sent()
    });

    let mut digitizer: Option<DigitizerParams> = None;
    for event in event_rx.iter() {
        match event {
            SliceEvent::Header(header) => {
                print_header(&header, json);
                digitizer = Some(header.digitizer);
            }
            SliceEvent::Slice(slice) => {
                if let Some(digitizer) = &digitizer {
                    print_slice(&slice, digitizer, json);
                }
            }
            SliceEvent::Finished => break,
        }
    }

    let sent = producer
        .join()
        .map_err(|_| anyhow::anyhow!("record source thread panicked"))?;
    let result = worker.join();

    if cancelled.load(Ordering::SeqCst) {
        info!("Interrupted after {sent} records");
    }
    eprintln!();
    eprintln!("{}", stats.summary());

    result.context("slicing session failed")?;
    Ok(())
}

fn print_header(header: &RunHeader, json: bool) {
    if json {
        match serde_json::to_string(header) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("Could not serialize run header: {e}"),
        }
        return;
    }

    println!("Record Slicer v{VERSION}");
    println!("Session: {}", header.session_id);
    println!("  Description: {}", header.description);
    println!("  Layout: {:?} ({} channel(s))", header.layout, header.n_channels);
    println!(
        "  Slice length: {}, stride: {}, record length: {}",
        header.geometry.slice_length, header.geometry.stride, header.geometry.record_length
    );
    println!();
}

fn print_slice(slice: &Slice, digitizer: &DigitizerParams, json: bool) {
    let summaries: Vec<_> = (0..slice.n_channels())
        .map(|ch| slice.summary(ch, digitizer))
        .collect();
    let h = &slice.header;

    if json {
        let line = serde_json::json!({
            "slice": h.slice_number,
            "new_acquisition": h.is_new_acquisition,
            "time_in_run": h.time_in_run,
            "start": [h.start_record_number, h.start_sample_number],
            "end": [h.end_record_number, h.end_sample_number],
            "channels": summaries,
        });
        println!("{line}");
        return;
    }

    let channels: Vec<String> = summaries
        .iter()
        .map(|s| {
            format!(
                "ch{} mean={:+.4} V sd={:.4} V",
                s.channel, s.mean_volts, s.std_dev_volts
            )
        })
        .collect();
    println!(
        "slice {:>5}{} t={:.6}s records {}:{}..{}:{}  {}",
        h.slice_number,
        if h.is_new_acquisition { "*" } else { " " },
        h.time_in_run,
        h.start_record_number,
        h.start_sample_number,
        h.end_record_number,
        h.end_sample_number,
        channels.join("  ")
    );
}

fn cmd_check(config: &Config) -> anyhow::Result<()> {
    let header = RunHeader::new(&config.slicer, &config.acquisition)
        .context("invalid slicing configuration")?;
    let g = &header.geometry;

    println!("Slice Geometry");
    println!("==============");
    println!();
    println!("  Slice length: {} samples", g.slice_length);
    println!("  Stride: {} samples (gap {})", g.stride, g.gap());
    println!("  Non-overlap fraction: {}", g.non_overlap_fraction());
    println!("  Record length: {} samples", g.record_length);
    println!("  Record size: {} bytes", header.record_bytes());
    println!("  Bin width: {:e} s", g.bin_width());
    println!("  Slice duration: {:e} s", g.bin_width() * g.slice_length as f64);
    println!(
        "  Digitizer: {} bits, {} levels, {:e} V/count",
        header.digitizer.bit_depth, header.digitizer.levels, header.digitizer.voltage_resolution
    );
    Ok(())
}

fn cmd_config(path: &Path, init: bool, force: bool) -> anyhow::Result<()> {
    if init {
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
        Config::default()
            .save_to(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = Config::load_from(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {}", path.display());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(cancelled: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        cancelled.store(true, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")
}

/// Log filter from `RUST_LOG`, falling back to `info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
