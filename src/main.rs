//! OscNet command line tool
//!
//! Inspects saved oscillator networks, replays raw telemetry captures through
//! the sample decoder and manages the settings file.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use oscnet_rs::{
    analysis::FftAnalyzer,
    config::{self, AppConfig},
    link::{LinkSession, MockLink},
    protocol::telemetry::{FramingPolicy, MAX_READ_PER_TICK},
    NetworkEditor, SampleRecorder,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "oscnet", author, version, about, long_about = None)]
struct Args {
    /// Settings file to use instead of the one in the app data directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the coupling matrix and wire frame of a saved network
    Matrix {
        /// Network file (.json / .net)
        network: PathBuf,
    },
    /// Replay a raw telemetry capture through the decoder
    Decode {
        /// Binary capture of the device's telemetry stream
        capture: PathBuf,

        /// Number of oscillator channels in the capture
        #[arg(short = 'n', long)]
        channels: usize,

        /// Bytes delivered per tick (defaults to the per-tick read limit)
        #[arg(long)]
        chunk: Option<usize>,

        /// Handling of a partial group at the end of a tick: drop | carry
        #[arg(long)]
        framing: Option<FramingPolicy>,

        /// Write decoded samples as CSV instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the settings file, or write it with --init
    Config {
        /// Write the current settings (defaults if none exist) to disk
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => AppConfig::load_or_default(),
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config);

    tracing::debug!("Running {:?}", args.command);

    match args.command {
        Command::Matrix { network } => print_matrix(&config, &network),
        Command::Decode {
            capture,
            channels,
            chunk,
            framing,
            output,
        } => decode_capture(&config, &capture, channels, chunk, framing, output.as_deref()),
        Command::Config { init } => show_config(&config, args.config.as_deref(), init),
    }
}

/// Install the stderr subscriber and, when enabled, a daily log file
fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = config
        .logging
        .level
        .clone()
        .unwrap_or_else(|| "info,oscnet_rs=debug".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (file_layer, guard) = match config.logging.log_to_file.then(config::log_dir).flatten() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "oscnet.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

fn print_matrix(config: &AppConfig, path: &Path) -> Result<()> {
    let mut editor = NetworkEditor::from_config(config);
    editor
        .load_file(path)
        .with_context(|| format!("Failed to load network {}", path.display()))?;

    let store = editor.store();
    println!(
        "{} nodes, {} edges",
        store.node_count(),
        store.edge_count()
    );
    for node in store.nodes() {
        println!("  node {:>3}: {:>6.2} Hz  {}", node.id, node.frequency, node.color);
    }

    let matrix = editor.coupling_matrix();
    println!();
    for row in matrix.rows() {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        println!("  {}", cells.join(" "));
    }
    println!();
    println!("{}", matrix);

    if matrix.size() > config.link.max_nodes {
        tracing::warn!(
            "Network has {} nodes; the device accepts at most {}",
            matrix.size(),
            config.link.max_nodes
        );
    }
    Ok(())
}

fn decode_capture(
    config: &AppConfig,
    path: &Path,
    channels: usize,
    chunk: Option<usize>,
    framing: Option<FramingPolicy>,
    output: Option<&Path>,
) -> Result<()> {
    if channels == 0 {
        bail!("--channels must be at least 1");
    }
    let per_tick = chunk.unwrap_or(MAX_READ_PER_TICK).min(MAX_READ_PER_TICK);
    if per_tick == 0 {
        bail!("--chunk must be at least 1");
    }

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let link = MockLink::new(path.display().to_string())
        .with_incoming(&bytes)
        .with_read_chunk(per_tick);
    let device = link.handle();
    let mut session = LinkSession::open(Box::new(link), config.link.clone())?;

    let mut decoder = config.acquisition.decoder(channels);
    if let Some(framing) = framing {
        decoder = decoder.with_framing(framing);
    }

    let ticks = bytes.len().div_ceil(per_tick).max(1);
    let mut recorder = SampleRecorder::with_ticks(channels, config.acquisition.tick_interval(), ticks);
    while !recorder.is_complete() {
        let samples = session.decode_tick(&mut decoder)?;
        recorder.push_tick(&samples);
    }
    if device.pending() > 0 {
        tracing::warn!("{} bytes left undecoded", device.pending());
    }
    session.close();

    let stats = decoder.stats();
    tracing::info!(
        "Decoded {} ticks: {} groups, {} rejected, {} bytes dropped",
        stats.ticks,
        stats.groups_decoded,
        stats.groups_rejected,
        stats.bytes_dropped
    );

    if let Some(output) = output {
        recorder.export_csv(output)?;
        println!("Wrote {} ticks to {}", recorder.len(), output.display());
        return Ok(());
    }

    let sample_rate = config.acquisition.sample_rate_hz();
    let mut analyzer = FftAnalyzer::new();
    println!("{} ticks at {:.1} Hz", recorder.len(), sample_rate);
    for (ch, latest) in decoder.latest().iter().enumerate() {
        let dominant = recorder
            .channel(ch)
            .and_then(|samples| analyzer.dominant_frequency(&samples, sample_rate));
        match dominant {
            Some(freq) => println!("  ch{}: {:.4} V, dominant {:.2} Hz", ch + 1, latest, freq),
            None => println!("  ch{}: {:.4} V", ch + 1, latest),
        }
    }
    Ok(())
}

fn show_config(config: &AppConfig, explicit: Option<&Path>, init: bool) -> Result<()> {
    if init {
        let path = match explicit {
            Some(path) => {
                config.save_to(path)?;
                path.to_path_buf()
            }
            None => config.save()?,
        };
        println!("Wrote settings to {}", path.display());
        return Ok(());
    }

    let location = explicit
        .map(Path::to_path_buf)
        .or_else(config::settings_path);
    match location {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no data directory available"),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
