use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use stillpoint_core::{
    AppConfig, BreathingMethod, Catalog, Session, SessionClock, SessionEvent, StillpointError,
};
use tracing_subscriber::EnvFilter;

fn main() -> stillpoint_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => run_list(),
        Commands::Guide {
            method,
            minutes,
            sound_out,
        } => run_guide(&method, minutes, sound_out.as_deref()),
        Commands::Render {
            method,
            minutes,
            output,
        } => run_render(&method, minutes, &output),
    }
}

fn run_list() -> stillpoint_core::Result<()> {
    let catalog = Catalog::builtin();
    for method in catalog.methods() {
        println!(
            "{:<16} {:<16} {:<8} {:>5.1}s cycle  {}",
            method.id,
            method.title,
            method.sound_profile,
            method.cycle_seconds(),
            method.description
        );
    }
    Ok(())
}

fn run_guide(
    method_id: &str,
    minutes: u32,
    sound_out: Option<&Path>,
) -> stillpoint_core::Result<()> {
    let config = AppConfig::default();
    let catalog = Catalog::builtin();
    let method = lookup_method(&catalog, method_id)?;
    println!("{} — {} minute session", method.title, minutes);

    // A missing audio sink degrades to a silent, visual-only session.
    let mut sink = match sound_out {
        Some(path) => match WavSink::create(path, config.audio.sample_rate) {
            Ok(sink) => Some(sink),
            Err(err) => {
                tracing::warn!(%err, "audio output unavailable, continuing silently");
                None
            }
        },
        None => None,
    };

    let clock = SessionClock::start();
    let mut session = Session::new(config.audio.sample_rate);
    session.start(method, minutes, clock.now_seconds());

    let mut block = vec![0.0_f32; config.audio.block_size * 2];
    let mut last_label = String::new();

    loop {
        let events = session.advance(clock.now_seconds());

        let phase = session.phase();
        if phase.label != last_label {
            last_label = phase.label.clone();
            println!("{:>5}  {}", format_time(session.remaining_seconds()), last_label);
        }

        if let Some(sink) = sink.as_mut() {
            session.render_audio(&mut block);
            sink.write_block(&block)?;
        }

        if events
            .iter()
            .any(|event| matches!(event, SessionEvent::Ended { .. }))
        {
            break;
        }
        thread::sleep(Duration::from_millis(16));
    }

    if let Some(sink) = sink {
        sink.finalize()?;
    }
    println!("Session complete.");
    Ok(())
}

fn run_render(method_id: &str, minutes: u32, output: &Path) -> stillpoint_core::Result<()> {
    let config = AppConfig::default();
    let catalog = Catalog::builtin();
    let method = lookup_method(&catalog, method_id)?;
    tracing::info!(method = %method.id, minutes, ?output, "rendering session soundscape");

    let sample_rate = config.audio.sample_rate;
    let block_frames = config.audio.block_size;
    let mut sink = WavSink::create(output, sample_rate)?;

    let mut session = Session::new(sample_rate);
    session.start(method, minutes, 0.0);

    let mut block = vec![0.0_f32; block_frames * 2];
    let step = block_frames as f64 / sample_rate as f64;
    let mut now = 0.0_f64;
    let mut ended = false;
    // Keep rendering past the end event so the fade-out tail lands in the file.
    let mut tail_frames = 2 * sample_rate as usize;

    loop {
        let events = session.advance(now);
        session.render_audio(&mut block);
        sink.write_block(&block)?;
        now += step;

        if events
            .iter()
            .any(|event| matches!(event, SessionEvent::Ended { .. }))
        {
            ended = true;
        }
        if ended {
            tail_frames = tail_frames.saturating_sub(block_frames);
            if tail_frames == 0 {
                break;
            }
        }
    }

    sink.finalize()?;
    tracing::info!(?output, "render complete");
    Ok(())
}

fn lookup_method(catalog: &Catalog, id: &str) -> stillpoint_core::Result<BreathingMethod> {
    catalog.get(id).cloned().ok_or_else(|| {
        let available: Vec<&str> = catalog
            .methods()
            .iter()
            .map(|method| method.id.as_str())
            .collect();
        StillpointError::msg(format!(
            "unknown method `{id}` (available: {})",
            available.join(", ")
        ))
    })
}

fn format_time(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Streams interleaved stereo f32 blocks into a WAV file.
struct WavSink {
    writer: hound::WavWriter<std::io::BufWriter<std::fs::File>>,
}

impl WavSink {
    fn create(path: &Path, sample_rate: u32) -> stillpoint_core::Result<Self> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let writer = hound::WavWriter::create(path, spec)
            .map_err(|err| StillpointError::msg(err.to_string()))?;
        Ok(Self { writer })
    }

    fn write_block(&mut self, block: &[f32]) -> stillpoint_core::Result<()> {
        for &sample in block {
            self.writer
                .write_sample(sample)
                .map_err(|err| StillpointError::msg(err.to_string()))?;
        }
        Ok(())
    }

    fn finalize(self) -> stillpoint_core::Result<()> {
        self.writer
            .finalize()
            .map_err(|err| StillpointError::msg(err.to_string()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Guided breathing with an adaptive soundscape", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the built-in breathing method catalog.
    List,
    /// Run a guided session in the terminal in real time.
    Guide {
        /// Method id from the catalog (see `list`).
        #[arg(short, long)]
        method: String,
        /// Session length in minutes.
        #[arg(short = 'n', long, default_value_t = 10)]
        minutes: u32,
        /// Optional WAV file that receives the live soundscape.
        #[arg(long)]
        sound_out: Option<PathBuf>,
    },
    /// Render a full session soundscape to a WAV file, offline.
    Render {
        /// Method id from the catalog (see `list`).
        #[arg(short, long)]
        method: String,
        /// Session length in minutes.
        #[arg(short = 'n', long, default_value_t = 1)]
        minutes: u32,
        /// Output path for the generated WAV file.
        output: PathBuf,
    },
}
