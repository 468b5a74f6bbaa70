//! Patch Feature Extraction CLI
//!
//! Samples random spatio-temporal patches from a directory of clips and
//! writes the resulting training matrix for an external learner.

use clap::{Parser, ValueHint};
use patchvol::{
    assembly::{Assembler, Assembly},
    config::{ClipPolicy, FileConfig},
    metrics::MetricsRegistry,
    output::{write_matrix, Manifest, MatrixFormat},
    source::{ClipLoader, ImageSequenceLoader, SyntheticLoader, SyntheticPattern, SyntheticSpec},
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const DEMO_CLIPS: usize = 4;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Random spatio-temporal patch features from video clips"
)]
struct Cli {
    /// TOML configuration file; command-line flags override it
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Directory holding the clips (one sub-directory of frames per clip)
    #[arg(long, value_hint = ValueHint::DirPath)]
    dir: Option<PathBuf>,

    /// Only use clips whose name starts with this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Patch edge length in x and y
    #[arg(short, long)]
    spatial: Option<usize>,

    /// Patch depth in frames
    #[arg(short, long)]
    temporal: Option<usize>,

    /// Patches sampled per clip
    #[arg(short = 'k', long)]
    patches: Option<usize>,

    /// Master seed for reproducible sampling
    #[arg(long, value_parser = clap::value_parser!(u64).range(..=i64::MAX as u64))]
    seed: Option<u64>,

    /// Clips processed concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Per-clip time limit in seconds
    #[arg(long, value_parser = parse_seconds)]
    clip_timeout: Option<Duration>,

    /// Matrix output path
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Matrix file format
    #[arg(long, value_enum)]
    format: Option<MatrixFormat>,

    /// Skip clips that fail instead of aborting the run
    #[arg(long)]
    skip_bad_clips: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Run on synthetic clips instead of a clip directory
    #[arg(long)]
    demo: bool,
}

impl Cli {
    fn apply(&self, config: &mut FileConfig) {
        let extraction = &mut config.extraction;
        if let Some(spatial) = self.spatial {
            extraction.spatial_size = spatial;
        }
        if let Some(temporal) = self.temporal {
            extraction.temporal_size = temporal;
        }
        if let Some(patches) = self.patches {
            extraction.num_patches = patches;
        }
        if let Some(seed) = self.seed {
            extraction.seed = Some(seed);
        }
        if let Some(workers) = self.workers {
            extraction.workers = workers;
        }
        if self.clip_timeout.is_some() {
            extraction.clip_timeout = self.clip_timeout;
        }
        if self.skip_bad_clips {
            extraction.on_clip_error = ClipPolicy::Skip;
        }
        if let Some(ref dir) = self.dir {
            config.clips.dir = dir.clone();
        }
        if self.prefix.is_some() {
            config.clips.prefix = self.prefix.clone();
        }
        if let Some(ref output) = self.output {
            config.output.path = output.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
    }
}

fn parse_seconds(arg: &str) -> Result<Duration, String> {
    let secs: f64 = arg.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{e}"))
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Patch feature extractor v{}", patchvol::VERSION);

    let mut config = match cli.config {
        Some(ref path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    cli.apply(&mut config);

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || {
            cancel.store(true, Ordering::SeqCst);
        }) {
            warn!("Could not install interrupt handler: {}", e);
        }
    }

    let (loader, clips): (Box<dyn ClipLoader>, Vec<PathBuf>) = if cli.demo {
        info!("Running on {} synthetic clips", DEMO_CLIPS);
        let spec = SyntheticSpec {
            width: 320,
            height: 240,
            frames: 40,
            pattern: SyntheticPattern::Gradient,
        };
        let clips = (0..DEMO_CLIPS)
            .map(|i| PathBuf::from(format!("demo-{i}")))
            .collect();
        (Box::new(SyntheticLoader::new(spec)) as Box<dyn ClipLoader>, clips)
    } else {
        match config.clips.selection().resolve(&config.clips.dir) {
            Ok(clips) => (Box::new(ImageSequenceLoader) as Box<dyn ClipLoader>, clips),
            Err(e) => {
                eprintln!("Failed to list clips: {}", e);
                std::process::exit(1);
            }
        }
    };

    let metrics = match MetricsRegistry::new() {
        Ok(metrics) => metrics,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };

    let assembly = match Assembler::new(loader.as_ref(), config.extraction.clone())
        .with_cancel(&cancel)
        .with_metrics(&metrics)
        .assemble(&clips)
    {
        Ok(assembly) => assembly,
        Err(e) => {
            error!("Extraction failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = write_outputs(&config, &assembly, &metrics) {
        error!("{}", e);
        std::process::exit(1);
    }

    let skipped = assembly.clips.iter().filter(|c| c.skipped.is_some()).count();
    info!(
        "Done: {} x {} matrix from {} clips ({} skipped), master seed {}",
        assembly.matrix.rows(),
        assembly.matrix.columns(),
        assembly.clips.len() - skipped,
        skipped,
        assembly.master_seed
    );
}

fn write_outputs(
    config: &FileConfig,
    assembly: &Assembly,
    metrics: &MetricsRegistry,
) -> Result<(), String> {
    let path = &config.output.path;
    write_matrix(&assembly.matrix, path, config.output.format)
        .map_err(|e| format!("Failed to write matrix: {e}"))?;

    if config.output.manifest {
        Manifest::new(assembly, &config.extraction)
            .write(&Manifest::path_for(path))
            .map_err(|e| format!("Failed to write manifest: {e}"))?;
    }

    if let Some(ref metrics_path) = config.output.metrics {
        metrics
            .write_to(metrics_path)
            .map_err(|e| format!("Failed to write metrics: {e}"))?;
    }
    Ok(())
}
