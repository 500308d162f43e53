//! flacforge - automated transcoding of owned lossless releases.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flacforge_core::{
    load_config, select_detector, validate_config, AutoConfirm, Config, Confirmer, Encoder,
    FatalError, FfmpegEncoder, FfprobeTagChecker, GazelleClient, PipelineDeps, PipelineDriver,
    RunOptions, SeenSet, StdinConfirmer, TagChecker, TorrentPackager,
};
use flacforge_core::tracker::GazelleConfig;

/// Command-line arguments for flacforge
#[derive(Parser, Debug)]
#[command(name = "flacforge")]
#[command(about = "Transcodes owned lossless releases into missing formats")]
#[command(version)]
struct Args {
    /// Explicit release references (permalinks or GROUPID:RELEASEID pairs).
    /// Without any, the whole owned catalog is considered.
    references: Vec<String>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml", env = "FLACFORGE_CONFIG")]
    config: PathBuf,

    /// Stop after the first successfully produced format per release
    #[arg(long)]
    single: bool,

    /// Answer yes to every upload confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Encode and package but never upload
    #[arg(long)]
    no_publish: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => {}
        Err(RunError::Fatal(e)) => {
            error!("Fatal error: {}", e);
            std::process::exit(e.exit_code());
        }
        Err(RunError::Other(e)) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

enum RunError {
    Fatal(FatalError),
    Other(anyhow::Error),
}

impl From<FatalError> for RunError {
    fn from(e: FatalError) -> Self {
        Self::Fatal(e)
    }
}

impl From<anyhow::Error> for RunError {
    fn from(e: anyhow::Error) -> Self {
        Self::Other(e)
    }
}

async fn run(args: Args) -> Result<(), RunError> {
    info!("Loading configuration from {:?}", args.config);
    let config = load_config(&args.config)
        .map_err(FatalError::from)?;
    validate_config(&config).map_err(FatalError::from)?;

    let deps = build_deps(&config, args.yes).await?;

    let mut seen = SeenSet::load(&config.library.cache_path)
        .await
        .map_err(|e| FatalError::SeenStore(e.to_string()))?;
    info!(
        "Seen set loaded from {:?} ({} entries)",
        config.library.cache_path,
        seen.len()
    );

    let options = RunOptions {
        references: args.references,
        single: args.single,
        publish: !args.no_publish,
    };

    let driver = PipelineDriver::new(config, deps);
    let summary = driver.run(&mut seen, &options).await?;

    if summary.formats_failed > 0 {
        warn!("{} format attempt(s) failed; see the log above", summary.formats_failed);
    }
    Ok(())
}

async fn build_deps(config: &Config, auto_confirm: bool) -> Result<PipelineDeps, RunError> {
    let tracker = GazelleClient::new(GazelleConfig::from(&config.tracker))
        .map_err(|e| FatalError::Tracker(format!("cannot build tracker client: {}", e)))?;

    let encoder = FfmpegEncoder::new(config.encoder.clone());
    encoder
        .validate()
        .await
        .context("Encoder validation failed (is ffmpeg installed?)")?;

    let tag_checker: Arc<dyn TagChecker> =
        Arc::new(FfprobeTagChecker::new(config.encoder.ffprobe_path.clone()));

    let detector = select_detector(&config.detector);
    if detector.is_none() {
        warn!("No transcode detection tool available; runs needing detection will abort");
    }

    let confirmer: Arc<dyn Confirmer> =
        if auto_confirm || !config.publish.require_confirmation {
            Arc::new(AutoConfirm)
        } else {
            Arc::new(StdinConfirmer)
        };

    Ok(PipelineDeps {
        tracker: Arc::new(tracker),
        tag_checker,
        detector,
        encoder: Arc::new(encoder),
        packager: Arc::new(TorrentPackager::new()),
        confirmer,
    })
}
