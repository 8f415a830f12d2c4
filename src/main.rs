use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use record_extra::{composition::SyncEngine, config::Config, transcode::FfmpegTranscoder};

#[derive(Parser)]
#[command(
    name = "record-extra",
    version,
    about = "Rebuild an extra video track from recorded play/pause events",
    long_about = "Produce the video that was shown on an extra track during a recording.\n\n\
Events are tokens 'record_time-action[-extra_time]' where record_time is the\n\
recording time in seconds, action is play or pause, and extra_time is the\n\
position in the extra video. An omitted extra_time is carried forward from the\n\
previous event. The last event marks the end of the recording.\n\n\
Example: ['0.0-play-0.0', '1.0-pause-1.0', '2.0-play-1.0', '4.0-pause-1.0', '6.0-pause']"
)]
struct Cli {
    /// Extra video file
    #[arg(short, long)]
    input: PathBuf,

    /// Output video file path
    #[arg(short, long)]
    output: PathBuf,

    /// Event list, e.g. "['0.0-play-0.0', '3.0-pause']"
    #[arg(short, long)]
    events: String,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the clip plan as JSON without transcoding anything
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging, RUST_LOG wins over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting record-extra v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => Config::default(),
    };
    config.validate()?;

    let transcoder = FfmpegTranscoder::new(config.transcoder.clone(), config.concat.mode);
    transcoder.check_available().await?;

    let engine = SyncEngine::new(config, transcoder);

    if cli.dry_run {
        let plan = engine.plan(&cli.input, &cli.events).await?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    match engine.render(&cli.input, &cli.output, &cli.events).await {
        Ok(report) => {
            info!(
                "Rendered {} clips ({} skipped) into {:?}, {:.3}s",
                report.clips, report.skipped, report.output.path, report.output.duration
            );
            Ok(())
        }
        Err(e) => {
            error!("{}", e.user_message());
            Err(e.into())
        }
    }
}
