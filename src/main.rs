//! Foveal demo: synthetic panoramic stream through the foveated pipeline

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use color_eyre::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use foveal::capture::{BufferedSource, SyntheticSource};
use foveal::codec;
use foveal::display::{FrameConsumer, HeadlessDisplay, SimulatedHead};
use foveal::pipeline::{OptimizerPipeline, ViewerOrientation, ViewerState};
use foveal::Config;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("foveal=debug"));

    #[cfg(feature = "profiling")]
    {
        use tracing_subscriber::prelude::*;
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_timer(tracing_subscriber::fmt::time::uptime()))
            .with(tracing_tracy::TracyLayer::default())
            .init();
    }

    #[cfg(not(feature = "profiling"))]
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    init_tracing();

    info!("Foveal launching...");

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    info!("Configuration: {:?}", config);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping");
                    stop.store(true, Ordering::Release);
                }
                Err(e) => warn!("Failed to listen for interrupt: {}", e),
            }
        });
    }

    let head = SimulatedHead::new(
        config.viewer.start_yaw,
        config.viewer.yaw_rate,
        config.viewer.pitch,
        config.viewer.pitch_multiplier,
    );
    let initial = ViewerOrientation::new(config.viewer.start_yaw, head.v_angle(), &config.codec);

    // Report what a single frame compresses to before streaming
    let preview = SyntheticSource::render(config.source.width, config.source.height, 0);
    let compact = codec::encode(&preview, initial.h_angle, initial.v_angle, &config.codec);
    let before = preview.as_raw().len();
    info!("Optimized: {} -> {} bytes ({:.2}%)", before, compact.byte_len(), compact.ratio(before) * 100.0);

    let source = BufferedSource::spawn(
        SyntheticSource::new(config.source.width, config.source.height, config.source.frames),
        config.pipeline.source_queue_capacity,
        config.pipeline.max_leading_empty_frames,
    )?;
    let viewer = Arc::new(ViewerState::new(initial));
    let pipeline = OptimizerPipeline::with_viewer(source, config.codec, &config.pipeline, viewer)?;
    let mut consumer = FrameConsumer::new(pipeline, head, config.codec, &config.pipeline);

    let display_config = config.display.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let mut display = HeadlessDisplay::new(&display_config);
        let summary = display.run(&mut consumer, &stop)?;
        consumer.stop()?;
        Ok::<_, foveal::Error>(summary)
    })
    .await??;

    info!(
        "Shown {} frames, {:.1}ms average latency, {:.1} fps, {:.2}% of full size transferred",
        summary.stats.frames_shown,
        summary.stats.avg_latency_ms,
        summary.stats.avg_fps,
        summary.ratio_percent()
    );

    info!("Foveal shutting down");
    Ok(())
}
