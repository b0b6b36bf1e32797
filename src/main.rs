//! LiveTune demo - Main Entry Point
//!
//! Runs the gradient pipeline on its own thread and drives it from a
//! headless presentation loop that consumes frames and applies a scripted
//! series of field edits. Pass a config file path as the first argument to
//! override the default location.

use anyhow::Context;
use livetune_rs::{
    config::{default_config_path, TuneConfig},
    frame::{FrameBuffer, FrameQueue},
    pipeline::{gradient_fields, GradientPipeline, PipelineRunner},
    presentation::{PresentationQueue, PresentationTask},
    tuner::FieldRegistry,
};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Edits applied by the presentation loop, keyed by loop tick
const SCRIPTED_EDITS: &[(u64, &str, &str)] = &[
    (5, "gain", "1.5"),
    (10, "direction", "diagonal"),
    (15, "offset", "0x20"),
    (20, "invert", "true"),
    (25, "gain", "not a number"),
    (30, "label", "tuned"),
    (35, "invert", "false"),
];

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,livetune_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LiveTune demo");

    let config = match std::env::args().nth(1).map(PathBuf::from).or_else(default_config_path) {
        Some(path) => {
            tracing::info!("Using config {}", path.display());
            TuneConfig::load_or_default(&path)
        }
        None => TuneConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    let (presentation, scheduler) = PresentationQueue::new(config.presentation.queue_capacity);

    let target = Arc::new(Mutex::new(GradientPipeline::default()));
    let registry = Arc::new(FieldRegistry::discover(
        gradient_fields(&target),
        Some(scheduler),
    ));

    let fq = &config.frame_queue;
    let (width, height, channels) = (fq.width, fq.height, fq.channels);
    let queue = Arc::new(
        FrameQueue::new(fq.capacity, fq.acquire_policy, || {
            FrameBuffer::new(width, height, channels)
        })
        .context("Failed to create frame queue")?,
    );

    let interval = Duration::from_millis(config.pipeline.iteration_interval_ms);
    let handle = PipelineRunner::new(target.clone(), registry.clone(), queue.clone())
        .with_interval(interval)
        .with_max_iterations(config.pipeline.iterations)
        .spawn()
        .context("Failed to spawn pipeline thread")?;

    let mut tick = 0u64;
    let mut frames_seen = 0u64;
    let mut last_sequence = None;

    while handle.is_running() {
        if let Some(frame) = queue.poll_latest() {
            frames_seen += 1;
            last_sequence = Some(frame.sequence);
            queue.release(frame)?;
        }

        for task in presentation.drain() {
            match task {
                PresentationTask::RefreshField { field, value } => {
                    tracing::trace!("Refresh {} = {:?}", field, value);
                }
                PresentationTask::FieldError { field, message } => {
                    tracing::warn!("Field '{}' unreadable: {}", field, message);
                }
            }
        }

        for (_, field, raw) in SCRIPTED_EDITS.iter().filter(|(at, _, _)| *at == tick) {
            match registry.apply_edit(field, raw) {
                Ok(outcome) => tracing::info!("Edit {} = {:?} ({:?})", field, raw, outcome),
                Err(e) if e.is_validation() => {
                    tracing::warn!("Rejected edit of {}: {}", field, e)
                }
                Err(e) => return Err(e).context(format!("Failed to edit {}", field)),
            }
        }

        tick += 1;
        std::thread::sleep(interval.max(Duration::from_millis(1)));
    }

    let summary = handle.shutdown();
    let stats = queue.stats();
    tracing::info!(
        "Pipeline ran {} iterations, presented {} frames (last #{:?}), {} evicted",
        summary.iterations,
        frames_seen,
        last_sequence,
        stats.evicted
    );

    println!("{}", registry.snapshot_json()?);
    Ok(())
}
