//! Pipeline thread loop.
//!
//! Each iteration fills one frame in place, posts it to the frame queue and
//! then refreshes every field binding from the target. This loop is the only
//! place either happens; the presentation thread only polls and edits.
//!
//! # Shutdown
//!
//! Under the blocking acquire policy the loop may be parked waiting for the
//! consumer to release a frame. [`PipelineHandle::shutdown`] clears the queue
//! until the thread exits, so a stalled consumer cannot hang teardown. The
//! registry and queue must not be dropped before the thread is joined.

use crate::error::Result;
use crate::frame::{FrameBuffer, FrameQueue};
use crate::tuner::FieldRegistry;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Per-iteration processing of a pipeline target
pub trait FrameSource: Send + 'static {
    /// Render iteration `iteration` into `frame`, overwriting it in place
    fn process(&mut self, iteration: u64, frame: &mut FrameBuffer);
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub frames_posted: u64,
    pub field_changes: u64,
    pub refresh_errors: u64,
    pub post_errors: u64,
}

/// Drives a [`FrameSource`] on its own thread
pub struct PipelineRunner<S> {
    target: Arc<Mutex<S>>,
    registry: Arc<FieldRegistry>,
    queue: Arc<FrameQueue<FrameBuffer>>,
    running: Arc<AtomicBool>,
    interval: Duration,
    max_iterations: u64,
}

impl<S: FrameSource> PipelineRunner<S> {
    pub fn new(
        target: Arc<Mutex<S>>,
        registry: Arc<FieldRegistry>,
        queue: Arc<FrameQueue<FrameBuffer>>,
    ) -> Self {
        Self {
            target,
            registry,
            queue,
            running: Arc::new(AtomicBool::new(true)),
            interval: Duration::ZERO,
            max_iterations: 0,
        }
    }

    /// Minimum time between iteration starts
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop after `iterations` iterations (0 runs until stopped)
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Flag that keeps the loop alive; clear it to stop
    pub fn running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Run one iteration
    pub fn step(&self, iteration: u64, summary: &mut RunSummary) -> Result<()> {
        let posted = self.queue.produce(|frame| {
            frame.sequence = iteration;
            self.target.lock().process(iteration, frame);
        });

        let report = self.registry.refresh_all();
        summary.iterations += 1;
        summary.field_changes += report.changed.len() as u64;
        summary.refresh_errors += report.errors.len() as u64;

        match posted {
            Ok(()) => {
                summary.frames_posted += 1;
                Ok(())
            }
            Err(e) => {
                summary.post_errors += 1;
                Err(e)
            }
        }
    }

    /// Run until stopped or the iteration limit is reached
    pub fn run(&self) -> RunSummary {
        tracing::info!("Pipeline thread started");
        let mut summary = RunSummary::default();
        let mut iteration = 0u64;

        while self.running.load(Ordering::Relaxed) {
            if self.max_iterations != 0 && iteration >= self.max_iterations {
                break;
            }

            let started = Instant::now();
            if let Err(e) = self.step(iteration, &mut summary) {
                tracing::warn!("Iteration {} failed to post frame: {}", iteration, e);
            }
            iteration += 1;

            self.rate_limit(started);
        }

        self.running.store(false, Ordering::Relaxed);
        tracing::info!(
            "Pipeline thread exiting after {} iterations",
            summary.iterations
        );
        summary
    }

    /// Move the loop onto a new thread
    pub fn spawn(self) -> Result<PipelineHandle> {
        let running = self.running.clone();
        let queue = self.queue.clone();
        let thread = std::thread::Builder::new()
            .name("pipeline".to_string())
            .spawn(move || self.run())?;
        Ok(PipelineHandle {
            running,
            queue,
            thread,
        })
    }

    fn rate_limit(&self, started: Instant) {
        if self.interval.is_zero() {
            return;
        }
        let elapsed = started.elapsed();
        if elapsed < self.interval {
            std::thread::sleep(self.interval - elapsed);
        }
    }
}

/// Handle to a spawned pipeline thread
pub struct PipelineHandle {
    running: Arc<AtomicBool>,
    queue: Arc<FrameQueue<FrameBuffer>>,
    thread: JoinHandle<RunSummary>,
}

impl PipelineHandle {
    /// Whether the loop is still running
    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Ask the loop to stop after its current iteration
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Stop the loop and join it, releasing queued frames so a producer
    /// blocked on the pool can observe the stop
    pub fn shutdown(self) -> RunSummary {
        self.stop();
        while !self.thread.is_finished() {
            self.queue.clear();
            std::thread::sleep(Duration::from_millis(1));
        }
        self.join()
    }

    /// Wait for the loop to finish on its own
    pub fn join(self) -> RunSummary {
        match self.thread.join() {
            Ok(summary) => summary,
            Err(_) => {
                tracing::error!("Pipeline thread panicked");
                RunSummary::default()
            }
        }
    }
}
