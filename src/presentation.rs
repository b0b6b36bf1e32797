//! Thread boundary between the pipeline and the presentation layer.
//!
//! Widgets may only be touched on the presentation thread, so the pipeline
//! thread never calls presentation code. Bindings hold a
//! [`PresentationScheduler`] and enqueue [`PresentationTask`] messages; the
//! presentation thread owns the matching [`PresentationQueue`] and drains it
//! on its own refresh cadence.

use crate::types::FieldValue;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

/// Default channel capacity for presentation tasks (pipeline → UI).
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Messages sent from the pipeline thread to the presentation thread.
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationTask {
    /// A field's value changed on the pipeline side; widgets should redraw it.
    RefreshField { field: String, value: FieldValue },

    /// The pipeline failed to read a field during refresh.
    FieldError { field: String, message: String },
}

/// Pipeline-side handle; cheap to clone, one per binding.
#[derive(Debug, Clone)]
pub struct PresentationScheduler {
    tx: Sender<PresentationTask>,
}

impl PresentationScheduler {
    /// Enqueue a task without blocking.
    ///
    /// Returns false when the task was dropped because the queue is full or
    /// the presentation side has gone away.
    pub fn schedule(&self, task: PresentationTask) -> bool {
        match self.tx.try_send(task) {
            Ok(()) => true,
            Err(TrySendError::Full(task)) => {
                tracing::warn!("Presentation queue full, dropping {:?}", task);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::trace!("Presentation queue disconnected");
                false
            }
        }
    }
}

/// Presentation-side handle for receiving tasks.
pub struct PresentationQueue {
    rx: Receiver<PresentationTask>,
}

impl PresentationQueue {
    /// Create a new queue pair: `(queue_for_ui, scheduler_for_pipeline)`.
    pub fn new(capacity: usize) -> (Self, PresentationScheduler) {
        let (tx, rx) = bounded(capacity.max(1));
        (Self { rx }, PresentationScheduler { tx })
    }

    /// Drain all pending tasks.
    pub fn drain(&self) -> Vec<PresentationTask> {
        let mut tasks = Vec::new();
        while let Ok(task) = self.rx.try_recv() {
            tasks.push(task);
        }
        tasks
    }

    /// Try to receive a single task without blocking.
    pub fn try_recv(&self) -> Option<PresentationTask> {
        self.rx.try_recv().ok()
    }

    /// Number of tasks waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// How a panel renders a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PresentationMode {
    /// One text box per component
    #[default]
    TextBoxes,
    /// One slider per component
    Sliders,
}

/// Where a panel's configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConfigSource {
    /// Nobody configured this panel
    #[default]
    GlobalDefault,
    /// The user changed the global panel configuration
    Global,
    /// The user pinned a configuration for this specific field
    Specific,
}

/// Panel configuration as held by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PanelConfig {
    pub mode: PresentationMode,
    pub source: ConfigSource,
}

impl PanelConfig {
    /// Mode to render with, given a binding's recommendation.
    ///
    /// The recommendation only applies while the user has not configured
    /// anything; a pinned or global configuration always wins.
    pub fn resolve(&self, recommended: Option<PresentationMode>) -> PresentationMode {
        match (self.source, recommended) {
            (ConfigSource::GlobalDefault, Some(mode)) => mode,
            _ => self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_drain() {
        let (queue, scheduler) = PresentationQueue::new(8);
        assert!(scheduler.schedule(PresentationTask::RefreshField {
            field: "gain".to_string(),
            value: FieldValue::Decimal(1.5),
        }));
        assert_eq!(queue.len(), 1);

        let tasks = queue.drain();
        assert_eq!(tasks.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_drops() {
        let (queue, scheduler) = PresentationQueue::new(1);
        let task = PresentationTask::FieldError {
            field: "x".to_string(),
            message: "gone".to_string(),
        };
        assert!(scheduler.schedule(task.clone()));
        assert!(!scheduler.schedule(task));
        assert_eq!(queue.drain().len(), 1);
    }

    #[test]
    fn test_disconnected_drops() {
        let (queue, scheduler) = PresentationQueue::new(4);
        drop(queue);
        assert!(!scheduler.schedule(PresentationTask::FieldError {
            field: "x".to_string(),
            message: "gone".to_string(),
        }));
    }

    #[test]
    fn test_recommendation_only_applies_to_default_source() {
        let default = PanelConfig::default();
        assert_eq!(
            default.resolve(Some(PresentationMode::Sliders)),
            PresentationMode::Sliders
        );
        assert_eq!(default.resolve(None), PresentationMode::TextBoxes);

        let pinned = PanelConfig {
            mode: PresentationMode::TextBoxes,
            source: ConfigSource::Specific,
        };
        assert_eq!(
            pinned.resolve(Some(PresentationMode::Sliders)),
            PresentationMode::TextBoxes
        );

        let global = PanelConfig {
            mode: PresentationMode::Sliders,
            source: ConfigSource::Global,
        };
        assert_eq!(
            global.resolve(Some(PresentationMode::TextBoxes)),
            PresentationMode::Sliders
        );
    }
}
