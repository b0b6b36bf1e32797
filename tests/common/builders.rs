//! Test data builders for creating test objects

use livetune_rs::{
    frame::{AcquirePolicy, FrameBuffer, FrameQueue},
    tuner::{AccessorField, FieldRegistry, VirtualField},
    types::{FieldKind, FieldValue},
    PresentationQueue,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Stand-in pipeline object with one field per scalar kind and one vector
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub threshold: i64,
    pub gain: f64,
    pub label: String,
    pub enabled: bool,
    pub mode: usize,
    pub roi: [f64; 4],
}

impl Default for Target {
    fn default() -> Self {
        Self {
            threshold: 10,
            gain: 1.0,
            label: "cam0".to_string(),
            enabled: true,
            mode: 0,
            roi: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

pub const MODES: [&str; 3] = ["fast", "balanced", "precise"];

/// Fields over every member of [`Target`]
pub fn target_fields(target: &Arc<Mutex<Target>>) -> Vec<Arc<dyn VirtualField>> {
    vec![
        AccessorField::new(
            "threshold",
            FieldKind::Integer,
            target,
            |t: &Target| FieldValue::Integer(t.threshold),
            |t, v| {
                if let FieldValue::Integer(x) = v {
                    t.threshold = x;
                }
            },
        )
        .shared(),
        AccessorField::new(
            "gain",
            FieldKind::Decimal,
            target,
            |t: &Target| FieldValue::Decimal(t.gain),
            |t, v| {
                if let FieldValue::Decimal(x) = v {
                    t.gain = x;
                }
            },
        )
        .shared(),
        AccessorField::new(
            "label",
            FieldKind::Text,
            target,
            |t: &Target| FieldValue::Text(t.label.clone()),
            |t, v| {
                if let FieldValue::Text(x) = v {
                    t.label = x;
                }
            },
        )
        .shared(),
        AccessorField::new(
            "enabled",
            FieldKind::Boolean,
            target,
            |t: &Target| FieldValue::Boolean(t.enabled),
            |t, v| {
                if let FieldValue::Boolean(x) = v {
                    t.enabled = x;
                }
            },
        )
        .shared(),
        AccessorField::new(
            "mode",
            FieldKind::Enumerated,
            target,
            |t: &Target| FieldValue::Enumerated(t.mode),
            |t, v| {
                if let FieldValue::Enumerated(x) = v {
                    t.mode = x;
                }
            },
        )
        .with_options(MODES)
        .shared(),
        AccessorField::new(
            "roi",
            FieldKind::Rect,
            target,
            |t: &Target| FieldValue::Rect(t.roi),
            |t, v| {
                if let FieldValue::Rect(x) = v {
                    t.roi = x;
                }
            },
        )
        .shared(),
    ]
}

/// Builder for a registry over a fresh [`Target`]
pub struct RegistryBuilder {
    target: Target,
    queue_capacity: Option<usize>,
}

/// Everything a registry test needs to hold on to
pub struct RegistryFixture {
    pub target: Arc<Mutex<Target>>,
    pub registry: FieldRegistry,
    pub presentation: Option<PresentationQueue>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            target: Target::default(),
            queue_capacity: None,
        }
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Attach a presentation queue of `capacity`
    pub fn presentation(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> RegistryFixture {
        let target = Arc::new(Mutex::new(self.target));
        let (presentation, scheduler) = match self.queue_capacity {
            Some(capacity) => {
                let (queue, scheduler) = PresentationQueue::new(capacity);
                (Some(queue), Some(scheduler))
            }
            None => (None, None),
        };
        let registry = FieldRegistry::discover(target_fields(&target), scheduler);
        RegistryFixture {
            target,
            registry,
            presentation,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Small frame queue of 4x4 RGB buffers
pub fn frame_queue(capacity: usize, policy: AcquirePolicy) -> FrameQueue<FrameBuffer> {
    FrameQueue::new(capacity, policy, || FrameBuffer::new(4, 4, 3))
        .expect("valid test queue capacity")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builder() {
        let fixture = RegistryBuilder::new().presentation(8).build();
        assert_eq!(fixture.registry.len(), 6);
        assert!(fixture.registry.exclusions().is_empty());
        assert!(fixture.presentation.is_some());
    }
}
