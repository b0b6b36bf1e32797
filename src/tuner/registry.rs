//! Registry of all bindings for one pipeline instance
//!
//! A registry is built when a pipeline is loaded and dropped when it is
//! unloaded; it is never reused for another instance, so every instance
//! starts from its own baseline values.

use super::binding::{ChangeListener, FieldBinding, SyncOutcome};
use super::VirtualField;
use crate::error::{Result, TuneError};
use crate::presentation::{PresentationScheduler, PresentationTask};
use crate::types::{FieldKind, FieldValue};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// A field left out of the registry, and why
#[derive(Debug)]
pub struct Exclusion {
    pub field: String,
    pub error: TuneError,
}

/// Outcome of one [`FieldRegistry::refresh_all`] pass
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Fields whose value changed, in registry order
    pub changed: Vec<String>,
    /// Fields whose refresh failed
    pub errors: Vec<(String, TuneError)>,
}

impl RefreshReport {
    /// True when every field refreshed without error
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Serializable view of one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSnapshot {
    pub name: String,
    pub kind: FieldKind,
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Ordered set of bindings for one target instance
pub struct FieldRegistry {
    bindings: Vec<FieldBinding>,
    index: HashMap<String, usize>,
    excluded: Vec<Exclusion>,
    scheduler: Option<PresentationScheduler>,
    refresh_guard: Mutex<()>,
}

impl FieldRegistry {
    /// Bind every field, in order.
    ///
    /// Fields whose initial read fails, or whose name repeats an earlier
    /// field, are excluded and reported by [`FieldRegistry::exclusions`].
    pub fn discover<I>(fields: I, scheduler: Option<PresentationScheduler>) -> Self
    where
        I: IntoIterator<Item = Arc<dyn VirtualField>>,
    {
        let mut bindings = Vec::new();
        let mut index = HashMap::new();
        let mut excluded = Vec::new();

        for field in fields {
            let name = field.name().to_string();
            if index.contains_key(&name) {
                tracing::warn!("Excluding duplicate field '{}'", name);
                excluded.push(Exclusion {
                    error: TuneError::DuplicateField(name.clone()),
                    field: name,
                });
                continue;
            }

            match FieldBinding::new(field, scheduler.clone()) {
                Ok(binding) => {
                    index.insert(name, bindings.len());
                    bindings.push(binding);
                }
                Err(e) => {
                    tracing::warn!("Excluding field '{}': {}", name, e);
                    excluded.push(Exclusion {
                        field: name,
                        error: e,
                    });
                }
            }
        }

        tracing::info!(
            "Registered {} fields ({} excluded)",
            bindings.len(),
            excluded.len()
        );

        Self {
            bindings,
            index,
            excluded,
            scheduler,
            refresh_guard: Mutex::new(()),
        }
    }

    /// Fields that could not be bound
    pub fn exclusions(&self) -> &[Exclusion] {
        &self.excluded
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Field names in registry order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.name())
    }

    /// Look up a binding by field name
    pub fn get(&self, name: &str) -> Option<&FieldBinding> {
        self.index.get(name).map(|&i| &self.bindings[i])
    }

    /// Visit every binding in registry order
    pub fn for_each_binding<F>(&self, mut f: F)
    where
        F: FnMut(&FieldBinding),
    {
        for binding in &self.bindings {
            f(binding);
        }
    }

    /// Attach one listener to every binding
    pub fn subscribe_all(&self, listener: ChangeListener) {
        for binding in &self.bindings {
            binding.subscribe(listener.clone());
        }
    }

    /// Refresh every binding from the target, in registry order.
    ///
    /// Called once per pipeline iteration. Overlapping passes are
    /// serialized. A failing field does not stop the pass; its error is
    /// returned in the report and forwarded to the presentation queue.
    pub fn refresh_all(&self) -> RefreshReport {
        let _pass = self.refresh_guard.lock();
        let mut report = RefreshReport::default();

        for binding in &self.bindings {
            match binding.refresh_from_target() {
                Ok(SyncOutcome::Changed) => report.changed.push(binding.name().to_string()),
                Ok(SyncOutcome::Unchanged) => {}
                Err(e) => {
                    tracing::debug!("Refresh of '{}' failed: {}", binding.name(), e);
                    report.errors.push((binding.name().to_string(), e));
                }
            }
        }

        if !report.errors.is_empty() {
            if let Some(scheduler) = &self.scheduler {
                for (field, error) in &report.errors {
                    scheduler.schedule(PresentationTask::FieldError {
                        field: field.clone(),
                        message: error.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Apply a user edit to a single-box field
    pub fn apply_edit(&self, name: &str, raw: &str) -> Result<SyncOutcome> {
        self.binding(name)?.apply_from_presentation(raw)
    }

    /// Apply a user edit to one component of a field
    pub fn apply_component_edit(&self, name: &str, index: usize, raw: &str) -> Result<SyncOutcome> {
        self.binding(name)?.set_value_from_user_input(index, raw)
    }

    /// Write a typed value to a field
    pub fn apply_value(&self, name: &str, value: FieldValue) -> Result<SyncOutcome> {
        self.binding(name)?.apply_value(value)
    }

    /// Current values of every field
    pub fn snapshot(&self) -> Vec<FieldSnapshot> {
        self.bindings
            .iter()
            .map(|b| FieldSnapshot {
                name: b.name().to_string(),
                kind: b.kind(),
                value: b.value(),
                options: b.combo_options(0).to_vec(),
            })
            .collect()
    }

    /// Current values of every field as pretty JSON
    pub fn snapshot_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| TuneError::Serialization(format!("Failed to serialize fields: {}", e)))
    }

    fn binding(&self, name: &str) -> Result<&FieldBinding> {
        self.get(name)
            .ok_or_else(|| TuneError::NotFound(name.to_string()))
    }
}

impl std::fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("bindings", &self.bindings)
            .field("excluded", &self.excluded.len())
            .finish()
    }
}
