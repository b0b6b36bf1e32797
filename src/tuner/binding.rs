//! Binding between one pipeline field and its widgets
//!
//! A [`FieldBinding`] caches the last value it read from or wrote to its
//! [`VirtualField`] and fires change listeners whenever a sync step finds the
//! value differs from the previous one.
//!
//! # Sync directions
//!
//! - **Pipeline → presentation**: [`FieldBinding::refresh_from_target`] runs
//!   once per iteration on the pipeline thread. On change it notifies
//!   listeners and schedules a widget refresh on the presentation queue.
//! - **Presentation → pipeline**: [`FieldBinding::apply_from_presentation`]
//!   parses user input, writes it through the field and notifies listeners.
//!
//! Both directions hold the binding's state lock for the whole
//! read-compare-write step, so an edit can never interleave with a refresh.
//! Listeners run after the lock is released.

use super::VirtualField;
use crate::error::{Result, TuneError};
use crate::presentation::{PanelConfig, PresentationMode, PresentationScheduler, PresentationTask};
use crate::types::{parse_input, parse_option, FieldKind, FieldValue, InputError, InputMode};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Which side produced a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Detected while refreshing from the running pipeline
    Pipeline,
    /// Written from user input
    Presentation,
}

/// A detected change, passed to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub value: FieldValue,
    pub origin: ChangeOrigin,
}

/// Result of a sync step that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Changed,
    Unchanged,
}

impl SyncOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, SyncOutcome::Changed)
    }
}

/// Change observer
pub type ChangeListener = Arc<dyn Fn(&FieldChange) + Send + Sync>;

struct BindingState {
    current: FieldValue,
    prior: FieldValue,
}

/// Live link between one pipeline field and its displayed representation
pub struct FieldBinding {
    field: Arc<dyn VirtualField>,
    name: String,
    kind: FieldKind,
    options: Vec<String>,
    initial: FieldValue,
    state: Mutex<BindingState>,
    listeners: RwLock<Vec<ChangeListener>>,
    scheduler: Option<PresentationScheduler>,
    recommended: OnceLock<PresentationMode>,
    ignore_presentation_updates: AtomicBool,
}

impl FieldBinding {
    /// Bind a field, capturing its initial value.
    ///
    /// Fails if the initial read fails or returns a value of another kind.
    pub fn new(field: Arc<dyn VirtualField>, scheduler: Option<PresentationScheduler>) -> Result<Self> {
        let name = field.name().to_string();
        let kind = field.kind();
        let initial = field.get()?;
        check_kind(&name, kind, &initial)?;

        let binding = Self {
            options: field.options(),
            field,
            name,
            kind,
            state: Mutex::new(BindingState {
                current: initial.clone(),
                prior: initial.clone(),
            }),
            initial,
            listeners: RwLock::new(Vec::new()),
            scheduler,
            recommended: OnceLock::new(),
            ignore_presentation_updates: AtomicBool::new(false),
        };

        match kind {
            FieldKind::Integer | FieldKind::Decimal => {
                binding.recommend_mode(PresentationMode::TextBoxes);
            }
            FieldKind::Point | FieldKind::Scalar | FieldKind::Rect => {
                binding.recommend_mode(PresentationMode::Sliders);
            }
            _ => {}
        }

        tracing::debug!("Bound field '{}' ({}) = {:?}", binding.name, kind, binding.initial);
        Ok(binding)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn input_mode(&self) -> InputMode {
        self.kind.input_mode()
    }

    /// Value captured when the binding was created
    pub fn initial_value(&self) -> &FieldValue {
        &self.initial
    }

    /// Last value read or written by this binding
    pub fn value(&self) -> FieldValue {
        self.state.lock().current.clone()
    }

    /// Register a change listener
    pub fn subscribe(&self, listener: ChangeListener) {
        self.listeners.write().push(listener);
    }

    /// Re-read the field and report whether it changed since the last sync.
    ///
    /// Call once per pipeline iteration from the pipeline thread.
    pub fn refresh_from_target(&self) -> Result<SyncOutcome> {
        let changed = {
            let mut state = self.state.lock();
            let value = self.field.get()?;
            check_kind(&self.name, self.kind, &value)?;

            let changed = !value.same_as(&state.prior);
            state.current = value;
            state.prior = state.current.clone();
            changed.then(|| state.current.clone())
        };

        let Some(value) = changed else {
            return Ok(SyncOutcome::Unchanged);
        };

        tracing::trace!("Field '{}' changed in pipeline: {:?}", self.name, value);
        if self.ignores_presentation_updates() {
            tracing::trace!("Field '{}' is being edited, widget refresh skipped", self.name);
        } else if let Some(scheduler) = &self.scheduler {
            scheduler.schedule(PresentationTask::RefreshField {
                field: self.name.clone(),
                value: value.clone(),
            });
        }
        self.notify(value, ChangeOrigin::Pipeline);
        Ok(SyncOutcome::Changed)
    }

    /// Apply a single-box user entry. Equivalent to component 0.
    pub fn apply_from_presentation(&self, raw: &str) -> Result<SyncOutcome> {
        self.set_value_from_user_input(0, raw)
    }

    /// Apply user input typed into the text box for `index`.
    ///
    /// Malformed input yields [`TuneError::Parse`] and leaves the field
    /// untouched.
    pub fn set_value_from_user_input(&self, index: usize, raw: &str) -> Result<SyncOutcome> {
        let count = self.rendered_field_count();
        if index >= count {
            return Err(self.out_of_range(index, count));
        }

        let parsed =
            parse_input(self.kind, raw, &self.options).map_err(|e| self.parse_error(raw, e))?;

        self.commit(|current| match (current.components(), &parsed) {
            (Some(_), FieldValue::Decimal(component)) => current
                .with_component(index, *component)
                .ok_or_else(|| self.out_of_range(index, count)),
            _ => Ok(parsed.clone()),
        })
    }

    /// Select an enumerated option by label from the combo box at `index`
    pub fn set_combo_from_user_input(&self, index: usize, label: &str) -> Result<SyncOutcome> {
        let count = self.combo_count();
        if index >= count {
            return Err(self.out_of_range(index, count));
        }
        let selected = parse_option(label, &self.options).map_err(|e| self.parse_error(label, e))?;
        self.commit(|_| Ok(FieldValue::Enumerated(selected)))
    }

    /// Write a typed value
    pub fn apply_value(&self, value: FieldValue) -> Result<SyncOutcome> {
        check_kind(&self.name, self.kind, &value)?;
        if let FieldValue::Enumerated(index) = value {
            if !self.options.is_empty() && index >= self.options.len() {
                return Err(self.parse_error(
                    &index.to_string(),
                    InputError {
                        expected: "one of the listed options",
                    },
                ));
            }
        }
        self.commit(|_| Ok(value.clone()))
    }

    /// Write the initial value back into the target
    pub fn reset_to_initial(&self) -> Result<SyncOutcome> {
        self.apply_value(self.initial.clone())
    }

    fn commit<F>(&self, build: F) -> Result<SyncOutcome>
    where
        F: FnOnce(&FieldValue) -> Result<FieldValue>,
    {
        let value = {
            let mut state = self.state.lock();
            let candidate = build(&state.current)?;
            if candidate.same_as(&state.current) {
                return Ok(SyncOutcome::Unchanged);
            }

            self.field.set(candidate.clone())?;
            state.current = candidate;
            state.prior = state.current.clone();
            state.current.clone()
        };

        tracing::debug!("Field '{}' set from presentation: {:?}", self.name, value);
        self.notify(value, ChangeOrigin::Presentation);
        Ok(SyncOutcome::Changed)
    }

    fn notify(&self, value: FieldValue, origin: ChangeOrigin) {
        // Snapshot so a listener may subscribe without deadlocking
        let listeners = self.listeners.read().clone();
        if listeners.is_empty() {
            return;
        }
        let change = FieldChange {
            field: self.name.clone(),
            value,
            origin,
        };
        for listener in listeners.iter() {
            listener(&change);
        }
    }

    // --- Widget protocol ---

    /// Number of text boxes a widget renders
    pub fn rendered_field_count(&self) -> usize {
        self.kind.component_count()
    }

    /// Number of combo boxes a widget renders
    pub fn combo_count(&self) -> usize {
        self.kind.combo_count()
    }

    /// Value shown in the text box for `index`
    pub fn display_value(&self, index: usize) -> Result<FieldValue> {
        let count = self.rendered_field_count();
        self.state
            .lock()
            .current
            .component(index)
            .ok_or_else(|| self.out_of_range(index, count))
    }

    /// Text for the box at `index`, suitable to feed back as user input
    pub fn format_component(&self, index: usize) -> Result<String> {
        Ok(self.display_value(index)?.format(&self.options))
    }

    /// Labels for the combo box at `index`; empty when there is none
    pub fn combo_options(&self, index: usize) -> &[String] {
        if index < self.combo_count() {
            &self.options
        } else {
            &[]
        }
    }

    /// Suppress widget refreshes while the user is editing this field.
    ///
    /// Refreshes still track the target's value and notify listeners; only
    /// the [`PresentationTask::RefreshField`] scheduling is skipped.
    pub fn set_ignore_presentation_updates(&self, ignore: bool) {
        self.ignore_presentation_updates.store(ignore, Ordering::Relaxed);
    }

    pub fn ignores_presentation_updates(&self) -> bool {
        self.ignore_presentation_updates.load(Ordering::Relaxed)
    }

    /// Advisory rendering mode, if the binding has one
    pub fn recommended_mode(&self) -> Option<PresentationMode> {
        self.recommended.get().copied()
    }

    /// Set the advisory mode; only the first call has any effect
    pub fn recommend_mode(&self, mode: PresentationMode) -> bool {
        self.recommended.set(mode).is_ok()
    }

    /// Mode a panel with `config` should render this field with
    pub fn resolve_mode(&self, config: &PanelConfig) -> PresentationMode {
        config.resolve(self.recommended_mode())
    }

    fn out_of_range(&self, index: usize, count: usize) -> TuneError {
        TuneError::ComponentOutOfRange {
            field: self.name.clone(),
            index,
            count,
        }
    }

    fn parse_error(&self, input: &str, err: InputError) -> TuneError {
        TuneError::Parse {
            field: self.name.clone(),
            input: input.to_string(),
            expected: err.expected,
        }
    }
}

impl std::fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value", &self.state.lock().current)
            .finish()
    }
}

fn check_kind(name: &str, kind: FieldKind, value: &FieldValue) -> Result<()> {
    if value.kind() == kind {
        Ok(())
    } else {
        Err(TuneError::KindMismatch {
            field: name.to_string(),
            expected: kind.to_string(),
            found: value.kind().to_string(),
        })
    }
}
