//! Live field tuning
//!
//! Exposes typed fields of a running pipeline object for inspection and
//! edit from the presentation thread.
//!
//! # Architecture
//!
//! - [`VirtualField`] - External get/set capability over one field of a target
//! - [`AccessorField`] - Closure-backed [`VirtualField`] over a shared target
//! - [`FieldBinding`] - Change tracking and the widget protocol for one field
//! - [`FieldRegistry`] - All bindings of one target instance
//!
//! The pipeline thread calls [`FieldRegistry::refresh_all`] once per
//! iteration; the presentation thread calls [`FieldRegistry::apply_edit`].
//! Each binding serializes the two so neither observes a partial update.

pub mod accessor;
pub mod binding;
pub mod registry;

pub use accessor::AccessorField;
pub use binding::{ChangeListener, ChangeOrigin, FieldBinding, FieldChange, SyncOutcome};
pub use registry::{Exclusion, FieldRegistry, FieldSnapshot, RefreshReport};

use crate::error::Result;
use crate::types::{FieldKind, FieldValue};

/// Read/write access to one field of a pipeline object
///
/// Supplied by the host's introspection layer. Implementations must be
/// `Send + Sync`: reads happen on the pipeline thread and writes on the
/// presentation thread. Both accessors may fail, for example once the
/// target has been unloaded.
#[cfg_attr(test, mockall::automock)]
pub trait VirtualField: Send + Sync {
    /// Field name, unique within its target
    fn name(&self) -> &str;

    /// Declared kind of the field
    fn kind(&self) -> FieldKind;

    /// Option labels for enumerated fields; empty otherwise
    fn options(&self) -> Vec<String> {
        Vec::new()
    }

    /// Read the current value from the target
    fn get(&self) -> Result<FieldValue>;

    /// Write a new value into the target
    fn set(&self, value: FieldValue) -> Result<()>;
}
