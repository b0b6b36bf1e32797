//! Closure-backed virtual fields
//!
//! Lets a host expose fields of a target held in `Arc<Mutex<T>>` without a
//! reflection layer: one getter and one setter per field. The field holds a
//! weak reference, so accessors fail with an access error once the target
//! has been unloaded.

use super::VirtualField;
use crate::error::{Result, TuneError};
use crate::types::{FieldKind, FieldValue};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

type Getter<T> = Box<dyn Fn(&T) -> FieldValue + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, FieldValue) + Send + Sync>;

/// A [`VirtualField`] over a shared target, built from accessor closures
pub struct AccessorField<T> {
    name: String,
    kind: FieldKind,
    options: Vec<String>,
    target: Weak<Mutex<T>>,
    getter: Getter<T>,
    setter: Setter<T>,
}

impl<T: Send + 'static> AccessorField<T> {
    /// Create a field over `target`
    ///
    /// The setter is only invoked with values of `kind`.
    pub fn new(
        name: impl Into<String>,
        kind: FieldKind,
        target: &Arc<Mutex<T>>,
        getter: impl Fn(&T) -> FieldValue + Send + Sync + 'static,
        setter: impl Fn(&mut T, FieldValue) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            options: Vec::new(),
            target: Arc::downgrade(target),
            getter: Box::new(getter),
            setter: Box::new(setter),
        }
    }

    /// Attach option labels (for enumerated fields)
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Box into a shareable trait object
    pub fn shared(self) -> Arc<dyn VirtualField> {
        Arc::new(self)
    }

    fn target(&self) -> Result<Arc<Mutex<T>>> {
        self.target
            .upgrade()
            .ok_or_else(|| TuneError::access(&self.name, "target has been unloaded"))
    }

    fn check_kind(&self, value: &FieldValue, direction: &str) -> Result<()> {
        if value.kind() == self.kind {
            Ok(())
        } else {
            Err(TuneError::access(
                &self.name,
                format!(
                    "{} a {} value on a {} field",
                    direction,
                    value.kind(),
                    self.kind
                ),
            ))
        }
    }
}

impl<T: Send + 'static> VirtualField for AccessorField<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> FieldKind {
        self.kind
    }

    fn options(&self) -> Vec<String> {
        self.options.clone()
    }

    fn get(&self) -> Result<FieldValue> {
        let target = self.target()?;
        let value = (self.getter)(&*target.lock());
        self.check_kind(&value, "read")?;
        Ok(value)
    }

    fn set(&self, value: FieldValue) -> Result<()> {
        self.check_kind(&value, "wrote")?;
        let target = self.target()?;
        (self.setter)(&mut *target.lock(), value);
        Ok(())
    }
}
