//! Hand-written [`VirtualField`] doubles for failure paths

use livetune_rs::{
    error::{Result, TuneError},
    tuner::VirtualField,
    types::{FieldKind, FieldValue},
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// A field whose reads and writes can be made to fail on demand
pub struct FlakyField {
    name: String,
    value: Mutex<FieldValue>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    pub writes: AtomicUsize,
}

impl FlakyField {
    pub fn new(name: &str, value: FieldValue) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            value: Mutex::new(value),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        })
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Change the value behind the binding's back
    pub fn poke(&self, value: FieldValue) {
        *self.value.lock() = value;
    }

    pub fn peek(&self) -> FieldValue {
        self.value.lock().clone()
    }
}

impl VirtualField for FlakyField {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> FieldKind {
        self.value.lock().kind()
    }

    fn get(&self) -> Result<FieldValue> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(TuneError::access(&self.name, "read failed"));
        }
        Ok(self.value.lock().clone())
    }

    fn set(&self, value: FieldValue) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TuneError::access(&self.name, "write failed"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.value.lock() = value;
        Ok(())
    }
}
