//! The live editing session: the current card plus the single-flight guard
//! for AI updates.
//!
//! Manual edits are always accepted, even while an AI update is pending. When
//! the pending update commits it replaces the whole record, so any manual edit
//! made in between is overwritten (last writer wins, no merge).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{CardField, CardRecord};

#[derive(Debug, Default)]
pub struct Editor {
    record: Mutex<CardRecord>,
    pending: AtomicBool,
}

impl Editor {
    pub fn new(record: CardRecord) -> Self {
        Self {
            record: Mutex::new(record),
            pending: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CardRecord> {
        // The record is replaced wholesale, so a poisoned lock still holds a
        // consistent value.
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> CardRecord {
        self.lock().clone()
    }

    /// Set one field and return the resulting record.
    pub fn patch_field(&self, field: CardField, value: impl Into<String>) -> CardRecord {
        let mut guard = self.lock();
        *guard = guard.with_field(field, value);
        guard.clone()
    }

    /// Overwrite every field.
    pub fn replace_all(&self, record: CardRecord) -> CardRecord {
        let mut guard = self.lock();
        *guard = record;
        guard.clone()
    }

    pub fn reset(&self) -> CardRecord {
        self.replace_all(CardRecord::default())
    }

    pub fn is_update_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Move from idle to pending. Returns `None` if an update is already in
    /// flight.
    pub fn begin_update(&self) -> Option<PendingUpdate<'_>> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(PendingUpdate {
            editor: self,
            base: self.snapshot(),
        })
    }
}

/// An AI update in flight. Dropping it without `commit` returns the editor to
/// idle and leaves the record untouched.
#[derive(Debug)]
pub struct PendingUpdate<'a> {
    editor: &'a Editor,
    base: CardRecord,
}

impl PendingUpdate<'_> {
    /// The record as it was when the update started.
    pub fn base(&self) -> &CardRecord {
        &self.base
    }

    pub fn commit(self, record: CardRecord) -> CardRecord {
        self.editor.replace_all(record)
    }
}

impl Drop for PendingUpdate<'_> {
    fn drop(&mut self) {
        self.editor.pending.store(false, Ordering::Release);
    }
}
