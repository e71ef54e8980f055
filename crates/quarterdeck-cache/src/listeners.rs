// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Listener directory: per-resource subscriber callbacks.
//!
//! Notification always walks a snapshot taken before the first callback runs,
//! and re-checks each entry's removed flag immediately before invoking it.
//! A callback may therefore unsubscribe any listener (including itself or a
//! peer in the same batch) without skipping or double-invoking anyone.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use crate::error::CacheError;

/// Success callback invoked with the freshly cached value.
pub type DataCallback = Box<dyn Fn(&Value) + Send + Sync>;

/// Error callback invoked with the normalized fetch failure.
pub type ErrorCallback = Box<dyn Fn(&CacheError) + Send + Sync>;

pub(crate) struct ListenerEntry {
    id: u64,
    resource: String,
    pub(crate) on_data: DataCallback,
    pub(crate) on_error: Option<ErrorCallback>,
    removed: AtomicBool,
}

impl ListenerEntry {
    pub(crate) fn removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }
}

/// Ordered set of subscribers, grouped by resource name.
#[derive(Default)]
pub(crate) struct ListenerDirectory {
    entries: Vec<Arc<ListenerEntry>>,
    next_id: u64,
}

impl ListenerDirectory {
    /// Append a listener and return its id. Notification order follows
    /// registration order.
    pub(crate) fn add(
        &mut self,
        resource: &str,
        on_data: DataCallback,
        on_error: Option<ErrorCallback>,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(Arc::new(ListenerEntry {
            id,
            resource: resource.to_string(),
            on_data,
            on_error,
            removed: AtomicBool::new(false),
        }));
        id
    }

    /// Mark a listener removed and excise it. Idempotent: removing an unknown
    /// or already-removed id returns `false`.
    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        // Flag first so in-progress notification batches holding a snapshot
        // skip this entry.
        self.entries[index].removed.store(true, Ordering::SeqCst);
        self.entries.remove(index);
        true
    }

    /// Whether any listener is registered for the given resource name.
    pub(crate) fn has_listeners(&self, resource: &str) -> bool {
        self.entries.iter().any(|entry| entry.resource == resource)
    }

    /// Snapshot the listeners for a resource, in registration order.
    ///
    /// Callers must invoke the callbacks outside the engine lock and check
    /// [`ListenerEntry::removed`] right before each invocation.
    pub(crate) fn snapshot(&self, resource: &str) -> Vec<Arc<ListenerEntry>> {
        self.entries
            .iter()
            .filter(|entry| entry.resource == resource)
            .cloned()
            .collect()
    }

    /// Mark every listener removed and drop them all.
    pub(crate) fn clear(&mut self) {
        for entry in &self.entries {
            entry.removed.store(true, Ordering::SeqCst);
        }
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn noop() -> DataCallback {
        Box::new(|_| {})
    }

    #[test]
    fn test_add_and_has_listeners() {
        let mut directory = ListenerDirectory::default();
        assert!(!directory.has_listeners("r"));
        directory.add("r", noop(), None);
        assert!(directory.has_listeners("r"));
        assert!(!directory.has_listeners("other"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut directory = ListenerDirectory::default();
        let id = directory.add("r", noop(), None);
        assert!(directory.remove(id));
        assert!(!directory.remove(id));
        assert!(!directory.has_listeners("r"));
    }

    #[test]
    fn test_snapshot_preserves_registration_order() {
        let mut directory = ListenerDirectory::default();
        let calls = Arc::new(AtomicUsize::new(0));
        for expected in 0..3usize {
            let calls = calls.clone();
            directory.add(
                "r",
                Box::new(move |_| {
                    assert_eq!(calls.fetch_add(1, Ordering::SeqCst), expected);
                }),
                None,
            );
        }
        for entry in directory.snapshot("r") {
            (entry.on_data)(&Value::Null);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_removed_flag_visible_through_snapshot() {
        let mut directory = ListenerDirectory::default();
        let id = directory.add("r", noop(), None);
        let snapshot = directory.snapshot("r");
        directory.remove(id);
        assert!(snapshot[0].removed());
    }

    #[test]
    fn test_clear_marks_everything_removed() {
        let mut directory = ListenerDirectory::default();
        directory.add("r", noop(), None);
        let snapshot = directory.snapshot("r");
        directory.clear();
        assert!(!directory.has_listeners("r"));
        assert!(snapshot[0].removed());
    }
}
