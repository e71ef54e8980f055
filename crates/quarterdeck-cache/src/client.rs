// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The public façade of the polling data cache.
//!
//! [`DataCache`] is the only surface page code is allowed to use: `listen`,
//! `update`, `get`, `put`, `reset`. It owns the listener directory, the
//! per-resource poll state, and the last-known-good value store behind one
//! lock; the scheduler lives in [`crate::scheduler`] as the other half of
//! this type.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::Value;
use tracing::debug;

use crate::error::CacheError;
use crate::listeners::{DataCallback, ErrorCallback, ListenerDirectory};
use crate::registry::Registry;
use crate::scheduler::PollState;
use crate::transport::Transport;

/// Handle to the console's polling data cache.
///
/// One `DataCache` is constructed per application session and injected into
/// consumers. Clones share the same underlying state, so a clone is a cheap
/// way to hand the cache to another component.
#[derive(Clone)]
pub struct DataCache {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) registry: Registry,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) state: Mutex<EngineState>,
}

/// Everything mutable, behind the one engine lock.
///
/// All transitions happen synchronously inside a lock scope; listener
/// callbacks are always invoked after the lock is released so a callback may
/// re-enter the cache freely.
#[derive(Default)]
pub(crate) struct EngineState {
    pub(crate) listeners: ListenerDirectory,
    pub(crate) cache: HashMap<String, Value>,
    pub(crate) polls: HashMap<String, PollState>,
}

impl Inner {
    /// A listener callback panicking must not wedge the whole cache, so a
    /// poisoned lock is recovered rather than propagated.
    pub(crate) fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EngineState {
    /// Stop polling a resource: abort the in-flight fetch, cancel the pending
    /// timer, and drop the cache entry.
    pub(crate) fn teardown_resource(&mut self, name: &str) {
        if let Some(poll) = self.polls.remove(name) {
            poll.cancel_all();
        }
        self.cache.remove(name);
    }
}

impl DataCache {
    /// Create a cache over the given descriptor registry and transport.
    pub fn new(registry: Registry, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                transport,
                state: Mutex::new(EngineState::default()),
            }),
        }
    }

    /// Subscribe to a resource. The callback fires on every successful fetch
    /// (and on every [`DataCache::put`]) until the subscription is
    /// unsubscribed. Fetch failures are dropped; use
    /// [`DataCache::listen_with_errors`] to observe them.
    pub fn listen(
        &self,
        resource: &str,
        on_data: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe(resource, Box::new(on_data), None)
    }

    /// Subscribe to a resource with an error callback for fetch failures.
    ///
    /// The error callback is never invoked for fetches the cache aborted
    /// itself (superseding update, teardown, or an abort-in-flight put).
    pub fn listen_with_errors(
        &self,
        resource: &str,
        on_data: impl Fn(&Value) + Send + Sync + 'static,
        on_error: impl Fn(&CacheError) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe(resource, Box::new(on_data), Some(Box::new(on_error)))
    }

    fn subscribe(
        &self,
        resource: &str,
        on_data: DataCallback,
        on_error: Option<ErrorCallback>,
    ) -> Subscription {
        let id = self.inner.state().listeners.add(resource, on_data, on_error);
        Subscription {
            inner: Arc::downgrade(&self.inner),
            id,
            resource: resource.to_string(),
        }
    }

    /// (Re)trigger polling of one resource for the given instantiation id.
    ///
    /// No-op when the resource has no listeners. An unregistered resource
    /// name is a caller bug and is logged and ignored.
    pub fn update(&self, instantiation: &str, resource: &str) {
        let Some(descriptor) = self.inner.registry.find(resource).cloned() else {
            debug!(resource, "update for unregistered resource, ignoring");
            return;
        };
        self.refresh(descriptor, instantiation.to_string());
    }

    /// [`DataCache::update`] for several resources sharing one instantiation id.
    pub fn update_all(&self, instantiation: &str, resources: &[&str]) {
        for resource in resources {
            self.update(instantiation, resource);
        }
    }

    /// The last-known-good value for a resource, if any fetch has landed.
    pub fn get(&self, resource: &str) -> Option<Value> {
        self.inner.state().cache.get(resource).cloned()
    }

    /// Overwrite the cached value and notify listeners.
    ///
    /// With `abort_inflight` set, an outstanding fetch for the resource is
    /// aborted first so a stale response cannot clobber the written value;
    /// the poll timer is re-armed in its place.
    pub fn put(&self, resource: &str, value: Value, abort_inflight: bool) {
        let snapshot = {
            let mut st = self.inner.state();
            let mut aborted = false;
            if abort_inflight {
                if let Some(poll) = st.polls.get_mut(resource) {
                    if let Some(token) = poll.inflight.take() {
                        token.cancel();
                        aborted = true;
                    }
                }
            }
            st.cache.insert(resource.to_string(), value.clone());
            if aborted {
                // The aborted fetch would have re-armed the timer on
                // completion; do it on its behalf.
                self.arm_timer(&mut st, resource);
            }
            st.listeners.snapshot(resource)
        };
        for listener in &snapshot {
            if !listener.removed() {
                (listener.on_data)(&value);
            }
        }
    }

    /// Drop all cache entries, listeners, timers and in-flight fetches.
    /// Called at session/account-switch boundaries.
    pub fn reset(&self) {
        let mut st = self.inner.state();
        for (_, poll) in st.polls.drain() {
            poll.cancel_all();
        }
        st.cache.clear();
        st.listeners.clear();
    }
}

/// Handle returned by [`DataCache::listen`]; revokes the subscription.
#[must_use = "dropping a Subscription without calling unsubscribe() leaves the listener registered"]
pub struct Subscription {
    inner: Weak<Inner>,
    id: u64,
    resource: String,
}

impl Subscription {
    /// Remove the listener. Idempotent, and safe to call from inside another
    /// listener's callback. When this was the last listener for the resource,
    /// polling stops immediately and the cache entry is dropped.
    pub fn unsubscribe(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut st = inner.state();
        if !st.listeners.remove(self.id) {
            return;
        }
        if !st.listeners.has_listeners(&self.resource) {
            debug!(resource = %self.resource, "last listener removed, stopping poll");
            st.teardown_resource(&self.resource);
        }
    }

    /// The resource name this subscription is registered against.
    pub fn resource(&self) -> &str {
        &self.resource
    }
}
