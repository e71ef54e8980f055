// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Poll scheduler: one fetch loop per active resource.
//!
//! Each resource with listeners cycles `Scheduled -> Fetching -> Scheduled`:
//! a timer task sleeps for the current interval, then triggers a refresh; the
//! refresh races the transport GET against a cancellation token. A refresh
//! always supersedes the previous cycle, so a resource never has more than
//! one fetch in flight.
//!
//! Every fetch carries the poll state's epoch at launch time. Completion
//! handlers re-check the epoch under the lock, which makes abort idempotent
//! and keeps a superseded fetch that already left the transport from
//! clobbering newer state.

use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{DataCache, EngineState};
use crate::descriptor::ResourceDescriptor;
use crate::error::Result;

/// Mutable poll state for one resource, created lazily on first refresh and
/// destroyed when the resource's listener set becomes empty.
pub(crate) struct PollState {
    /// Last computed poll interval; starts at the descriptor default.
    pub(crate) current_interval: Duration,
    /// Cancellation handle for the at-most-one outstanding fetch.
    pub(crate) inflight: Option<CancellationToken>,
    /// Cancellation handle for the armed next-poll timer.
    pub(crate) timer: Option<CancellationToken>,
    /// Incremented on every refresh; stale completions compare against it.
    pub(crate) epoch: u64,
    /// Instantiation id of the most recent refresh, re-used by the timer.
    pub(crate) last_path: String,
}

impl PollState {
    pub(crate) fn new(default_interval: Duration) -> Self {
        Self {
            current_interval: default_interval,
            inflight: None,
            timer: None,
            epoch: 0,
            last_path: String::new(),
        }
    }

    /// Abort the in-flight fetch and cancel the pending timer.
    pub(crate) fn cancel_all(self) {
        if let Some(token) = self.inflight {
            token.cancel();
        }
        if let Some(token) = self.timer {
            token.cancel();
        }
    }
}

impl DataCache {
    /// Issue a fresh fetch for the resource, superseding any in-flight fetch
    /// and pending timer. No-op when the resource has no listeners.
    pub(crate) fn refresh(&self, descriptor: ResourceDescriptor, path: String) {
        let name = descriptor.name();
        let (token, epoch) = {
            let mut st = self.inner.state();
            if !st.listeners.has_listeners(name) {
                debug!(resource = name, "skipping refresh, no listeners");
                return;
            }
            let poll = st
                .polls
                .entry(name.to_string())
                .or_insert_with(|| PollState::new(descriptor.default_interval()));
            if let Some(previous) = poll.inflight.take() {
                debug!(resource = name, "superseding in-flight fetch");
                previous.cancel();
            }
            if let Some(timer) = poll.timer.take() {
                timer.cancel();
            }
            poll.epoch += 1;
            poll.last_path = path.clone();
            let token = CancellationToken::new();
            poll.inflight = Some(token.clone());
            (token, poll.epoch)
        };

        let cache = self.clone();
        tokio::spawn(async move {
            let url = descriptor.url(&path);
            let transport = cache.inner.transport.clone();
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    debug!(resource = descriptor.name(), "in-flight fetch aborted");
                }

                // Polls always bypass the transport's response cache.
                result = transport.get(&url, true) => {
                    cache.complete_fetch(&descriptor, epoch, &token, result);
                }
            }
        });
    }

    /// Land a completed fetch: store and fan out on success, surface the
    /// normalized failure otherwise, then re-arm the poll timer.
    fn complete_fetch(
        &self,
        descriptor: &ResourceDescriptor,
        epoch: u64,
        token: &CancellationToken,
        result: Result<Value>,
    ) {
        let name = descriptor.name();
        let mut data_snapshot = Vec::new();
        let mut error_snapshot = Vec::new();
        let mut published = None;
        let mut failure = None;
        {
            let mut st = self.inner.state();
            let current_interval = match st.polls.get_mut(name) {
                Some(poll) if poll.epoch == epoch && !token.is_cancelled() => {
                    poll.inflight = None;
                    poll.current_interval
                }
                // Torn down, superseded, or intentionally aborted; whoever
                // owns the poll state now decides what happens next.
                _ => return,
            };

            match result {
                Ok(raw) => {
                    let value = descriptor.format(raw);
                    let next = descriptor.next_interval(st.cache.get(name), &value, current_interval);
                    let interval = next
                        .filter(|interval| !interval.is_zero())
                        .unwrap_or_else(|| descriptor.default_interval());
                    st.cache.insert(name.to_string(), value.clone());
                    data_snapshot = st.listeners.snapshot(name);
                    published = Some(value);
                    if let Some(poll) = st.polls.get_mut(name) {
                        poll.current_interval = interval;
                    }
                    self.arm_timer(&mut st, name);
                }
                Err(err) => {
                    error_snapshot = st.listeners.snapshot(name);
                    failure = Some(err);
                    if st.cache.contains_key(name) {
                        self.arm_timer(&mut st, name);
                    } else {
                        // The very first fetch failed: do not spin on a
                        // resource that has never produced data. The next
                        // explicit update() retries.
                        debug!(resource = name, "first fetch failed, not rescheduling");
                    }
                }
            }
        }

        if let Some(value) = published {
            debug!(
                resource = name,
                listeners = data_snapshot.len(),
                "resource updated"
            );
            for listener in &data_snapshot {
                if !listener.removed() {
                    (listener.on_data)(&value);
                }
            }
        }
        if let Some(err) = failure {
            warn!(resource = name, error = %err, "resource fetch failed");
            for listener in &error_snapshot {
                if listener.removed() {
                    continue;
                }
                if let Some(on_error) = &listener.on_error {
                    on_error(&err);
                }
            }
        }
    }

    /// Arm the next-poll timer for a resource at its current interval.
    /// Replaces any timer already pending.
    pub(crate) fn arm_timer(&self, st: &mut EngineState, name: &str) {
        let Some(descriptor) = self.inner.registry.find(name).cloned() else {
            return;
        };
        let Some(poll) = st.polls.get_mut(name) else {
            return;
        };
        if let Some(previous) = poll.timer.take() {
            previous.cancel();
        }
        let interval = poll.current_interval;
        let path = poll.last_path.clone();
        let timer = CancellationToken::new();
        poll.timer = Some(timer.clone());

        let cache = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = timer.cancelled() => {}

                _ = tokio::time::sleep(interval) => {
                    cache.refresh(descriptor, path);
                }
            }
        });
    }
}
