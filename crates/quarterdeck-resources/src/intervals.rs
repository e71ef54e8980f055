// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Adaptive poll interval policies.
//!
//! Resources that represent in-progress work poll at a short fixed step while
//! the underlying entity is still transitioning, then back off by fixed
//! increments until they sit at the resource's default interval again. The
//! policies return `None` once settled, which the scheduler reads as "use the
//! default".

use std::time::Duration;

use serde_json::Value;

/// Poll step while the underlying entity is still transitioning.
pub const TRANSITION_INTERVAL: Duration = Duration::from_secs(3);

/// Fixed increment used to back off toward the default once settled.
pub const BACKOFF_STEP: Duration = Duration::from_secs(5);

fn backoff(default: Duration, last: Duration) -> Option<Duration> {
    if last < default {
        Some((last + BACKOFF_STEP).min(default))
    } else {
        None
    }
}

/// Poll fast until `status_field` reaches one of the terminal states, then
/// back off. A missing or non-string status counts as transitioning.
pub fn transitioning(
    status_field: &'static str,
    terminal: &'static [&'static str],
) -> impl Fn(Option<&Value>, &Value, Duration, Duration) -> Option<Duration> + Send + Sync + 'static
{
    move |_old, new, default, last| {
        let status = new.get(status_field).and_then(Value::as_str).unwrap_or("");
        if !terminal.iter().any(|t| t.eq_ignore_ascii_case(status)) {
            return Some(TRANSITION_INTERVAL);
        }
        backoff(default, last)
    }
}

/// Poll fast while the number at the given JSON pointer keeps moving. The
/// first observation (no prior value) counts as a change.
pub fn count_changed(
    pointer: &'static str,
) -> impl Fn(Option<&Value>, &Value, Duration, Duration) -> Option<Duration> + Send + Sync + 'static
{
    move |old, new, default, last| {
        let new_count = new.pointer(pointer).and_then(Value::as_u64);
        let old_count = old.and_then(|value| value.pointer(pointer)).and_then(Value::as_u64);
        if old.is_none() || new_count != old_count {
            return Some(TRANSITION_INTERVAL);
        }
        backoff(default, last)
    }
}
