// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Resource descriptors: the static shape of a pollable remote resource.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

/// Builds the concrete request path for one instantiation of a resource.
///
/// The instantiation id is an opaque string conventionally shaped as
/// `region/<regionId>/project/<projectId>[/<entityKind>/<entityId>]` and is
/// interpreted only here, never by the scheduler.
pub type UrlFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Extracts the domain payload from a raw transport response.
pub type FormatFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Computes the next poll interval from an observed data transition.
///
/// Arguments are `(old_value, new_value, default_interval, last_interval)`.
/// Returning `None` (or a zero duration) means "use the default interval".
pub type NextIntervalFn =
    Arc<dyn Fn(Option<&Value>, &Value, Duration, Duration) -> Option<Duration> + Send + Sync>;

/// Static description of one remote resource type.
///
/// A descriptor is immutable configuration: the cache key, how to build a URL
/// for a given instantiation, how to shape the response, and how fast to poll.
/// Descriptors are cheap to clone (the function fields are shared).
#[derive(Clone)]
pub struct ResourceDescriptor {
    name: &'static str,
    url: UrlFn,
    format: Option<FormatFn>,
    default_interval: Duration,
    next_interval: Option<NextIntervalFn>,
}

impl ResourceDescriptor {
    /// Create a descriptor with the given cache key, default poll interval and
    /// URL builder. The formatter defaults to the identity and the poll
    /// interval stays fixed at the default unless a policy is attached.
    pub fn new(
        name: &'static str,
        default_interval: Duration,
        url: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            url: Arc::new(url),
            format: None,
            default_interval,
            next_interval: None,
        }
    }

    /// Attach a response formatter.
    pub fn with_formatter(mut self, format: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.format = Some(Arc::new(format));
        self
    }

    /// Attach an adaptive poll interval policy.
    pub fn with_next_interval(
        mut self,
        next_interval: impl Fn(Option<&Value>, &Value, Duration, Duration) -> Option<Duration>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.next_interval = Some(Arc::new(next_interval));
        self
    }

    /// The unique cache key for this resource type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The fallback poll interval.
    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    /// Build the request path for the given instantiation id.
    pub fn url(&self, instantiation: &str) -> String {
        (self.url)(instantiation)
    }

    /// Shape a raw transport response into the cached domain value.
    pub fn format(&self, raw: Value) -> Value {
        match &self.format {
            Some(format) => format(raw),
            None => raw,
        }
    }

    /// Compute the next poll interval after a successful fetch.
    ///
    /// Returns `None` when no policy is attached or the policy declines,
    /// in which case the scheduler falls back to the default interval.
    pub fn next_interval(
        &self,
        old: Option<&Value>,
        new: &Value,
        last_interval: Duration,
    ) -> Option<Duration> {
        self.next_interval
            .as_ref()
            .and_then(|policy| policy(old, new, self.default_interval, last_interval))
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("name", &self.name)
            .field("default_interval", &self.default_interval)
            .field("adaptive", &self.next_interval.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_formatter_by_default() {
        let descriptor =
            ResourceDescriptor::new("thing", Duration::from_secs(60), |p| format!("/v2/{p}"));
        let raw = json!({"a": 1});
        assert_eq!(descriptor.format(raw.clone()), raw);
    }

    #[test]
    fn test_url_builder_receives_instantiation() {
        let descriptor =
            ResourceDescriptor::new("thing", Duration::from_secs(60), |p| format!("/v2/{p}"));
        assert_eq!(descriptor.url("region/us/project/p1"), "/v2/region/us/project/p1");
    }

    #[test]
    fn test_next_interval_none_without_policy() {
        let descriptor = ResourceDescriptor::new("thing", Duration::from_secs(60), |_| String::new());
        assert_eq!(
            descriptor.next_interval(None, &json!({}), Duration::from_secs(60)),
            None
        );
    }

    #[test]
    fn test_next_interval_policy_sees_default_and_last() {
        let descriptor = ResourceDescriptor::new("thing", Duration::from_secs(60), |_| String::new())
            .with_next_interval(|_, _, default, last| Some(default.min(last) / 2));
        let next = descriptor.next_interval(None, &json!({}), Duration::from_secs(30));
        assert_eq!(next, Some(Duration::from_secs(15)));
    }
}
