// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Code Engine resource descriptors for the Quarterdeck data cache.
//!
//! This crate is pure configuration: for every remote resource the console
//! displays it declares how to build the request URL from an instantiation
//! id, how to shape the response, and how fast to poll. The engine itself
//! lives in `quarterdeck-cache` and never knows these names.
//!
//! # Registered resources
//!
//! | Name | Scope | Adaptive policy |
//! |------|-------|-----------------|
//! | `project` | project | fast until provisioning settles |
//! | `project-list` | region | fixed |
//! | `application` | app | fast until ready/failed |
//! | `application-list` | project | fixed |
//! | `application-instances` | app | fast while instance count moves |
//! | `job` | job | fixed |
//! | `job-run` | run | fast until a terminal status |
//! | `job-run-list` | project | fixed |
//! | `build` | build | fixed |
//! | `build-run` | run | fast until a terminal status |
//! | `secret-list` | project | fixed |
//! | `configmap-list` | project | fixed |
//!
//! ```ignore
//! use quarterdeck_resources::{names, registry};
//!
//! let cache = DataCache::new(registry().clone(), transport);
//! let sub = cache.listen(names::JOB_RUN, |run| render(run));
//! cache.update("region/us-east/project/p-42/job_run/run-7", names::JOB_RUN);
//! ```

pub mod intervals;
pub mod paths;

use std::time::Duration;

use chrono::DateTime;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use quarterdeck_cache::{Registry, ResourceDescriptor};

use crate::intervals::{count_changed, transitioning};
use crate::paths::{encode, InstancePath};

/// Resource names, the cache keys the console subscribes to.
pub mod names {
    pub const PROJECT: &str = "project";
    pub const PROJECT_LIST: &str = "project-list";
    pub const APPLICATION: &str = "application";
    pub const APPLICATION_LIST: &str = "application-list";
    pub const APPLICATION_INSTANCES: &str = "application-instances";
    pub const JOB: &str = "job";
    pub const JOB_RUN: &str = "job-run";
    pub const JOB_RUN_LIST: &str = "job-run-list";
    pub const BUILD: &str = "build";
    pub const BUILD_RUN: &str = "build-run";
    pub const SECRET_LIST: &str = "secret-list";
    pub const CONFIGMAP_LIST: &str = "configmap-list";
}

/// Project provisioning settles in one of these states.
const PROJECT_TERMINAL: &[&str] = &["active", "failed"];
/// An application deployment settles in one of these states.
const APP_TERMINAL: &[&str] = &["ready", "failed"];
/// A job or build run settles in one of these states.
const RUN_TERMINAL: &[&str] = &["succeeded", "failed", "cancelled"];

fn project_base(path: &InstancePath) -> String {
    format!(
        "/v2/regions/{}/projects/{}",
        encode(path.region()),
        encode(path.project())
    )
}

fn collection_url(collection: &'static str) -> impl Fn(&str) -> String + Send + Sync + 'static {
    move |id| format!("{}/{collection}", project_base(&InstancePath::parse(id)))
}

fn entity_url(collection: &'static str) -> impl Fn(&str) -> String + Send + Sync + 'static {
    move |id| {
        let path = InstancePath::parse(id);
        format!(
            "{}/{collection}/{}",
            project_base(&path),
            encode(path.entity_id())
        )
    }
}

/// Lists arrive wrapped in a single collection field; cache just the array.
fn list_formatter(field: &'static str) -> impl Fn(Value) -> Value + Send + Sync + 'static {
    move |raw| {
        raw.get(field)
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()))
    }
}

/// Shape a job/build run into what the run detail pages bind to, deriving
/// the run duration when both timestamps are present.
fn run_formatter(raw: Value) -> Value {
    let timestamp = |field: &str| {
        raw.get(field)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    };
    let duration_seconds = match (timestamp("start_time"), timestamp("completion_time")) {
        (Some(start), Some(end)) => Some((end - start).num_seconds()),
        _ => None,
    };
    json!({
        "name": raw.get("name").cloned().unwrap_or(Value::Null),
        "status": raw.get("status").cloned().unwrap_or(Value::Null),
        "start_time": raw.get("start_time").cloned().unwrap_or(Value::Null),
        "completion_time": raw.get("completion_time").cloned().unwrap_or(Value::Null),
        "duration_seconds": duration_seconds,
    })
}

/// Reduce an instance list to the count the overview tiles poll for, keeping
/// the per-instance status for the detail drawer.
fn instances_formatter(raw: Value) -> Value {
    let instances: Vec<Value> = raw
        .get("instances")
        .and_then(Value::as_array)
        .map(|instances| {
            instances
                .iter()
                .map(|instance| {
                    json!({
                        "name": instance.get("name").cloned().unwrap_or(Value::Null),
                        "status": instance.get("status").cloned().unwrap_or(Value::Null),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    json!({
        "count": instances.len(),
        "instances": instances,
    })
}

/// All descriptors known to the console.
pub fn descriptors() -> Vec<ResourceDescriptor> {
    vec![
        ResourceDescriptor::new(names::PROJECT, Duration::from_secs(60), |id| {
            project_base(&InstancePath::parse(id))
        })
        .with_next_interval(transitioning("status", PROJECT_TERMINAL)),
        // The project list is region-scoped; the instantiation id carries no
        // project segment yet.
        ResourceDescriptor::new(names::PROJECT_LIST, Duration::from_secs(120), |id| {
            let path = InstancePath::parse(id);
            format!("/v2/regions/{}/projects", encode(path.region()))
        })
        .with_formatter(list_formatter("projects")),
        ResourceDescriptor::new(names::APPLICATION, Duration::from_secs(60), entity_url("apps"))
            .with_next_interval(transitioning("status", APP_TERMINAL)),
        ResourceDescriptor::new(
            names::APPLICATION_LIST,
            Duration::from_secs(60),
            collection_url("apps"),
        )
        .with_formatter(list_formatter("apps")),
        ResourceDescriptor::new(names::APPLICATION_INSTANCES, Duration::from_secs(30), |id| {
            let path = InstancePath::parse(id);
            format!(
                "{}/apps/{}/instances",
                project_base(&path),
                encode(path.entity_id())
            )
        })
        .with_formatter(instances_formatter)
        .with_next_interval(count_changed("/count")),
        ResourceDescriptor::new(names::JOB, Duration::from_secs(120), entity_url("jobs")),
        ResourceDescriptor::new(names::JOB_RUN, Duration::from_secs(60), entity_url("job_runs"))
            .with_formatter(run_formatter)
            .with_next_interval(transitioning("status", RUN_TERMINAL)),
        ResourceDescriptor::new(
            names::JOB_RUN_LIST,
            Duration::from_secs(60),
            collection_url("job_runs"),
        )
        .with_formatter(list_formatter("job_runs")),
        ResourceDescriptor::new(names::BUILD, Duration::from_secs(120), entity_url("builds")),
        ResourceDescriptor::new(
            names::BUILD_RUN,
            Duration::from_secs(60),
            entity_url("build_runs"),
        )
        .with_formatter(run_formatter)
        .with_next_interval(transitioning("status", RUN_TERMINAL)),
        ResourceDescriptor::new(
            names::SECRET_LIST,
            Duration::from_secs(120),
            collection_url("secrets"),
        )
        .with_formatter(list_formatter("secrets")),
        ResourceDescriptor::new(
            names::CONFIGMAP_LIST,
            Duration::from_secs(120),
            collection_url("config_maps"),
        )
        .with_formatter(list_formatter("config_maps")),
    ]
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| Registry::new(descriptors()));

/// The console's resource registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}
