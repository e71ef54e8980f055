// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Quarterdeck data cache - the polling data layer of the Code Engine console.
//!
//! Console pages never talk to the Code Engine API directly. They subscribe
//! to named resources (a project, a job run, an app's instance list) and this
//! crate keeps those resources fresh: each resource with at least one
//! listener is polled on its own adaptive interval, every successful fetch is
//! stored as the last-known-good value and fanned out to all listeners, and
//! polling stops the instant the last listener goes away.
//!
//! # Features
//!
//! - **Listener multiplexing**: any number of subscribers per resource, one
//!   poll loop between them
//! - **Adaptive intervals**: per-resource policies poll fast while an entity
//!   is transitioning and back off once it settles
//! - **In-flight dedup**: at most one outstanding fetch per resource; a new
//!   update aborts and supersedes the old fetch
//! - **Abort-aware errors**: a fetch the cache aborted itself never surfaces
//!   as a user-visible error
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use quarterdeck_cache::{CacheConfig, DataCache, HttpTransport};
//!
//! #[tokio::main]
//! async fn main() -> quarterdeck_cache::Result<()> {
//!     let transport = Arc::new(HttpTransport::new(CacheConfig::from_env()?)?);
//!     let cache = DataCache::new(quarterdeck_resources::registry().clone(), transport);
//!
//!     // Subscribe, then trigger polling for one concrete job run.
//!     let sub = cache.listen_with_errors(
//!         "job-run",
//!         |run| println!("job run now: {run}"),
//!         |err| eprintln!("fetch failed: {err}"),
//!     );
//!     cache.update("region/us-east/project/p-42/job_run/r-7", "job-run");
//!
//!     // ... page lifetime ...
//!     sub.unsubscribe(); // last listener gone: polling stops, entry dropped
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency model
//!
//! All engine state lives behind one lock and every transition (timer fire,
//! fetch completion, façade call) mutates it synchronously. Listener
//! callbacks run outside the lock over a pre-taken snapshot, so a callback
//! may unsubscribe itself or a peer mid-batch without skipping or
//! double-invoking anyone. The only suspension points are the transport's
//! network I/O and the poll timers, both cancelled through
//! `tokio_util::sync::CancellationToken`.

mod client;
mod config;
mod descriptor;
mod error;
mod listeners;
mod registry;
mod scheduler;
mod transport;

// Main types
pub use client::{DataCache, Subscription};
pub use config::CacheConfig;
pub use descriptor::{FormatFn, NextIntervalFn, ResourceDescriptor, UrlFn};
pub use error::{CacheError, Result};
pub use listeners::{DataCallback, ErrorCallback};
pub use registry::Registry;
pub use transport::{transform_error_response, HttpTransport, Transport};
