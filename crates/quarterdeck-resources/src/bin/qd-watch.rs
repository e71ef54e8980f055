// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Quarterdeck watch CLI
//!
//! Tails one cached resource from the terminal: subscribes, triggers
//! polling, and prints every update until interrupted.
//!
//! Usage:
//!   qd-watch <resource> --path <instantiation-id>
//!
//! Example:
//!   qd-watch job-run --path region/us-east/project/p-42/job_run/run-7

use std::process::ExitCode;
use std::sync::Arc;

use quarterdeck_cache::{CacheConfig, DataCache, HttpTransport};
use quarterdeck_resources::registry;

fn print_usage() {
    eprintln!(
        r#"Usage: qd-watch <resource> --path <instantiation-id>

Tail one Quarterdeck resource and print every update.

OPTIONS:
    --path <id>                     Instantiation id, shaped as
                                    region/<region>/project/<project>[/<kind>/<id>]

ENVIRONMENT:
    QUARTERDECK_API_BASE_URL        Code Engine API base URL (required)
    QUARTERDECK_AUTH_TOKEN          Bearer token (optional)
    QUARTERDECK_ACCOUNT_ID          Account ID header (optional)

EXAMPLES:
    # Watch a job run until it settles
    qd-watch job-run --path region/us-east/project/p-42/job_run/run-7

    # Watch an app's instance count
    qd-watch application-instances --path region/eu-de/project/p-1/app/frontend
"#
    );
}

struct Args {
    resource: String,
    path: String,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    if args.len() < 2 {
        return Err("No resource specified".to_string());
    }
    match args[1].as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            std::process::exit(0);
        }
        _ => {}
    }

    let resource = args[1].clone();
    let mut path: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--path" => {
                i += 1;
                path = Some(args.get(i).ok_or("--path requires a value")?.clone());
            }
            arg => return Err(format!("Unknown argument: {}", arg)),
        }
        i += 1;
    }

    Ok(Args {
        resource,
        path: path.ok_or("--path is required")?,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("Error: {}\n", err);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if registry().find(&args.resource).is_none() {
        eprintln!("Unknown resource '{}'. Registered resources:", args.resource);
        let mut names: Vec<_> = registry().names().collect();
        names.sort_unstable();
        for name in names {
            eprintln!("  {name}");
        }
        return ExitCode::FAILURE;
    }

    let config = match CacheConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let transport = match HttpTransport::new(config) {
        Ok(transport) => Arc::new(transport),
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let cache = DataCache::new(registry().clone(), transport);
    let resource = args.resource.clone();
    let sub = cache.listen_with_errors(
        &args.resource,
        move |value| {
            let rendered = serde_json::to_string_pretty(value)
                .unwrap_or_else(|_| value.to_string());
            println!("[{resource}] {rendered}");
        },
        |err| eprintln!("fetch failed: {}", err),
    );
    cache.update(&args.path, &args.resource);
    println!("Watching '{}' at {} (Ctrl-C to stop)", args.resource, args.path);

    let _ = tokio::signal::ctrl_c().await;
    sub.unsubscribe();
    ExitCode::SUCCESS
}
