// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Instantiation id parsing.
//!
//! An instantiation id is the opaque string distinguishing one concrete
//! resource instance from another sharing the same descriptor. By convention
//! it is shaped as `region/<regionId>/project/<projectId>[/<kind>/<entityId>]`
//! and only URL builders ever look inside it; the cache engine passes it
//! through untouched.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped when an id becomes a URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'&')
    .add(b'+');

/// Percent-encode an id for use as a single URL path segment.
pub fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// The parsed form of an instantiation id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePath {
    pub region: Option<String>,
    pub project: Option<String>,
    /// Trailing `<kind>/<entityId>` pair, if present.
    pub entity: Option<(String, String)>,
}

impl InstancePath {
    /// Parse the `key/value` pair convention. Unknown keys are treated as the
    /// entity kind; a trailing key without a value is ignored.
    pub fn parse(path: &str) -> Self {
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());
        let mut parsed = Self::default();
        while let (Some(key), Some(value)) = (segments.next(), segments.next()) {
            match key {
                "region" => parsed.region = Some(value.to_string()),
                "project" => parsed.project = Some(value.to_string()),
                kind => parsed.entity = Some((kind.to_string(), value.to_string())),
            }
        }
        parsed
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or("")
    }

    pub fn project(&self) -> &str {
        self.project.as_deref().unwrap_or("")
    }

    pub fn entity_id(&self) -> &str {
        self.entity
            .as_ref()
            .map(|(_, id)| id.as_str())
            .unwrap_or("")
    }

    /// Compose an instantiation id for a project-scoped resource.
    pub fn for_project(region: &str, project: &str) -> String {
        format!("region/{region}/project/{project}")
    }

    /// Compose an instantiation id for an entity inside a project.
    pub fn for_entity(region: &str, project: &str, kind: &str, id: &str) -> String {
        format!("region/{region}/project/{project}/{kind}/{id}")
    }
}
