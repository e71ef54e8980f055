// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Name-indexed lookup table of resource descriptors.

use std::collections::HashMap;

use tracing::warn;

use crate::descriptor::ResourceDescriptor;

/// A fixed table of resource descriptors, keyed by resource name.
///
/// The registry is pure static configuration: it is built once at startup
/// and only ever queried. A lookup miss on `update()` is a caller bug and is
/// logged rather than surfaced as an error.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    by_name: HashMap<&'static str, ResourceDescriptor>,
}

impl Registry {
    /// Build a registry from a set of descriptors.
    ///
    /// A duplicate name keeps the later descriptor and logs the collision.
    pub fn new(descriptors: impl IntoIterator<Item = ResourceDescriptor>) -> Self {
        let mut by_name = HashMap::new();
        for descriptor in descriptors {
            if by_name.insert(descriptor.name(), descriptor).is_some() {
                warn!("duplicate resource descriptor registered, keeping the later one");
            }
        }
        Self { by_name }
    }

    /// Look up a descriptor by resource name.
    pub fn find(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.by_name.get(name)
    }

    /// Names of all registered resources.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_name.keys().copied()
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
