// Alertnode - Sensor telemetry and alert-tone node core
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Inbound resource table
//!
//! Maps an inbound resource path to the handler that owns it. The scheduler
//! resolves every request the transport delivers against this table.

use crate::alert::AlertOutcome;
use crate::error::{NodeError, Result};
use std::collections::HashMap;

/// Handler owning an inbound resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The alert dispatcher
    Alert,
}

/// Result of routing one inbound request
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Handled by the alert dispatcher
    Alert(AlertOutcome),
    /// No resource registered for the path
    Unrouted(String),
    /// The handler failed
    Failed(NodeError),
}

/// Path -> handler table
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    routes: HashMap<String, Resource>,
}

impl ResourceTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler on a path
    ///
    /// # Errors
    ///
    /// Returns an error if the path is already registered.
    pub fn register(&mut self, path: impl Into<String>, resource: Resource) -> Result<()> {
        let path = normalize(&path.into());
        if self.routes.contains_key(&path) {
            return Err(NodeError::Routing(format!("resource already registered: {}", path)));
        }
        self.routes.insert(path, resource);
        Ok(())
    }

    /// Handler registered on a path
    pub fn resolve(&self, path: &str) -> Option<Resource> {
        self.routes.get(&normalize(path)).copied()
    }

    /// Registered paths
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.routes.keys()
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut table = ResourceTable::new();
        table.register("alert", Resource::Alert).unwrap();
        assert_eq!(table.resolve("alert"), Some(Resource::Alert));
        assert_eq!(table.resolve("/alert"), Some(Resource::Alert));
        assert_eq!(table.resolve("ac/n02"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut table = ResourceTable::new();
        table.register("ac/n02", Resource::Alert).unwrap();
        let err = table.register("/ac/n02", Resource::Alert).unwrap_err();
        assert!(matches!(err, NodeError::Routing(_)));
    }
}
