//! Context configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for a [`Context`](crate::Context).
///
/// Every field has a default, so a JSON document only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextOptions {
    /// Maximum nesting of proxy handler dispatch before reporting
    /// "too much recursion".
    /// Default: 512
    pub max_dispatch_depth: u32,

    /// Object slots reserved up front.
    /// Default: 256
    pub initial_heap_capacity: usize,

    /// Allocations between automatic collections; 0 disables them.
    /// Automatic collections only run from [`Context::maybe_gc`](crate::Context::maybe_gc).
    /// Default: 0
    pub gc_threshold: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_dispatch_depth: 512,
            initial_heap_capacity: 256,
            gc_threshold: 0,
        }
    }
}

impl ContextOptions {
    /// Options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the proxy dispatch depth limit.
    pub fn max_dispatch_depth(mut self, depth: u32) -> Self {
        self.max_dispatch_depth = depth;
        self
    }

    /// Set the initial heap capacity.
    pub fn initial_heap_capacity(mut self, capacity: usize) -> Self {
        self.initial_heap_capacity = capacity;
        self
    }

    /// Set the automatic collection threshold.
    pub fn gc_threshold(mut self, threshold: usize) -> Self {
        self.gc_threshold = threshold;
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
