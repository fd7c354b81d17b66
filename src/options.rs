// Copyright 2025 Oxide Computer Company

use serde::Deserialize;

/// Settings for a comparison run.
///
/// Deserializable so that hosts can carry it in their own configuration;
/// every field has a default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareOptions {
    /// Upper bound on the number of distinct (source, target) schema pairs a
    /// run may compare. Cycles are already cut by the cycle guard; this
    /// bounds the work on very large or adversarial component tables.
    pub max_schema_pairs: Option<usize>,
}

impl CompareOptions {
    pub fn with_max_schema_pairs(mut self, limit: usize) -> Self {
        self.max_schema_pairs = Some(limit);
        self
    }
}
