//! Tuning parameters for the context pool and the selection policy.
//!
//! All values have defaults matching the shipped plugin. Tests and embedders
//! override them by constructing a custom `TunerConfig`.

use crate::error::{Result, TunerError};
use crate::pool::MAX_ENCODABLE_CONTEXTS;

/// Pool capacity and policy thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunerConfig {
    /// Maximum number of concurrently allocated contexts (one per communicator).
    pub max_contexts: usize,

    /// All-reduce messages at or below this size are candidates for the
    /// tree/LL override.
    pub small_msg_bytes: usize,

    /// Minimum node count for the tree/LL override to apply.
    pub min_nodes: usize,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            max_contexts: 1024,
            small_msg_bytes: 64,
            min_nodes: 16,
        }
    }
}

impl TunerConfig {
    pub fn with_max_contexts(mut self, n: usize) -> Self {
        self.max_contexts = n;
        self
    }

    pub fn with_small_msg_bytes(mut self, n: usize) -> Self {
        self.small_msg_bytes = n;
        self
    }

    pub fn with_min_nodes(mut self, n: usize) -> Self {
        self.min_nodes = n;
        self
    }

    /// Reject configurations the pool cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_contexts == 0 {
            return Err(TunerError::InvalidConfig {
                reason: "max_contexts must be at least 1".into(),
            });
        }
        if self.max_contexts > MAX_ENCODABLE_CONTEXTS {
            return Err(TunerError::InvalidConfig {
                reason: format!(
                    "max_contexts {} exceeds handle encoding limit {}",
                    self.max_contexts, MAX_ENCODABLE_CONTEXTS
                ),
            });
        }
        Ok(())
    }
}
