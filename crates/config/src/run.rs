//! Run execution configuration.

use serde::Deserialize;

/// Deadlines and fan-out bounds for run expansion.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Hard wall-clock deadline per provider call, seconds.
    pub hard_deadline_secs: u64,
    /// Soft deadline for grounded calls, seconds. Exceeding it is logged.
    pub grounded_soft_deadline_secs: u64,
    /// Maximum expansion steps in flight at once.
    pub max_parallel: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            hard_deadline_secs: 120,
            grounded_soft_deadline_secs: 60,
            max_parallel: 4,
        }
    }
}
