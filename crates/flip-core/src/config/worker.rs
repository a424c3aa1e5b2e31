//! Background worker configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Background transform worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorkerConfig {
    /// Whether transforms may run off the calling task.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Capacity of the request queue feeding the worker.
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, max = 1024))]
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    8
}
