//! Runtime configuration knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Orchestration loop policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Iteration cap. The loop ends in ERROR when the counter passes it.
    pub max_iterations: u32,
    /// Bounded timeout for one capability execution.
    pub task_timeout: Duration,
    /// Transformed-score cutoff below which a resolved entity is rendered
    /// as having no confident match.
    pub medium_confidence: f64,
    /// Transformed-score level above which two candidates are rendered as
    /// ambiguous.
    pub ambiguity_threshold: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            task_timeout: Duration::from_secs(60),
            medium_confidence: 0.5,
            ambiguity_threshold: 0.7,
        }
    }
}

/// HTTP planner endpoint settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Base URL of the text-generation endpoint.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl PlannerConfig {
    /// Settings for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(60),
        }
    }
}
