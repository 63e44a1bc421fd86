//! Final responses synthesized when a session completes.

use serde::{Deserialize, Serialize};

/// Structured final response from an orchestration session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalResponse {
    /// Human-readable answer.
    pub message: String,
    /// Id of the task whose data backs the answer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    /// Key insights pulled from analysis tasks.
    #[serde(default)]
    pub insights: Vec<String>,
    /// Actionable recommendations.
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Confidence in the answer, `[0, 1]`.
    pub confidence: f64,
    /// Whether raw task payloads should accompany the answer.
    #[serde(default)]
    pub include_previous_results: bool,
}

impl FinalResponse {
    /// A plain-text response with default confidence.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            data_source: None,
            insights: Vec::new(),
            recommendations: Vec::new(),
            confidence: 0.8,
            include_previous_results: false,
        }
    }
}
