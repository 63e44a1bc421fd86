//! Analysis capability.
//!
//! Takes an analysis request plus the data gathered by earlier tasks and
//! asks the injected [`InsightGenerator`] for insights and
//! recommendations. Like the other capabilities it owns only validation
//! and payload shaping.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use marquee_core::capability::{CapabilityCategory, CapabilityDescriptor, FieldSpec};
use marquee_core::task::Task;

use crate::errors::CapabilityError;
use crate::traits::{Capability, CapabilityInputs, SessionScope, require_string};

/// Structured output of an analysis pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// One-paragraph summary of what the data shows.
    pub summary: String,
    /// Notable patterns and findings.
    #[serde(default)]
    pub insights: Vec<String>,
    /// Suggested follow-up actions.
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Insight-generation seam.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    /// Analyze `data` according to `request`.
    async fn analyze(
        &self,
        request: &str,
        data: &Value,
        scope: &SessionScope,
    ) -> Result<Analysis, CapabilityError>;
}

/// The `analyze` capability.
pub struct AnalyzeCapability {
    insights: Arc<dyn InsightGenerator>,
}

impl AnalyzeCapability {
    /// Create the capability around an insight generator.
    pub fn new(insights: Arc<dyn InsightGenerator>) -> Self {
        Self { insights }
    }
}

#[async_trait]
impl Capability for AnalyzeCapability {
    fn describe(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: "analyze".into(),
            purpose: "Analyze fetched data for patterns, trends, and actionable insights".into(),
            category: CapabilityCategory::Analysis,
            inputs: vec![
                FieldSpec::new("analysis_request", "What to look for in the data"),
                FieldSpec::new("data", "Rows or payloads from earlier tasks to analyze"),
            ],
            outputs: vec![
                FieldSpec::new("summary", "What the data shows"),
                FieldSpec::new("insights", "Notable patterns and findings"),
                FieldSpec::new("recommendations", "Suggested follow-up actions"),
            ],
            examples: vec![
                "why did revenue drop in March?".into(),
                "which productions are trending up?".into(),
                "compare weekday and weekend attendance".into(),
            ],
        }
    }

    fn build_inputs(
        &self,
        task: &Task,
        scope: &SessionScope,
    ) -> Result<CapabilityInputs, CapabilityError> {
        let _ = require_string(&task.inputs, "analysis_request")?;
        Ok(CapabilityInputs {
            scope: scope.clone(),
            params: task.inputs.clone(),
        })
    }

    #[instrument(skip(self, inputs), fields(session_id = %inputs.scope.session_id))]
    async fn execute(&self, inputs: CapabilityInputs) -> Result<Value, CapabilityError> {
        let request = require_string(&inputs.params, "analysis_request")?;
        let data = inputs.params.get("data").cloned().unwrap_or(Value::Null);
        let analysis = self.insights.analyze(&request, &data, &inputs.scope).await?;
        serde_json::to_value(&analysis).map_err(|e| CapabilityError::Execution(e.to_string()))
    }

    fn summarize(&self, payload: &Value) -> String {
        let count = payload["insights"].as_array().map_or(0, Vec::len);
        let summary = payload["summary"].as_str().unwrap_or_default();
        if summary.is_empty() {
            format!("Produced {count} insights")
        } else {
            format!("Produced {count} insights: {summary}")
        }
    }
}
