//! Data-fetch capability.
//!
//! Turns a natural-language data request into a [`QueryPlan`] via the
//! injected [`QueryTranslator`], executes the plan with bounded
//! concurrency, and shapes the merged rows into a task payload. A plan
//! where every sub-query failed is an execution error; a plan where some
//! failed succeeds with failure metadata and a coverage caveat attached.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, instrument};

use marquee_core::capability::{CapabilityCategory, CapabilityDescriptor, FieldSpec};
use marquee_core::task::Task;

use crate::client::QueryClient;
use crate::errors::CapabilityError;
use crate::multi_fetch::{MultiFetchConfig, execute_plan};
use crate::query::{PlanStrategy, QueryPlan};
use crate::traits::{Capability, CapabilityInputs, SessionScope, require_string};

/// Planner-provided inputs for one data fetch, deserialized from task
/// inputs. Only `query_request` is required; the structured hints are
/// passed through to the translator when present.
#[derive(Clone, Debug, Deserialize)]
pub struct FetchRequest {
    /// Natural-language description of the data to fetch.
    pub query_request: String,
    /// Suggested measures.
    #[serde(default)]
    pub measures: Vec<String>,
    /// Suggested grouping dimensions.
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// Time context in the planner's words (e.g. `last quarter`).
    #[serde(default)]
    pub time_context: Option<String>,
    /// Row limit hint.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Natural language → [`QueryPlan`] seam.
#[async_trait]
pub trait QueryTranslator: Send + Sync {
    /// Translate a fetch request into an executable plan.
    async fn translate(
        &self,
        request: &FetchRequest,
        scope: &SessionScope,
    ) -> Result<QueryPlan, CapabilityError>;
}

/// The `fetch_data` capability.
pub struct FetchDataCapability {
    translator: Arc<dyn QueryTranslator>,
    client: Arc<dyn QueryClient>,
    config: MultiFetchConfig,
}

impl FetchDataCapability {
    /// Create the capability around a translator and query client.
    pub fn new(
        translator: Arc<dyn QueryTranslator>,
        client: Arc<dyn QueryClient>,
        config: MultiFetchConfig,
    ) -> Self {
        Self {
            translator,
            client,
            config,
        }
    }
}

#[async_trait]
impl Capability for FetchDataCapability {
    fn describe(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: "fetch_data".into(),
            purpose: "Execute analytical queries for ticketing metrics like revenue, attendance, and sales".into(),
            category: CapabilityCategory::Data,
            inputs: vec![
                FieldSpec::new("query_request", "Natural language description of the data to fetch"),
                FieldSpec::new("measures", "Optional list of suggested measures"),
                FieldSpec::new("dimensions", "Optional list of grouping dimensions"),
                FieldSpec::new("time_context", "Optional time window in plain words"),
                FieldSpec::new("limit", "Optional row limit"),
            ],
            outputs: vec![
                FieldSpec::new("rows", "Tabular result rows, merged in query order"),
                FieldSpec::new("total_rows", "Number of rows returned"),
                FieldSpec::new("coverage_caveat", "Present when some sub-queries failed"),
            ],
            examples: vec![
                "total revenue for Chicago last quarter".into(),
                "attendance by production this year".into(),
                "compare Q1 and Q2 ticket sales".into(),
            ],
        }
    }

    fn build_inputs(
        &self,
        task: &Task,
        scope: &SessionScope,
    ) -> Result<CapabilityInputs, CapabilityError> {
        let _ = require_string(&task.inputs, "query_request")?;
        let _: FetchRequest = serde_json::from_value(Value::Object(task.inputs.clone()))
            .map_err(|e| CapabilityError::InvalidInputs(e.to_string()))?;
        Ok(CapabilityInputs {
            scope: scope.clone(),
            params: task.inputs.clone(),
        })
    }

    #[instrument(skip(self, inputs), fields(tenant_id = %inputs.scope.tenant_id))]
    async fn execute(&self, inputs: CapabilityInputs) -> Result<Value, CapabilityError> {
        let request: FetchRequest = serde_json::from_value(Value::Object(inputs.params.clone()))
            .map_err(|e| CapabilityError::InvalidInputs(e.to_string()))?;

        let plan = self.translator.translate(&request, &inputs.scope).await?;
        info!(
            strategy = ?plan.strategy,
            queries = plan.queries.len(),
            "executing query plan"
        );

        let result = execute_plan(&*self.client, &plan, &inputs.scope.tenant_id, &self.config).await;
        if !result.success {
            let reasons: Vec<String> = result
                .failed_queries
                .iter()
                .map(|f| format!("{}: {}", f.label, f.reason))
                .collect();
            return Err(CapabilityError::Execution(format!(
                "all {} queries failed ({})",
                result.attempted,
                reasons.join("; ")
            )));
        }

        let strategy = match plan.strategy {
            PlanStrategy::Single => "single",
            PlanStrategy::Multi => "multi",
        };
        let mut payload = json!({
            "rows": result.rows,
            "total_rows": result.rows.len(),
            "strategy": strategy,
            "reasoning": plan.reasoning,
        });
        if !result.failed_queries.is_empty() {
            payload["failed_queries"] = serde_json::to_value(&result.failed_queries)
                .map_err(|e| CapabilityError::Execution(e.to_string()))?;
        }
        if let Some(caveat) = result.coverage_caveat {
            payload["coverage_caveat"] = json!(caveat);
        }
        Ok(payload)
    }

    fn summarize(&self, payload: &Value) -> String {
        let total = payload["total_rows"].as_u64().unwrap_or(0);
        match payload["coverage_caveat"].as_str() {
            Some(caveat) => format!("Fetched {total} rows. {caveat}"),
            None => format!("Fetched {total} rows"),
        }
    }

    fn response_context(&self, payload: &Value) -> Map<String, Value> {
        let mut context = Map::new();
        let _ = context.insert("rows".into(), payload["rows"].clone());
        let _ = context.insert("total_rows".into(), payload["total_rows"].clone());
        if let Some(caveat) = payload.get("coverage_caveat") {
            let _ = context.insert("coverage_caveat".into(), caveat.clone());
        }
        context
    }
}
