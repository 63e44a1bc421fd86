//! The capability contract consumed by the orchestrator.
//!
//! The orchestrator depends only on this abstract interface — capability
//! internals (query translation, response generation, insight generation)
//! are out of its sight. Inputs travel as JSON objects; each capability
//! validates and deserializes its own typed view in `build_inputs`.

use async_trait::async_trait;
use serde_json::{Map, Value};

use marquee_core::capability::CapabilityDescriptor;
use marquee_core::task::Task;

use crate::errors::CapabilityError;

/// Identity scope a capability invocation runs under.
///
/// Travels with every invocation so capabilities can enforce tenant
/// isolation without reaching back into session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionScope {
    /// Session the task belongs to.
    pub session_id: String,
    /// Data-isolation scope for all lookups and queries.
    pub tenant_id: String,
    /// Requesting user.
    pub user_id: String,
}

/// Validated inputs for one capability invocation.
#[derive(Clone, Debug)]
pub struct CapabilityInputs {
    /// Identity scope.
    pub scope: SessionScope,
    /// Planner-provided parameters, validated by `build_inputs`.
    pub params: Map<String, Value>,
}

/// A pluggable unit of work.
///
/// `summarize` and `response_context` are pure views over the execution
/// payload: the first feeds the planner's task log, the second feeds the
/// final response composer.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Registration-time metadata shown to the planner.
    fn describe(&self) -> CapabilityDescriptor;

    /// Validate task inputs into an invocation. The default accepts the
    /// planner's inputs as-is; capabilities with required fields override
    /// this to reject malformed tasks before execution.
    fn build_inputs(
        &self,
        task: &Task,
        scope: &SessionScope,
    ) -> Result<CapabilityInputs, CapabilityError> {
        Ok(CapabilityInputs {
            scope: scope.clone(),
            params: task.inputs.clone(),
        })
    }

    /// Execute the capability. Errors are absorbed into a failed
    /// `TaskResult` at the dispatch boundary.
    async fn execute(&self, inputs: CapabilityInputs) -> Result<Value, CapabilityError>;

    /// One-line summary of a payload for the planner's task log.
    fn summarize(&self, payload: &Value) -> String;

    /// Fields the response composer may surface to the user.
    fn response_context(&self, payload: &Value) -> Map<String, Value> {
        payload.as_object().cloned().unwrap_or_default()
    }
}

/// Pull a required string parameter out of task inputs.
pub(crate) fn require_string(
    params: &Map<String, Value>,
    key: &str,
) -> Result<String, CapabilityError> {
    match params.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(CapabilityError::InvalidInputs(format!(
            "parameter '{key}' must not be empty"
        ))),
        Some(_) => Err(CapabilityError::InvalidInputs(format!(
            "parameter '{key}' must be a string"
        ))),
        None => Err(CapabilityError::InvalidInputs(format!(
            "missing required parameter '{key}'"
        ))),
    }
}
