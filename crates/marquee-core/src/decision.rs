//! Planner decisions.
//!
//! The planner oracle returns one of two actions per iteration: complete
//! with a final answer, or execute a named capability. The wire shape is
//! a tagged JSON object; [`Decision::from_value`] validates it without
//! trusting the oracle to be well-formed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw wire shape of a planner reply, before validation.
#[derive(Debug, Deserialize)]
struct RawDecision {
    action: String,
    #[serde(default)]
    capability: Option<String>,
    #[serde(default)]
    inputs: Option<Map<String, Value>>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// A validated decision from the planner oracle.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    /// Terminate the loop with a final answer.
    Complete {
        /// The planner's answer text.
        response: String,
        /// Optional reasoning, kept for traces.
        #[serde(skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
    },
    /// Dispatch one capability and loop again.
    Execute {
        /// Capability name to invoke.
        capability: String,
        /// Inputs for the capability.
        inputs: Map<String, Value>,
        /// Optional reasoning, kept for traces.
        #[serde(skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
    },
}

/// Why a planner reply failed validation.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// Reply was not a JSON object of the expected shape.
    #[error("decision is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// `action` was neither `execute` nor `complete`.
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    /// `action=execute` without a capability name.
    #[error("action 'execute' requires a capability name")]
    MissingCapability,
}

impl Decision {
    /// Validate a raw JSON value into a decision.
    ///
    /// `action=complete` without a response is tolerated (the original
    /// behavior): a generic completion message is substituted.
    pub fn from_value(value: Value) -> Result<Self, DecisionError> {
        let raw: RawDecision = serde_json::from_value(value)?;
        match raw.action.as_str() {
            "complete" => Ok(Self::Complete {
                response: raw
                    .response
                    .unwrap_or_else(|| "Task completed successfully".to_string()),
                reasoning: raw.reasoning,
            }),
            "execute" => {
                let capability = raw.capability.ok_or(DecisionError::MissingCapability)?;
                Ok(Self::Execute {
                    capability,
                    inputs: raw.inputs.unwrap_or_default(),
                    reasoning: raw.reasoning,
                })
            }
            other => Err(DecisionError::UnknownAction(other.to_string())),
        }
    }
}
