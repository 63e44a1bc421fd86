//! The planner seam — the non-deterministic decision oracle.
//!
//! The orchestrator treats the planner strictly as `context -> Decision`.
//! [`HttpPlanner`] posts the rendered context to a remote text-generation
//! endpoint and digs the first JSON object out of the reply; a reply with
//! no usable decision becomes the safe default rather than an error, so a
//! rambling oracle can never crash the loop. Transport failures do
//! propagate — a planner that cannot be reached ends the session.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use marquee_core::decision::Decision;

use crate::config::PlannerConfig;
use crate::context::PlannerContext;
use crate::errors::PlannerError;

/// Decision oracle interface.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Decide the next step given the rendered context.
    async fn decide(&self, context: &PlannerContext) -> Result<Decision, PlannerError>;
}

/// The decision substituted when the oracle's reply is unusable.
pub fn safe_default() -> Decision {
    Decision::Complete {
        response: "I wasn't able to work out how to handle that request. \
                   Could you rephrase it?"
            .into(),
        reasoning: None,
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    text: String,
}

/// HTTP-backed planner against a remote text-generation endpoint.
pub struct HttpPlanner {
    config: PlannerConfig,
    http: reqwest::Client,
}

impl HttpPlanner {
    /// Create a planner for the configured endpoint.
    pub fn new(config: PlannerConfig) -> Result<Self, PlannerError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PlannerError::Transport(e.to_string()))?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl Planner for HttpPlanner {
    #[instrument(skip(self, context))]
    async fn decide(&self, context: &PlannerContext) -> Result<Decision, PlannerError> {
        let url = format!(
            "{}/v1/generate",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .json(&json!({ "prompt": context.text }))
            .send()
            .await
            .map_err(|e| PlannerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlannerError::Transport(format!("HTTP {status}")));
        }
        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PlannerError::Transport(format!("undecodable reply: {e}")))?;

        match first_json_object(&reply.text).map(Decision::from_value) {
            Some(Ok(decision)) => Ok(decision),
            Some(Err(e)) => {
                warn!(error = %e, "planner reply failed validation, substituting safe default");
                Ok(safe_default())
            }
            None => {
                warn!("planner reply contained no JSON object, substituting safe default");
                Ok(safe_default())
            }
        }
    }
}

/// Find and parse the first complete JSON object embedded in `text`.
///
/// Oracles wrap their decision in prose and code fences; a brace-depth
/// scan (string- and escape-aware) finds each balanced `{...}` span and
/// the first one that parses wins.
fn first_json_object(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' if depth > 0 => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        if let Ok(value) = serde_json::from_str::<Value>(&text[s..=i]) {
                            debug!(span = i - s + 1, "extracted planner decision JSON");
                            return Some(value);
                        }
                    }
                    start = None;
                }
            }
            _ => {}
        }
    }
    None
}

/// Deterministic planner for tests: replays a scripted decision sequence
/// and falls back to `fallback` when the script is exhausted.
pub struct ScriptedPlanner {
    script: Mutex<VecDeque<Decision>>,
    fallback: Decision,
}

impl ScriptedPlanner {
    /// Replay `decisions` in order, then keep returning the safe default.
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self {
            script: Mutex::new(decisions.into()),
            fallback: safe_default(),
        }
    }

    /// Return `decision` on every call, forever.
    pub fn repeating(decision: Decision) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: decision,
        }
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn decide(&self, _context: &PlannerContext) -> Result<Decision, PlannerError> {
        Ok(self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}
