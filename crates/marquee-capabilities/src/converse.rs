//! Conversational capability.
//!
//! Thin shell around an injected [`Conversationalist`]: the capability
//! owns input validation and payload shaping, the collaborator owns the
//! actual text generation. Greetings, capability questions, and follow-up
//! chatter all route here.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::instrument;

use marquee_core::capability::{CapabilityCategory, CapabilityDescriptor, FieldSpec};
use marquee_core::task::Task;

use crate::errors::CapabilityError;
use crate::traits::{Capability, CapabilityInputs, SessionScope, require_string};

/// Text-generation seam for conversational replies.
#[async_trait]
pub trait Conversationalist: Send + Sync {
    /// Produce a conversational reply to `message`.
    async fn respond(&self, message: &str, scope: &SessionScope)
    -> Result<String, CapabilityError>;
}

/// The `converse` capability.
pub struct ConverseCapability {
    generator: Arc<dyn Conversationalist>,
}

impl ConverseCapability {
    /// Create the capability around a reply generator.
    pub fn new(generator: Arc<dyn Conversationalist>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Capability for ConverseCapability {
    fn describe(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: "converse".into(),
            purpose: "Respond conversationally to greetings, questions about capabilities, and general chat".into(),
            category: CapabilityCategory::Communication,
            inputs: vec![FieldSpec::new(
                "message",
                "The user's message to respond to",
            )],
            outputs: vec![FieldSpec::new("response", "The conversational reply")],
            examples: vec![
                "hello".into(),
                "what can you do?".into(),
                "thanks, that's all".into(),
            ],
        }
    }

    fn build_inputs(
        &self,
        task: &Task,
        scope: &SessionScope,
    ) -> Result<CapabilityInputs, CapabilityError> {
        let _ = require_string(&task.inputs, "message")?;
        Ok(CapabilityInputs {
            scope: scope.clone(),
            params: task.inputs.clone(),
        })
    }

    #[instrument(skip(self, inputs), fields(session_id = %inputs.scope.session_id))]
    async fn execute(&self, inputs: CapabilityInputs) -> Result<Value, CapabilityError> {
        let message = require_string(&inputs.params, "message")?;
        let response = self.generator.respond(&message, &inputs.scope).await?;
        Ok(json!({ "response": response }))
    }

    fn summarize(&self, payload: &Value) -> String {
        let reply = payload["response"].as_str().unwrap_or_default();
        let mut preview: String = reply.chars().take(60).collect();
        if reply.chars().count() > 60 {
            preview.push('…');
        }
        format!("Replied: {preview}")
    }

    fn response_context(&self, payload: &Value) -> Map<String, Value> {
        let mut context = Map::new();
        let _ = context.insert("response".into(), payload["response"].clone());
        context
    }
}
