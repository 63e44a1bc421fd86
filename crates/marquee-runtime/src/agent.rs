//! The end-to-end agent pipeline: extract → resolve → orchestrate.
//!
//! [`MarqueeAgent`] wires the external extraction step, the entity
//! resolver, and the orchestration loop into one entry point per user
//! request. Extraction and resolution failures end the session before the
//! loop ever starts; resolver unavailability is the one infrastructure
//! failure that is never absorbed into a task result.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, instrument};

use marquee_core::events::MarqueeEvent;
use marquee_core::frame::Frame;
use marquee_resolver::EntityResolver;

use crate::errors::RuntimeError;
use crate::orchestrator::Orchestrator;
use crate::session::{OrchestrationState, SessionStatus};

/// External step that breaks a query into a frame of entity mentions and
/// concepts. Tests construct frames by hand.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Extract the semantic frame for `query`.
    async fn extract(&self, query: &str) -> Result<Frame, RuntimeError>;
}

/// One user request in, one terminal [`OrchestrationState`] out.
pub struct MarqueeAgent {
    extractor: Arc<dyn FrameExtractor>,
    resolver: EntityResolver,
    orchestrator: Orchestrator,
}

impl MarqueeAgent {
    /// Assemble the pipeline.
    pub fn new(
        extractor: Arc<dyn FrameExtractor>,
        resolver: EntityResolver,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            extractor,
            resolver,
            orchestrator,
        }
    }

    /// The underlying orchestrator (for event subscription).
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Handle one request end to end. Always returns a terminal state.
    #[instrument(skip(self, query))]
    pub async fn handle(&self, tenant_id: &str, user_id: &str, query: &str) -> OrchestrationState {
        let mut state = OrchestrationState::new(tenant_id, user_id, query);

        let frame = match self.extractor.extract(query).await {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "frame extraction failed");
                state.fail(e.to_string());
                self.emit_terminal(&state);
                return state;
            }
        };

        state.frame = Some(frame);
        let tenant = state.tenant_id.clone();
        if let Some(frame) = state.frame.as_mut() {
            if frame.needs_resolution() {
                if let Err(e) = self.resolver.resolve_frame(frame, &tenant).await {
                    error!(error = %e, "entity resolution failed");
                    state.fail(format!("entity datastore unavailable: {e}"));
                    self.emit_terminal(&state);
                    return state;
                }
                info!(
                    frame_id = %frame.id,
                    entities = frame.resolved_entities.len(),
                    "frame resolved"
                );
                let _ = self.orchestrator.events().emit(MarqueeEvent::FrameResolved {
                    session_id: state.session_id.clone(),
                    frame_id: frame.id.clone(),
                    entity_count: frame.resolved_entities.len(),
                });
            }
        }

        self.orchestrator.run(&mut state).await;
        state
    }

    /// Emit `SessionCompleted` for sessions that failed before the loop.
    fn emit_terminal(&self, state: &OrchestrationState) {
        let status = if state.status == SessionStatus::Complete {
            "complete"
        } else {
            "error"
        };
        let _ = self.orchestrator.events().emit(MarqueeEvent::SessionCompleted {
            session_id: state.session_id.clone(),
            status: status.into(),
            reason: state.error.clone(),
            task_count: state.completed_tasks.len(),
            detail: Value::Null,
        });
    }
}
