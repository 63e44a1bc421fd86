//! The orchestration loop.
//!
//! One iteration: render context → ask the planner → either complete the
//! session or dispatch one task and append its result. The loop counter
//! increments after every iteration that keeps the session processing,
//! and the session ends in ERROR once the counter passes the cap, so a
//! planner that never completes cannot run forever. Task ids are assigned in dispatch order (`t1`, `t2`, …)
//! and results are appended unconditionally, failures included — the
//! planner sees failures in context and routes around them.

use std::sync::Arc;
use std::time::Instant;

use metrics::counter;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use marquee_capabilities::Catalog;
use marquee_core::decision::Decision;
use marquee_core::events::MarqueeEvent;
use marquee_core::task::Task;

use crate::compose::{DefaultComposer, ResponseComposer};
use crate::config::OrchestratorConfig;
use crate::context::ContextBuilder;
use crate::errors::{PlannerError, RuntimeError};
use crate::event_emitter::EventEmitter;
use crate::executor::TaskExecutor;
use crate::planner::{Planner, safe_default};
use crate::session::{OrchestrationState, SessionStatus};

/// Drives sessions from Processing to a terminal state.
pub struct Orchestrator {
    planner: Arc<dyn Planner>,
    executor: TaskExecutor,
    context: ContextBuilder,
    composer: Arc<dyn ResponseComposer>,
    config: OrchestratorConfig,
    events: Arc<EventEmitter>,
}

impl Orchestrator {
    /// Create an orchestrator over `planner` and `catalog`.
    pub fn new(planner: Arc<dyn Planner>, catalog: Arc<Catalog>, config: OrchestratorConfig) -> Self {
        Self {
            planner,
            executor: TaskExecutor::new(Arc::clone(&catalog), config.task_timeout),
            context: ContextBuilder::new(catalog)
                .with_cutoffs(config.medium_confidence, config.ambiguity_threshold),
            composer: Arc::new(DefaultComposer),
            config,
            events: Arc::new(EventEmitter::new()),
        }
    }

    /// Swap in a custom response composer.
    #[must_use]
    pub fn with_composer(mut self, composer: Arc<dyn ResponseComposer>) -> Self {
        self.composer = composer;
        self
    }

    /// The lifecycle event emitter.
    pub fn events(&self) -> &Arc<EventEmitter> {
        &self.events
    }

    /// Run `state` until it reaches a terminal status.
    #[instrument(skip(self, state), fields(session_id = %state.session_id))]
    pub async fn run(&self, state: &mut OrchestrationState) {
        while state.status == SessionStatus::Processing {
            let iteration = state.loop_count + 1;
            let context = self.context.build(state);

            let decision = match self.planner.decide(&context).await {
                Ok(decision) => decision,
                Err(PlannerError::Malformed(reason)) => {
                    warn!(iteration, reason, "malformed planner decision, using safe default");
                    safe_default()
                }
                Err(e @ PlannerError::Transport(_)) => {
                    error!(iteration, error = %e, "planner unreachable");
                    state.fail(format!("planner unavailable: {e}"));
                    break;
                }
            };
            counter!("orchestration_iterations").increment(1);
            let _ = self.events.emit(MarqueeEvent::DecisionMade {
                session_id: state.session_id.clone(),
                iteration,
                decision: decision.clone(),
            });

            match decision {
                Decision::Complete { response, .. } => {
                    info!(iteration, "planner completed the session");
                    let final_response = self.composer.compose(&response, state);
                    state.complete(final_response);
                }
                Decision::Execute {
                    capability, inputs, ..
                } => {
                    let task = Task::new(state.next_sequence(), capability, inputs);
                    let started = Instant::now();
                    let result = self.executor.dispatch(&task, &state.scope()).await;
                    let _ = self.events.emit(MarqueeEvent::TaskCompleted {
                        session_id: state.session_id.clone(),
                        task_id: result.task_id.clone(),
                        capability: result.capability.clone(),
                        success: result.success,
                        duration_ms: started.elapsed().as_millis() as u64,
                    });
                    state.completed_tasks.push(result);
                }
            }

            // A completing iteration stops before the counter advances, so
            // a finished session reports only the iterations that looped.
            if state.status == SessionStatus::Processing {
                state.loop_count += 1;
                if state.loop_count > self.config.max_iterations {
                    let limit = RuntimeError::LoopLimitExceeded {
                        limit: self.config.max_iterations,
                    };
                    warn!(loop_count = state.loop_count, "loop limit exceeded");
                    state.fail(limit.to_string());
                }
            }
        }

        let status = if state.status == SessionStatus::Complete {
            "complete"
        } else {
            "error"
        };
        info!(status, tasks = state.completed_tasks.len(), "session finished");
        let _ = self.events.emit(MarqueeEvent::SessionCompleted {
            session_id: state.session_id.clone(),
            status: status.into(),
            reason: state.error.clone(),
            task_count: state.completed_tasks.len(),
            detail: Value::Null,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::ScriptedPlanner;
    use async_trait::async_trait;
    use marquee_capabilities::CatalogBuilder;
    use marquee_capabilities::errors::CapabilityError;
    use marquee_capabilities::traits::{Capability, CapabilityInputs};
    use marquee_core::capability::{CapabilityCategory, CapabilityDescriptor};
    use serde_json::{Map, json};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct EchoCapability;

    #[async_trait]
    impl Capability for EchoCapability {
        fn describe(&self) -> CapabilityDescriptor {
            CapabilityDescriptor {
                name: "echo".into(),
                purpose: "Echo inputs".into(),
                category: CapabilityCategory::General,
                inputs: vec![],
                outputs: vec![],
                examples: vec![],
            }
        }

        async fn execute(&self, inputs: CapabilityInputs) -> Result<Value, CapabilityError> {
            if inputs.params.contains_key("fail") {
                return Err(CapabilityError::Execution("synthetic failure".into()));
            }
            Ok(Value::Object(inputs.params))
        }

        fn summarize(&self, _payload: &Value) -> String {
            "echoed".into()
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            CatalogBuilder::new()
                .register(Arc::new(EchoCapability))
                .unwrap()
                .build(),
        )
    }

    fn execute(capability: &str, inputs: Map<String, Value>) -> Decision {
        Decision::Execute {
            capability: capability.into(),
            inputs,
            reasoning: None,
        }
    }

    fn complete(response: &str) -> Decision {
        Decision::Complete {
            response: response.into(),
            reasoning: None,
        }
    }

    fn config(max_iterations: u32) -> OrchestratorConfig {
        OrchestratorConfig {
            max_iterations,
            ..OrchestratorConfig::default()
        }
    }

    #[tokio::test]
    async fn completes_when_the_planner_completes() {
        let planner = ScriptedPlanner::new(vec![
            execute("echo", Map::new()),
            complete("All done."),
        ]);
        let orchestrator = Orchestrator::new(Arc::new(planner), catalog(), config(20));
        let mut state = OrchestrationState::new("tenant_a", "u1", "q");

        orchestrator.run(&mut state).await;

        assert_eq!(state.status, SessionStatus::Complete);
        // Only the execute iteration counts; completing stops the loop
        // before the counter advances.
        assert_eq!(state.loop_count, 1);
        let response = state.final_response.unwrap();
        assert_eq!(response.message, "All done.");
        assert_eq!(response.data_source.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn immediate_completion_leaves_the_counter_at_zero() {
        let planner = ScriptedPlanner::new(vec![complete("nothing to do")]);
        let orchestrator = Orchestrator::new(Arc::new(planner), catalog(), config(20));
        let mut state = OrchestrationState::new("tenant_a", "u1", "q");

        orchestrator.run(&mut state).await;

        assert_eq!(state.status, SessionStatus::Complete);
        assert_eq!(state.loop_count, 0);
        assert!(state.completed_tasks.is_empty());
    }

    #[tokio::test]
    async fn ghost_capability_loop_ends_in_error_at_cap_plus_one() {
        let mut inputs = Map::new();
        let _ = inputs.insert("query_request".into(), json!("anything"));
        let planner = ScriptedPlanner::repeating(execute("ghost", inputs));
        let orchestrator = Orchestrator::new(Arc::new(planner), catalog(), config(5));
        let mut state = OrchestrationState::new("tenant_a", "u1", "q");

        orchestrator.run(&mut state).await;

        assert_eq!(state.status, SessionStatus::Error);
        assert_eq!(state.loop_count, 6);
        assert!(state.error.unwrap().contains("loop limit of 5 iterations"));
        // Every iteration recorded a failed task; none were dropped.
        assert_eq!(state.completed_tasks.len(), 6);
        assert!(state.completed_tasks.iter().all(|r| !r.success));
        assert!(
            state.completed_tasks[0]
                .error
                .as_ref()
                .unwrap()
                .contains("unknown capability 'ghost'")
        );
    }

    #[tokio::test]
    async fn task_ids_stay_ordered_across_failures() {
        let mut failing = Map::new();
        let _ = failing.insert("fail".into(), json!(true));
        let planner = ScriptedPlanner::new(vec![
            execute("echo", Map::new()),
            execute("ghost", Map::new()),
            execute("echo", failing),
            execute("echo", Map::new()),
            complete("done"),
        ]);
        let orchestrator = Orchestrator::new(Arc::new(planner), catalog(), config(20));
        let mut state = OrchestrationState::new("tenant_a", "u1", "q");

        orchestrator.run(&mut state).await;

        let ids: Vec<&str> = state
            .completed_tasks
            .iter()
            .map(|r| r.task_id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1", "t2", "t3", "t4"]);
        let outcomes: Vec<bool> = state.completed_tasks.iter().map(|r| r.success).collect();
        assert_eq!(outcomes, vec![true, false, false, true]);
    }

    #[tokio::test]
    async fn malformed_planner_reply_recovers_to_safe_default() {
        struct MalformedOncePlanner {
            tripped: AtomicBool,
        }

        #[async_trait]
        impl Planner for MalformedOncePlanner {
            async fn decide(
                &self,
                _context: &crate::context::PlannerContext,
            ) -> Result<Decision, PlannerError> {
                if self.tripped.swap(true, Ordering::SeqCst) {
                    Ok(complete("should not be reached"))
                } else {
                    Err(PlannerError::Malformed("not json".into()))
                }
            }
        }

        let planner = MalformedOncePlanner {
            tripped: AtomicBool::new(false),
        };
        let orchestrator = Orchestrator::new(Arc::new(planner), catalog(), config(20));
        let mut state = OrchestrationState::new("tenant_a", "u1", "q");

        orchestrator.run(&mut state).await;

        // Safe default is a completion, so the first iteration already ends
        // the session gracefully.
        assert_eq!(state.status, SessionStatus::Complete);
        assert_eq!(state.loop_count, 0);
        assert_eq!(state.final_response.unwrap(), safe_default_response());
    }

    fn safe_default_response() -> marquee_core::response::FinalResponse {
        match safe_default() {
            Decision::Complete { response, .. } => {
                marquee_core::response::FinalResponse::message(response)
            }
            Decision::Execute { .. } => unreachable!(),
        }
    }

    #[tokio::test]
    async fn unreachable_planner_fails_the_session() {
        struct DownPlanner;

        #[async_trait]
        impl Planner for DownPlanner {
            async fn decide(
                &self,
                _context: &crate::context::PlannerContext,
            ) -> Result<Decision, PlannerError> {
                Err(PlannerError::Transport("connection refused".into()))
            }
        }

        let orchestrator = Orchestrator::new(Arc::new(DownPlanner), catalog(), config(20));
        let mut state = OrchestrationState::new("tenant_a", "u1", "q");

        orchestrator.run(&mut state).await;

        assert_eq!(state.status, SessionStatus::Error);
        assert!(state.error.unwrap().contains("planner unavailable"));
        assert!(state.completed_tasks.is_empty());
    }

    #[tokio::test]
    async fn lifecycle_events_are_broadcast() {
        let planner = ScriptedPlanner::new(vec![
            execute("echo", Map::new()),
            complete("done"),
        ]);
        let orchestrator = Orchestrator::new(Arc::new(planner), catalog(), config(20));
        let mut rx = orchestrator.events().subscribe();
        let mut state = OrchestrationState::new("tenant_a", "u1", "q");

        orchestrator.run(&mut state).await;

        let mut types = Vec::new();
        while let Ok(event) = rx.try_recv() {
            types.push(event.event_type());
        }
        assert_eq!(
            types,
            vec![
                "decision_made",
                "task_completed",
                "decision_made",
                "session_completed"
            ]
        );
    }
}
