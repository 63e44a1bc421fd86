//! # marquee-runtime
//!
//! The orchestration state machine and agent pipeline.
//!
//! - **Session**: per-request [`session::OrchestrationState`]; terminal
//!   states never mutate
//! - **Context**: renders what the planner is allowed to see each
//!   iteration
//! - **Planner seam**: [`planner::Planner`] trait, HTTP implementation
//!   with safe-default recovery, scripted stub for tests
//! - **Executor**: the dispatch boundary; every capability failure
//!   becomes a failed task result
//! - **Orchestrator**: the bounded decision loop
//! - **Agent**: extract → resolve → orchestrate, one call per request
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: marquee-core, marquee-resolver,
//! marquee-capabilities.

#![deny(unsafe_code)]

pub mod agent;
pub mod compose;
pub mod config;
pub mod context;
pub mod errors;
pub mod event_emitter;
pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod session;

pub use agent::{FrameExtractor, MarqueeAgent};
pub use compose::{DefaultComposer, ResponseComposer};
pub use config::{OrchestratorConfig, PlannerConfig};
pub use context::{ContextBuilder, PlannerContext};
pub use errors::{PlannerError, RuntimeError};
pub use event_emitter::EventEmitter;
pub use executor::TaskExecutor;
pub use orchestrator::Orchestrator;
pub use planner::{HttpPlanner, Planner, ScriptedPlanner};
pub use session::{OrchestrationState, SessionStatus};
