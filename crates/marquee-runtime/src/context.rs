//! Planner context assembly.
//!
//! Renders everything the planner is allowed to see into one text block:
//! the request, the semantic understanding (resolved entities with their
//! catalog ids, ambiguities spelled out candidate-by-candidate), the task
//! log most-recent-first, the capability catalog, and fixed decision
//! instructions. The planner sees nothing else — no session internals, no
//! raw datastore rows.

use std::sync::Arc;

use marquee_capabilities::Catalog;
use marquee_core::frame::ResolvedEntity;

use crate::session::OrchestrationState;

/// Decision-format instructions appended to every context.
const INSTRUCTIONS: &str = "\
Decide the single next step. Reply with one JSON object, nothing else:\n\
  {\"action\": \"execute\", \"capability\": \"<name>\", \"inputs\": {...}, \"reasoning\": \"...\"}\n\
  {\"action\": \"complete\", \"response\": \"<final answer for the user>\", \"reasoning\": \"...\"}\n\
Use `complete` once the task log already answers the request. \
Never invent capability names: only the listed ones exist.";

/// Rendered planner input for one loop iteration.
#[derive(Clone, Debug)]
pub struct PlannerContext {
    /// The full rendered text.
    pub text: String,
}

/// Builds [`PlannerContext`] values from session state.
pub struct ContextBuilder {
    catalog: Arc<Catalog>,
    /// Transformed-score cutoff below which a match is not worth showing.
    medium_confidence: f64,
    /// Transformed-score level above which two candidates are ambiguous.
    ambiguity_threshold: f64,
}

impl ContextBuilder {
    /// Create a builder over `catalog` with the default cutoffs.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            medium_confidence: 0.5,
            ambiguity_threshold: 0.7,
        }
    }

    /// Override the rendering cutoffs.
    #[must_use]
    pub fn with_cutoffs(mut self, medium_confidence: f64, ambiguity_threshold: f64) -> Self {
        self.medium_confidence = medium_confidence;
        self.ambiguity_threshold = ambiguity_threshold;
        self
    }

    /// Render the context for the current iteration.
    pub fn build(&self, state: &OrchestrationState) -> PlannerContext {
        let mut text = format!("## Request\n{}\n", state.query);

        if let Some(frame) = &state.frame {
            text.push_str("\n## Semantic understanding\n");
            if !frame.concepts.is_empty() {
                text.push_str(&format!("Concepts: {}\n", frame.concepts.join(", ")));
            }
            for resolved in &frame.resolved_entities {
                text.push_str(&self.render_entity(resolved));
                text.push('\n');
            }
        }

        if !state.completed_tasks.is_empty() {
            text.push_str("\n## Completed tasks (most recent first)\n");
            for result in state.completed_tasks.iter().rev() {
                let outcome = if result.success { "ok" } else { "FAILED" };
                text.push_str(&format!(
                    "{} {} [{}]: {}\n",
                    result.task_id, result.capability, outcome, result.summary
                ));
            }
        }

        text.push_str("\n## Capabilities\n");
        for descriptor in self.catalog.descriptors() {
            text.push_str(&descriptor.render());
            text.push('\n');
        }

        text.push_str("\n## Instructions\n");
        text.push_str(INSTRUCTIONS);

        PlannerContext { text }
    }

    fn render_entity(&self, resolved: &ResolvedEntity) -> String {
        if resolved.is_ambiguous(self.ambiguity_threshold) {
            return format!(
                "AMBIGUOUS: {}",
                resolved.ambiguity_context(self.ambiguity_threshold)
            );
        }
        match resolved.best() {
            Some(best) if best.score >= self.medium_confidence => {
                format!("{} -> {}", resolved.text, best.disambiguation)
            }
            _ => format!("{}: no confident match found", resolved.text),
        }
    }
}
