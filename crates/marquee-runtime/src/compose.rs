//! Final response composition.
//!
//! When the planner completes, its answer text is combined with what the
//! session actually produced: the most recent successful task contributes
//! its response-context fields (insights, recommendations, raw rows).
//! The seam is a trait so richer composers can be dropped in without
//! touching the loop.

use serde_json::Value;

use marquee_core::response::FinalResponse;
use marquee_core::task::TaskResult;

use crate::session::OrchestrationState;

/// Builds the [`FinalResponse`] for a completing session.
pub trait ResponseComposer: Send + Sync {
    /// Compose the final response from the planner's answer and the
    /// session's task log.
    fn compose(&self, message: &str, state: &OrchestrationState) -> FinalResponse;
}

/// Default composer: planner text plus the latest successful task's
/// response context.
#[derive(Default)]
pub struct DefaultComposer;

impl ResponseComposer for DefaultComposer {
    fn compose(&self, message: &str, state: &OrchestrationState) -> FinalResponse {
        let mut response = FinalResponse::message(message);

        if let Some(source) = latest_success(state) {
            response.data_source = Some(source.task_id.clone());
            response.include_previous_results = !source.response_context.is_empty();
            response.insights = string_list(source.response_context.get("insights"));
            response.recommendations =
                string_list(source.response_context.get("recommendations"));
        }
        response
    }
}

fn latest_success(state: &OrchestrationState) -> Option<&TaskResult> {
    state.completed_tasks.iter().rev().find(|r| r.success)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
