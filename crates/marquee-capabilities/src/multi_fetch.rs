//! Bounded-concurrency multi-query execution with partial-failure
//! aggregation.
//!
//! Sub-queries are independent request→response calls with no shared
//! mutable state, so up to `concurrency` of them run at once. Results are
//! merged in **index order**, never completion order: rows from query 0
//! always precede rows from query 2, regardless of which finished first.
//! A failed sub-query becomes metadata travelling alongside the partial
//! data — it never aborts the whole request.

use std::time::Duration;

use futures::StreamExt;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::client::QueryClient;
use crate::errors::QueryError;
use crate::query::{QueryPlan, Row};

/// Policy knobs for multi-fetch execution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiFetchConfig {
    /// Maximum sub-queries in flight at once.
    pub concurrency: usize,
    /// Bounded timeout per sub-query.
    pub query_timeout: Duration,
}

impl Default for MultiFetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            query_timeout: Duration::from_secs(30),
        }
    }
}

/// Failure record for one sub-query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedQuery {
    /// Zero-based index of the sub-query in the plan.
    pub index: usize,
    /// The sub-query's label.
    pub label: String,
    /// Why it failed.
    pub reason: String,
}

/// Aggregated outcome of a plan execution.
///
/// `success` means at least one sub-query succeeded; `rows` is the
/// index-order concatenation of rows from succeeding sub-queries only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiFetchResult {
    /// At least one sub-query succeeded.
    pub success: bool,
    /// Merged rows, index order.
    pub rows: Vec<Row>,
    /// One entry per failed sub-query.
    pub failed_queries: Vec<FailedQuery>,
    /// Number of sub-queries attempted.
    pub attempted: usize,
    /// Coverage caveat when the result is partial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_caveat: Option<String>,
}

/// Execute every sub-query of `plan` and merge the results.
#[instrument(skip(client, plan), fields(queries = plan.queries.len()))]
pub async fn execute_plan(
    client: &dyn QueryClient,
    plan: &QueryPlan,
    tenant_id: &str,
    config: &MultiFetchConfig,
) -> MultiFetchResult {
    let timeout = config.query_timeout;
    let sub_futures: Vec<_> = plan
        .queries
        .iter()
        .enumerate()
        .map(|(index, query)| {
            let label = if query.label.is_empty() {
                format!("query {}", index + 1)
            } else {
                query.label.clone()
            };
            async move {
                let outcome = match tokio::time::timeout(timeout, client.submit(query, tenant_id))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(QueryError::Timeout(timeout)),
                };
                (index, label, outcome)
            }
        })
        .collect();
    let outcomes: Vec<(usize, String, Result<Vec<Row>, QueryError>)> =
        futures::stream::iter(sub_futures)
            .buffered(config.concurrency.max(1))
            .collect()
            .await;

    let attempted = outcomes.len();
    let mut rows = Vec::new();
    let mut failed_queries = Vec::new();
    for (index, label, outcome) in outcomes {
        match outcome {
            Ok(mut sub_rows) => rows.append(&mut sub_rows),
            Err(e) => {
                warn!(index, label, error = %e, "sub-query failed");
                counter!("subquery_failures_total").increment(1);
                failed_queries.push(FailedQuery {
                    index,
                    label,
                    reason: e.to_string(),
                });
            }
        }
    }

    let success = attempted > failed_queries.len();
    let coverage_caveat = if success && !failed_queries.is_empty() {
        let labels: Vec<&str> = failed_queries.iter().map(|f| f.label.as_str()).collect();
        Some(format!(
            "Partial data: {} of {attempted} queries failed ({})",
            failed_queries.len(),
            labels.join(", ")
        ))
    } else {
        None
    };

    info!(
        attempted,
        failed = failed_queries.len(),
        row_count = rows.len(),
        "plan executed"
    );

    MultiFetchResult {
        success,
        rows,
        failed_queries,
        attempted,
        coverage_caveat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{PlanStrategy, SubQuery};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Client whose behavior is keyed by sub-query label: `fail:*` labels
    /// error, `slow:*` labels sleep first, anything else returns one row
    /// echoing the label.
    struct ScriptedClient {
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl ScriptedClient {
        fn new() -> Self {
            Self {
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl QueryClient for ScriptedClient {
        async fn submit(&self, query: &SubQuery, _tenant_id: &str) -> Result<Vec<Row>, QueryError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if query.label.starts_with("fail") || query.label.is_empty() {
                return Err(QueryError::Service("window unavailable".into()));
            }
            if query.label.starts_with("slow") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            let mut row = Row::new();
            let _ = row.insert("label".into(), json!(query.label));
            Ok(vec![row])
        }
    }

    fn plan(labels: &[&str]) -> QueryPlan {
        QueryPlan {
            strategy: if labels.len() > 1 {
                PlanStrategy::Multi
            } else {
                PlanStrategy::Single
            },
            queries: labels
                .iter()
                .map(|label| SubQuery {
                    label: (*label).into(),
                    measures: vec!["ticket_line_items.amount".into()],
                    ..SubQuery::default()
                })
                .collect(),
            reasoning: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_of_three_is_partial_success() {
        let client = ScriptedClient::new();
        let result = execute_plan(
            &client,
            &plan(&["q1", "fail:q2", "q3"]),
            "tenant_a",
            &MultiFetchConfig::default(),
        )
        .await;

        assert!(result.success);
        assert_eq!(result.attempted, 3);
        // Rows from q1 then q3, index order, failed query absent.
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0]["label"], json!("q1"));
        assert_eq!(result.rows[1]["label"], json!("q3"));
        assert_eq!(result.failed_queries.len(), 1);
        assert_eq!(result.failed_queries[0].index, 1);
        assert_eq!(result.failed_queries[0].label, "fail:q2");
        let caveat = result.coverage_caveat.unwrap();
        assert!(caveat.contains("1 of 3"));
    }

    #[tokio::test(start_paused = true)]
    async fn all_failures_is_overall_failure() {
        let client = ScriptedClient::new();
        let result = execute_plan(
            &client,
            &plan(&["fail:a", "fail:b", "fail:c"]),
            "tenant_a",
            &MultiFetchConfig::default(),
        )
        .await;

        assert!(!result.success);
        assert!(result.rows.is_empty());
        assert_eq!(result.failed_queries.len(), 3);
        assert!(result.coverage_caveat.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn all_successes_have_no_failure_metadata() {
        let client = ScriptedClient::new();
        let result = execute_plan(
            &client,
            &plan(&["q1", "q2"]),
            "tenant_a",
            &MultiFetchConfig::default(),
        )
        .await;

        assert!(result.success);
        assert_eq!(result.rows.len(), 2);
        assert!(result.failed_queries.is_empty());
        assert!(result.coverage_caveat.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_stays_within_bound() {
        let client = ScriptedClient::new();
        let max_seen = client.max_in_flight.clone();
        let _ = execute_plan(
            &client,
            &plan(&["a", "b", "c", "d", "e", "f"]),
            "tenant_a",
            &MultiFetchConfig {
                concurrency: 3,
                query_timeout: Duration::from_secs(30),
            },
        )
        .await;

        assert!(max_seen.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_subquery_becomes_failure_metadata() {
        let client = ScriptedClient::new();
        let result = execute_plan(
            &client,
            &plan(&["q1", "slow:q2"]),
            "tenant_a",
            &MultiFetchConfig {
                concurrency: 3,
                query_timeout: Duration::from_secs(5),
            },
        )
        .await;

        assert!(result.success);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.failed_queries.len(), 1);
        assert!(result.failed_queries[0].reason.contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn unlabeled_queries_get_positional_labels() {
        let client = ScriptedClient::new();
        let mut p = plan(&["fail:x"]);
        p.queries[0].label = String::new();
        let result = execute_plan(&client, &p, "tenant_a", &MultiFetchConfig::default()).await;
        assert_eq!(result.failed_queries[0].label, "query 1");
    }
}
