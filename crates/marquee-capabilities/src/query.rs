//! Structured analytical queries and execution plans.
//!
//! A [`SubQuery`] is one request to the analytical service: measures,
//! groupings, filters, an optional time range, ordering, and a limit.
//! A [`QueryPlan`] is what the query translator produces from a natural
//! language request — either a single query or several independent ones
//! (e.g. two disjoint time windows being compared).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One tabular result row, keyed by member name.
pub type Row = Map<String, Value>;

/// Filter applied to a query member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Member the filter applies to (e.g. `productions.name`).
    pub member: String,
    /// Filter operator (e.g. `equals`, `contains`, `in`).
    pub operator: String,
    /// Filter values.
    pub values: Vec<String>,
}

/// Time window restriction for a query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Time member the range applies to.
    pub member: String,
    /// Inclusive start, `YYYY-MM-DD`.
    pub start: String,
    /// Inclusive end, `YYYY-MM-DD`.
    pub end: String,
}

/// Sort direction for one ordered member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Sort order for one member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Member to sort by.
    pub member: String,
    /// Direction.
    pub direction: SortDirection,
}

/// One structured request to the analytical query service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubQuery {
    /// Short label used in failure metadata (e.g. `Q1 2024`).
    #[serde(default)]
    pub label: String,
    /// Measures to aggregate.
    pub measures: Vec<String>,
    /// Grouping dimensions.
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// Filters.
    #[serde(default)]
    pub filters: Vec<QueryFilter>,
    /// Optional time window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Ordering.
    #[serde(default)]
    pub order: Vec<OrderSpec>,
    /// Row limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl Default for SortDirection {
    fn default() -> Self {
        Self::Desc
    }
}

/// Whether a plan runs one query or fans out to several.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStrategy {
    /// One query answers the request.
    Single,
    /// Several independent queries are merged (e.g. window comparison).
    Multi,
}

/// Execution plan produced by the query translator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Single or multi.
    pub strategy: PlanStrategy,
    /// Sub-queries, in the order their rows should be concatenated.
    pub queries: Vec<SubQuery>,
    /// Why the translator chose this shape.
    #[serde(default)]
    pub reasoning: String,
}

impl QueryPlan {
    /// A single-query plan.
    pub fn single(query: SubQuery) -> Self {
        Self {
            strategy: PlanStrategy::Single,
            queries: vec![query],
            reasoning: String::new(),
        }
    }
}
