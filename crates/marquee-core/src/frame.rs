//! Frames — the semantic unit a request is broken into.
//!
//! A frame carries the entity mentions and concept strings extracted from
//! a query. The extraction step (an external collaborator) creates the
//! frame once; the resolver appends [`ResolvedEntity`] entries; everything
//! else reads it.
//!
//! Leaf type first: [`EntityCandidate`] is a plain value produced by the
//! resolver, aggregated into [`ResolvedEntity`], aggregated into [`Frame`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fuzzy-match result for an entity mention.
///
/// Immutable once produced by the resolver. Candidates for one mention are
/// always ordered score-descending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityCandidate {
    /// Catalog id of the matched record.
    pub id: String,
    /// Canonical name of the matched record.
    pub name: String,
    /// Entity type of the matched record (e.g. `production`, `venue`).
    pub entity_type: String,
    /// Transformed confidence score in `[0, 1]`.
    pub score: f64,
    /// Human-readable disambiguation string.
    pub disambiguation: String,
    /// Recent-activity figure, when the catalog records one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sold_last_30_days: Option<f64>,
    /// First observed activity date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<NaiveDate>,
    /// Last observed activity date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<NaiveDate>,
    /// Free-form auxiliary data carried from the catalog record.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

/// An entity mention extracted from the query, awaiting resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityToResolve {
    /// Extractor-assigned id (`e1`, `e2`, …).
    pub id: String,
    /// The mention text as it appeared in the query.
    pub text: String,
    /// The extractor's guess at the entity type.
    pub guessed_type: String,
}

/// A resolved entity mention with its ranked candidate list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    /// Matches the [`EntityToResolve`] id this resolution answers.
    pub id: String,
    /// The mention text.
    pub text: String,
    /// The type hint the resolution was attempted with.
    pub guessed_type: String,
    /// Candidates ordered score-descending. May be empty — an empty list
    /// is a valid resolution outcome, not an error.
    pub candidates: Vec<EntityCandidate>,
}

impl ResolvedEntity {
    /// Best candidate, if any.
    pub fn best(&self) -> Option<&EntityCandidate> {
        self.candidates.first()
    }

    /// True when the best candidate clears `cutoff` and no second
    /// candidate does — a single clear winner.
    pub fn is_high_confidence(&self, cutoff: f64) -> bool {
        match self.candidates.as_slice() {
            [only] => only.score >= cutoff,
            [best, second, ..] => best.score >= cutoff && second.score < cutoff,
            [] => false,
        }
    }

    /// True when at least two candidates score above `threshold`.
    ///
    /// Ambiguity is preserved, not collapsed: downstream context rendering
    /// shows every qualifying candidate so the planner can decide.
    pub fn is_ambiguous(&self, threshold: f64) -> bool {
        self.candidates.iter().filter(|c| c.score > threshold).count() >= 2
    }

    /// Render every candidate above `threshold` for planner context.
    pub fn ambiguity_context(&self, threshold: f64) -> String {
        let options: Vec<String> = self
            .candidates
            .iter()
            .filter(|c| c.score > threshold)
            .map(|c| c.disambiguation.clone())
            .collect();
        format!("{} could be: {}", self.text, options.join("; "))
    }
}

/// A semantically self-contained unit of a request.
///
/// Created once by the extraction step; `resolved_entities` is appended to
/// by the resolver; read-only thereafter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Extractor-assigned id (`f1`, `f2`, …).
    pub id: String,
    /// Original query text for this semantic unit.
    pub query: String,
    /// Entity mentions to resolve, in extraction order.
    #[serde(default)]
    pub entities: Vec<EntityToResolve>,
    /// Concept strings (e.g. `revenue`) — resolved on demand, never
    /// required for resolution-completeness.
    #[serde(default)]
    pub concepts: Vec<String>,
    /// Resolutions, appended by the resolver.
    #[serde(default)]
    pub resolved_entities: Vec<ResolvedEntity>,
}

impl Frame {
    /// Create an unresolved frame.
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            entities: Vec::new(),
            concepts: Vec::new(),
            resolved_entities: Vec::new(),
        }
    }

    /// True when the frame has anything to resolve.
    pub fn needs_resolution(&self) -> bool {
        !self.entities.is_empty() || !self.concepts.is_empty()
    }

    /// True when every entity mention has a matching resolution.
    ///
    /// Concepts are not required: memory may have no context for them.
    pub fn is_resolved(&self) -> bool {
        self.entities
            .iter()
            .all(|e| self.resolved_entities.iter().any(|r| r.id == e.id))
    }
}
