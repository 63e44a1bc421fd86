//! The entity resolver — fuzzy, tenant-scoped, ambiguity-preserving.
//!
//! Two lookup modes:
//!
//! - [`EntityResolver::resolve`]: restricted to a type hint, returns every
//!   match above the threshold (not just the best one) so ambiguity
//!   survives into the candidate list.
//! - [`EntityResolver::cross_type_lookup`]: ignores the type hint and
//!   discounts every score by a fixed factor to reflect the reduced
//!   confidence.
//!
//! [`EntityResolver::resolve_frame`] strings these together: type-scoped
//! first, cross-type fallback when the type-scoped result is empty or its
//! top score is below the medium-confidence cutoff.

use chrono::{NaiveDate, Utc};
use metrics::counter;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use marquee_core::frame::{EntityCandidate, Frame, ResolvedEntity};

use crate::errors::{ResolverError, Result};
use crate::score::transform;
use crate::store::ConnectionPool;

/// Policy knobs for resolution. All values are defaults observed in
/// production use, exposed here rather than hard-coded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Raw-similarity floor for any match.
    pub threshold: f64,
    /// Transformed-score cutoff below which cross-type fallback kicks in.
    pub medium_confidence: f64,
    /// Transformed-score level above which two candidates count as
    /// ambiguous.
    pub ambiguity_threshold: f64,
    /// Multiplier applied to every cross-type score.
    pub cross_type_discount: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            medium_confidence: 0.5,
            ambiguity_threshold: 0.7,
            cross_type_discount: 0.85,
        }
    }
}

/// One row out of the entity store, before scoring.
struct EntityRow {
    id: String,
    name: String,
    entity_type: String,
    data: Value,
    raw_score: f64,
}

/// Tenant-scoped fuzzy entity lookup over the shared connection pool.
#[derive(Clone)]
pub struct EntityResolver {
    pool: ConnectionPool,
    config: ResolverConfig,
}

impl EntityResolver {
    /// Create a resolver over `pool`.
    pub fn new(pool: ConnectionPool, config: ResolverConfig) -> Self {
        Self { pool, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Type-scoped lookup: all matches of `type_hint` in `tenant` whose
    /// raw similarity to `text` exceeds `threshold`, score-descending.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        text: &str,
        type_hint: &str,
        tenant: &str,
        threshold: f64,
    ) -> Result<Vec<EntityCandidate>> {
        let candidates = self
            .query(text, tenant, Some(type_hint), threshold, 1.0)
            .await?;
        counter!("entity_resolutions_total", "kind" => "typed").increment(1);
        info!(text, type_hint, count = candidates.len(), "entity resolution");
        Ok(candidates)
    }

    /// Cross-type lookup: ignores the type hint and discounts every
    /// score by the configured factor.
    #[instrument(skip(self))]
    pub async fn cross_type_lookup(
        &self,
        text: &str,
        tenant: &str,
        threshold: f64,
    ) -> Result<Vec<EntityCandidate>> {
        let discount = self.config.cross_type_discount;
        let candidates = self.query(text, tenant, None, threshold, discount).await?;
        counter!("entity_resolutions_total", "kind" => "cross_type").increment(1);
        info!(text, count = candidates.len(), "cross-type lookup");
        Ok(candidates)
    }

    /// Resolve every entity mention in `frame`, appending a
    /// [`ResolvedEntity`] per mention (possibly with an empty candidate
    /// list — that is a valid outcome).
    #[instrument(skip(self, frame), fields(frame_id = %frame.id))]
    pub async fn resolve_frame(&self, frame: &mut Frame, tenant: &str) -> Result<()> {
        let mentions = frame.entities.clone();
        for mention in mentions {
            let mut candidates = self
                .resolve(&mention.text, &mention.guessed_type, tenant, self.config.threshold)
                .await?;

            // Fall back to cross-type search when the type hint found
            // nothing convincing; keep whichever list has the better top.
            let top = candidates.first().map_or(0.0, |c| c.score);
            if candidates.is_empty() || top < self.config.medium_confidence {
                let cross = self
                    .cross_type_lookup(&mention.text, tenant, self.config.threshold)
                    .await?;
                if cross.first().map_or(0.0, |c| c.score) > top {
                    candidates = cross;
                }
            }

            frame.resolved_entities.push(ResolvedEntity {
                id: mention.id,
                text: mention.text,
                guessed_type: mention.guessed_type,
                candidates,
            });
        }
        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        tenant: &str,
        type_hint: Option<&str>,
        threshold: f64,
        discount: f64,
    ) -> Result<Vec<EntityCandidate>> {
        let pool = self.pool.clone();
        let text = text.to_owned();
        let tenant = tenant.to_owned();
        let type_hint = type_hint.map(str::to_owned);
        let tag_type = type_hint.is_none();

        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<EntityRow>> {
            let conn = pool.get()?;
            let mut out = Vec::new();
            // Ties broken by id so repeated calls return identical lists.
            let sql = if type_hint.is_some() {
                "SELECT id, name, entity_type, data, similarity(name, ?1) AS raw_score
                 FROM entities
                 WHERE tenant_id = ?2 AND entity_type = ?3 AND similarity(name, ?1) > ?4
                 ORDER BY raw_score DESC, id ASC"
            } else {
                "SELECT id, name, entity_type, data, similarity(name, ?1) AS raw_score
                 FROM entities
                 WHERE tenant_id = ?2 AND similarity(name, ?1) > ?3
                 ORDER BY raw_score DESC, id ASC"
            };
            let mut stmt = conn.prepare_cached(sql)?;
            let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<EntityRow> {
                let data_text: Option<String> = row.get(3)?;
                Ok(EntityRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    entity_type: row.get(2)?,
                    data: data_text
                        .and_then(|t| serde_json::from_str(&t).ok())
                        .unwrap_or(Value::Null),
                    raw_score: row.get(4)?,
                })
            };
            let mapped = match &type_hint {
                Some(t) => stmt.query_map(params![text, tenant, t, threshold], map_row)?,
                None => stmt.query_map(params![text, tenant, threshold], map_row)?,
            };
            for row in mapped {
                out.push(row?);
            }
            Ok(out)
        })
        .await
        .map_err(|e| ResolverError::Unavailable(format!("resolver task failed: {e}")))??;

        Ok(rows
            .into_iter()
            .map(|row| candidate_from_row(row, discount, tag_type))
            .collect())
    }
}

/// Score a row and build its disambiguation text.
fn candidate_from_row(row: EntityRow, discount: f64, tag_type: bool) -> EntityCandidate {
    let score = transform(row.raw_score) * discount;
    let first_date = date_field(&row.data, "first_date");
    let last_date = date_field(&row.data, "last_date");
    let sold_last_30 = row.data.get("sold_last_30_days").and_then(Value::as_f64);

    let disambiguation = disambiguation_text(
        &row.name,
        &row.id,
        &row.entity_type,
        score,
        first_date,
        last_date,
        sold_last_30,
        tag_type,
    );

    EntityCandidate {
        id: row.id,
        name: row.name,
        entity_type: row.entity_type,
        score,
        disambiguation,
        sold_last_30_days: sold_last_30,
        first_date,
        last_date,
        data: row.data,
    }
}

fn date_field(data: &Value, key: &str) -> Option<NaiveDate> {
    data.get(key)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// Deterministic disambiguation composition.
///
/// Productions get active-date range and recent-sales context; other
/// types get name + id + score, with the entity type appended for
/// cross-type results.
fn disambiguation_text(
    name: &str,
    id: &str,
    entity_type: &str,
    score: f64,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    sold_last_30: Option<f64>,
    tag_type: bool,
) -> String {
    let mut parts = vec![name.to_owned(), format!("[{id}]"), format!("(score: {score:.2})")];
    if tag_type {
        parts.push(format!("({entity_type})"));
    }
    if entity_type == "production" {
        if let Some(first) = first_date {
            let still_running = last_date.is_none_or(|last| last > Utc::now().date_naive());
            if still_running {
                parts.push(format!("({}-present)", first.format("%Y")));
            } else if let Some(last) = last_date {
                parts.push(format!("({}-{})", first.format("%Y"), last.format("%Y")));
            }
        }
        match sold_last_30 {
            Some(sold) if sold > 0.0 => {
                parts.push(format!("${} last 30 days", format_amount(sold)));
            }
            _ => parts.push("no recent sales".to_owned()),
        }
    }
    parts.join(" ")
}

/// Format a figure with thousands separators and no decimals.
fn format_amount(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{new_in_memory, run_migrations, upsert_entity};
    use serde_json::json;

    fn seeded_resolver() -> EntityResolver {
        let pool = new_in_memory().unwrap();
        {
            let conn = pool.get().unwrap();
            run_migrations(&conn).unwrap();
            upsert_entity(
                &conn,
                "tenant_a",
                "p1",
                "production",
                "Chicago",
                &json!({
                    "first_date": "2019-03-01",
                    "sold_last_30_days": 12345.0,
                }),
            )
            .unwrap();
            upsert_entity(
                &conn,
                "tenant_a",
                "p2",
                "production",
                "Chicago the Musical",
                &json!({
                    "first_date": "2001-06-01",
                    "last_date": "2003-09-30",
                    "sold_last_30_days": 0.0,
                }),
            )
            .unwrap();
            upsert_entity(&conn, "tenant_a", "c1", "city", "Chicago", &json!({})).unwrap();
            upsert_entity(&conn, "tenant_a", "v1", "venue", "Majestic Theatre", &json!({}))
                .unwrap();
            upsert_entity(&conn, "tenant_b", "p9", "production", "Chicago", &json!({})).unwrap();
        }
        EntityResolver::new(pool, ResolverConfig::default())
    }

    #[tokio::test]
    async fn exact_match_scores_one() {
        let resolver = seeded_resolver();
        let candidates = resolver
            .resolve("chicago", "production", "tenant_a", 0.3)
            .await
            .unwrap();
        assert!(!candidates.is_empty());
        assert_eq!(candidates[0].id, "p1");
        assert!((candidates[0].score - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn all_matches_above_threshold_are_returned() {
        let resolver = seeded_resolver();
        let candidates = resolver
            .resolve("chicago", "production", "tenant_a", 0.3)
            .await
            .unwrap();
        let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"], "ambiguity must be preserved");
        assert!(candidates[0].score >= candidates[1].score);
    }

    #[tokio::test]
    async fn lookups_are_tenant_scoped() {
        let resolver = seeded_resolver();
        let candidates = resolver
            .resolve("chicago", "production", "tenant_b", 0.3)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "p9");
    }

    #[tokio::test]
    async fn cross_type_discounts_by_fixed_factor() {
        let resolver = seeded_resolver();
        let typed = resolver
            .resolve("chicago", "production", "tenant_a", 0.3)
            .await
            .unwrap();
        let cross = resolver
            .cross_type_lookup("chicago", "tenant_a", 0.3)
            .await
            .unwrap();
        let typed_p1 = typed.iter().find(|c| c.id == "p1").unwrap();
        let cross_p1 = cross.iter().find(|c| c.id == "p1").unwrap();
        assert!((cross_p1.score - typed_p1.score * 0.85).abs() < 1e-12);
        // Cross-type search also surfaces the city record.
        assert!(cross.iter().any(|c| c.entity_type == "city"));
    }

    #[tokio::test]
    async fn repeated_resolution_is_idempotent() {
        let resolver = seeded_resolver();
        let first = resolver
            .resolve("chicago", "production", "tenant_a", 0.3)
            .await
            .unwrap();
        let second = resolver
            .resolve("chicago", "production", "tenant_a", 0.3)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn no_match_is_an_empty_list_not_an_error() {
        let resolver = seeded_resolver();
        let candidates = resolver
            .resolve("zzzzzz", "production", "tenant_a", 0.3)
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn production_disambiguation_has_dates_and_sales() {
        let resolver = seeded_resolver();
        let candidates = resolver
            .resolve("chicago", "production", "tenant_a", 0.3)
            .await
            .unwrap();
        let running = &candidates[0];
        assert!(running.disambiguation.contains("Chicago [p1] (score: 1.00)"));
        assert!(running.disambiguation.contains("(2019-present)"));
        assert!(running.disambiguation.contains("$12,345 last 30 days"));

        let closed = candidates.iter().find(|c| c.id == "p2").unwrap();
        assert!(closed.disambiguation.contains("(2001-2003)"));
        assert!(closed.disambiguation.contains("no recent sales"));
    }

    #[tokio::test]
    async fn generic_type_disambiguation_is_name_id_score() {
        let resolver = seeded_resolver();
        let candidates = resolver
            .resolve("majestic theatre", "venue", "tenant_a", 0.3)
            .await
            .unwrap();
        assert_eq!(candidates[0].disambiguation, "Majestic Theatre [v1] (score: 1.00)");
    }

    #[tokio::test]
    async fn cross_type_disambiguation_tags_the_type() {
        let resolver = seeded_resolver();
        let cross = resolver
            .cross_type_lookup("majestic theatre", "tenant_a", 0.3)
            .await
            .unwrap();
        assert!(cross[0].disambiguation.contains("(venue)"));
    }

    #[tokio::test]
    async fn resolve_frame_appends_one_resolution_per_mention() {
        use marquee_core::frame::EntityToResolve;
        let resolver = seeded_resolver();
        let mut frame = Frame::new("f1", "compare Chicago and the Majestic");
        frame.entities = vec![
            EntityToResolve {
                id: "e1".into(),
                text: "chicago".into(),
                guessed_type: "production".into(),
            },
            EntityToResolve {
                id: "e2".into(),
                text: "majestic theatre".into(),
                guessed_type: "venue".into(),
            },
        ];

        resolver.resolve_frame(&mut frame, "tenant_a").await.unwrap();

        assert!(frame.is_resolved());
        assert_eq!(frame.resolved_entities.len(), 2);
        assert_eq!(frame.resolved_entities[0].candidates[0].id, "p1");
    }

    #[tokio::test]
    async fn resolve_frame_falls_back_to_cross_type() {
        use marquee_core::frame::EntityToResolve;
        let resolver = seeded_resolver();
        // Wrong type hint: no venue named Chicago, so the type-scoped
        // lookup is empty and the cross-type fallback finds the records.
        let mut frame = Frame::new("f1", "how is chicago doing");
        frame.entities = vec![EntityToResolve {
            id: "e1".into(),
            text: "chicago".into(),
            guessed_type: "venue".into(),
        }];

        resolver.resolve_frame(&mut frame, "tenant_a").await.unwrap();

        let resolved = &frame.resolved_entities[0];
        assert!(!resolved.candidates.is_empty());
        assert!((resolved.candidates[0].score - 0.85).abs() < 1e-12);
    }

    #[test]
    fn amount_formatting_groups_thousands() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(12345.0), "12,345");
        assert_eq!(format_amount(1_234_567.4), "1,234,567");
    }
}
