//! Help capability.
//!
//! A meta-capability: it explains what the system can do by rendering the
//! catalog's grouped summary, so "what can you do" requests get a real
//! answer instead of a canned reply. Registered through
//! [`CatalogBuilder::build_with_help`](crate::registry::CatalogBuilder::build_with_help),
//! which fills the catalog slot after construction.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::instrument;

use marquee_core::capability::{CapabilityCategory, CapabilityDescriptor, FieldSpec};
use marquee_core::task::Task;

use crate::errors::CapabilityError;
use crate::registry::Catalog;
use crate::traits::{Capability, CapabilityInputs, SessionScope};

const SUGGESTION_LIMIT: usize = 5;

/// The `help` capability.
pub struct HelpCapability {
    catalog: Arc<OnceLock<Arc<Catalog>>>,
}

impl HelpCapability {
    /// Create the capability over a catalog slot filled after the catalog
    /// containing it is built.
    pub fn new(catalog: Arc<OnceLock<Arc<Catalog>>>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Capability for HelpCapability {
    fn describe(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: "help".into(),
            purpose: "Explain what the system can do and suggest example requests".into(),
            category: CapabilityCategory::Communication,
            inputs: vec![
                FieldSpec::new("query", "What the user wants to know about (optional)"),
                FieldSpec::new("category", "Specific category to explore (optional)"),
            ],
            outputs: vec![
                FieldSpec::new("help_text", "Formatted explanation of capabilities"),
                FieldSpec::new("suggested_queries", "Example requests to try"),
            ],
            examples: vec![
                "what can you help me with?".into(),
                "what kind of analysis can you do?".into(),
                "show me all capabilities".into(),
            ],
        }
    }

    fn build_inputs(
        &self,
        task: &Task,
        scope: &SessionScope,
    ) -> Result<CapabilityInputs, CapabilityError> {
        // Both inputs are optional; an empty request means "show everything".
        Ok(CapabilityInputs {
            scope: scope.clone(),
            params: task.inputs.clone(),
        })
    }

    #[instrument(skip(self, inputs), fields(session_id = %inputs.scope.session_id))]
    async fn execute(&self, inputs: CapabilityInputs) -> Result<Value, CapabilityError> {
        let catalog = self
            .catalog
            .get()
            .ok_or_else(|| CapabilityError::Execution("capability catalog not initialized".into()))?;

        let help_text = match inputs.params.get("category").and_then(Value::as_str) {
            Some(category) => render_category(catalog, category),
            None => catalog.summary(),
        };
        let suggested: Vec<String> = catalog
            .descriptors()
            .iter()
            .filter_map(|d| d.examples.first().cloned())
            .take(SUGGESTION_LIMIT)
            .collect();

        Ok(json!({
            "help_text": help_text,
            "capability_count": catalog.len(),
            "suggested_queries": suggested,
        }))
    }

    fn summarize(&self, payload: &Value) -> String {
        let count = payload["capability_count"].as_u64().unwrap_or(0);
        format!("Explained {count} available capabilities")
    }

    fn response_context(&self, payload: &Value) -> Map<String, Value> {
        let mut context = Map::new();
        let _ = context.insert("help_text".into(), payload["help_text"].clone());
        let _ = context.insert(
            "suggested_queries".into(),
            payload["suggested_queries"].clone(),
        );
        context
    }
}

fn render_category(catalog: &Catalog, raw: &str) -> String {
    let parsed: Option<CapabilityCategory> =
        serde_json::from_value(Value::String(raw.to_lowercase())).ok();
    let matching: Vec<CapabilityDescriptor> = match parsed {
        Some(category) => catalog
            .descriptors()
            .into_iter()
            .filter(|d| d.category == category)
            .collect(),
        None => Vec::new(),
    };

    if matching.is_empty() {
        return format!("I don't have any capabilities in the '{raw}' category yet.");
    }
    let mut out = format!("Here's what I can help with in {raw}:\n\n");
    for descriptor in matching {
        out.push_str(&format!("- {}\n", descriptor.purpose));
        if let Some(example) = descriptor.examples.first() {
            out.push_str(&format!("  Example: \"{example}\"\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CatalogBuilder;
    use assert_matches::assert_matches;

    struct FakeCapability {
        name: &'static str,
        category: CapabilityCategory,
    }

    #[async_trait]
    impl Capability for FakeCapability {
        fn describe(&self) -> CapabilityDescriptor {
            CapabilityDescriptor {
                name: self.name.into(),
                purpose: format!("{} things", self.name),
                category: self.category,
                inputs: vec![],
                outputs: vec![],
                examples: vec![format!("{} example", self.name)],
            }
        }

        async fn execute(&self, _inputs: CapabilityInputs) -> Result<Value, CapabilityError> {
            Ok(json!({}))
        }

        fn summarize(&self, _payload: &Value) -> String {
            "done".into()
        }
    }

    fn scope() -> SessionScope {
        SessionScope {
            session_id: "s1".into(),
            tenant_id: "tenant_a".into(),
            user_id: "u1".into(),
        }
    }

    fn catalog() -> Arc<Catalog> {
        CatalogBuilder::new()
            .register(Arc::new(FakeCapability {
                name: "fetch_data",
                category: CapabilityCategory::Data,
            }))
            .unwrap()
            .register(Arc::new(FakeCapability {
                name: "converse",
                category: CapabilityCategory::Communication,
            }))
            .unwrap()
            .build_with_help()
            .unwrap()
    }

    async fn run_help(catalog: &Arc<Catalog>, inputs: Map<String, Value>) -> Value {
        // Through the same lookup the executor uses at dispatch time.
        let help = catalog.get("help").unwrap();
        let task = Task::new(1, "help", inputs);
        let invocation = help.build_inputs(&task, &scope()).unwrap();
        help.execute(invocation).await.unwrap()
    }

    #[tokio::test]
    async fn renders_the_grouped_catalog_summary() {
        let catalog = catalog();
        let payload = run_help(&catalog, Map::new()).await;

        let text = payload["help_text"].as_str().unwrap();
        assert!(text.starts_with("I can help you with:"));
        assert!(text.contains("**Data**"));
        assert!(text.contains("**Communication**"));
        assert!(text.contains("fetch_data things"));
        // The help capability itself shows up in its own summary.
        assert!(text.contains("Explain what the system can do"));

        assert_eq!(payload["capability_count"], json!(3));
        let suggested = payload["suggested_queries"].as_array().unwrap();
        assert!(suggested.contains(&json!("converse example")));

        let help = catalog.get("help").unwrap();
        assert_eq!(help.summarize(&payload), "Explained 3 available capabilities");
        assert_eq!(
            help.response_context(&payload)["help_text"],
            payload["help_text"]
        );
    }

    #[tokio::test]
    async fn filters_by_category() {
        let catalog = catalog();
        let mut inputs = Map::new();
        let _ = inputs.insert("category".into(), json!("data"));
        let payload = run_help(&catalog, inputs).await;

        let text = payload["help_text"].as_str().unwrap();
        assert!(text.starts_with("Here's what I can help with in data:"));
        assert!(text.contains("fetch_data things"));
        assert!(text.contains("Example: \"fetch_data example\""));
        assert!(!text.contains("converse things"));
    }

    #[tokio::test]
    async fn unknown_category_says_so() {
        let catalog = catalog();
        let mut inputs = Map::new();
        let _ = inputs.insert("category".into(), json!("astrology"));
        let payload = run_help(&catalog, inputs).await;

        assert_eq!(
            payload["help_text"],
            json!("I don't have any capabilities in the 'astrology' category yet.")
        );
    }

    #[tokio::test]
    async fn unwired_slot_is_an_execution_error() {
        let help = HelpCapability::new(Arc::new(OnceLock::new()));
        let err = help
            .execute(CapabilityInputs {
                scope: scope(),
                params: Map::new(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, CapabilityError::Execution(_));
    }
}
