//! Capability descriptors — registration-time metadata.
//!
//! A descriptor is everything the planner oracle sees about a capability:
//! what it does, what it takes, what it returns, and a few example
//! requests. Descriptors are immutable once the capability is registered.

use serde::{Deserialize, Serialize};

/// Category tag used to group capabilities in catalog summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityCategory {
    /// Retrieve and fetch data from analytical sources.
    Data,
    /// Analyze data for patterns, trends, and insights.
    Analysis,
    /// Conversational responses and support.
    Communication,
    /// General purpose.
    General,
}

impl CapabilityCategory {
    /// Human-readable description of the category.
    pub fn description(self) -> &'static str {
        match self {
            Self::Data => "Retrieve and fetch data from various sources",
            Self::Analysis => "Analyze data to find patterns, trends, and insights",
            Self::Communication => "Chat, get support, and have conversations",
            Self::General => "General purpose capabilities",
        }
    }
}

/// Description of a single declared input or output field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as it appears in task inputs.
    pub name: String,
    /// What the field means and how the planner should fill it.
    pub description: String,
}

impl FieldSpec {
    /// Create a field spec.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Immutable description of a capability, created at registration time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Unique capability name (the planner addresses it by this).
    pub name: String,
    /// One-sentence purpose shown to the planner.
    pub purpose: String,
    /// Category tag for grouped summaries.
    pub category: CapabilityCategory,
    /// Declared input fields, in declaration order.
    pub inputs: Vec<FieldSpec>,
    /// Declared output fields, in declaration order.
    pub outputs: Vec<FieldSpec>,
    /// Example requests this capability handles well.
    pub examples: Vec<String>,
}

impl CapabilityDescriptor {
    /// Render the descriptor as a context block for the planner.
    ///
    /// Examples are capped at three to keep the context bounded.
    pub fn render(&self) -> String {
        let mut out = format!("- {}: {}", self.name, self.purpose);
        if !self.inputs.is_empty() {
            out.push_str("\n  Inputs:");
            for field in &self.inputs {
                out.push_str(&format!("\n    * {}: {}", field.name, field.description));
            }
        }
        if !self.outputs.is_empty() {
            out.push_str("\n  Outputs:");
            for field in &self.outputs {
                out.push_str(&format!("\n    * {}: {}", field.name, field.description));
            }
        }
        if !self.examples.is_empty() {
            out.push_str("\n  Examples:");
            for example in self.examples.iter().take(3) {
                out.push_str(&format!("\n    - {example}"));
            }
        }
        out
    }
}
