//! MainData / SubData node.

use serde::{Deserialize, Serialize};

use super::constraint::Constraint;
use super::step::{StepGroup, StepType};
use crate::domain::foundation::NodeId;

/// Positional bookkeeping; never semantically required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
}

fn default_required() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// A slot to collect. Sub-nodes share the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataNode {
    /// Stable machine name, unique among siblings.
    pub variable: String,
    /// Declared data type (`date`, `number`, `text`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payoff: Option<String>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub steps: Vec<StepGroup>,
    #[serde(default)]
    pub sub_data: Vec<DataNode>,
    /// Whether a composite parent needs this node to be saturated.
    #[serde(default = "default_required", skip_serializing_if = "is_true")]
    pub required: bool,
    /// Successor edge followed when this node is saturated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step_id: Option<NodeId>,
    #[serde(default)]
    pub meta: NodeMeta,
}

impl DataNode {
    /// Returns true when the node has sub-data.
    pub fn is_composite(&self) -> bool {
        !self.sub_data.is_empty()
    }

    /// Declared type, defaulting to free text.
    pub fn expected_type(&self) -> &str {
        self.data_type.as_deref().unwrap_or("text")
    }

    /// Step group for the given moment, if authored.
    pub fn step(&self, step_type: &StepType) -> Option<&StepGroup> {
        self.steps.iter().find(|s| &s.step_type == step_type)
    }

    /// Direct child with the given variable name.
    pub fn sub_node(&self, variable: &str) -> Option<&DataNode> {
        self.sub_data.iter().find(|s| s.variable == variable)
    }

    /// Variables of required sub-nodes.
    pub fn required_sub_variables(&self) -> impl Iterator<Item = &str> {
        self.sub_data
            .iter()
            .filter(|s| s.required)
            .map(|s| s.variable.as_str())
    }

    /// Visits this node and all descendants depth-first, parents first.
    pub fn walk<'a>(&'a self, id: &NodeId, visit: &mut dyn FnMut(&NodeId, &'a DataNode)) {
        visit(id, self);
        for child in &self.sub_data {
            child.walk(&id.child(&child.variable), visit);
        }
    }
}
