//! Raw, loosely-structured input to the assembler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::constraint::RawConstraint;
use crate::domain::translation::TranslationTable;

/// A data node as described by authoring or generation tools.
///
/// Field names vary between producers; `name` is accepted where `variable`
/// is missing and `subdata` where `subData` is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Label proposed by an upstream type detector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payoff: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<RawConstraint>,
    #[serde(default, alias = "subdata", skip_serializing_if = "Vec::is_empty")]
    pub sub_data: Vec<RawNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step_id: Option<String>,
}

impl RawNode {
    /// A node with only a variable name and a type.
    pub fn new(variable: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            variable: Some(variable.into()),
            data_type: Some(data_type.into()),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_sub_data(mut self, sub_data: Vec<RawNode>) -> Self {
        self.sub_data = sub_data;
        self
    }

    pub fn with_constraint(mut self, constraint: RawConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_next_step(mut self, next: impl Into<String>) -> Self {
        self.next_step_id = Some(next.into());
        self
    }
}

/// Literal messages for one node and, positionally, for its sub-nodes.
///
/// `steps` maps a step name to its escalation payloads; each payload is the
/// ordered list of messages, one per action of that escalation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMessages {
    #[serde(default)]
    pub steps: BTreeMap<String, Vec<Vec<String>>>,
    #[serde(default, alias = "subdata", skip_serializing_if = "Vec::is_empty")]
    pub sub_data: Vec<NodeMessages>,
}

impl NodeMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one escalation payload to a step.
    pub fn with_escalation<S: Into<String>>(
        mut self,
        step: &str,
        messages: impl IntoIterator<Item = S>,
    ) -> Self {
        self.steps
            .entry(step.to_string())
            .or_default()
            .push(messages.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sub_data(mut self, sub_data: Vec<NodeMessages>) -> Self {
        self.sub_data = sub_data;
        self
    }

    /// Messages of the `index`-th child, if any were supplied.
    pub fn child(&self, index: usize) -> Option<&NodeMessages> {
        self.sub_data.get(index)
    }
}

/// Everything the assembler needs to build one DDT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyRequest {
    /// Caller-pinned DDT id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddt_id: Option<String>,
    /// Explicit DDT label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub root: RawNode,
    #[serde(default)]
    pub messages: NodeMessages,
    /// Existing translations to extend; entries are copied, never mutated in place.
    #[serde(default, skip_serializing_if = "TranslationTable::is_empty")]
    pub translations: TranslationTable,
}

impl AssemblyRequest {
    pub fn new(root: RawNode, messages: NodeMessages) -> Self {
        Self {
            root,
            messages,
            ..Default::default()
        }
    }

    pub fn with_ddt_id(mut self, id: impl Into<String>) -> Self {
        self.ddt_id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_node_accepts_loose_field_names() {
        let node: RawNode = serde_json::from_str(
            r#"{"name":"dob","type":"date","subdata":[{"variable":"day"}]}"#,
        )
        .unwrap();
        assert_eq!(node.name.as_deref(), Some("dob"));
        assert_eq!(node.sub_data.len(), 1);
    }

    #[test]
    fn messages_parse_from_yaml() {
        let yaml = r#"
steps:
  start:
    - ["When were you born?"]
  noMatch:
    - ["Sorry, I did not get that.", "Your date of birth?"]
subData:
  - steps:
      start:
        - ["Which day?"]
"#;
        let messages: NodeMessages = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(messages.steps["noMatch"][0].len(), 2);
        assert_eq!(messages.child(0).unwrap().steps["start"][0][0], "Which day?");
        assert!(messages.child(1).is_none());
    }

    #[test]
    fn builders_compose_request() {
        let request = AssemblyRequest::new(
            RawNode::new("dateOfBirth", "date").with_label("Date of birth"),
            NodeMessages::new().with_escalation("start", ["When were you born?"]),
        )
        .with_ddt_id("dob");
        assert_eq!(request.ddt_id.as_deref(), Some("dob"));
        assert_eq!(request.messages.steps["start"], vec![vec!["When were you born?".to_string()]]);
    }
}
