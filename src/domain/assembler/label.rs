//! Fallback chains for labels and variable names.

use super::raw::{AssemblyRequest, RawNode};
use crate::domain::foundation::{DdtId, IdKind, IdSource};

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Machine name of a node: `variable`, then `name`, then a generated one.
pub fn resolve_variable(raw: &RawNode, ids: &mut dyn IdSource) -> String {
    match present(raw.variable.as_deref()).or_else(|| present(raw.name.as_deref())) {
        Some(variable) => variable.to_string(),
        None => {
            let generated = ids.next_id(IdKind::Label);
            tracing::warn!(variable = %generated, "Node has no variable or name, generated one");
            generated
        }
    }
}

/// Display label of a node.
///
/// Detected label, then `label` or `name`, then the variable or type, then a
/// generated placeholder. Never fails.
pub fn resolve_node_label(raw: &RawNode, variable: &str, ids: &mut dyn IdSource) -> String {
    if let Some(label) = present(raw.detected_label.as_deref())
        .or_else(|| present(raw.label.as_deref()))
        .or_else(|| present(raw.name.as_deref()))
    {
        return label.to_string();
    }

    let fallback = present(Some(variable))
        .or_else(|| present(raw.data_type.as_deref()))
        .map(str::to_string)
        .unwrap_or_else(|| ids.next_id(IdKind::Label));
    tracing::warn!(label = %fallback, "Node has no label, using fallback");
    fallback
}

/// Label of the whole DDT: explicit, then the root's detected label, then
/// the root's type, then the DDT id.
pub fn resolve_ddt_label(request: &AssemblyRequest, ddt_id: &DdtId) -> String {
    present(request.label.as_deref())
        .or_else(|| present(request.root.detected_label.as_deref()))
        .or_else(|| present(request.root.data_type.as_deref()))
        .map(str::to_string)
        .unwrap_or_else(|| ddt_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assembler::NodeMessages;
    use crate::domain::foundation::SequentialIds;

    #[test]
    fn detected_label_wins() {
        let raw = RawNode {
            detected_label: Some("Date of birth".into()),
            ..RawNode::new("dob", "date").with_label("DOB")
        };
        assert_eq!(resolve_node_label(&raw, "dob", &mut SequentialIds::new()), "Date of birth");
    }

    #[test]
    fn name_is_used_when_label_is_missing() {
        let raw = RawNode {
            name: Some("Street".into()),
            ..Default::default()
        };
        assert_eq!(resolve_node_label(&raw, "street", &mut SequentialIds::new()), "Street");
    }

    #[test]
    fn blank_label_falls_back_to_variable() {
        let raw = RawNode::new("city", "text").with_label("   ");
        assert_eq!(resolve_node_label(&raw, "city", &mut SequentialIds::new()), "city");
    }

    #[test]
    fn type_is_used_before_placeholder() {
        let raw = RawNode {
            data_type: Some("email".into()),
            ..Default::default()
        };
        assert_eq!(resolve_node_label(&raw, "", &mut SequentialIds::new()), "email");
    }

    #[test]
    fn empty_node_gets_placeholders() {
        let mut ids = SequentialIds::new();
        let raw = RawNode::default();
        let variable = resolve_variable(&raw, &mut ids);
        assert_eq!(variable, "data_1");
        assert_eq!(resolve_node_label(&raw, "", &mut ids), "data_2");
    }

    #[test]
    fn ddt_label_chain() {
        let id = DdtId::new("ddt_1").unwrap();
        let mut request = AssemblyRequest::new(RawNode::default(), NodeMessages::new());
        assert_eq!(resolve_ddt_label(&request, &id), "ddt_1");

        request.root.data_type = Some("date".into());
        assert_eq!(resolve_ddt_label(&request, &id), "date");

        request.root.detected_label = Some("Date of birth".into());
        assert_eq!(resolve_ddt_label(&request, &id), "Date of birth");

        request.label = Some("Birth date".into());
        assert_eq!(resolve_ddt_label(&request, &id), "Birth date");
    }
}
