//! Structural validation gate between assembly and the runtime.
//!
//! A [`ValidatedDdt`] can only be obtained through [`validate`], so the
//! runtime never sees a DDT that breaks the key or sibling invariants.

use std::collections::{BTreeMap, HashSet};
use std::ops::Deref;
use thiserror::Error;

use super::{DataNode, Ddt};
use crate::domain::constraint::check_script;
use crate::domain::foundation::{DomainError, ErrorCode, NodeId};
use crate::domain::translation::{ParsedKey, TranslationKey};

/// One broken structural invariant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructuralViolation {
    #[error("node '{node}' has an empty variable")]
    EmptyVariable { node: NodeId },

    #[error("variable of node '{node}' contains the path separator")]
    SeparatorInVariable { node: NodeId },

    #[error("variable '{variable}' appears more than once under '{parent}'")]
    DuplicateVariable { parent: NodeId, variable: String },

    #[error("'{key}' at '{node}' is not a well-formed translation key")]
    MalformedKey { node: NodeId, key: TranslationKey },

    #[error("key '{key}' at '{node}' belongs to DDT '{found}'")]
    ForeignKey {
        node: NodeId,
        key: TranslationKey,
        found: String,
    },

    #[error("key '{key}' at '{node}' does not match its position ({expected})")]
    KeyPositionMismatch {
        node: NodeId,
        key: TranslationKey,
        expected: String,
    },

    #[error("key '{key}' referenced at '{node}' has no translation")]
    MissingTranslation { node: NodeId, key: TranslationKey },

    #[error("key '{key}' is referenced more than once")]
    DuplicateKeyReference { key: TranslationKey },

    #[error("constraint id '{id}' is used more than once")]
    DuplicateConstraintId { id: String },

    #[error("constraint '{constraint}' at '{node}' has an invalid validation script: {reason}")]
    InvalidValidationScript {
        node: NodeId,
        constraint: String,
        reason: String,
    },
}

/// A DDT rejected by structural validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("DDT '{ddt_id}' failed structural validation: {}", summary(.violations))]
pub struct StructuralError {
    pub ddt_id: String,
    pub violations: Vec<StructuralViolation>,
}

fn summary(violations: &[StructuralViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<StructuralError> for DomainError {
    fn from(err: StructuralError) -> Self {
        let code = match err.violations.first() {
            Some(StructuralViolation::MissingTranslation { .. }) => ErrorCode::MissingTranslation,
            Some(StructuralViolation::InvalidValidationScript { .. }) => {
                ErrorCode::InvalidValidationScript
            }
            _ => ErrorCode::StructuralViolation,
        };
        DomainError::new(code, err.to_string())
            .with_detail("ddt_id", err.ddt_id.clone())
            .with_detail("violations", err.violations.len().to_string())
    }
}

/// A DDT that passed structural validation, with a node index.
#[derive(Debug, Clone)]
pub struct ValidatedDdt {
    ddt: Ddt,
    node_ids: Vec<NodeId>,
}

impl ValidatedDdt {
    /// Node ids in depth-first order, root first.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    pub fn into_inner(self) -> Ddt {
        self.ddt
    }
}

impl Deref for ValidatedDdt {
    type Target = Ddt;

    fn deref(&self) -> &Self::Target {
        &self.ddt
    }
}

/// Checks every structural invariant, collecting all violations.
pub fn validate(ddt: Ddt) -> Result<ValidatedDdt, StructuralError> {
    let mut checker = Checker {
        ddt: &ddt,
        violations: Vec::new(),
        seen_keys: HashSet::new(),
        seen_constraints: HashSet::new(),
        node_ids: Vec::new(),
    };
    let root = ddt.root_id();
    checker.check_node(&root, &ddt.main_data);
    if ddt.main_data.variable.trim().is_empty() {
        checker.violations.insert(0, StructuralViolation::EmptyVariable { node: root });
    }

    if checker.violations.is_empty() {
        let node_ids = checker.node_ids;
        tracing::debug!(ddt_id = %ddt.id, nodes = node_ids.len(), "DDT passed validation");
        Ok(ValidatedDdt { ddt, node_ids })
    } else {
        let violations = checker.violations;
        tracing::warn!(ddt_id = %ddt.id, violations = violations.len(), "DDT rejected");
        Err(StructuralError {
            ddt_id: ddt.id.to_string(),
            violations,
        })
    }
}

struct Checker<'a> {
    ddt: &'a Ddt,
    violations: Vec<StructuralViolation>,
    seen_keys: HashSet<TranslationKey>,
    seen_constraints: HashSet<String>,
    node_ids: Vec<NodeId>,
}

impl<'a> Checker<'a> {
    fn check_node(&mut self, id: &NodeId, node: &DataNode) {
        self.node_ids.push(id.clone());

        if node.variable.contains(NodeId::SEPARATOR) {
            self.violations
                .push(StructuralViolation::SeparatorInVariable { node: id.clone() });
        }
        self.check_steps(id, node);
        self.check_constraints(id, node);

        let mut siblings: BTreeMap<&str, usize> = BTreeMap::new();
        for child in &node.sub_data {
            if child.variable.trim().is_empty() {
                self.violations.push(StructuralViolation::EmptyVariable {
                    node: id.child(&child.variable),
                });
            }
            *siblings.entry(child.variable.as_str()).or_default() += 1;
        }
        for (variable, count) in siblings {
            if count > 1 {
                self.violations.push(StructuralViolation::DuplicateVariable {
                    parent: id.clone(),
                    variable: variable.to_string(),
                });
            }
        }

        for child in &node.sub_data {
            self.check_node(&id.child(&child.variable), child);
        }
    }

    fn check_steps(&mut self, id: &NodeId, node: &DataNode) {
        for group in &node.steps {
            for (index, escalation) in group.escalations.iter().enumerate() {
                for action in &escalation.actions {
                    for param in &action.parameters {
                        let expected = format!(
                            "{}#{} {} {}",
                            group.step_type, index, action.action_instance_id, param.parameter_id
                        );
                        let matches = |parsed: &ParsedKey| match parsed {
                            ParsedKey::StepText {
                                step_type,
                                escalation_index,
                                action_instance_id,
                                parameter_id,
                                ..
                            } => {
                                step_type == group.step_type.as_str()
                                    && *escalation_index == index
                                    && action_instance_id == action.action_instance_id.as_str()
                                    && *parameter_id == param.parameter_id
                            }
                            ParsedKey::ConstraintPrompt { .. } => false,
                        };
                        self.check_key(id, &param.value, expected, matches);
                    }
                }
            }
        }
    }

    fn check_constraints(&mut self, id: &NodeId, node: &DataNode) {
        for constraint in &node.constraints {
            if !self.seen_constraints.insert(constraint.id.to_string()) {
                self.violations.push(StructuralViolation::DuplicateConstraintId {
                    id: constraint.id.to_string(),
                });
            }
            for (n, key) in constraint.prompts.iter().enumerate() {
                let expected = format!("constraint#{} prompt#{}", constraint.id, n);
                let matches = |parsed: &ParsedKey| match parsed {
                    ParsedKey::ConstraintPrompt {
                        constraint_id,
                        index,
                        ..
                    } => constraint_id == constraint.id.as_str() && *index == n,
                    ParsedKey::StepText { .. } => false,
                };
                self.check_key(id, key, expected, matches);
            }
            if !constraint.validation_script.trim().is_empty() {
                if let Err(err) = check_script(&constraint.validation_script) {
                    self.violations.push(StructuralViolation::InvalidValidationScript {
                        node: id.clone(),
                        constraint: constraint.id.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    fn check_key(
        &mut self,
        id: &NodeId,
        key: &TranslationKey,
        expected: String,
        matches_position: impl Fn(&ParsedKey) -> bool,
    ) {
        let Some(parsed) = key.parts() else {
            self.violations.push(StructuralViolation::MalformedKey {
                node: id.clone(),
                key: key.clone(),
            });
            return;
        };
        if parsed.ddt_id() != self.ddt.id.as_str() {
            self.violations.push(StructuralViolation::ForeignKey {
                node: id.clone(),
                key: key.clone(),
                found: parsed.ddt_id().to_string(),
            });
        }
        if !matches_position(&parsed) {
            self.violations.push(StructuralViolation::KeyPositionMismatch {
                node: id.clone(),
                key: key.clone(),
                expected,
            });
        }
        if !self.ddt.translations.contains(key) {
            self.violations.push(StructuralViolation::MissingTranslation {
                node: id.clone(),
                key: key.clone(),
            });
        }
        if !self.seen_keys.insert(key.clone()) {
            self.violations
                .push(StructuralViolation::DuplicateKeyReference { key: key.clone() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ddt::{
        Action, ActionKind, ActionParameter, Constraint, Escalation, NodeMeta, StepGroup,
        StepType, TEXT_PARAMETER,
    };
    use crate::domain::foundation::{ActionInstanceId, ConstraintId, DdtId, EscalationId};
    use crate::domain::translation::TranslationTable;

    fn leaf(variable: &str) -> DataNode {
        DataNode {
            variable: variable.into(),
            data_type: None,
            label: variable.into(),
            description: None,
            payoff: None,
            constraints: vec![],
            steps: vec![],
            sub_data: vec![],
            required: true,
            next_step_id: None,
            meta: NodeMeta::default(),
        }
    }

    fn key(raw: &str) -> TranslationKey {
        TranslationKey::parse(raw).unwrap()
    }

    fn say(instance: &str, raw_key: &str) -> Action {
        Action {
            action_id: ActionKind::SayMessage,
            action_instance_id: ActionInstanceId::new(instance).unwrap(),
            parameters: vec![ActionParameter {
                parameter_id: TEXT_PARAMETER.into(),
                value: key(raw_key),
            }],
        }
    }

    fn group(step_type: StepType, escalations: Vec<Vec<Action>>) -> StepGroup {
        StepGroup {
            step_type,
            escalations: escalations
                .into_iter()
                .enumerate()
                .map(|(i, actions)| Escalation {
                    escalation_id: EscalationId::new(format!("e_{}", i)).unwrap(),
                    actions,
                })
                .collect(),
        }
    }

    fn ddt_with(main_data: DataNode, keys: &[&str]) -> Ddt {
        let mut translations = TranslationTable::new();
        for k in keys {
            translations.upsert(key(k), "text");
        }
        Ddt {
            id: DdtId::new("dob").unwrap(),
            label: "Date of birth".into(),
            main_data,
            translations,
        }
    }

    #[test]
    fn accepts_well_formed_ddt() {
        let mut root = leaf("dateOfBirth");
        root.steps = vec![group(
            StepType::NoMatch,
            vec![
                vec![say("a_1", "runtime.dob.noMatch#0.a_1.text.text")],
                vec![say("a_2", "runtime.dob.noMatch#1.a_2.text.text")],
            ],
        )];
        root.sub_data = vec![leaf("day"), leaf("month")];
        let ddt = ddt_with(
            root,
            &[
                "runtime.dob.noMatch#0.a_1.text.text",
                "runtime.dob.noMatch#1.a_2.text.text",
            ],
        );

        let validated = validate(ddt).unwrap();
        assert_eq!(validated.node_ids().len(), 3);
        assert_eq!(validated.label, "Date of birth");
    }

    #[test]
    fn rejects_duplicate_sibling_variables() {
        let mut root = leaf("dateOfBirth");
        root.sub_data = vec![leaf("day"), leaf("day")];
        let err = validate(ddt_with(root, &[])).unwrap_err();
        assert_eq!(
            err.violations,
            vec![StructuralViolation::DuplicateVariable {
                parent: NodeId::new("dateOfBirth"),
                variable: "day".into(),
            }]
        );
    }

    #[test]
    fn rejects_variables_that_would_alias_a_nested_path() {
        let mut nested = leaf("b");
        nested.sub_data = vec![leaf("c")];
        let mut root = leaf("a");
        root.sub_data = vec![nested, leaf("b/c")];

        let err = validate(ddt_with(root, &[])).unwrap_err();
        assert_eq!(
            err.violations,
            vec![StructuralViolation::SeparatorInVariable {
                node: NodeId::new("a/b/c"),
            }]
        );
    }

    #[test]
    fn rejects_key_whose_index_differs_from_position() {
        let mut root = leaf("dateOfBirth");
        root.steps = vec![group(
            StepType::NoMatch,
            vec![vec![say("a_1", "runtime.dob.noMatch#1.a_1.text.text")]],
        )];
        let err = validate(ddt_with(root, &["runtime.dob.noMatch#1.a_1.text.text"])).unwrap_err();
        assert!(matches!(
            err.violations[0],
            StructuralViolation::KeyPositionMismatch { .. }
        ));
    }

    #[test]
    fn rejects_missing_translation() {
        let mut root = leaf("dateOfBirth");
        root.steps = vec![group(
            StepType::Start,
            vec![vec![say("a_1", "runtime.dob.start#0.a_1.text.text")]],
        )];
        let err = validate(ddt_with(root, &[])).unwrap_err();
        assert_eq!(
            err.violations,
            vec![StructuralViolation::MissingTranslation {
                node: NodeId::new("dateOfBirth"),
                key: key("runtime.dob.start#0.a_1.text.text"),
            }]
        );
        let domain: DomainError = err.into();
        assert_eq!(domain.code, ErrorCode::MissingTranslation);
    }

    #[test]
    fn rejects_key_reused_across_actions() {
        let mut root = leaf("dateOfBirth");
        root.steps = vec![group(
            StepType::Start,
            vec![vec![
                say("a_1", "runtime.dob.start#0.a_1.text.text"),
                say("a_1", "runtime.dob.start#0.a_1.text.text"),
            ]],
        )];
        let err = validate(ddt_with(root, &["runtime.dob.start#0.a_1.text.text"])).unwrap_err();
        assert!(err
            .violations
            .contains(&StructuralViolation::DuplicateKeyReference {
                key: key("runtime.dob.start#0.a_1.text.text")
            }));
    }

    #[test]
    fn rejects_keys_of_another_ddt() {
        let mut root = leaf("dateOfBirth");
        root.steps = vec![group(
            StepType::Start,
            vec![vec![say("a_1", "runtime.other.start#0.a_1.text.text")]],
        )];
        let err =
            validate(ddt_with(root, &["runtime.other.start#0.a_1.text.text"])).unwrap_err();
        assert!(matches!(
            err.violations[0],
            StructuralViolation::ForeignKey { .. }
        ));
    }

    #[test]
    fn rejects_malformed_validation_script() {
        let mut root = leaf("dateOfBirth");
        root.constraints = vec![Constraint {
            id: ConstraintId::new("c_1").unwrap(),
            kind: None,
            label: "Broken".into(),
            payoff: String::new(),
            prompts: vec![],
            validation_script: "(a, b) => a < b".into(),
            test_set: vec![],
        }];
        let err = validate(ddt_with(root, &[])).unwrap_err();
        assert!(matches!(
            err.violations[0],
            StructuralViolation::InvalidValidationScript { .. }
        ));
    }

    #[test]
    fn accepts_empty_validation_script() {
        let mut root = leaf("name");
        root.constraints = vec![Constraint {
            id: ConstraintId::new("c_1").unwrap(),
            kind: None,
            label: String::new(),
            payoff: String::new(),
            prompts: vec![key("runtime.dob.constraint#c_1.prompt#0")],
            validation_script: String::new(),
            test_set: vec![],
        }];
        assert!(validate(ddt_with(root, &["runtime.dob.constraint#c_1.prompt#0"])).is_ok());
    }

    #[test]
    fn reports_every_violation_at_once() {
        let mut root = leaf("dateOfBirth");
        root.sub_data = vec![leaf("day"), leaf("day"), leaf("")];
        let err = validate(ddt_with(root, &[])).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.to_string().contains("appears more than once"));
    }
}
