//! Recursive DDT assembly and its inverse.

use std::collections::BTreeMap;
use thiserror::Error;

use super::action_policy::ActionPolicy;
use super::label::{resolve_ddt_label, resolve_node_label, resolve_variable};
use super::raw::{AssemblyRequest, NodeMessages, RawNode};
use crate::domain::constraint::{attach_prompts, normalize, RawConstraint};
use crate::domain::ddt::{
    Action, ActionParameter, DataNode, Ddt, Escalation, NodeMeta, StepGroup, StepType,
    TEXT_PARAMETER,
};
use crate::domain::foundation::{
    ActionInstanceId, DdtId, DomainError, ErrorCode, EscalationId, IdKind, IdSource, NodeId,
    ValidationError,
};
use crate::domain::translation::{TranslationError, TranslationKey, TranslationTable};

/// Assembly failures. Missing labels, ids and messages are never errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] ValidationError),

    #[error("translation table conflict: {0}")]
    Translation(#[from] TranslationError),
}

impl From<AssemblyError> for DomainError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::InvalidId(inner) => inner.into(),
            AssemblyError::Translation(TranslationError::Duplicate(key)) => DomainError::new(
                ErrorCode::DuplicateTranslation,
                format!("Translation key '{}' already exists", key),
            ),
            AssemblyError::Translation(TranslationError::Missing(key)) => DomainError::new(
                ErrorCode::MissingTranslation,
                format!("Translation key '{}' is missing", key),
            ),
        }
    }
}

/// Builds canonical DDTs from raw descriptors.
#[derive(Debug, Clone, Default)]
pub struct DdtAssembler {
    policy: ActionPolicy,
}

impl DdtAssembler {
    pub fn new(policy: ActionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ActionPolicy {
        &self.policy
    }

    /// Assembles a DDT, drawing every generated id from `ids`.
    ///
    /// The translation table of the request is extended into a new table
    /// owned by the result; nothing shared with a live DDT is mutated.
    pub fn assemble(
        &self,
        request: AssemblyRequest,
        ids: &mut dyn IdSource,
    ) -> Result<Ddt, AssemblyError> {
        let ddt_id = match request.ddt_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => DdtId::new(id)?,
            _ => DdtId::new(ids.next_id(IdKind::Ddt))?,
        };
        let label = resolve_ddt_label(&request, &ddt_id);

        let AssemblyRequest {
            root,
            messages,
            translations,
            ..
        } = request;

        let mut build = NodeBuild {
            ddt_id: &ddt_id,
            policy: &self.policy,
            ids,
            translations,
        };
        let main_data = build.node(&root, Some(&messages), None, 0)?;
        let translations = build.translations;

        tracing::info!(
            ddt_id = %ddt_id,
            translations = translations.len(),
            "DDT assembled"
        );

        Ok(Ddt {
            id: ddt_id,
            label,
            main_data,
            translations,
        })
    }
}

struct NodeBuild<'a> {
    ddt_id: &'a DdtId,
    policy: &'a ActionPolicy,
    ids: &'a mut dyn IdSource,
    translations: TranslationTable,
}

impl NodeBuild<'_> {
    fn node(
        &mut self,
        raw: &RawNode,
        messages: Option<&NodeMessages>,
        parent: Option<&NodeId>,
        order: usize,
    ) -> Result<DataNode, AssemblyError> {
        let variable = resolve_variable(raw, self.ids);
        let label = resolve_node_label(raw, &variable, self.ids);
        let id = match parent {
            Some(parent) => parent.child(&variable),
            None => NodeId::root(&variable),
        };

        let mut constraints = Vec::with_capacity(raw.constraints.len());
        for normalized in normalize(&raw.constraints, self.ids)? {
            constraints.push(attach_prompts(self.ddt_id, normalized, &mut self.translations)?);
        }

        let steps = match messages {
            Some(messages) => self.steps(&id, messages)?,
            None => Vec::new(),
        };

        let mut sub_data = Vec::with_capacity(raw.sub_data.len());
        for (index, child) in raw.sub_data.iter().enumerate() {
            let child_messages = messages.and_then(|m| m.child(index));
            sub_data.push(self.node(child, child_messages, Some(&id), index)?);
        }

        let next_step_id = raw
            .next_step_id
            .as_deref()
            .map(str::trim)
            .filter(|next| !next.is_empty())
            .map(NodeId::new);

        Ok(DataNode {
            variable,
            data_type: raw.data_type.clone(),
            label,
            description: raw.description.clone(),
            payoff: raw.payoff.clone(),
            constraints,
            steps,
            sub_data,
            required: raw.required.unwrap_or(true),
            next_step_id,
            meta: NodeMeta {
                parent_id: parent.cloned(),
                path: Some(id),
                order: Some(order),
            },
        })
    }

    fn steps(
        &mut self,
        node: &NodeId,
        messages: &NodeMessages,
    ) -> Result<Vec<StepGroup>, AssemblyError> {
        let mut by_type: BTreeMap<StepType, &Vec<Vec<String>>> = BTreeMap::new();
        for (name, payloads) in &messages.steps {
            match name.parse::<StepType>() {
                Ok(step_type) => {
                    by_type.insert(step_type, payloads);
                }
                Err(err) => {
                    tracing::warn!(node = %node, step = %name, error = %err, "Skipping unknown step");
                }
            }
        }

        let mut groups = Vec::new();
        for (step_type, payloads) in by_type {
            let escalations = self.escalations(&step_type, payloads)?;
            if escalations.is_empty() {
                tracing::debug!(node = %node, step = %step_type, "Step has no messages, omitted");
                continue;
            }
            groups.push(StepGroup {
                step_type,
                escalations,
            });
        }
        Ok(groups)
    }

    fn escalations(
        &mut self,
        step_type: &StepType,
        payloads: &[Vec<String>],
    ) -> Result<Vec<Escalation>, AssemblyError> {
        let kind = self.policy.kind_for(step_type);
        let mut escalations = Vec::new();

        for payload in payloads {
            let messages: Vec<&String> = payload.iter().filter(|m| !m.trim().is_empty()).collect();
            if messages.is_empty() {
                continue;
            }
            let index = escalations.len();
            let mut actions = Vec::with_capacity(messages.len());
            for message in messages {
                let instance = ActionInstanceId::new(self.ids.next_id(IdKind::ActionInstance))?;
                let key = TranslationKey::step_text(
                    self.ddt_id,
                    step_type.as_str(),
                    index,
                    &instance,
                    TEXT_PARAMETER,
                );
                self.translations.insert_new(key.clone(), message.as_str())?;
                actions.push(Action {
                    action_id: kind,
                    action_instance_id: instance,
                    parameters: vec![ActionParameter {
                        parameter_id: TEXT_PARAMETER.to_string(),
                        value: key,
                    }],
                });
            }
            escalations.push(Escalation {
                escalation_id: EscalationId::new(self.ids.next_id(IdKind::Escalation))?,
                actions,
            });
        }
        Ok(escalations)
    }
}

/// Turns a DDT back into an assembly request with literal texts.
///
/// Re-assembling the result with the same id source reproduces the DDT, so
/// edits can be applied to the raw form and re-assembled. Translations of
/// other DDTs in the table are carried over untouched.
pub fn disassemble(ddt: &Ddt) -> Result<AssemblyRequest, TranslationError> {
    let (root, messages) = raw_node(ddt, &ddt.main_data)?;
    Ok(AssemblyRequest {
        ddt_id: Some(ddt.id.to_string()),
        label: Some(ddt.label.clone()),
        root,
        messages,
        translations: ddt.translations.without_ddt(ddt.id.as_str()),
    })
}

fn raw_node(ddt: &Ddt, node: &DataNode) -> Result<(RawNode, NodeMessages), TranslationError> {
    let mut constraints = Vec::with_capacity(node.constraints.len());
    for constraint in &node.constraints {
        let prompts = constraint
            .prompts
            .iter()
            .map(|key| ddt.translations.resolve(key).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        constraints.push(RawConstraint {
            id: Some(constraint.id.to_string()),
            kind: constraint.kind.clone(),
            label: Some(constraint.label.clone()),
            payoff: Some(constraint.payoff.clone()),
            prompts: Some(prompts),
            validation_script: Some(constraint.validation_script.clone()),
            test_set: Some(constraint.test_set.clone()),
        });
    }

    let mut steps = BTreeMap::new();
    for group in &node.steps {
        let mut payloads = Vec::with_capacity(group.escalations.len());
        for escalation in &group.escalations {
            let mut texts = Vec::with_capacity(escalation.actions.len());
            for key in escalation.actions.iter().filter_map(Action::text_key) {
                texts.push(ddt.translations.resolve(key)?.to_string());
            }
            payloads.push(texts);
        }
        steps.insert(group.step_type.to_string(), payloads);
    }

    let mut sub_data = Vec::with_capacity(node.sub_data.len());
    let mut sub_messages = Vec::with_capacity(node.sub_data.len());
    for child in &node.sub_data {
        let (raw, messages) = raw_node(ddt, child)?;
        sub_data.push(raw);
        sub_messages.push(messages);
    }

    let raw = RawNode {
        variable: Some(node.variable.clone()),
        name: None,
        label: Some(node.label.clone()),
        detected_label: None,
        data_type: node.data_type.clone(),
        description: node.description.clone(),
        payoff: node.payoff.clone(),
        constraints,
        sub_data,
        required: (!node.required).then_some(false),
        next_step_id: node.next_step_id.as_ref().map(ToString::to_string),
    };
    Ok((
        raw,
        NodeMessages {
            steps,
            sub_data: sub_messages,
        },
    ))
}
