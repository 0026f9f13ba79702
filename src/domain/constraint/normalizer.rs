//! Constraint normalization and prompt externalization.

use serde::{Deserialize, Serialize};

use super::catalog::builtin;
use super::predicate::{check_script, EvalContext};
use crate::domain::ddt::{Constraint, ConstraintTestCase};
use crate::domain::foundation::{ConstraintId, DdtId, IdKind, IdSource, ValidationError};
use crate::domain::translation::{TranslationError, TranslationKey, TranslationTable};

/// Loosely-structured constraint as produced by authoring or generation tools.
///
/// Every field is optional; a field that is present overrides the built-in
/// default for the declared `type`, even when it is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payoff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_set: Option<Vec<ConstraintTestCase>>,
}

impl RawConstraint {
    /// A raw constraint that only declares its type.
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }
}

/// A constraint with every field resolved; prompts may still be literal text.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedConstraint {
    pub id: ConstraintId,
    pub kind: Option<String>,
    pub label: String,
    pub payoff: String,
    pub prompts: Vec<String>,
    pub validation_script: String,
    pub test_set: Vec<ConstraintTestCase>,
}

/// Applies built-in enrichments and fills every missing field.
///
/// Ids are generated only when absent or blank; an explicit id that cannot
/// be used as a key segment is rejected rather than replaced, because ids
/// must stay stable across edits.
pub fn normalize(
    raw: &[RawConstraint],
    ids: &mut dyn IdSource,
) -> Result<Vec<NormalizedConstraint>, ValidationError> {
    raw.iter().map(|r| normalize_one(r, ids)).collect()
}

fn normalize_one(
    raw: &RawConstraint,
    ids: &mut dyn IdSource,
) -> Result<NormalizedConstraint, ValidationError> {
    let defaults = raw.kind.as_deref().and_then(builtin);
    if let (Some(kind), None) = (raw.kind.as_deref(), defaults) {
        tracing::debug!(kind, "No built-in enrichment for constraint type");
    }

    let id = match raw.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => ConstraintId::new(id)?,
        _ => ConstraintId::new(ids.next_id(IdKind::Constraint))?,
    };

    Ok(NormalizedConstraint {
        id,
        kind: raw.kind.clone(),
        label: raw
            .label
            .clone()
            .or_else(|| defaults.map(|d| d.label.to_string()))
            .unwrap_or_default(),
        payoff: raw
            .payoff
            .clone()
            .or_else(|| defaults.map(|d| d.payoff.to_string()))
            .unwrap_or_default(),
        prompts: raw
            .prompts
            .clone()
            .or_else(|| defaults.map(|d| d.prompts.iter().map(|p| p.to_string()).collect()))
            .unwrap_or_default(),
        validation_script: raw
            .validation_script
            .clone()
            .or_else(|| defaults.map(|d| d.validation_script.to_string()))
            .unwrap_or_default(),
        test_set: raw
            .test_set
            .clone()
            .or_else(|| defaults.map(|d| d.test_cases()))
            .unwrap_or_default(),
    })
}

/// Moves literal prompts into the translation table and keeps their keys.
///
/// Prompts that already have key shape are kept as they are, so a
/// constraint coming back from a persisted DDT is not externalized twice.
pub fn attach_prompts(
    ddt_id: &DdtId,
    constraint: NormalizedConstraint,
    translations: &mut TranslationTable,
) -> Result<Constraint, TranslationError> {
    let mut prompts = Vec::with_capacity(constraint.prompts.len());
    for (n, prompt) in constraint.prompts.into_iter().enumerate() {
        if let Some(existing) = TranslationKey::parse(&prompt) {
            prompts.push(existing);
            continue;
        }
        let key = TranslationKey::constraint_prompt(ddt_id, &constraint.id, n);
        translations.insert_new(key.clone(), prompt)?;
        prompts.push(key);
    }

    Ok(Constraint {
        id: constraint.id,
        kind: constraint.kind,
        label: constraint.label,
        payoff: constraint.payoff,
        prompts,
        validation_script: constraint.validation_script,
        test_set: constraint.test_set,
    })
}

/// Result of running one test case of a constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub case: ConstraintTestCase,
    pub actual: bool,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.actual == self.case.expected
    }
}

/// Runs a constraint's test set against its script.
///
/// Authoring tooling only; the runtime never executes test sets.
pub fn self_test(constraint: &Constraint, ctx: &EvalContext) -> Vec<TestOutcome> {
    constraint
        .test_set
        .iter()
        .map(|case| TestOutcome {
            case: case.clone(),
            actual: is_satisfied(constraint, &case.input, ctx),
        })
        .collect()
}

/// Evaluates a constraint on a value. Script errors count as unsatisfied.
pub fn is_satisfied(constraint: &Constraint, value: &serde_json::Value, ctx: &EvalContext) -> bool {
    if constraint.validation_script.trim().is_empty() {
        return true;
    }
    match check_script(&constraint.validation_script) {
        Ok(predicate) => predicate.holds(value, ctx),
        Err(err) => {
            tracing::warn!(constraint_id = %constraint.id, error = %err, "Unusable validation script");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SequentialIds;
    use chrono::NaiveDate;
    use serde_json::json;

    fn ctx() -> EvalContext {
        EvalContext::at(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }

    fn ddt_id() -> DdtId {
        DdtId::new("dob").unwrap()
    }

    mod normalization {
        use super::*;

        #[test]
        fn past_date_gets_canned_label_and_test_set() {
            let out = normalize(&[RawConstraint::of_kind("pastDate")], &mut SequentialIds::new())
                .unwrap();
            assert_eq!(out[0].label, "Must be in the past");
            assert_eq!(
                out[0].test_set,
                vec![
                    ConstraintTestCase::new("2022-01-01", true),
                    ConstraintTestCase::new("2100-01-01", false),
                ]
            );
            assert_eq!(out[0].validation_script, "value => date(value) < today()");
        }

        #[test]
        fn explicit_fields_override_builtin() {
            let raw = RawConstraint {
                label: Some("Born before today".into()),
                prompts: Some(vec![]),
                ..RawConstraint::of_kind("pastDate")
            };
            let out = normalize(&[raw], &mut SequentialIds::new()).unwrap();
            assert_eq!(out[0].label, "Born before today");
            assert!(out[0].prompts.is_empty());
            assert_eq!(out[0].payoff, builtin("pastDate").unwrap().payoff);
        }

        #[test]
        fn unknown_type_falls_back_to_empty_fields() {
            let out = normalize(&[RawConstraint::of_kind("custom")], &mut SequentialIds::new())
                .unwrap();
            let c = &out[0];
            assert_eq!(c.id.as_str(), "c_1");
            assert!(c.label.is_empty() && c.payoff.is_empty() && c.validation_script.is_empty());
            assert!(c.prompts.is_empty() && c.test_set.is_empty());
        }

        #[test]
        fn explicit_id_is_kept_and_blank_id_is_generated() {
            let raw = vec![
                RawConstraint {
                    id: Some("c_keep".into()),
                    ..Default::default()
                },
                RawConstraint {
                    id: Some("  ".into()),
                    ..Default::default()
                },
            ];
            let out = normalize(&raw, &mut SequentialIds::new()).unwrap();
            assert_eq!(out[0].id.as_str(), "c_keep");
            assert_eq!(out[1].id.as_str(), "c_1");
        }

        #[test]
        fn unusable_explicit_id_is_rejected() {
            let raw = RawConstraint {
                id: Some("c.1".into()),
                ..Default::default()
            };
            assert!(normalize(&[raw], &mut SequentialIds::new()).is_err());
        }
    }

    mod attach {
        use super::*;

        fn normalized(prompts: Vec<&str>) -> NormalizedConstraint {
            NormalizedConstraint {
                id: ConstraintId::new("c_1").unwrap(),
                kind: None,
                label: String::new(),
                payoff: String::new(),
                prompts: prompts.into_iter().map(String::from).collect(),
                validation_script: String::new(),
                test_set: vec![],
            }
        }

        #[test]
        fn literals_become_keys_and_texts_move_to_table() {
            let mut table = TranslationTable::new();
            let c = attach_prompts(&ddt_id(), normalized(vec!["Too late", "Try again"]), &mut table)
                .unwrap();
            assert_eq!(c.prompts[0].as_str(), "runtime.dob.constraint#c_1.prompt#0");
            assert_eq!(c.prompts[1].as_str(), "runtime.dob.constraint#c_1.prompt#1");
            assert_eq!(table.resolve(&c.prompts[1]), Ok("Try again"));
        }

        #[test]
        fn already_keyed_prompts_are_not_externalized_twice() {
            let mut table = TranslationTable::new();
            let first = attach_prompts(&ddt_id(), normalized(vec!["Too late"]), &mut table).unwrap();
            let again = NormalizedConstraint {
                prompts: first.prompts.iter().map(|k| k.to_string()).collect(),
                ..normalized(vec![])
            };
            let second = attach_prompts(&ddt_id(), again, &mut table).unwrap();
            assert_eq!(second.prompts, first.prompts);
            assert_eq!(table.len(), 1);
        }

        #[test]
        fn colliding_key_is_an_error() {
            let mut table = TranslationTable::new();
            attach_prompts(&ddt_id(), normalized(vec!["one"]), &mut table).unwrap();
            let err = attach_prompts(&ddt_id(), normalized(vec!["two"]), &mut table).unwrap_err();
            assert!(matches!(err, TranslationError::Duplicate(_)));
        }
    }

    mod evaluation {
        use super::*;

        fn constraint(script: &str, cases: Vec<ConstraintTestCase>) -> Constraint {
            Constraint {
                id: ConstraintId::new("c_1").unwrap(),
                kind: None,
                label: String::new(),
                payoff: String::new(),
                prompts: vec![],
                validation_script: script.into(),
                test_set: cases,
            }
        }

        #[test]
        fn empty_script_is_always_satisfied() {
            assert!(is_satisfied(&constraint("", vec![]), &json!("x"), &ctx()));
        }

        #[test]
        fn broken_script_is_unsatisfied() {
            assert!(!is_satisfied(&constraint("value =>", vec![]), &json!("x"), &ctx()));
        }

        #[test]
        fn self_test_reports_each_case() {
            let c = constraint(
                "value => date(value) < today()",
                vec![
                    ConstraintTestCase::new("2022-01-01", true),
                    ConstraintTestCase::new("2100-01-01", true),
                ],
            );
            let outcomes = self_test(&c, &ctx());
            assert!(outcomes[0].passed());
            assert!(!outcomes[1].passed());
        }
    }
}
