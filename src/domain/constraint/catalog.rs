//! Built-in constraint enrichments keyed by declared type.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::domain::ddt::ConstraintTestCase;

/// Defaults applied to a raw constraint of a known type.
#[derive(Debug, Clone)]
pub struct BuiltinConstraint {
    pub label: &'static str,
    pub payoff: &'static str,
    pub prompts: &'static [&'static str],
    pub validation_script: &'static str,
    pub test_set: &'static [(&'static str, bool)],
}

impl BuiltinConstraint {
    pub fn test_cases(&self) -> Vec<ConstraintTestCase> {
        self.test_set
            .iter()
            .map(|(input, expected)| ConstraintTestCase::new(*input, *expected))
            .collect()
    }
}

static CATALOG: Lazy<HashMap<&'static str, BuiltinConstraint>> = Lazy::new(|| {
    let mut catalog = HashMap::new();
    catalog.insert(
        "pastDate",
        BuiltinConstraint {
            label: "Must be in the past",
            payoff: "A date that has not happened yet cannot be accepted here.",
            prompts: &["The date must be in the past. Could you check it?"],
            validation_script: "value => date(value) < today()",
            test_set: &[("2022-01-01", true), ("2100-01-01", false)],
        },
    );
    catalog.insert(
        "futureDate",
        BuiltinConstraint {
            label: "Must be in the future",
            payoff: "Only upcoming dates can be scheduled.",
            prompts: &["The date must be in the future. Could you check it?"],
            validation_script: "value => date(value) > today()",
            test_set: &[("2100-01-01", true), ("2022-01-01", false)],
        },
    );
    catalog.insert(
        "required",
        BuiltinConstraint {
            label: "Required",
            payoff: "This information is needed to continue.",
            prompts: &["This information is required."],
            validation_script: "value => value != null && len(trim(str(value))) > 0",
            test_set: &[("Rome", true), ("   ", false)],
        },
    );
    catalog.insert(
        "email",
        BuiltinConstraint {
            label: "Must be a valid e-mail address",
            payoff: "We need a reachable e-mail address.",
            prompts: &["That does not look like an e-mail address."],
            validation_script: r#"value => matches(value, "^[^@\\s]+@[^@\\s]+\\.[^@\\s]+$")"#,
            test_set: &[("anna@example.com", true), ("anna.example.com", false)],
        },
    );
    catalog.insert(
        "positiveNumber",
        BuiltinConstraint {
            label: "Must be a positive number",
            payoff: "Only amounts greater than zero make sense here.",
            prompts: &["Please give a number greater than zero."],
            validation_script: "value => isNumber(value) && number(value) > 0",
            test_set: &[("12", true), ("-3", false)],
        },
    );
    catalog.insert(
        "integer",
        BuiltinConstraint {
            label: "Must be a whole number",
            payoff: "Fractions are not accepted for this value.",
            prompts: &["Please give a whole number."],
            validation_script: r#"value => matches(str(value), "^-?[0-9]+$")"#,
            test_set: &[("42", true), ("4.2", false)],
        },
    );
    catalog
});

/// Looks up the built-in enrichment for a declared constraint type.
pub fn builtin(kind: &str) -> Option<&'static BuiltinConstraint> {
    CATALOG.get(kind)
}

/// Declared types that have a built-in enrichment.
pub fn builtin_kinds() -> Vec<&'static str> {
    let mut kinds: Vec<&'static str> = CATALOG.keys().copied().collect();
    kinds.sort_unstable();
    kinds
}
