//! Saturation predicates: when has a slot been fully collected?

use chrono::NaiveDate;
use serde_json::Value;

use super::variables::VariableSet;
use crate::domain::ddt::DataNode;

/// Variables a date needs before it counts as collected.
pub const DATE_PARTS: [&str; 3] = ["day", "month", "year"];

/// Type-specific saturation rule.
///
/// `date` needs day, month and year all present and truthy. Any other type
/// needs at least one non-null, non-blank value, so `false` and `0` count.
pub fn is_data_saturated(variables: &VariableSet, expected_type: &str) -> bool {
    match expected_type {
        "date" => DATE_PARTS.iter().all(|part| variables.has(part)),
        _ => variables.any_present(),
    }
}

/// Saturation for a node: the type rule plus every required sub-variable.
pub fn is_node_saturated(node: &DataNode, variables: &VariableSet) -> bool {
    is_data_saturated(variables, node.expected_type())
        && node.required_sub_variables().all(|v| variables.has_value(v))
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The single value constraints are checked against.
///
/// The node's own variable, then `value`, then an ISO date composed from
/// day/month/year. `null` when none is available.
pub fn node_value(node: &DataNode, variables: &VariableSet) -> Value {
    if let Some(value) = variables.get(&node.variable).or_else(|| variables.get("value")) {
        return value.clone();
    }
    let parts: Option<Vec<u32>> = DATE_PARTS
        .iter()
        .map(|part| variables.get(part).and_then(as_u32))
        .collect();
    match parts.as_deref() {
        Some([day, month, year]) => NaiveDate::from_ymd_opt(*year as i32, *month, *day)
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
