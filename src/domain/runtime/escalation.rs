//! Escalation predicate.

use crate::domain::ddt::StepType;
use crate::ports::ParseResult;

/// Returns true for empty or whitespace-only input.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Which escalation a turn triggers, if any.
///
/// Blank input is `noInput`; a failed parse is `noMatch`. A partial
/// extraction (missing sub-data reported) is not a failure.
pub fn check_escalation(text: &str, parsed: &ParseResult) -> Option<StepType> {
    if is_blank(text) {
        Some(StepType::NoInput)
    } else if parsed.is_failure() {
        Some(StepType::NoMatch)
    } else {
        None
    }
}
