//! Strongly-typed identifier value objects.
//!
//! Every identifier here ends up as a segment of a translation key, and a DDT
//! id also names a file, so none of them may be empty or contain the key
//! separators `.` and `#` or a path separator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Characters reserved by the translation key grammar and by file paths.
const RESERVED: [char; 4] = ['.', '#', '/', '\\'];

fn check_segment(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    if let Some(c) = value.chars().find(|c| RESERVED.contains(c) || c.is_whitespace()) {
        return Err(ValidationError::invalid_format(
            field,
            format!("'{}' may not contain '{}'", value, c),
        ));
    }
    Ok(())
}

macro_rules! segment_id {
    ($(#[$doc:meta])* $name:ident, $field:literal, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier, rejecting empty values and key separators.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                check_segment($field, &value)?;
                Ok(Self(value))
            }

            /// Creates a new random identifier.
            pub fn generate() -> Self {
                Self(format!("{}{}", $prefix, Uuid::new_v4().simple()))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

segment_id!(
    /// Identifier of an assembled Dialogue Data Template.
    DdtId,
    "ddt_id",
    "ddt_"
);

segment_id!(
    /// Identifier of a constraint; generated once and stable across edits.
    ConstraintId,
    "constraint_id",
    "c_"
);

segment_id!(
    /// Identifier of one occurrence of an action inside an escalation.
    ActionInstanceId,
    "action_instance_id",
    "a_"
);

segment_id!(
    /// Identifier of one escalation tier.
    EscalationId,
    "escalation_id",
    "e_"
);

/// Identifier of a slot node within a DDT.
///
/// Built from the `/`-joined variable path from the root, e.g. `dateOfBirth/day`.
/// Nodes are addressed by this id for `nextStepId` edges and session state;
/// ids that match no node are treated as terminal by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node id from an arbitrary string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Creates the id of the root node.
    /// Joins variable names into a path.
    pub const SEPARATOR: char = '/';

    pub fn root(variable: &str) -> Self {
        Self(variable.to_string())
    }

    /// Creates the id of a child node below this one.
    pub fn child(&self, variable: &str) -> Self {
        Self(format!("{}{}{}", self.0, Self::SEPARATOR, variable))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Which kind of identifier an [`IdSource`] is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Ddt,
    Constraint,
    ActionInstance,
    Escalation,
    Label,
}

impl IdKind {
    fn prefix(&self) -> &'static str {
        match self {
            IdKind::Ddt => "ddt_",
            IdKind::Constraint => "c_",
            IdKind::ActionInstance => "a_",
            IdKind::Escalation => "e_",
            IdKind::Label => "data_",
        }
    }
}

/// Source of freshly generated identifiers.
///
/// The assembler draws every generated id from one of these, so callers can
/// pin ids (for diffing and tests) by supplying a deterministic source.
pub trait IdSource {
    /// Returns the next identifier of the given kind. Must be a valid key segment.
    fn next_id(&mut self, kind: IdKind) -> String;
}

/// Random uuid-based identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self, kind: IdKind) -> String {
        format!("{}{}", kind.prefix(), Uuid::new_v4().simple())
    }
}

/// Deterministic identifiers: `a_1`, `a_2`, `c_1`, ... counted per kind.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    counters: std::collections::HashMap<IdKind, u64>,
}

impl SequentialIds {
    /// Creates a source whose counters all start at 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self, kind: IdKind) -> String {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("{}{}", kind.prefix(), counter)
    }
}
