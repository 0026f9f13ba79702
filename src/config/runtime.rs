//! Dialogue runtime configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::foundation::NodeId;
use crate::domain::runtime::{EngineConfig, DEFAULT_TERMINAL_NODE};
use crate::domain::simulator::SimulatorConfig;

/// Runtime configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Parser calls slower than this count as noMatch
    #[serde(default = "default_parser_timeout_ms")]
    pub parser_timeout_ms: u64,

    /// Successor of nodes without `nextStepId`
    #[serde(default = "default_terminal_node")]
    pub default_terminal_node: String,

    /// Extra node ids the simulator treats as terminal
    #[serde(default)]
    pub terminal_node_ids: Vec<String>,

    /// Host policy: stop a session when a node's attempts reach this
    pub max_attempts: Option<u32>,
}

fn default_parser_timeout_ms() -> u64 {
    5000
}

fn default_terminal_node() -> String {
    DEFAULT_TERMINAL_NODE.to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            parser_timeout_ms: default_parser_timeout_ms(),
            default_terminal_node: default_terminal_node(),
            terminal_node_ids: Vec::new(),
            max_attempts: None,
        }
    }
}

impl RuntimeConfig {
    pub fn parser_timeout(&self) -> Duration {
        Duration::from_millis(self.parser_timeout_ms)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            parser_timeout: self.parser_timeout(),
            default_terminal_node: NodeId::new(self.default_terminal_node.trim()),
            today: None,
        }
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            terminal_node_ids: self
                .terminal_node_ids
                .iter()
                .map(|id| NodeId::new(id.trim()))
                .collect(),
            max_attempts: self.max_attempts,
        }
    }

    /// Validate runtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.parser_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_attempts == Some(0) {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        if self.default_terminal_node.trim().is_empty()
            || self.terminal_node_ids.iter().any(|id| id.trim().is_empty())
        {
            return Err(ValidationError::EmptyTerminalNode);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_defaults() {
        let config = RuntimeConfig::default();
        let engine = config.engine_config();
        assert_eq!(engine.parser_timeout, EngineConfig::default().parser_timeout);
        assert_eq!(engine.default_terminal_node, NodeId::new("end"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = RuntimeConfig {
            parser_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let config = RuntimeConfig {
            max_attempts: Some(0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxAttempts));
    }

    #[test]
    fn blank_terminal_ids_are_rejected() {
        let config = RuntimeConfig {
            terminal_node_ids: vec!["done".into(), " ".into()],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyTerminalNode));
    }

    #[test]
    fn simulator_config_carries_host_policy() {
        let config = RuntimeConfig {
            terminal_node_ids: vec!["done".into()],
            max_attempts: Some(3),
            ..Default::default()
        };
        let sim = config.simulator_config();
        assert_eq!(sim.terminal_node_ids, vec![NodeId::new("done")]);
        assert_eq!(sim.max_attempts, Some(3));
    }
}
