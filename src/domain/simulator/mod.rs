//! Simulator - drives one session and keeps a readable transcript.
//!
//! No dialogue logic lives here: turns are delegated to the
//! [`DialogueEngine`]; the simulator only records what happened and applies
//! host policy (terminal nodes, attempt limit).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, NodeId, Timestamp};
use crate::domain::runtime::{DialogueEngine, DialogueEvent, RuntimeError, SessionState, Speaker};

/// One line of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub from: Speaker,
    pub node_id: NodeId,
    pub text: String,
    /// Step name for bot prompts, `userInput`, `askSubdata`, `constraint` or `notice`.
    pub kind: String,
    pub at: Timestamp,
}

impl From<&DialogueEvent> for TranscriptEntry {
    fn from(event: &DialogueEvent) -> Self {
        Self {
            from: event.speaker,
            node_id: event.node_id.clone(),
            text: event.text.clone(),
            kind: event.kind.name().to_string(),
            at: event.at,
        }
    }
}

/// Host policy applied on top of the engine.
#[derive(Debug, Clone, Default)]
pub struct SimulatorConfig {
    /// Node ids that end the session even if they exist in the DDT.
    pub terminal_node_ids: Vec<NodeId>,
    /// Stop once the active node has failed this many times.
    pub max_attempts: Option<u32>,
}

/// Where the simulated session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SimulatorStatus {
    Running,
    Completed,
    AttemptsExhausted,
}

impl fmt::Display for SimulatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SimulatorStatus::Running => "running",
            SimulatorStatus::Completed => "completed",
            SimulatorStatus::AttemptsExhausted => "attempts exhausted",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimulatorError {
    #[error("session is over ({0})")]
    Finished(SimulatorStatus),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<SimulatorError> for DomainError {
    fn from(err: SimulatorError) -> Self {
        match err {
            SimulatorError::Finished(SimulatorStatus::AttemptsExhausted) => {
                DomainError::new(ErrorCode::AttemptsExhausted, err.to_string())
            }
            SimulatorError::Finished(_) => {
                DomainError::new(ErrorCode::SessionCompleted, err.to_string())
            }
            SimulatorError::Runtime(inner) => inner.into(),
        }
    }
}

/// A single simulated conversation.
#[derive(Debug)]
pub struct Simulator {
    engine: DialogueEngine,
    config: SimulatorConfig,
    state: SessionState,
    status: SimulatorStatus,
    transcript: Vec<TranscriptEntry>,
}

impl Simulator {
    /// Starts a session and records the opening prompt.
    pub fn init(engine: DialogueEngine, config: SimulatorConfig) -> Result<Self, SimulatorError> {
        let state = engine.start()?;
        let mut simulator = Self {
            engine,
            config,
            state,
            status: SimulatorStatus::Running,
            transcript: Vec::new(),
        };
        simulator.record_from(0);
        simulator.refresh_status();
        Ok(simulator)
    }

    /// Sends one user turn. Returns the transcript entries it produced.
    pub async fn send_input(&mut self, text: &str) -> Result<&[TranscriptEntry], SimulatorError> {
        if self.status != SimulatorStatus::Running {
            return Err(SimulatorError::Finished(self.status));
        }
        let first = self.transcript.len();
        let seen = self.state.history.len();
        self.engine.advance(&mut self.state, text).await?;
        self.record_from(seen);
        self.refresh_status();
        Ok(&self.transcript[first..])
    }

    /// Drops the session and starts over.
    pub fn reset(&mut self) -> Result<(), SimulatorError> {
        self.state = self.engine.start()?;
        self.status = SimulatorStatus::Running;
        self.transcript.clear();
        self.record_from(0);
        self.refresh_status();
        tracing::debug!(ddt_id = %self.state.ddt_id, "Simulator reset");
        Ok(())
    }

    pub fn status(&self) -> SimulatorStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status != SimulatorStatus::Running
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    fn record_from(&mut self, index: usize) {
        self.transcript
            .extend(self.state.history[index..].iter().map(TranscriptEntry::from));
    }

    fn refresh_status(&mut self) {
        let current = self.state.current_node_id.clone();
        let status = if self.engine.is_terminal(&current)
            || self.config.terminal_node_ids.contains(&current)
        {
            SimulatorStatus::Completed
        } else if self
            .config
            .max_attempts
            .is_some_and(|max| self.state.attempts(&current) >= max)
        {
            SimulatorStatus::AttemptsExhausted
        } else {
            SimulatorStatus::Running
        };

        if status != SimulatorStatus::Running && status != self.status {
            let notice = DialogueEvent::system(current.clone(), format!("Session {}", status));
            self.transcript.push(TranscriptEntry::from(&notice));
            self.state.history.push(notice);
            tracing::info!(ddt_id = %self.state.ddt_id, node_id = %current, %status, "Session ended");
        }
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assembler::{AssemblyRequest, DdtAssembler, NodeMessages, RawNode};
    use crate::domain::ddt::validate;
    use crate::domain::foundation::SequentialIds;
    use crate::domain::runtime::{EngineConfig, VariableSet};
    use crate::ports::{InputParser, ParseResult, ParserError};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Succeeds on "ok", fails otherwise.
    struct OkParser;

    #[async_trait]
    impl InputParser for OkParser {
        async fn parse_input(&self, text: &str, _: &str) -> Result<ParseResult, ParserError> {
            Ok(if text == "ok" {
                ParseResult::matched(VariableSet::new().with("value", "ok"))
            } else {
                ParseResult::no_match("not ok")
            })
        }
    }

    fn engine() -> DialogueEngine {
        let messages = NodeMessages::new()
            .with_escalation("start", ["Name?"])
            .with_escalation("noMatch", ["Again?"]);
        let ddt = DdtAssembler::default()
            .assemble(
                AssemblyRequest::new(RawNode::new("name", "text"), messages).with_ddt_id("name"),
                &mut SequentialIds::new(),
            )
            .unwrap();
        DialogueEngine::new(
            Arc::new(validate(ddt).unwrap()),
            Arc::new(OkParser),
            EngineConfig::default(),
        )
    }

    #[test]
    fn init_records_opening_prompt() {
        let sim = Simulator::init(engine(), SimulatorConfig::default()).unwrap();
        assert_eq!(sim.transcript().len(), 1);
        assert_eq!(sim.transcript()[0].from, Speaker::Bot);
        assert_eq!(sim.transcript()[0].kind, "start");
        assert_eq!(sim.transcript()[0].text, "Name?");
    }

    #[tokio::test]
    async fn transcript_is_append_only_and_ends_with_notice() {
        let mut sim = Simulator::init(engine(), SimulatorConfig::default()).unwrap();
        let entries = sim.send_input("nope").await.unwrap().to_vec();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "userInput");
        assert_eq!(entries[1].kind, "noMatch");

        sim.send_input("ok").await.unwrap();
        assert!(sim.is_complete());
        assert_eq!(sim.status(), SimulatorStatus::Completed);
        let last = sim.transcript().last().unwrap();
        assert_eq!(last.from, Speaker::System);
        assert_eq!(sim.transcript().len(), 5);

        let err = sim.send_input("more").await.unwrap_err();
        assert_eq!(err, SimulatorError::Finished(SimulatorStatus::Completed));
    }

    #[tokio::test]
    async fn attempt_limit_stops_the_session() {
        let config = SimulatorConfig {
            max_attempts: Some(2),
            ..Default::default()
        };
        let mut sim = Simulator::init(engine(), config).unwrap();
        sim.send_input("a").await.unwrap();
        assert!(!sim.is_complete());
        sim.send_input("b").await.unwrap();
        assert_eq!(sim.status(), SimulatorStatus::AttemptsExhausted);
    }

    #[tokio::test]
    async fn configured_terminal_node_completes_immediately() {
        let config = SimulatorConfig {
            terminal_node_ids: vec![NodeId::new("name")],
            ..Default::default()
        };
        let sim = Simulator::init(engine(), config).unwrap();
        assert!(sim.is_complete());
    }

    #[tokio::test]
    async fn reset_starts_over() {
        let mut sim = Simulator::init(engine(), SimulatorConfig::default()).unwrap();
        sim.send_input("ok").await.unwrap();
        sim.reset().unwrap();
        assert!(!sim.is_complete());
        assert_eq!(sim.transcript().len(), 1);
        assert_eq!(sim.state().current_node_id, NodeId::new("name"));
    }
}
