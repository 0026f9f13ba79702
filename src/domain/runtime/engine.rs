//! Slot-filling state machine.
//!
//! One node is active at a time. Each user turn either escalates (retry on
//! the same node), continues a partial extraction, fails a constraint, or
//! saturates the node and follows its successor edge.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::escalation::{check_escalation, is_blank};
use super::saturation::{is_node_saturated, node_value};
use super::session::{DialogueEvent, EventKind, SessionState, Speaker};
use crate::domain::constraint::{is_satisfied, EvalContext};
use crate::domain::ddt::{DataNode, StepType, ValidatedDdt};
use crate::domain::foundation::{ConstraintId, DomainError, ErrorCode, NodeId, Timestamp};
use crate::domain::translation::TranslationError;
use crate::ports::{InputParser, ParseResult};

/// Default node id a saturated node without `nextStepId` moves to.
pub const DEFAULT_TERMINAL_NODE: &str = "end";

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Parser calls longer than this count as a failed parse.
    pub parser_timeout: Duration,
    /// Successor of nodes that declare none.
    pub default_terminal_node: NodeId,
    /// Pinned "today" for constraint evaluation; `None` uses the clock.
    pub today: Option<NaiveDate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parser_timeout: Duration::from_millis(5000),
            default_terminal_node: NodeId::new(DEFAULT_TERMINAL_NODE),
            today: None,
        }
    }
}

/// Runtime failures. Parser problems are never reported here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("session is on '{node_id}', which is not a node of the DDT")]
    NoActiveNode { node_id: NodeId },

    #[error("session belongs to DDT '{found}', engine runs '{expected}'")]
    DdtMismatch { expected: String, found: String },

    #[error(transparent)]
    Translation(#[from] TranslationError),
}

impl From<RuntimeError> for DomainError {
    fn from(err: RuntimeError) -> Self {
        let code = match &err {
            RuntimeError::NoActiveNode { .. } => ErrorCode::SessionCompleted,
            RuntimeError::DdtMismatch { .. } => ErrorCode::ValidationFailed,
            RuntimeError::Translation(_) => ErrorCode::MissingTranslation,
        };
        DomainError::new(code, err.to_string())
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Retry on the same node.
    Escalated { step_type: StepType, attempts: u32 },
    /// Some sub-values are still missing; the first one was asked for.
    AwaitingSubdata { missing: Vec<String> },
    /// The node saturated but a constraint rejected the value.
    ConstraintFailed { constraint_id: ConstraintId, attempts: u32 },
    /// The node saturated and the session moved on.
    Transitioned { from: NodeId, to: NodeId, terminal: bool },
    /// Values were merged; more input is expected.
    Continued,
}

/// Result of one `advance` call.
#[derive(Debug, Clone)]
pub struct Turn {
    /// History entries appended by this turn, user input first.
    pub events: Vec<DialogueEvent>,
    pub outcome: TurnOutcome,
}

impl Turn {
    /// Texts the bot said during this turn.
    pub fn bot_texts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter(|e| e.speaker == Speaker::Bot)
            .map(|e| e.text.as_str())
            .collect()
    }
}

/// Drives sessions over one validated DDT.
///
/// The DDT is shared by reference; every session owns its own
/// [`SessionState`]. Cloning the engine is cheap.
#[derive(Clone)]
pub struct DialogueEngine {
    ddt: Arc<ValidatedDdt>,
    parser: Arc<dyn InputParser>,
    config: EngineConfig,
}

impl std::fmt::Debug for DialogueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueEngine")
            .field("ddt_id", &self.ddt.id)
            .field("config", &self.config)
            .finish()
    }
}

impl DialogueEngine {
    pub fn new(ddt: Arc<ValidatedDdt>, parser: Arc<dyn InputParser>, config: EngineConfig) -> Self {
        Self { ddt, parser, config }
    }

    pub fn ddt(&self) -> &Arc<ValidatedDdt> {
        &self.ddt
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns true if `node_id` does not address a node of the DDT.
    pub fn is_terminal(&self, node_id: &NodeId) -> bool {
        self.ddt.node(node_id).is_none()
    }

    /// Opens a session on the root node and emits its entry prompt.
    pub fn start(&self) -> Result<SessionState, RuntimeError> {
        let root = self.ddt.root_id();
        let mut state = SessionState::new(self.ddt.id.clone(), root.clone());
        state.progress_mut(&root);
        let events = self.step_events(&root, &self.ddt.main_data, &StepType::Start, 0)?;
        state.history.extend(events);
        tracing::info!(ddt_id = %self.ddt.id, node_id = %root, "Session started");
        Ok(state)
    }

    /// Processes one user turn.
    ///
    /// On error `state` is left untouched.
    pub async fn advance(
        &self,
        state: &mut SessionState,
        input: &str,
    ) -> Result<Turn, RuntimeError> {
        if state.ddt_id != self.ddt.id {
            return Err(RuntimeError::DdtMismatch {
                expected: self.ddt.id.to_string(),
                found: state.ddt_id.to_string(),
            });
        }
        let node_id = state.current_node_id.clone();
        let node = self
            .ddt
            .node(&node_id)
            .ok_or_else(|| RuntimeError::NoActiveNode {
                node_id: node_id.clone(),
            })?;

        let parsed = if is_blank(input) {
            ParseResult::default()
        } else {
            self.parse(&node_id, input, node.expected_type()).await
        };

        let mut next = state.clone();
        let mut events = vec![DialogueEvent::user(node_id.clone(), input)];

        let outcome = match check_escalation(input, &parsed) {
            Some(step_type) => self.escalate(&mut next, &node_id, node, step_type, &mut events)?,
            None => self.accept(&mut next, &node_id, node, &parsed, &mut events)?,
        };

        next.history.extend(events.iter().cloned());
        *state = next;
        Ok(Turn { events, outcome })
    }

    async fn parse(&self, node_id: &NodeId, input: &str, expected_type: &str) -> ParseResult {
        match tokio::time::timeout(
            self.config.parser_timeout,
            self.parser.parse_input(input, expected_type),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::warn!(node_id = %node_id, error = %err, "Parser failed, treating as no match");
                ParseResult::no_match(err.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    node_id = %node_id,
                    timeout_ms = self.config.parser_timeout.as_millis() as u64,
                    "Parser timed out, treating as no match"
                );
                ParseResult::no_match("parser timed out")
            }
        }
    }

    fn escalate(
        &self,
        state: &mut SessionState,
        node_id: &NodeId,
        node: &DataNode,
        step_type: StepType,
        events: &mut Vec<DialogueEvent>,
    ) -> Result<TurnOutcome, RuntimeError> {
        let progress = state.progress_mut(node_id);
        progress.attempts += 1;
        let streak = progress.streaks.entry(step_type.clone()).or_insert(0);
        let consecutive = *streak;
        *streak += 1;
        let attempts = progress.attempts;

        tracing::debug!(
            node_id = %node_id,
            step_type = %step_type,
            attempt = attempts,
            "Escalation"
        );
        events.extend(self.step_events(node_id, node, &step_type, consecutive)?);
        Ok(TurnOutcome::Escalated {
            step_type,
            attempts,
        })
    }

    fn accept(
        &self,
        state: &mut SessionState,
        node_id: &NodeId,
        node: &DataNode,
        parsed: &ParseResult,
        events: &mut Vec<DialogueEvent>,
    ) -> Result<TurnOutcome, RuntimeError> {
        let progress = state.progress_mut(node_id);
        progress.streaks.clear();
        progress.variables.merge(&parsed.variables);

        let missing: Vec<String> = parsed
            .missing_subdata
            .iter()
            .filter(|variable| !progress.variables.has(variable))
            .cloned()
            .collect();
        if let Some(first) = missing.first() {
            tracing::debug!(node_id = %node_id, missing = ?missing, "Asking for missing sub-data");
            events.extend(self.ask_subdata(node_id, node, first)?);
            return Ok(TurnOutcome::AwaitingSubdata { missing });
        }

        if !is_node_saturated(node, &progress.variables) {
            tracing::debug!(node_id = %node_id, "Merged values, node not saturated yet");
            return Ok(TurnOutcome::Continued);
        }

        let value = node_value(node, &progress.variables);
        let ctx = match self.config.today {
            Some(today) => EvalContext::at(today),
            None => EvalContext::at(Timestamp::now().date()),
        };
        if let Some(failed) = node.constraints.iter().find(|c| !is_satisfied(c, &value, &ctx)) {
            progress.attempts += 1;
            progress.variables.clear();
            let attempts = progress.attempts;
            tracing::debug!(
                node_id = %node_id,
                constraint_id = %failed.id,
                attempt = attempts,
                "Constraint rejected value"
            );
            if let Some(key) = failed.prompts.first() {
                let text = self.ddt.translations.resolve(key)?;
                events.push(DialogueEvent::bot(
                    node_id.clone(),
                    text,
                    EventKind::ConstraintPrompt {
                        constraint_id: failed.id.clone(),
                    },
                ));
            }
            return Ok(TurnOutcome::ConstraintFailed {
                constraint_id: failed.id.clone(),
                attempts,
            });
        }

        self.transition(state, node_id, node, events)
    }

    fn transition(
        &self,
        state: &mut SessionState,
        from: &NodeId,
        node: &DataNode,
        events: &mut Vec<DialogueEvent>,
    ) -> Result<TurnOutcome, RuntimeError> {
        let to = node
            .next_step_id
            .clone()
            .unwrap_or_else(|| self.config.default_terminal_node.clone());

        events.extend(self.step_events(from, node, &StepType::Success, 0)?);
        state.progress_mut(from).attempts = 0;
        state.nodes.insert(to.clone(), Default::default());
        state.current_node_id = to.clone();

        let terminal = match self.ddt.node(&to) {
            Some(entered) => {
                events.extend(self.step_events(&to, entered, &StepType::Start, 0)?);
                false
            }
            None => true,
        };
        tracing::info!(
            ddt_id = %self.ddt.id,
            from = %from,
            to = %to,
            terminal,
            "Node saturated, transitioned"
        );
        Ok(TurnOutcome::Transitioned {
            from: from.clone(),
            to,
            terminal,
        })
    }

    fn ask_subdata(
        &self,
        node_id: &NodeId,
        node: &DataNode,
        variable: &str,
    ) -> Result<Vec<DialogueEvent>, RuntimeError> {
        let Some(sub) = node.sub_node(variable) else {
            return Ok(vec![DialogueEvent::bot(
                node_id.clone(),
                variable,
                EventKind::AskSubdata {
                    variable: variable.to_string(),
                },
            )]);
        };
        let sub_id = node_id.child(variable);
        if sub.step(&StepType::Start).is_some() {
            return self.step_events(&sub_id, sub, &StepType::Start, 0);
        }
        Ok(vec![DialogueEvent::bot(
            sub_id,
            sub.label.clone(),
            EventKind::AskSubdata {
                variable: variable.to_string(),
            },
        )])
    }

    /// Bot events for one step of a node, tier chosen by the ladder.
    fn step_events(
        &self,
        node_id: &NodeId,
        node: &DataNode,
        step_type: &StepType,
        consecutive: usize,
    ) -> Result<Vec<DialogueEvent>, RuntimeError> {
        let Some(ladder) = node.step(step_type).and_then(|group| group.ladder()) else {
            if step_type.is_escalation() {
                tracing::warn!(node_id = %node_id, step_type = %step_type, "No escalation authored");
            }
            return Ok(Vec::new());
        };

        let escalation_index = ladder.tier_index(consecutive);
        let escalation = ladder.resolve(consecutive);
        let mut events = Vec::with_capacity(escalation.actions.len());
        for action in &escalation.actions {
            let Some(key) = action.text_key() else {
                continue;
            };
            let text = self.ddt.translations.resolve(key)?;
            events.push(DialogueEvent::bot(
                node_id.clone(),
                text,
                EventKind::Step {
                    step_type: step_type.clone(),
                    escalation_index,
                    action: action.action_id,
                },
            ));
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assembler::{AssemblyRequest, DdtAssembler, NodeMessages, RawNode};
    use crate::domain::constraint::RawConstraint;
    use crate::domain::ddt::validate;
    use crate::domain::foundation::SequentialIds;
    use crate::domain::runtime::VariableSet;
    use crate::ports::ParserError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns queued results in order; counts calls.
    struct Queue {
        results: Mutex<VecDeque<Result<ParseResult, ParserError>>>,
        calls: Mutex<usize>,
        delay: Duration,
    }

    impl Queue {
        fn new(results: Vec<Result<ParseResult, ParserError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(0),
                delay: Duration::ZERO,
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl InputParser for Queue {
        async fn parse_input(&self, _: &str, _: &str) -> Result<ParseResult, ParserError> {
            *self.calls.lock().unwrap() += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ParseResult::no_match("exhausted")))
        }
    }

    fn ddt() -> Arc<ValidatedDdt> {
        let root = RawNode::new("dateOfBirth", "date")
            .with_label("Date of birth")
            .with_constraint(RawConstraint::of_kind("pastDate"))
            .with_sub_data(vec![
                RawNode::new("day", "number").with_label("Day"),
                RawNode::new("month", "number").with_label("Month"),
                RawNode::new("year", "number").with_label("Year"),
            ])
            .with_next_step("dateOfBirth/year");
        let messages = NodeMessages::new()
            .with_escalation("start", ["When were you born?"])
            .with_escalation("noMatch", ["Sorry, which date?"])
            .with_escalation("noInput", ["Are you there?"])
            .with_escalation("noInput", ["Please answer."])
            .with_escalation("success", ["Got it."])
            .with_sub_data(vec![
                NodeMessages::new().with_escalation("start", ["Which day?"]),
                NodeMessages::new(),
                NodeMessages::new().with_escalation("start", ["Confirm the year?"]),
            ]);
        let ddt = DdtAssembler::default()
            .assemble(
                AssemblyRequest::new(root, messages).with_ddt_id("dob"),
                &mut SequentialIds::new(),
            )
            .unwrap();
        Arc::new(validate(ddt).unwrap())
    }

    fn engine(parser: Arc<dyn InputParser>) -> DialogueEngine {
        DialogueEngine::new(
            ddt(),
            parser,
            EngineConfig {
                today: NaiveDate::from_ymd_opt(2026, 10, 18),
                ..Default::default()
            },
        )
    }

    fn full_date(year: i64) -> ParseResult {
        ParseResult::matched(
            VariableSet::new()
                .with("day", 3)
                .with("month", 7)
                .with("year", year)
                .with("dateOfBirth", format!("{}-07-03", year)),
        )
    }

    mod start {
        use super::*;

        #[test]
        fn emits_root_start_prompt() {
            let state = engine(Queue::new(vec![])).start().unwrap();
            assert_eq!(state.current_node_id, NodeId::new("dateOfBirth"));
            assert_eq!(state.bot_messages().collect::<Vec<_>>(), vec!["When were you born?"]);
        }
    }

    mod escalation {
        use super::*;

        #[tokio::test]
        async fn blank_input_skips_parser_and_counts_attempt() {
            let parser = Queue::new(vec![]);
            let engine = engine(parser.clone());
            let mut state = engine.start().unwrap();

            let turn = engine.advance(&mut state, "   ").await.unwrap();

            assert_eq!(parser.calls(), 0);
            assert_eq!(
                turn.outcome,
                TurnOutcome::Escalated {
                    step_type: StepType::NoInput,
                    attempts: 1
                }
            );
            assert_eq!(turn.bot_texts(), vec!["Are you there?"]);
            assert_eq!(state.current_node_id, NodeId::new("dateOfBirth"));
        }

        #[tokio::test]
        async fn consecutive_escalations_climb_then_clamp() {
            let engine = engine(Queue::new(vec![]));
            let mut state = engine.start().unwrap();

            let texts: Vec<String> = {
                let mut texts = Vec::new();
                for _ in 0..3 {
                    let turn = engine.advance(&mut state, "").await.unwrap();
                    texts.push(turn.bot_texts().join(" "));
                }
                texts
            };
            assert_eq!(texts, vec!["Are you there?", "Please answer.", "Please answer."]);
            assert_eq!(state.attempts(&NodeId::new("dateOfBirth")), 3);
        }

        #[tokio::test]
        async fn parser_error_is_no_match() {
            let engine = engine(Queue::new(vec![Err(ParserError::Unavailable("down".into()))]));
            let mut state = engine.start().unwrap();
            let turn = engine.advance(&mut state, "03/07/1990").await.unwrap();
            assert!(matches!(
                turn.outcome,
                TurnOutcome::Escalated { step_type: StepType::NoMatch, .. }
            ));
        }

        #[tokio::test]
        async fn parser_timeout_is_no_match() {
            let parser = Arc::new(Queue {
                results: Mutex::new(vec![Ok(full_date(1990))].into()),
                calls: Mutex::new(0),
                delay: Duration::from_millis(200),
            });
            let engine = DialogueEngine::new(
                ddt(),
                parser,
                EngineConfig {
                    parser_timeout: Duration::from_millis(10),
                    ..Default::default()
                },
            );
            let mut state = engine.start().unwrap();
            let turn = engine.advance(&mut state, "03/07/1990").await.unwrap();
            assert_eq!(turn.bot_texts(), vec!["Sorry, which date?"]);
            assert_eq!(state.current_node_id, NodeId::new("dateOfBirth"));
        }

        #[tokio::test]
        async fn successful_turn_resets_streaks_but_not_attempts() {
            let engine = engine(Queue::new(vec![Ok(ParseResult::partial(
                VariableSet::new().with("year", 1990),
                ["day", "month"],
            ))]));
            let mut state = engine.start().unwrap();
            engine.advance(&mut state, "").await.unwrap();
            engine.advance(&mut state, "1990").await.unwrap();
            let turn = engine.advance(&mut state, "").await.unwrap();

            assert_eq!(turn.bot_texts(), vec!["Are you there?"]);
            assert_eq!(state.attempts(&NodeId::new("dateOfBirth")), 2);
        }
    }

    mod extraction {
        use super::*;

        #[tokio::test]
        async fn partial_parse_asks_for_first_missing_part() {
            let engine = engine(Queue::new(vec![Ok(ParseResult::partial(
                VariableSet::new().with("year", 1990),
                ["day", "month"],
            ))]));
            let mut state = engine.start().unwrap();
            let turn = engine.advance(&mut state, "1990").await.unwrap();

            assert_eq!(
                turn.outcome,
                TurnOutcome::AwaitingSubdata {
                    missing: vec!["day".into(), "month".into()]
                }
            );
            assert_eq!(turn.bot_texts(), vec!["Which day?"]);
            let vars = state.variables(&NodeId::new("dateOfBirth")).unwrap();
            assert!(vars.has("year"));
        }

        #[tokio::test]
        async fn sub_node_without_start_step_is_asked_by_label() {
            let engine = engine(Queue::new(vec![Ok(ParseResult::partial(
                VariableSet::new().with("year", 1990).with("day", 3),
                ["month"],
            ))]));
            let mut state = engine.start().unwrap();
            let turn = engine.advance(&mut state, "3 1990").await.unwrap();

            let event = turn.events.last().unwrap();
            assert_eq!(event.text, "Month");
            assert_eq!(event.node_id, NodeId::new("dateOfBirth/month"));
            assert_eq!(
                event.kind,
                EventKind::AskSubdata {
                    variable: "month".into()
                }
            );
        }

        #[tokio::test]
        async fn parts_given_over_several_turns_saturate_the_node() {
            let engine = engine(Queue::new(vec![
                Ok(ParseResult::partial(
                    VariableSet::new().with("year", 1990),
                    ["day", "month"],
                )),
                Ok(ParseResult::partial(
                    VariableSet::new().with("day", 3).with("month", 7),
                    ["year"],
                )),
            ]));
            let mut state = engine.start().unwrap();
            engine.advance(&mut state, "1990").await.unwrap();
            let turn = engine.advance(&mut state, "3 July").await.unwrap();

            assert!(matches!(turn.outcome, TurnOutcome::Transitioned { .. }));
        }

        #[tokio::test]
        async fn unsaturated_success_continues() {
            let engine = engine(Queue::new(vec![Ok(ParseResult::matched(
                VariableSet::new().with("year", 1990),
            ))]));
            let mut state = engine.start().unwrap();
            let turn = engine.advance(&mut state, "1990").await.unwrap();
            assert_eq!(turn.outcome, TurnOutcome::Continued);
            assert!(turn.bot_texts().is_empty());
        }
    }

    mod transition {
        use super::*;

        #[tokio::test]
        async fn saturation_moves_to_successor_and_emits_prompts() {
            let engine = engine(Queue::new(vec![Ok(full_date(1990))]));
            let mut state = engine.start().unwrap();
            let turn = engine.advance(&mut state, "03/07/1990").await.unwrap();

            assert_eq!(
                turn.outcome,
                TurnOutcome::Transitioned {
                    from: NodeId::new("dateOfBirth"),
                    to: NodeId::new("dateOfBirth/year"),
                    terminal: false
                }
            );
            assert_eq!(turn.bot_texts(), vec!["Got it.", "Confirm the year?"]);
            assert_eq!(state.attempts(&NodeId::new("dateOfBirth/year")), 0);
        }

        #[tokio::test]
        async fn missing_successor_goes_to_terminal_node() {
            let engine = engine(Queue::new(vec![
                Ok(full_date(1990)),
                Ok(ParseResult::matched(VariableSet::new().with("year", 1990))),
            ]));
            let mut state = engine.start().unwrap();
            engine.advance(&mut state, "03/07/1990").await.unwrap();
            let turn = engine.advance(&mut state, "yes").await.unwrap();

            assert_eq!(
                turn.outcome,
                TurnOutcome::Transitioned {
                    from: NodeId::new("dateOfBirth/year"),
                    to: NodeId::new(DEFAULT_TERMINAL_NODE),
                    terminal: true
                }
            );
            assert!(engine.is_terminal(&state.current_node_id));
            let err = engine.advance(&mut state, "more").await.unwrap_err();
            assert!(matches!(err, RuntimeError::NoActiveNode { .. }));
        }

        #[tokio::test]
        async fn failing_constraint_clears_values_and_stays() {
            let engine = engine(Queue::new(vec![Ok(full_date(2100))]));
            let mut state = engine.start().unwrap();
            let turn = engine.advance(&mut state, "03/07/2100").await.unwrap();

            assert!(matches!(
                turn.outcome,
                TurnOutcome::ConstraintFailed { attempts: 1, .. }
            ));
            assert_eq!(
                turn.bot_texts(),
                vec!["The date must be in the past. Could you check it?"]
            );
            assert_eq!(state.current_node_id, NodeId::new("dateOfBirth"));
            assert!(state.variables(&NodeId::new("dateOfBirth")).unwrap().is_empty());
        }
    }

    mod falsy_answers {
        use super::*;
        use crate::adapters::RuleBasedParser;

        fn single_node(data_type: &str) -> DialogueEngine {
            let messages = NodeMessages::new()
                .with_escalation("start", ["Your answer?"])
                .with_escalation("success", ["Thanks."]);
            let ddt = DdtAssembler::default()
                .assemble(
                    AssemblyRequest::new(RawNode::new("answer", data_type), messages)
                        .with_ddt_id("single"),
                    &mut SequentialIds::new(),
                )
                .unwrap();
            DialogueEngine::new(
                Arc::new(validate(ddt).unwrap()),
                Arc::new(RuleBasedParser::new()),
                EngineConfig::default(),
            )
        }

        async fn assert_transitions(data_type: &str, input: &str) {
            let engine = single_node(data_type);
            let mut state = engine.start().unwrap();
            let turn = engine.advance(&mut state, input).await.unwrap();

            assert!(
                matches!(turn.outcome, TurnOutcome::Transitioned { terminal: true, .. }),
                "{} {:?} gave {:?}",
                data_type,
                input,
                turn.outcome
            );
            assert_eq!(turn.bot_texts(), vec!["Thanks."]);
        }

        #[tokio::test]
        async fn no_fills_a_yes_no_slot() {
            assert_transitions("yesNo", "no").await;
        }

        #[tokio::test]
        async fn zero_fills_a_number_slot() {
            assert_transitions("number", "0").await;
        }
    }

    #[tokio::test]
    async fn session_of_another_ddt_is_rejected() {
        let engine = engine(Queue::new(vec![]));
        let mut state = engine.start().unwrap();
        state.ddt_id = crate::domain::foundation::DdtId::new("other").unwrap();
        let before = state.clone();
        assert!(engine.advance(&mut state, "x").await.is_err());
        assert_eq!(state, before);
    }
}
