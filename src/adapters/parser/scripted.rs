//! Scripted Input Parser for testing.
//!
//! Provides a configurable implementation of the InputParser port, so
//! dialogue flows can be exercised without a real NLU collaborator.
//!
//! # Features
//!
//! - Results keyed by exact input text
//! - Queued results consumed in order
//! - Simulated delays for timeout testing
//! - Error injection
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let parser = ScriptedParser::new()
//!     .on("1990", ParseResult::partial(VariableSet::new().with("year", 1990), ["day", "month"]))
//!     .with_delay(Duration::from_millis(100));
//!
//! let result = parser.parse_input("1990", "date").await?;
//! assert!(result.is_partial());
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{InputParser, ParseResult, ParserError};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCall {
    pub text: String,
    pub expected_type: String,
}

type Scripted = Result<ParseResult, ParserError>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parser that answers from a script.
///
/// Lookup order: a result registered for the exact input text, then the
/// next queued result, then a no-match.
#[derive(Debug, Clone, Default)]
pub struct ScriptedParser {
    by_text: Arc<Mutex<HashMap<String, Scripted>>>,
    queue: Arc<Mutex<VecDeque<Scripted>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<ParseCall>>>,
}

impl ScriptedParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `result` whenever the input is exactly `text`.
    pub fn on(self, text: impl Into<String>, result: ParseResult) -> Self {
        lock(&self.by_text).insert(text.into(), Ok(result));
        self
    }

    /// Adds a result to the queue.
    pub fn with_result(self, result: ParseResult) -> Self {
        lock(&self.queue).push_back(Ok(result));
        self
    }

    /// Adds an error to the queue.
    pub fn with_error(self, error: ParserError) -> Self {
        lock(&self.queue).push_back(Err(error));
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this parser.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<ParseCall> {
        lock(&self.calls).clone()
    }

    fn next(&self, text: &str) -> Scripted {
        if let Some(result) = lock(&self.by_text).get(text) {
            return result.clone();
        }
        lock(&self.queue)
            .pop_front()
            .unwrap_or_else(|| Ok(ParseResult::no_match("no scripted result")))
    }
}

#[async_trait]
impl InputParser for ScriptedParser {
    async fn parse_input(&self, text: &str, expected_type: &str) -> Result<ParseResult, ParserError> {
        lock(&self.calls).push(ParseCall {
            text: text.to_string(),
            expected_type: expected_type.to_string(),
        });

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.next(text)
    }
}
