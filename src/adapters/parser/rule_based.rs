//! Rule-based Input Parser Adapter
//!
//! Regex extraction for the common slot types. Good enough for the CLI
//! simulator and local previews; production deployments plug a real NLU
//! collaborator into the same port.
//!
//! | expected type      | variables                                  |
//! |--------------------|--------------------------------------------|
//! | `date`             | `day`, `month`, `year`, `value` (ISO date) |
//! | `number`           | `value`                                    |
//! | `email`            | `value`                                    |
//! | `yesNo`, `boolean` | `value` (bool)                             |
//! | anything else      | `value` (trimmed text)                     |

use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use crate::domain::runtime::VariableSet;
use crate::ports::{InputParser, ParseResult, ParserError};

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("ISO date pattern is valid"));

static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})(?:[/.\-](\d{4}))?\b").expect("numeric date pattern is valid")
});

static MONTH_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(january|jan|february|feb|march|mar|april|apr|may|june|jun|july|jul|august|aug|september|sept|sep|october|oct|november|nov|december|dec)\b",
    )
    .expect("month name pattern is valid")
});

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(1[89]\d{2}|2\d{3})\b").expect("year pattern is valid"));

static DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?:st|nd|rd|th)?\b").expect("day pattern is valid"));

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:[.,]\d+)?").expect("number pattern is valid"));

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^@\s]+@[^@\s]+\.[^@\s]+").expect("email pattern is valid"));

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct DateParts {
    day: Option<u32>,
    month: Option<u32>,
    year: Option<i32>,
}

impl DateParts {
    fn is_empty(&self) -> bool {
        self.day.is_none() && self.month.is_none() && self.year.is_none()
    }

    fn in_range(&self) -> bool {
        self.day.map_or(true, |d| (1..=31).contains(&d))
            && self.month.map_or(true, |m| (1..=12).contains(&m))
    }
}

fn capture<T: std::str::FromStr>(caps: &regex::Captures<'_>, index: usize) -> Option<T> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

fn date_parts(text: &str) -> DateParts {
    if let Some(caps) = ISO_DATE.captures(text) {
        return DateParts {
            year: capture(&caps, 1),
            month: capture(&caps, 2),
            day: capture(&caps, 3),
        };
    }
    if let Some(caps) = NUMERIC_DATE.captures(text) {
        return DateParts {
            day: capture(&caps, 1),
            month: capture(&caps, 2),
            year: capture(&caps, 3),
        };
    }

    // Free text: pick each part independently
    let year_match = YEAR.find(text);
    let month_match = MONTH_NAME.find(text);
    let day = DAY
        .captures_iter(text)
        .filter(|caps| caps.get(0).map(|m| m.start()) != year_match.map(|m| m.start()))
        .find_map(|caps| capture::<u32>(&caps, 1).filter(|d| (1..=31).contains(d)));
    DateParts {
        day,
        month: month_match.and_then(|m| month_number(m.as_str())),
        year: year_match.and_then(|m| m.as_str().parse().ok()),
    }
}

fn parse_date(text: &str) -> ParseResult {
    let parts = date_parts(text);
    if parts.is_empty() {
        return ParseResult::no_match("no date found");
    }
    if !parts.in_range() {
        return ParseResult::no_match("day or month out of range");
    }

    let mut variables = VariableSet::new();
    let mut missing = Vec::new();
    match parts.day {
        Some(day) => variables.insert("day", day),
        None => missing.push("day"),
    }
    match parts.month {
        Some(month) => variables.insert("month", month),
        None => missing.push("month"),
    }
    match parts.year {
        Some(year) => variables.insert("year", year),
        None => missing.push("year"),
    }

    if !missing.is_empty() {
        return ParseResult::partial(variables, missing);
    }

    match (parts.year, parts.month, parts.day) {
        (Some(year), Some(month), Some(day)) => match NaiveDate::from_ymd_opt(year, month, day) {
            Some(date) => {
                variables.insert("value", date.format("%Y-%m-%d").to_string());
                ParseResult::matched(variables)
            }
            None => ParseResult::no_match("not a calendar date"),
        },
        _ => ParseResult::no_match("incomplete date"),
    }
}

fn parse_number(text: &str) -> ParseResult {
    let Some(found) = NUMBER.find(text) else {
        return ParseResult::no_match("no number found");
    };
    let literal = found.as_str().replace(',', ".");
    let value = match literal.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => match literal.parse::<f64>().ok().and_then(Number::from_f64) {
            Some(n) => Value::Number(n),
            None => return ParseResult::no_match("unreadable number"),
        },
    };
    ParseResult::matched(VariableSet::new().with("value", value))
}

fn parse_email(text: &str) -> ParseResult {
    match EMAIL.find(text) {
        Some(found) => ParseResult::matched(VariableSet::new().with("value", found.as_str())),
        None => ParseResult::no_match("no e-mail address found"),
    }
}

fn parse_yes_no(text: &str) -> ParseResult {
    let answer = match text.trim().to_lowercase().as_str() {
        "yes" | "y" | "yeah" | "yep" | "sure" | "ok" | "okay" | "correct" | "true" => true,
        "no" | "n" | "nope" | "wrong" | "false" => false,
        _ => return ParseResult::no_match("expected yes or no"),
    };
    ParseResult::matched(VariableSet::new().with("value", answer))
}

/// Regex-based parser for `date`, `number`, `email`, `yesNo` and text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedParser;

impl RuleBasedParser {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous form of [`InputParser::parse_input`].
    pub fn parse(&self, text: &str, expected_type: &str) -> ParseResult {
        match expected_type {
            "date" => parse_date(text),
            "number" | "integer" => parse_number(text),
            "email" => parse_email(text),
            "yesNo" | "boolean" => parse_yes_no(text),
            _ => ParseResult::matched(VariableSet::new().with("value", text.trim())),
        }
    }
}

#[async_trait]
impl InputParser for RuleBasedParser {
    async fn parse_input(&self, text: &str, expected_type: &str) -> Result<ParseResult, ParserError> {
        let result = self.parse(text, expected_type);
        tracing::debug!(
            expected_type,
            success = result.success,
            missing = result.missing_subdata.len(),
            "Rule-based parse"
        );
        Ok(result)
    }
}
