//! Validation script language.
//!
//! A script is a single-parameter arrow predicate such as
//! `value => date(value) < today()` or `(v) => len(trim(v)) > 0`.
//! Scripts are parsed and type checked statically; evaluation is pure and
//! any evaluation error is reported as an error, which callers map to
//! "constraint not satisfied".

use chrono::NaiveDate;
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while},
    character::complete::{anychar, char, digit1, multispace0, none_of, satisfy},
    combinator::{all_consuming, cut, map, map_res, not, opt, recognize, value, verify},
    error::{context, ErrorKind, VerboseError, VerboseErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::Timestamp;

/// Errors raised while checking or evaluating a validation script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PredicateError {
    #[error("expected {expected}, found {found}")]
    Syntax { expected: String, found: String },

    #[error("expected exactly one parameter, found {0}")]
    ParameterCount(usize),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("function '{name}' takes {expected} argument(s), got {found}")]
    FunctionArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// Built-in functions available to scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Date,
    Today,
    Number,
    Str,
    Trim,
    Lower,
    Len,
    Matches,
    IsNumber,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "date" => Func::Date,
            "today" => Func::Today,
            "number" => Func::Number,
            "str" => Func::Str,
            "trim" => Func::Trim,
            "lower" => Func::Lower,
            "len" => Func::Len,
            "matches" => Func::Matches,
            "isNumber" => Func::IsNumber,
            _ => return None,
        })
    }

    fn arity(&self) -> usize {
        match self {
            Func::Today => 0,
            Func::Matches => 2,
            _ => 1,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Func::Date => "date",
            Func::Today => "today",
            Func::Number => "number",
            Func::Str => "str",
            Func::Trim => "trim",
            Func::Lower => "lower",
            Func::Len => "len",
            Func::Matches => "matches",
            Func::IsNumber => "isNumber",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
}

#[derive(Debug, Clone)]
enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Param,
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Length(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
    Matches(Box<Expr>, Regex),
}

/// Untyped tree produced by the grammar, before names are resolved.
#[derive(Debug, Clone, PartialEq)]
enum Syntax {
    Number(f64),
    Str(String),
    Ident(String),
    Call(String, Vec<Syntax>),
    Not(Box<Syntax>),
    Neg(Box<Syntax>),
    Length(Box<Syntax>),
    Binary(BinOp, Box<Syntax>, Box<Syntax>),
}

// =============================================================================
// Grammar
// =============================================================================

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn sym<'a>(symbol: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    preceded(multispace0, tag(symbol))
}

/// `!` that does not start `!=`.
fn bang(input: &str) -> Res<'_, char> {
    preceded(multispace0, terminated(char('!'), not(char('='))))(input)
}

fn identifier(input: &str) -> Res<'_, String> {
    preceded(
        multispace0,
        map(
            recognize(pair(
                satisfy(|c| c.is_alphabetic() || c == '_' || c == '$'),
                take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
            )),
            String::from,
        ),
    )(input)
}

fn number(input: &str) -> Res<'_, f64> {
    preceded(
        multispace0,
        map_res(
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            |literal: &str| literal.parse::<f64>(),
        ),
    )(input)
}

/// Quoted text; a backslash takes the next character literally.
fn quoted<'a>(quote: char, special: &'static str) -> impl FnMut(&'a str) -> Res<'a, String> {
    preceded(
        char(quote),
        cut(terminated(
            map(
                opt(escaped_transform(none_of(special), '\\', anychar)),
                Option::unwrap_or_default,
            ),
            context("closing quote", char(quote)),
        )),
    )
}

fn string_literal(input: &str) -> Res<'_, String> {
    preceded(
        multispace0,
        alt((quoted('"', "\\\""), quoted('\'', "\\'"))),
    )(input)
}

fn closing_paren(input: &str) -> Res<'_, &str> {
    context("')'", sym(")"))(input)
}

fn arguments(input: &str) -> Res<'_, Vec<Syntax>> {
    preceded(
        sym("("),
        cut(terminated(separated_list0(sym(","), expression), closing_paren)),
    )(input)
}

fn primary(input: &str) -> Res<'_, Syntax> {
    context(
        "expression",
        alt((
            map(number, Syntax::Number),
            map(string_literal, Syntax::Str),
            preceded(sym("("), cut(terminated(expression, closing_paren))),
            map(pair(identifier, opt(arguments)), |(name, args)| match args {
                Some(args) => Syntax::Call(name, args),
                None => Syntax::Ident(name),
            }),
        )),
    )(input)
}

fn postfix(input: &str) -> Res<'_, Syntax> {
    let (input, base) = primary(input)?;
    let (input, lengths) = many0(preceded(
        sym("."),
        cut(context(
            "'length'",
            verify(identifier, |name: &str| name == "length"),
        )),
    ))(input)?;
    let expr = lengths
        .into_iter()
        .fold(base, |expr, _| Syntax::Length(Box::new(expr)));
    Ok((input, expr))
}

fn unary(input: &str) -> Res<'_, Syntax> {
    alt((
        map(preceded(bang, cut(unary)), |expr| Syntax::Not(Box::new(expr))),
        map(preceded(sym("-"), cut(unary)), |expr| Syntax::Neg(Box::new(expr))),
        postfix,
    ))(input)
}

fn fold_binary(first: Syntax, rest: Vec<(BinOp, Syntax)>) -> Syntax {
    rest.into_iter().fold(first, |lhs, (op, rhs)| {
        Syntax::Binary(op, Box::new(lhs), Box::new(rhs))
    })
}

fn additive(input: &str) -> Res<'_, Syntax> {
    let operator = alt((value(BinOp::Add, sym("+")), value(BinOp::Sub, sym("-"))));
    map(pair(unary, many0(pair(operator, cut(unary)))), |(first, rest)| {
        fold_binary(first, rest)
    })(input)
}

fn comparison_operator(input: &str) -> Res<'_, BinOp> {
    alt((
        value(BinOp::Eq, alt((sym("==="), sym("==")))),
        value(BinOp::NotEq, alt((sym("!=="), sym("!=")))),
        value(BinOp::Le, sym("<=")),
        value(BinOp::Ge, sym(">=")),
        value(BinOp::Lt, sym("<")),
        value(BinOp::Gt, sym(">")),
    ))(input)
}

/// Comparisons do not chain.
fn comparison(input: &str) -> Res<'_, Syntax> {
    map(
        pair(additive, opt(pair(comparison_operator, cut(additive)))),
        |(lhs, rhs)| match rhs {
            Some((op, rhs)) => Syntax::Binary(op, Box::new(lhs), Box::new(rhs)),
            None => lhs,
        },
    )(input)
}

fn conjunction(input: &str) -> Res<'_, Syntax> {
    map(
        pair(comparison, many0(pair(value(BinOp::And, sym("&&")), cut(comparison)))),
        |(first, rest)| fold_binary(first, rest),
    )(input)
}

fn expression(input: &str) -> Res<'_, Syntax> {
    map(
        pair(conjunction, many0(pair(value(BinOp::Or, sym("||")), cut(conjunction)))),
        |(first, rest)| fold_binary(first, rest),
    )(input)
}

/// `name` or `(a, b, ...)`.
fn parameters(input: &str) -> Res<'_, Vec<String>> {
    alt((
        map(identifier, |name| vec![name]),
        delimited(
            sym("("),
            separated_list0(sym(","), identifier),
            cut(closing_paren),
        ),
    ))(input)
}

fn script(input: &str) -> Res<'_, (Vec<String>, Syntax)> {
    all_consuming(terminated(
        pair(
            context("parameter list", parameters),
            preceded(cut(context("'=>'", sym("=>"))), cut(expression)),
        ),
        multispace0,
    ))(input)
}

fn syntax_error(err: nom::Err<VerboseError<&str>>) -> PredicateError {
    let errors = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.errors,
        nom::Err::Incomplete(_) => Vec::new(),
    };
    let expected = errors
        .iter()
        .find_map(|(_, kind)| match kind {
            VerboseErrorKind::Context(label) => Some(label.to_string()),
            _ => None,
        })
        .or_else(|| {
            errors.iter().find_map(|(_, kind)| match kind {
                VerboseErrorKind::Char(c) => Some(format!("'{}'", c)),
                VerboseErrorKind::Nom(ErrorKind::Eof) => Some("end of script".to_string()),
                _ => None,
            })
        })
        .unwrap_or_else(|| "expression".to_string());
    let found = match errors.first().map(|(rest, _)| rest.trim_start()) {
        Some(rest) if !rest.is_empty() => format!("'{}'", rest.chars().take(12).collect::<String>()),
        _ => "end of script".to_string(),
    };
    PredicateError::Syntax { expected, found }
}

// =============================================================================
// Name resolution
// =============================================================================

fn resolve(syntax: Syntax, param: &str) -> Result<Expr, PredicateError> {
    let boxed = |inner: Box<Syntax>| resolve(*inner, param).map(Box::new);
    Ok(match syntax {
        Syntax::Number(n) => Expr::Number(n),
        Syntax::Str(s) => Expr::Str(s),
        Syntax::Ident(name) => match name.as_str() {
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            "null" => Expr::Null,
            _ if name == param => Expr::Param,
            _ => return Err(PredicateError::UnknownIdentifier(name)),
        },
        Syntax::Not(inner) => Expr::Not(boxed(inner)?),
        Syntax::Neg(inner) => Expr::Neg(boxed(inner)?),
        Syntax::Length(inner) => Expr::Length(boxed(inner)?),
        Syntax::Binary(op, lhs, rhs) => Expr::Binary(op, boxed(lhs)?, boxed(rhs)?),
        Syntax::Call(name, args) => resolve_call(name, args, param)?,
    })
}

fn resolve_call(name: String, args: Vec<Syntax>, param: &str) -> Result<Expr, PredicateError> {
    let Some(func) = Func::lookup(&name) else {
        return Err(PredicateError::UnknownIdentifier(name));
    };
    if args.len() != func.arity() {
        return Err(PredicateError::FunctionArity {
            name: func.name().to_string(),
            expected: func.arity(),
            found: args.len(),
        });
    }

    if func == Func::Matches {
        let mut args = args.into_iter();
        let (Some(subject), Some(Syntax::Str(pattern))) = (args.next(), args.next()) else {
            return Err(PredicateError::Type(
                "matches() needs a string literal pattern".into(),
            ));
        };
        let regex =
            Regex::new(&pattern).map_err(|e| PredicateError::InvalidRegex(e.to_string()))?;
        return Ok(Expr::Matches(Box::new(resolve(subject, param)?), regex));
    }

    let args = args
        .into_iter()
        .map(|arg| resolve(arg, param))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expr::Call(func, args))
}

/// Static type of an expression. `Any` is the unknown parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ty {
    Any,
    Null,
    Bool,
    Number,
    Text,
    Date,
}

fn expect_ty(found: Ty, allowed: &[Ty], context: &str) -> Result<(), PredicateError> {
    if found == Ty::Any || allowed.contains(&found) {
        Ok(())
    } else {
        Err(PredicateError::Type(format!(
            "{} does not accept {:?}",
            context, found
        )))
    }
}

fn type_of(expr: &Expr) -> Result<Ty, PredicateError> {
    Ok(match expr {
        Expr::Null => Ty::Null,
        Expr::Bool(_) => Ty::Bool,
        Expr::Number(_) => Ty::Number,
        Expr::Str(_) => Ty::Text,
        Expr::Param => Ty::Any,
        Expr::Not(inner) => {
            expect_ty(type_of(inner)?, &[Ty::Bool], "'!'")?;
            Ty::Bool
        }
        Expr::Neg(inner) => {
            expect_ty(type_of(inner)?, &[Ty::Number], "unary '-'")?;
            Ty::Number
        }
        Expr::Length(inner) => {
            expect_ty(type_of(inner)?, &[Ty::Text], "'.length'")?;
            Ty::Number
        }
        Expr::Matches(subject, _) => {
            type_of(subject)?;
            Ty::Bool
        }
        Expr::Call(func, args) => {
            for arg in args {
                type_of(arg)?;
            }
            match func {
                Func::Date | Func::Today => Ty::Date,
                Func::Number | Func::Len => Ty::Number,
                Func::Str | Func::Trim | Func::Lower => Ty::Text,
                Func::IsNumber | Func::Matches => Ty::Bool,
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let (l, r) = (type_of(lhs)?, type_of(rhs)?);
            match op {
                BinOp::And | BinOp::Or => {
                    expect_ty(l, &[Ty::Bool], "'&&'/'||'")?;
                    expect_ty(r, &[Ty::Bool], "'&&'/'||'")?;
                    Ty::Bool
                }
                BinOp::Eq | BinOp::NotEq => Ty::Bool,
                BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                    let ordered = [Ty::Number, Ty::Text, Ty::Date];
                    expect_ty(l, &ordered, "comparison")?;
                    expect_ty(r, &ordered, "comparison")?;
                    if l != Ty::Any && r != Ty::Any && l != r {
                        return Err(PredicateError::Type(format!(
                            "cannot compare {:?} with {:?}",
                            l, r
                        )));
                    }
                    Ty::Bool
                }
                BinOp::Add => match (l, r) {
                    (Ty::Number, Ty::Number) => Ty::Number,
                    (Ty::Text, Ty::Text) => Ty::Text,
                    (Ty::Any, _) | (_, Ty::Any) => Ty::Any,
                    _ => {
                        return Err(PredicateError::Type(format!(
                            "cannot add {:?} and {:?}",
                            l, r
                        )))
                    }
                },
                BinOp::Sub => {
                    expect_ty(l, &[Ty::Number], "'-'")?;
                    expect_ty(r, &[Ty::Number], "'-'")?;
                    Ty::Number
                }
            }
        }
    })
}

/// Ambient values a predicate may read.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    pub today: NaiveDate,
}

impl EvalContext {
    pub fn at(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            today: Timestamp::now().date(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Val {
    Null,
    Bool(bool),
    Num(f64),
    Text(String),
    Date(NaiveDate),
}

fn eval_err(message: impl Into<String>) -> PredicateError {
    PredicateError::Evaluation(message.into())
}

impl Val {
    fn from_json(value: &Value) -> Result<Self, PredicateError> {
        match value {
            Value::Null => Ok(Val::Null),
            Value::Bool(b) => Ok(Val::Bool(*b)),
            Value::Number(n) => n
                .as_f64()
                .map(Val::Num)
                .ok_or_else(|| eval_err("number out of range")),
            Value::String(s) => Ok(Val::Text(s.clone())),
            other => Err(eval_err(format!("unsupported input {}", other))),
        }
    }

    fn as_bool(&self) -> Result<bool, PredicateError> {
        match self {
            Val::Bool(b) => Ok(*b),
            other => Err(eval_err(format!("expected boolean, got {:?}", other))),
        }
    }

    fn as_num(&self) -> Result<f64, PredicateError> {
        match self {
            Val::Num(n) => Ok(*n),
            Val::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| eval_err(format!("'{}' is not a number", s))),
            other => Err(eval_err(format!("expected number, got {:?}", other))),
        }
    }

    fn to_text(&self) -> String {
        match self {
            Val::Null => String::new(),
            Val::Bool(b) => b.to_string(),
            Val::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Val::Num(n) => n.to_string(),
            Val::Text(s) => s.clone(),
            Val::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    fn as_date(&self) -> Result<NaiveDate, PredicateError> {
        match self {
            Val::Date(d) => Ok(*d),
            Val::Text(s) => {
                let head = s.trim().get(..10).unwrap_or(s.trim());
                NaiveDate::parse_from_str(head, "%Y-%m-%d")
                    .map_err(|_| eval_err(format!("'{}' is not a date", s)))
            }
            other => Err(eval_err(format!("expected date, got {:?}", other))),
        }
    }
}

fn compare(op: BinOp, l: &Val, r: &Val) -> Result<bool, PredicateError> {
    use std::cmp::Ordering;
    let ordering: Ordering = match (l, r) {
        (Val::Num(a), Val::Num(b)) => a
            .partial_cmp(b)
            .ok_or_else(|| eval_err("cannot order NaN"))?,
        (Val::Text(a), Val::Text(b)) => a.cmp(b),
        (Val::Date(a), Val::Date(b)) => a.cmp(b),
        (a, b) => return Err(eval_err(format!("cannot compare {:?} with {:?}", a, b))),
    };
    Ok(match op {
        BinOp::Lt => ordering.is_lt(),
        BinOp::Le => ordering.is_le(),
        BinOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    })
}

fn eval(expr: &Expr, input: &Val, ctx: &EvalContext) -> Result<Val, PredicateError> {
    Ok(match expr {
        Expr::Null => Val::Null,
        Expr::Bool(b) => Val::Bool(*b),
        Expr::Number(n) => Val::Num(*n),
        Expr::Str(s) => Val::Text(s.clone()),
        Expr::Param => input.clone(),
        Expr::Not(inner) => Val::Bool(!eval(inner, input, ctx)?.as_bool()?),
        Expr::Neg(inner) => Val::Num(-eval(inner, input, ctx)?.as_num()?),
        Expr::Length(inner) => match eval(inner, input, ctx)? {
            Val::Text(s) => Val::Num(s.chars().count() as f64),
            other => return Err(eval_err(format!("{:?} has no length", other))),
        },
        Expr::Matches(subject, regex) => {
            Val::Bool(regex.is_match(&eval(subject, input, ctx)?.to_text()))
        }
        Expr::Call(func, args) => {
            let arg = match args.first() {
                Some(a) => eval(a, input, ctx)?,
                None => Val::Null,
            };
            match func {
                Func::Today => Val::Date(ctx.today),
                Func::Date => Val::Date(arg.as_date()?),
                Func::Number => Val::Num(arg.as_num()?),
                Func::Str => Val::Text(arg.to_text()),
                Func::Trim => Val::Text(arg.to_text().trim().to_string()),
                Func::Lower => Val::Text(arg.to_text().to_lowercase()),
                Func::Len => match arg {
                    Val::Text(s) => Val::Num(s.chars().count() as f64),
                    other => return Err(eval_err(format!("{:?} has no length", other))),
                },
                Func::IsNumber => Val::Bool(matches!(arg, Val::Num(_)) || arg.as_num().is_ok()),
                Func::Matches => return Err(eval_err("matches() without pattern")),
            }
        }
        Expr::Binary(op, lhs, rhs) => match op {
            BinOp::And => {
                Val::Bool(eval(lhs, input, ctx)?.as_bool()? && eval(rhs, input, ctx)?.as_bool()?)
            }
            BinOp::Or => {
                Val::Bool(eval(lhs, input, ctx)?.as_bool()? || eval(rhs, input, ctx)?.as_bool()?)
            }
            _ => {
                let (l, r) = (eval(lhs, input, ctx)?, eval(rhs, input, ctx)?);
                match op {
                    BinOp::Eq => Val::Bool(l == r),
                    BinOp::NotEq => Val::Bool(l != r),
                    BinOp::Add => match (l, r) {
                        (Val::Num(a), Val::Num(b)) => Val::Num(a + b),
                        (Val::Text(a), b) => Val::Text(a + &b.to_text()),
                        (a, Val::Text(b)) => Val::Text(a.to_text() + &b),
                        (a, b) => return Err(eval_err(format!("cannot add {:?} and {:?}", a, b))),
                    },
                    BinOp::Sub => Val::Num(l.as_num()? - r.as_num()?),
                    _ => Val::Bool(compare(*op, &l, &r)?),
                }
            }
        },
    })
}

/// A checked validation script.
#[derive(Debug, Clone)]
pub struct Predicate {
    param: String,
    body: Expr,
}

impl Predicate {
    /// Name of the single parameter.
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Evaluates the predicate on one value.
    pub fn evaluate(&self, value: &Value, ctx: &EvalContext) -> Result<bool, PredicateError> {
        let input = Val::from_json(value)?;
        eval(&self.body, &input, ctx)?.as_bool()
    }

    /// Evaluates the predicate, treating any evaluation error as `false`.
    pub fn holds(&self, value: &Value, ctx: &EvalContext) -> bool {
        match self.evaluate(value, ctx) {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(error = %err, "Validation script failed; treating as unsatisfied");
                false
            }
        }
    }
}

/// Parses and statically checks a validation script.
///
/// The script must declare exactly one parameter, reference only that
/// parameter and known functions, and produce a boolean.
pub fn check_script(source: &str) -> Result<Predicate, PredicateError> {
    let (_, (params, body)) = script(source).map_err(syntax_error)?;
    let [param]: [String; 1] = params
        .try_into()
        .map_err(|params: Vec<String>| PredicateError::ParameterCount(params.len()))?;
    let body = resolve(body, &param)?;

    match type_of(&body)? {
        Ty::Bool => Ok(Predicate { param, body }),
        other => Err(PredicateError::Type(format!(
            "script must return a boolean, returns {:?}",
            other
        ))),
    }
}
