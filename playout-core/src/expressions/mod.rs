//! The two small expression languages attached to schedule rules: count
//! expressions on `Multiple` rules and filler expressions on mid-roll
//! presets. Both share one grammar.

use thiserror::Error;

pub mod count;
pub mod filler;
pub mod lexer;
pub mod parser;

pub use count::evaluate_count;
pub use filler::filter_chapters;
pub use parser::{Expr, Scope, parse};

#[derive(Error, Debug)]
pub enum ExpressionError {
    #[error("Unexpected character '{0}' at {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Unterminated string starting at {0}")]
    UnterminatedString(usize),

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("Unexpected token {0}")]
    UnexpectedToken(String),

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid like pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, ExpressionError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(value) => *value != 0.0,
            Value::Text(text) => !text.is_empty(),
            Value::Bool(value) => *value,
        }
    }

    pub fn as_number(&self) -> Result<f64> {
        match self {
            Value::Number(value) => Ok(*value),
            Value::Bool(value) => Ok(if *value { 1.0 } else { 0.0 }),
            Value::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| ExpressionError::TypeMismatch(format!("'{text}' is not a number"))),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Value::Number(value) => value.to_string(),
            Value::Text(text) => text.clone(),
            Value::Bool(value) => value.to_string(),
        }
    }
}

/// Parses and evaluates `input` against `scope` in one step.
pub fn evaluate(input: &str, scope: &Scope) -> Result<Value> {
    parse(input)?.evaluate(scope)
}
