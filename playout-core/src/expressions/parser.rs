//! Recursive-descent parser and tree-walking evaluator.
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparison and `like`,
//! `+ -`, `* / %`, unary minus, then literals, variables and parentheses.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::RegexBuilder;

use super::lexer::{Token, tokenize};
use super::{ExpressionError, Result, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Like,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Var(String),
    Negate(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// Variable bindings for one evaluation.
pub type Scope = HashMap<&'static str, Value>;

pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ExpressionError::UnexpectedToken(format!("{token:?}"))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Expr> {
        let mut left = self.and()?;
        while self.eat(&Token::Or) {
            let right = self.and()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut left = self.not()?;
        while self.eat(&Token::And) {
            let right = self.not()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let left = self.additive()?;
        let op = match self.peek() {
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::Ne) => BinaryOp::Ne,
            Some(Token::Like) => BinaryOp::Like,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.additive()?;
        Ok(Expr::Binary(op, Box::new(left), Box::new(right)))
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Negate(Box::new(self.unary()?)));
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Text(text)) => Ok(Expr::Text(text)),
            Some(Token::Ident(name)) => match name.to_ascii_lowercase().as_str() {
                "true" => Ok(Expr::Number(1.0)),
                "false" => Ok(Expr::Number(0.0)),
                _ => Ok(Expr::Var(name)),
            },
            Some(Token::LParen) => {
                let inner = self.or()?;
                if self.eat(&Token::RParen) {
                    Ok(inner)
                } else {
                    Err(ExpressionError::UnexpectedEnd)
                }
            }
            Some(token) => Err(ExpressionError::UnexpectedToken(format!("{token:?}"))),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }
}

impl Expr {
    pub fn evaluate(&self, scope: &Scope) -> Result<Value> {
        match self {
            Expr::Number(value) => Ok(Value::Number(*value)),
            Expr::Text(text) => Ok(Value::Text(text.clone())),
            Expr::Var(name) => scope
                .get(name.as_str())
                .or_else(|| scope.get(name.to_ascii_lowercase().as_str()))
                .cloned()
                .ok_or_else(|| ExpressionError::UnknownVariable(name.clone())),
            Expr::Negate(inner) => Ok(Value::Number(-inner.evaluate(scope)?.as_number()?)),
            Expr::Not(inner) => Ok(Value::Bool(!inner.evaluate(scope)?.is_truthy())),
            Expr::Binary(BinaryOp::And, left, right) => Ok(Value::Bool(
                left.evaluate(scope)?.is_truthy() && right.evaluate(scope)?.is_truthy(),
            )),
            Expr::Binary(BinaryOp::Or, left, right) => Ok(Value::Bool(
                left.evaluate(scope)?.is_truthy() || right.evaluate(scope)?.is_truthy(),
            )),
            Expr::Binary(op, left, right) => {
                binary(*op, left.evaluate(scope)?, right.evaluate(scope)?)
            }
        }
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    match op {
        BinaryOp::Add => match (&left, &right) {
            (Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{a}{b}"))),
            _ => Ok(Value::Number(left.as_number()? + right.as_number()?)),
        },
        BinaryOp::Sub => Ok(Value::Number(left.as_number()? - right.as_number()?)),
        BinaryOp::Mul => Ok(Value::Number(left.as_number()? * right.as_number()?)),
        BinaryOp::Div | BinaryOp::Rem => {
            let divisor = right.as_number()?;
            if divisor == 0.0 {
                return Err(ExpressionError::DivisionByZero);
            }
            let dividend = left.as_number()?;
            Ok(Value::Number(if op == BinaryOp::Div {
                dividend / divisor
            } else {
                dividend % divisor
            }))
        }
        BinaryOp::Like => {
            let pattern = regex::escape(&right.to_text())
                .replace('%', ".*")
                .replace('_', ".");
            let regex = RegexBuilder::new(&format!("^{pattern}$"))
                .case_insensitive(true)
                .build()?;
            Ok(Value::Bool(regex.is_match(&left.to_text())))
        }
        BinaryOp::Eq => Ok(Value::Bool(compare(&left, &right)? == Ordering::Equal)),
        BinaryOp::Ne => Ok(Value::Bool(compare(&left, &right)? != Ordering::Equal)),
        BinaryOp::Lt => Ok(Value::Bool(compare(&left, &right)? == Ordering::Less)),
        BinaryOp::Le => Ok(Value::Bool(compare(&left, &right)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(compare(&left, &right)? == Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(compare(&left, &right)? != Ordering::Less)),
        BinaryOp::And | BinaryOp::Or => Ok(Value::Bool(match op {
            BinaryOp::And => left.is_truthy() && right.is_truthy(),
            _ => left.is_truthy() || right.is_truthy(),
        })),
    }
}

fn compare(left: &Value, right: &Value) -> Result<Ordering> {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => Ok(a.to_lowercase().cmp(&b.to_lowercase())),
        _ => {
            let (a, b) = (left.as_number()?, right.as_number()?);
            a.partial_cmp(&b)
                .ok_or_else(|| ExpressionError::TypeMismatch("NaN comparison".to_string()))
        }
    }
}
