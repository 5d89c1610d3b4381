// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime conditions: named boolean facts and expressions over them.
//!
//! Expressions are parsed once, at configuration time, into an
//! [`Expression`] tree that every event shares through an
//! `Arc<ConditionTable>`. Each event gets its own [`RuntimeConditions`]
//! holding the facts its processors set.
//!
//! # Grammar
//! ```text
//! or      := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | primary
//! primary := fact | "(" or ")"
//! fact    := [A-Za-z0-9_.]+
//! ```
//!
//! `true`, `True`, `false` and `False` are always defined.

use crate::errors::{ConfigError, ContextError};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const BUILTIN_FACTS: [(&str, bool); 4] = [
    ("true", true),
    ("True", true),
    ("false", false),
    ("False", false),
];

/// Parsed boolean expression over named facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Fact(String),
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn parse(text: &str) -> Result<Self, ContextError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser {
            text,
            tokens: &tokens,
            pos: 0,
        };
        let expression = parser.or()?;
        if parser.pos != tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expression)
    }

    /// Evaluate against `facts`.
    ///
    /// Every referenced fact is resolved, so an unset fact is reported even
    /// when the other operand already decides the result.
    pub fn evaluate(&self, facts: &RuntimeConditions) -> Result<bool, ContextError> {
        match self {
            Expression::Fact(name) => facts.fact(name),
            Expression::Not(inner) => Ok(!inner.evaluate(facts)?),
            Expression::And(lhs, rhs) => {
                let lhs = lhs.evaluate(facts)?;
                let rhs = rhs.evaluate(facts)?;
                Ok(lhs && rhs)
            }
            Expression::Or(lhs, rhs) => {
                let lhs = lhs.evaluate(facts)?;
                let rhs = rhs.evaluate(facts)?;
                Ok(lhs || rhs)
            }
        }
    }

    /// Names of all facts referenced by the expression.
    pub fn facts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_facts(&mut out);
        out
    }

    fn collect_facts<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expression::Fact(name) => out.push(name),
            Expression::Not(inner) => inner.collect_facts(out),
            Expression::And(lhs, rhs) | Expression::Or(lhs, rhs) => {
                lhs.collect_facts(out);
                rhs.collect_facts(out);
            }
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Expression::Fact(name) => write!(f, "{}", name),
            Expression::Not(inner) => write!(f, "!{}", inner),
            Expression::And(lhs, rhs) => write!(f, "({} && {})", lhs, rhs),
            Expression::Or(lhs, rhs) => write!(f, "({} || {})", lhs, rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn tokenize(text: &str) -> Result<Vec<Token>, ContextError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '!' => tokens.push(Token::Not),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(ContextError::InvalidExpression {
                        expression: text.to_string(),
                        reason: format!("single '{}' at offset {}", c, start),
                    });
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if is_ident_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some((idx, next)) = chars.next_if(|&(_, next)| is_ident_char(next)) {
                    end = idx + next.len_utf8();
                }
                tokens.push(Token::Ident(text[start..end].to_string()));
            }
            other => {
                return Err(ContextError::InvalidExpression {
                    expression: text.to_string(),
                    reason: format!("unexpected character '{}' at offset {}", other, start),
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    text: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: &str) -> ContextError {
        ContextError::InvalidExpression {
            expression: self.text.to_string(),
            reason: format!("{} at token {}", reason, self.pos),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.tokens.get(self.pos) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Expression, ContextError> {
        let mut lhs = self.and()?;
        while self.eat(&Token::Or) {
            let rhs = self.and()?;
            lhs = Expression::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expression, ContextError> {
        let mut lhs = self.unary()?;
        while self.eat(&Token::And) {
            let rhs = self.unary()?;
            lhs = Expression::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expression, ContextError> {
        if self.eat(&Token::Not) {
            return Ok(Expression::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expression, ContextError> {
        match self.tokens.get(self.pos) {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(Expression::Fact(name.clone()))
            }
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.or()?;
                if !self.eat(&Token::Close) {
                    return Err(self.error("missing ')'"));
                }
                Ok(inner)
            }
            Some(_) => Err(self.error("expected a fact name or '('")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

/// Configuration-time table mapping a processor name to its guard expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionTable {
    conditions: IndexMap<String, Expression>,
}

impl ConditionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `expression` and register it as the guard of `name`.
    pub fn add(&mut self, name: &str, expression: &str) -> Result<(), ConfigError> {
        let parsed = Expression::parse(expression).map_err(|e| ConfigError::InvalidCondition {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.conditions.insert(name.to_string(), parsed);
        Ok(())
    }

    pub fn from_entries<'a, I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut table = Self::new();
        for (name, expression) in entries {
            table.add(name, expression)?;
        }
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Option<&Expression> {
        self.conditions.get(name)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// The facts set while processing one event.
#[derive(Debug, Clone)]
pub struct RuntimeConditions {
    table: Arc<ConditionTable>,
    facts: HashMap<String, bool>,
}

impl RuntimeConditions {
    pub fn new(table: Arc<ConditionTable>) -> Self {
        let facts = BUILTIN_FACTS
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        Self { table, facts }
    }

    pub fn set_fact(&mut self, owner: &str, value: bool) {
        self.facts.insert(owner.to_string(), value);
    }

    pub fn set_named_fact(&mut self, owner: &str, name: &str, value: bool) {
        self.facts.insert(format!("{}.{}", owner, name), value);
    }

    pub fn fact(&self, name: &str) -> Result<bool, ContextError> {
        self.facts
            .get(name)
            .copied()
            .ok_or_else(|| ContextError::UnsetFact {
                name: name.to_string(),
            })
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.facts.contains_key(name)
    }

    /// Parse and evaluate an ad-hoc expression.
    pub fn evaluate(&self, expression: &str) -> Result<bool, ContextError> {
        Expression::parse(expression)?.evaluate(self)
    }

    /// Whether the guard registered for `processor` holds. Unguarded processors always run.
    pub fn condition_is_true(&self, processor: &str) -> Result<bool, ContextError> {
        match self.table.get(processor) {
            Some(expression) => expression.evaluate(self),
            None => Ok(true),
        }
    }

    /// Facts set so far, excluding the built-in constants, sorted by name.
    pub fn facts(&self) -> Vec<(&str, bool)> {
        let mut out: Vec<(&str, bool)> = self
            .facts
            .iter()
            .filter(|(name, _)| {
                !BUILTIN_FACTS
                    .iter()
                    .any(|(builtin, _)| *builtin == name.as_str())
            })
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        out.sort();
        out
    }
}
