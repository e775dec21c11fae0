//! PEP 508 environment markers as a small algebra.
//!
//! The exporter never evaluates a marker against a concrete interpreter; it
//! only needs to combine markers coming from different dependency edges, test
//! them against the requested extras, and print them back out. Everything
//! else stays symbolic.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::names::canonicalize_name;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MarkerTree {
    /// Matches every environment.
    #[default]
    Any,
    /// Matches no environment.
    Empty,
    Expression(MarkerExpression),
    And(Vec<MarkerTree>),
    Or(Vec<MarkerTree>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MarkerExpression {
    pub variable: String,
    pub operator: MarkerOperator,
    pub value: String,
    /// `"value" op variable` form, kept so the marker prints as written.
    pub reversed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerOperator {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Compatible,
    Arbitrary,
    In,
    NotIn,
}

impl MarkerOperator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterEqual => ">=",
            Self::Compatible => "~=",
            Self::Arbitrary => "===",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::LessThan,
            "<=" => Self::LessEqual,
            ">" => Self::GreaterThan,
            ">=" => Self::GreaterEqual,
            "~=" => Self::Compatible,
            "===" => Self::Arbitrary,
            _ => return None,
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid marker `{input}`: {reason}")]
pub struct MarkerParseError {
    pub input: String,
    pub reason: String,
}

impl MarkerExpression {
    pub fn new(variable: &str, operator: MarkerOperator, value: &str) -> Self {
        let value = if variable == "extra" {
            canonicalize_name(value)
        } else {
            value.to_string()
        };
        Self {
            variable: variable.to_string(),
            operator,
            value,
            reversed: false,
        }
    }

    fn is_extra(&self) -> bool {
        self.variable == "extra"
    }

    fn evaluate_extras(&self, extras: &BTreeSet<String>) -> Option<bool> {
        if !self.is_extra() || self.reversed {
            return None;
        }
        match self.operator {
            MarkerOperator::Equal => Some(extras.contains(&self.value)),
            MarkerOperator::NotEqual => Some(!extras.contains(&self.value)),
            _ => None,
        }
    }
}

impl fmt::Display for MarkerExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reversed {
            write!(
                f,
                "\"{}\" {} {}",
                self.value,
                self.operator.as_str(),
                self.variable
            )
        } else {
            write!(
                f,
                "{} {} \"{}\"",
                self.variable,
                self.operator.as_str(),
                self.value
            )
        }
    }
}

impl MarkerTree {
    pub fn expression(variable: &str, operator: MarkerOperator, value: &str) -> Self {
        Self::Expression(MarkerExpression::new(variable, operator, value))
    }

    /// Parses a marker, treating blank input as [`MarkerTree::Any`].
    pub fn parse(input: &str) -> Result<Self, MarkerParseError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Ok(Self::Any);
        }
        let mut parser = Parser {
            input,
            tokens,
            pos: 0,
        };
        let tree = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(tree)
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn intersect(&self, other: &MarkerTree) -> MarkerTree {
        let mut parts: Vec<MarkerTree> = Vec::new();
        for tree in [self, other] {
            match tree {
                Self::Any => {}
                Self::Empty => return Self::Empty,
                Self::And(items) => {
                    for item in items {
                        push_unique(&mut parts, item);
                    }
                }
                other => push_unique(&mut parts, other),
            }
        }
        collapse(absorb(parts, disjuncts), Self::Any, Self::And)
    }

    #[must_use]
    pub fn union(&self, other: &MarkerTree) -> MarkerTree {
        let mut parts: Vec<MarkerTree> = Vec::new();
        for tree in [self, other] {
            match tree {
                Self::Empty => {}
                Self::Any => return Self::Any,
                Self::Or(items) => {
                    for item in items {
                        push_unique(&mut parts, item);
                    }
                }
                other => push_unique(&mut parts, other),
            }
        }
        collapse(absorb(parts, conjuncts), Self::Empty, Self::Or)
    }

    /// Partially evaluates the marker knowing only the active extras.
    ///
    /// Returns `None` when the outcome depends on anything else.
    pub fn evaluate_extras(&self, extras: &BTreeSet<String>) -> Option<bool> {
        match self {
            Self::Any => Some(true),
            Self::Empty => Some(false),
            Self::Expression(expr) => expr.evaluate_extras(extras),
            Self::And(items) => {
                let mut all_true = true;
                for item in items {
                    match item.evaluate_extras(extras) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => all_true = false,
                    }
                }
                all_true.then_some(true)
            }
            Self::Or(items) => {
                let mut all_false = true;
                for item in items {
                    match item.evaluate_extras(extras) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => all_false = false,
                    }
                }
                all_false.then_some(false)
            }
        }
    }

    /// False only when the extras alone rule the marker out.
    pub fn validate_extras(&self, extras: &BTreeSet<String>) -> bool {
        self.evaluate_extras(extras) != Some(false)
    }

    #[must_use]
    pub fn without_extras(&self) -> MarkerTree {
        match self {
            Self::Expression(expr) if expr.is_extra() => Self::Any,
            Self::And(items) => items
                .iter()
                .fold(Self::Any, |acc, item| acc.intersect(&item.without_extras())),
            Self::Or(items) => items
                .iter()
                .fold(Self::Empty, |acc, item| acc.union(&item.without_extras())),
            other => other.clone(),
        }
    }
}

fn push_unique(parts: &mut Vec<MarkerTree>, item: &MarkerTree) {
    if !parts.contains(item) {
        parts.push(item.clone());
    }
}

/// Drops every term whose members include all members of another term, so
/// `a or (a and b)` is `a` and `a and (a or b)` is `a`.
fn absorb(
    parts: Vec<MarkerTree>,
    members: fn(&MarkerTree) -> &[MarkerTree],
) -> Vec<MarkerTree> {
    let keep: Vec<bool> = parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let own = members(part);
            !parts.iter().enumerate().any(|(other_index, other)| {
                if other_index == index {
                    return false;
                }
                let theirs = members(other);
                theirs.iter().all(|member| own.contains(member))
                    && (theirs.len() < own.len() || other_index < index)
            })
        })
        .collect();
    parts
        .into_iter()
        .zip(keep)
        .filter_map(|(part, keep)| keep.then_some(part))
        .collect()
}

fn conjuncts(tree: &MarkerTree) -> &[MarkerTree] {
    match tree {
        MarkerTree::And(items) => items,
        other => std::slice::from_ref(other),
    }
}

fn disjuncts(tree: &MarkerTree) -> &[MarkerTree] {
    match tree {
        MarkerTree::Or(items) => items,
        other => std::slice::from_ref(other),
    }
}

fn collapse(
    mut parts: Vec<MarkerTree>,
    identity: MarkerTree,
    build: fn(Vec<MarkerTree>) -> MarkerTree,
) -> MarkerTree {
    match parts.len() {
        0 => identity,
        1 => parts.remove(0),
        _ => build(parts),
    }
}

impl FromStr for MarkerTree {
    type Err = MarkerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MarkerTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => Ok(()),
            Self::Empty => f.write_str("<empty>"),
            Self::Expression(expr) => expr.fmt(f),
            Self::And(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" and ")?;
                    }
                    if matches!(item, Self::Or(_)) {
                        write!(f, "({item})")?;
                    } else {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Or(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Ident(String),
    Str(String),
    Op(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, MarkerParseError> {
    let error = |reason: &str| MarkerParseError {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut idx = 0;
    while idx < chars.len() {
        let ch = chars[idx];
        match ch {
            c if c.is_whitespace() => idx += 1,
            '(' => {
                tokens.push(Token::Open);
                idx += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                idx += 1;
            }
            '"' | '\'' => {
                let start = idx + 1;
                let end = chars[start..]
                    .iter()
                    .position(|c| *c == ch)
                    .map(|offset| start + offset)
                    .ok_or_else(|| error("unterminated string"))?;
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                idx = end + 1;
            }
            '<' | '>' | '=' | '!' | '~' => {
                let start = idx;
                while idx < chars.len() && matches!(chars[idx], '<' | '>' | '=' | '!' | '~') {
                    idx += 1;
                }
                let symbol: String = chars[start..idx].iter().collect();
                if MarkerOperator::from_symbol(&symbol).is_none() {
                    return Err(error(&format!("unknown operator `{symbol}`")));
                }
                tokens.push(Token::Op(symbol));
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                let start = idx;
                while idx < chars.len()
                    && (chars[idx].is_ascii_alphanumeric() || matches!(chars[idx], '_' | '.'))
                {
                    idx += 1;
                }
                tokens.push(Token::Ident(chars[start..idx].iter().collect()));
            }
            other => return Err(error(&format!("unexpected character `{other}`"))),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> MarkerParseError {
        MarkerParseError {
            input: self.input.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Ident(word)) if word == keyword)
    }

    fn parse_or(&mut self) -> Result<MarkerTree, MarkerParseError> {
        let mut tree = self.parse_and()?;
        while self.peek_keyword("or") {
            self.pos += 1;
            let rhs = self.parse_and()?;
            tree = tree.union(&rhs);
        }
        Ok(tree)
    }

    fn parse_and(&mut self) -> Result<MarkerTree, MarkerParseError> {
        let mut tree = self.parse_atom()?;
        while self.peek_keyword("and") {
            self.pos += 1;
            let rhs = self.parse_atom()?;
            tree = tree.intersect(&rhs);
        }
        Ok(tree)
    }

    fn parse_atom(&mut self) -> Result<MarkerTree, MarkerParseError> {
        if matches!(self.tokens.get(self.pos), Some(Token::Open)) {
            self.pos += 1;
            let inner = self.parse_or()?;
            if !matches!(self.tokens.get(self.pos), Some(Token::Close)) {
                return Err(self.error("missing closing parenthesis"));
            }
            self.pos += 1;
            return Ok(inner);
        }
        let lhs = self.next_operand()?;
        let operator = self.next_operator()?;
        let rhs = self.next_operand()?;
        match (lhs, rhs) {
            (Token::Ident(variable), Token::Str(value)) => {
                Ok(MarkerTree::expression(&variable, operator, &value))
            }
            (Token::Str(value), Token::Ident(variable)) => {
                let mut expr = MarkerExpression::new(&variable, operator, &value);
                expr.reversed = true;
                Ok(MarkerTree::Expression(expr))
            }
            _ => Err(self.error("expressions must compare a variable with a quoted string")),
        }
    }

    fn next_operand(&mut self) -> Result<Token, MarkerParseError> {
        match self.tokens.get(self.pos) {
            Some(token @ (Token::Ident(_) | Token::Str(_))) => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error("expected a marker variable or string")),
        }
    }

    fn next_operator(&mut self) -> Result<MarkerOperator, MarkerParseError> {
        let operator = match self.tokens.get(self.pos) {
            Some(Token::Op(symbol)) => MarkerOperator::from_symbol(symbol),
            Some(Token::Ident(word)) if word == "in" => Some(MarkerOperator::In),
            Some(Token::Ident(word)) if word == "not" => {
                if matches!(self.tokens.get(self.pos + 1), Some(Token::Ident(next)) if next == "in")
                {
                    self.pos += 1;
                    Some(MarkerOperator::NotIn)
                } else {
                    None
                }
            }
            _ => None,
        };
        let operator = operator.ok_or_else(|| self.error("expected a comparison operator"))?;
        self.pos += 1;
        Ok(operator)
    }
}
