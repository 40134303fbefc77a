//! Condition trees and correlation specifications consumed by the backend.
//!
//! Everything here is built once per rule (by the YAML front-end or by a
//! caller) and only read during conversion.

use std::fmt;
use std::str::FromStr;

use serde_json::Number;

use crate::error::{Result, SigmaError};

/// Where the `*` markers of a string value sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardShape {
    /// `*text*`
    Contains,
    /// `*text`
    EndsWith,
    /// `text*`
    StartsWith,
    /// `text`
    Equals,
}

/// A string value as written in a rule, with wildcard markers left in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigmaString {
    text: String,
    wildcards: bool,
}

impl SigmaString {
    /// Wraps `text`, treating `*` and `?` as wildcards.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let wildcards = text.contains('*') || text.contains('?');
        SigmaString { text, wildcards }
    }

    /// Wraps `text` as a literal: a leading or trailing `*` is matched as is.
    pub fn raw(text: impl Into<String>) -> Self {
        SigmaString {
            text: text.into(),
            wildcards: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn has_wildcards(&self) -> bool {
        self.wildcards
    }

    /// Only the leading and trailing `*` are considered.
    pub fn shape(&self) -> WildcardShape {
        if !self.wildcards {
            return WildcardShape::Equals;
        }
        match (self.text.starts_with('*'), self.text.ends_with('*')) {
            (true, true) => WildcardShape::Contains,
            (true, false) => WildcardShape::EndsWith,
            (false, true) => WildcardShape::StartsWith,
            (false, false) => WildcardShape::Equals,
        }
    }

    /// The text with the markers that determine [`shape`](Self::shape) removed.
    pub fn unwrapped(&self) -> &str {
        match self.shape() {
            WildcardShape::Contains => {
                let inner = &self.text[1..];
                inner.strip_suffix('*').unwrap_or(inner)
            }
            WildcardShape::EndsWith => &self.text[1..],
            WildcardShape::StartsWith => &self.text[..self.text.len() - 1],
            WildcardShape::Equals => &self.text,
        }
    }
}

impl fmt::Display for SigmaString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The value side of a field condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(SigmaString),
    Bool(bool),
    Number(Number),
    Regex(String),
    List(Vec<Value>),
    /// Alternatives produced by placeholder expansion.
    Expansion(Vec<Value>),
    /// Name of another field whose value must be equal.
    FieldRef(String),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(SigmaString::new(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(SigmaString::new(s))
    }
}

impl From<SigmaString> for Value {
    fn from(s: SigmaString) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

/// Numeric comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Lte,
    Gt,
    Gte,
    /// Only produced by correlation conditions.
    Eq,
}

/// A terminal condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// `field == value`; without a field this is a keyword search.
    FieldEquals { field: Option<String>, value: Value },
    Compare {
        field: String,
        op: CompareOp,
        value: Number,
    },
    Null { field: String },
    Exists { field: String, exists: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    And(Vec<ConditionNode>),
    Or(Vec<ConditionNode>),
    Not(Box<ConditionNode>),
    Leaf(Leaf),
}

impl ConditionNode {
    /// Builds an AND group, rejecting an empty child list.
    pub fn and(children: Vec<ConditionNode>) -> Result<Self> {
        if children.is_empty() {
            return Err(SigmaError::EmptyGroup("AND"));
        }
        Ok(ConditionNode::And(children))
    }

    /// Builds an OR group, rejecting an empty child list.
    pub fn or(children: Vec<ConditionNode>) -> Result<Self> {
        if children.is_empty() {
            return Err(SigmaError::EmptyGroup("OR"));
        }
        Ok(ConditionNode::Or(children))
    }

    pub fn not(child: ConditionNode) -> Self {
        ConditionNode::Not(Box::new(child))
    }

    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        ConditionNode::Leaf(Leaf::FieldEquals {
            field: Some(field.into()),
            value: value.into(),
        })
    }

    pub fn keyword(value: impl Into<Value>) -> Self {
        ConditionNode::Leaf(Leaf::FieldEquals {
            field: None,
            value: value.into(),
        })
    }

    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Number>) -> Self {
        ConditionNode::Leaf(Leaf::Compare {
            field: field.into(),
            op,
            value: value.into(),
        })
    }

    pub fn null(field: impl Into<String>) -> Self {
        ConditionNode::Leaf(Leaf::Null {
            field: field.into(),
        })
    }

    pub fn exists(field: impl Into<String>, exists: bool) -> Self {
        ConditionNode::Leaf(Leaf::Exists {
            field: field.into(),
            exists,
        })
    }
}

// =============================================================================
// Correlations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimespanUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimespanUnit {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(TimespanUnit::Second),
            'm' => Some(TimespanUnit::Minute),
            'h' => Some(TimespanUnit::Hour),
            'd' => Some(TimespanUnit::Day),
            'w' => Some(TimespanUnit::Week),
            'M' => Some(TimespanUnit::Month),
            'y' => Some(TimespanUnit::Year),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            TimespanUnit::Second => 's',
            TimespanUnit::Minute => 'm',
            TimespanUnit::Hour => 'h',
            TimespanUnit::Day => 'd',
            TimespanUnit::Week => 'w',
            TimespanUnit::Month => 'M',
            TimespanUnit::Year => 'y',
        }
    }
}

/// A correlation window such as `10m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timespan {
    pub count: u64,
    pub unit: TimespanUnit,
}

impl FromStr for Timespan {
    type Err = SigmaError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SigmaError::InvalidTimespan(s.to_string());
        let unit_char = s.chars().last().ok_or_else(invalid)?;
        let unit = TimespanUnit::from_char(unit_char).ok_or_else(invalid)?;
        let count = s[..s.len() - unit_char.len_utf8()]
            .parse::<u64>()
            .map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }
        Ok(Timespan { count, unit })
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.as_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationKind {
    EventCount,
    /// Counts distinct values of the named field.
    ValueCount(String),
    Temporal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    pub op: CompareOp,
    pub count: u64,
}

/// An already converted query of a rule taking part in a correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleQuery {
    pub id: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationSpec {
    pub kind: CorrelationKind,
    pub timespan: Timespan,
    pub group_by: Option<Vec<String>>,
    pub threshold: Threshold,
    pub rules: Vec<RuleQuery>,
}
