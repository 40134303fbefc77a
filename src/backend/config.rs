//! Backend configuration: the fixed token tables of the target syntax and
//! the handful of options a caller may set.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ast::{CompareOp, TimespanUnit};

lazy_static! {
    /// Field names matching this pattern are emitted without quoting.
    pub(crate) static ref FIELD_NAME_PATTERN: Regex =
        Regex::new(r"^[\w.]+$").expect("valid regex");
}

/// Token and escaping tables of one target query dialect.
///
/// A dialect is immutable and shared by reference, so several dialects can be
/// used side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub and_token: &'static str,
    pub or_token: &'static str,
    /// Negated disjunction, used for every NOT.
    pub not_token: &'static str,
    pub in_token: &'static str,
    pub regex_token: &'static str,
    pub lt_token: &'static str,
    pub lte_token: &'static str,
    pub gt_token: &'static str,
    pub gte_token: &'static str,
    pub eq_token: &'static str,
    pub true_token: &'static str,
    pub false_token: &'static str,
    pub str_quote: char,
    pub escape_char: char,
    /// Characters escaped inside regular expressions, besides the escape
    /// character and the string quote.
    pub re_special: &'static str,
    pub list_separator: &'static str,
    /// Quote applied to field names outside [`FIELD_NAME_PATTERN`].
    pub field_quote: &'static str,
}

impl Dialect {
    pub const MONGODB: Dialect = Dialect {
        and_token: "$and",
        or_token: "$or",
        not_token: "$nor",
        in_token: "$in",
        regex_token: "$regex",
        lt_token: "$lt",
        lte_token: "$lte",
        gt_token: "$gt",
        gte_token: "$gte",
        eq_token: "$eq",
        true_token: "true",
        false_token: "false",
        str_quote: '"',
        escape_char: '\\',
        re_special: ".?()[]{}+*^$|",
        list_separator: ", ",
        field_quote: "",
    };

    pub fn compare_token(&self, op: CompareOp) -> &'static str {
        match op {
            CompareOp::Lt => self.lt_token,
            CompareOp::Lte => self.lte_token,
            CompareOp::Gt => self.gt_token,
            CompareOp::Gte => self.gte_token,
            CompareOp::Eq => self.eq_token,
        }
    }

    pub fn bool_token(&self, b: bool) -> &'static str {
        if b {
            self.true_token
        } else {
            self.false_token
        }
    }

    /// Unit name understood by `$dateTrunc`.
    pub fn timespan_unit(&self, unit: TimespanUnit) -> &'static str {
        match unit {
            TimespanUnit::Second => "second",
            TimespanUnit::Minute => "minute",
            TimespanUnit::Hour => "hour",
            TimespanUnit::Day => "day",
            TimespanUnit::Week => "week",
            TimespanUnit::Month => "month",
            TimespanUnit::Year => "year",
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::MONGODB
    }
}

/// Caller-facing backend options.
///
/// ```rust
/// # use sigmars_mongodb::BackendOptions;
/// let options: BackendOptions = serde_yaml::from_str("index: logs").unwrap();
/// assert_eq!(options.index, "logs");
/// assert_eq!(options.correlation_method, "aggregate");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BackendOptions {
    /// Collection the queries are meant to run against. Not part of the
    /// query text; carried for the caller.
    pub index: String,
    pub correlation_method: String,
}

impl Default for BackendOptions {
    fn default() -> Self {
        BackendOptions {
            index: "*".to_string(),
            correlation_method: "aggregate".to_string(),
        }
    }
}
