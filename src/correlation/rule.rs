use serde::{de, Deserialize, Deserializer};
use std::fmt;

use crate::ast::{CompareOp, CorrelationKind, Threshold, Timespan};
use crate::error::{Result, SigmaError};

/// The `condition` block of a correlation: an optional field and exactly one
/// comparison.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorrelationCondition {
    pub field: Option<String>,
    pub gt: Option<u64>,
    pub gte: Option<u64>,
    pub lt: Option<u64>,
    pub lte: Option<u64>,
    pub eq: Option<u64>,
}

impl CorrelationCondition {
    pub fn threshold(&self) -> Result<Threshold> {
        let thresholds = [
            (CompareOp::Gt, self.gt),
            (CompareOp::Gte, self.gte),
            (CompareOp::Lt, self.lt),
            (CompareOp::Lte, self.lte),
            (CompareOp::Eq, self.eq),
        ]
        .into_iter()
        .filter_map(|(op, count)| count.map(|count| Threshold { op, count }))
        .collect::<Vec<_>>();

        match thresholds.as_slice() {
            [threshold] => Ok(*threshold),
            [] => Err(SigmaError::InvalidCorrelation(
                "condition without comparison".to_string(),
            )),
            _ => Err(SigmaError::InvalidCorrelation(
                "condition with more than one comparison".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CorrelationType {
    EventCount {
        condition: CorrelationCondition,
    },
    ValueCount {
        condition: CorrelationCondition,
    },
    Temporal {
        #[serde(default)]
        condition: Option<CorrelationCondition>,
    },
    TemporalOrdered {
        #[serde(default)]
        condition: Option<CorrelationCondition>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Correlation {
    #[serde(flatten)]
    pub correlation_type: CorrelationType,
    /// Referenced rules, by name or id.
    pub rules: Vec<String>,
    #[serde(deserialize_with = "deserialize_timespan")]
    pub timespan: Timespan,
    #[serde(default)]
    pub group_by: Option<Vec<String>>,
    /// Whether the referenced rules are also converted on their own.
    #[serde(default)]
    pub generate: bool,
}

impl Correlation {
    /// Aggregation kind and threshold of this correlation.
    ///
    /// A temporal correlation without condition requires all referenced
    /// rules to match.
    pub fn kind(&self) -> Result<(CorrelationKind, Threshold)> {
        match &self.correlation_type {
            CorrelationType::EventCount { condition } => {
                Ok((CorrelationKind::EventCount, condition.threshold()?))
            }
            CorrelationType::ValueCount { condition } => {
                let field = condition.field.clone().ok_or_else(|| {
                    SigmaError::InvalidCorrelation(
                        "value_count condition requires a field".to_string(),
                    )
                })?;
                Ok((CorrelationKind::ValueCount(field), condition.threshold()?))
            }
            CorrelationType::Temporal { condition } => {
                let threshold = match condition {
                    Some(condition) => condition.threshold()?,
                    None => Threshold {
                        op: CompareOp::Gte,
                        count: self.rules.len() as u64,
                    },
                };
                Ok((CorrelationKind::Temporal, threshold))
            }
            CorrelationType::TemporalOrdered { .. } => Err(SigmaError::Unsupported(
                "temporal_ordered correlation".to_string(),
            )),
        }
    }

    /// Group-by fields, `None` when absent or empty.
    pub fn group_by(&self) -> Option<Vec<String>> {
        self.group_by.clone().filter(|fields| !fields.is_empty())
    }
}

struct TimespanVisitor;

impl<'de> de::Visitor<'de> for TimespanVisitor {
    type Value = Timespan;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(
            "a string representing a timespan as a number followed by a unit (s, m, h, d, w, M, y)",
        )
    }

    fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        value.parse::<Timespan>().map_err(de::Error::custom)
    }
}

fn deserialize_timespan<'de, D>(deserializer: D) -> std::result::Result<Timespan, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_str(TimespanVisitor)
}
