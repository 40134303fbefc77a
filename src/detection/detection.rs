use serde_yaml::Value as YamlValue;

use super::condition::Condition;
use super::selection;
use crate::ast::ConditionNode;
use crate::error::{Result, SigmaError};

/// The compiled `detection` block of a rule: one condition tree per
/// `condition` entry, with selection names resolved.
#[derive(Debug)]
pub struct Detection {
    conditions: Vec<ConditionNode>,
}

impl Detection {
    pub fn new(detection: &YamlValue) -> Result<Self> {
        let invalid = |msg: &str| SigmaError::InvalidDetection(msg.to_string());
        let rules = detection
            .as_mapping()
            .ok_or_else(|| invalid("detection must be a mapping"))?;

        let mut condition = None;
        let mut selections = Vec::new();
        for (key, value) in rules {
            let key = key.as_str().ok_or_else(|| invalid("invalid selection name"))?;
            match key {
                "condition" => condition = Some(value),
                // deprecated, superseded by correlation rules
                "timeframe" => {}
                _ => selections.push((key.to_string(), selection::selection(value)?)),
            }
        }

        let conditions = match condition {
            Some(YamlValue::String(s)) => vec![s.as_str()],
            Some(YamlValue::Sequence(seq)) if !seq.is_empty() => seq
                .iter()
                .map(|c| c.as_str().ok_or_else(|| invalid("condition must be a string")))
                .collect::<Result<Vec<_>>>()?,
            _ => return Err(invalid("missing condition")),
        };

        let conditions = conditions
            .into_iter()
            .map(|c| Condition::new(c)?.resolve(&selections))
            .collect::<Result<Vec<_>>>()?;

        Ok(Detection { conditions })
    }

    pub fn conditions(&self) -> &[ConditionNode] {
        &self.conditions
    }
}
