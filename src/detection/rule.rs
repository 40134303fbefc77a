use super::detection::Detection;
use crate::ast::ConditionNode;
use crate::error::Result;
use crate::rule::LogSource;

#[derive(Debug)]
pub struct DetectionRule {
    /// The log source information for the detection rule.
    pub logsource: LogSource,
    pub detection: serde_yaml::Value,
    compiled: Detection,
}

impl DetectionRule {
    /// Compiles the `detection` block into condition trees.
    pub fn new(logsource: LogSource, detection: serde_yaml::Value) -> Result<Self> {
        let compiled = Detection::new(&detection)?;
        Ok(DetectionRule {
            logsource,
            detection,
            compiled,
        })
    }

    pub fn conditions(&self) -> &[ConditionNode] {
        self.compiled.conditions()
    }
}
