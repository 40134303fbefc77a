use std::collections::HashMap;

use serde::{self, de, Deserialize, Serialize};

use crate::correlation::Correlation;
use crate::detection::DetectionRule;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSource {
    pub category: Option<String>,
    pub product: Option<String>,
    pub service: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Stable,
    Test,
    Experimental,
    Deprecated,
    Unsupported,
}

#[derive(Debug)]
pub enum RuleType {
    Detection(DetectionRule),
    Correlation(Correlation),
}

/// A Sigma detection or correlation rule.
#[derive(Debug)]
pub struct SigmaRule {
    pub title: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub references: Option<Vec<String>>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub modified: Option<String>,
    pub status: Option<Status>,
    pub license: Option<String>,
    pub tags: Option<Vec<String>>,
    pub falsepositives: Option<Vec<String>>,
    pub level: Option<String>,
    pub rule: RuleType,
}

impl SigmaRule {
    /// The name correlations use for this rule: `name`, falling back to `id`.
    pub fn identifier(&self) -> Option<&str> {
        self.name.as_deref().or(self.id.as_deref())
    }

    /// Whether `reference` names this rule by id or by name.
    pub fn is_referenced_by(&self, reference: &str) -> bool {
        self.id.as_deref() == Some(reference) || self.name.as_deref() == Some(reference)
    }
}

impl<'de> Deserialize<'de> for SigmaRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RuleWrapper {
            title: String,
            id: Option<String>,
            name: Option<String>,
            description: Option<String>,
            references: Option<Vec<String>>,
            author: Option<String>,
            date: Option<String>,
            modified: Option<String>,
            status: Option<Status>,
            license: Option<String>,
            tags: Option<Vec<String>>,
            falsepositives: Option<Vec<String>>,
            level: Option<String>,
            logsource: Option<LogSource>,
            detection: Option<serde_yaml::Value>,
            correlation: Option<Correlation>,
        }

        let rule = RuleWrapper::deserialize(deserializer)?;

        let rule_type = match (rule.detection, rule.correlation) {
            (Some(detection), None) => {
                let logsource = rule
                    .logsource
                    .ok_or_else(|| <D::Error as de::Error>::missing_field("logsource"))?;
                RuleType::Detection(
                    DetectionRule::new(logsource, detection)
                        .map_err(<D::Error as de::Error>::custom)?,
                )
            }
            (None, Some(correlation)) => RuleType::Correlation(correlation),
            (Some(_), Some(_)) => {
                return Err(<D::Error as de::Error>::custom(format!(
                    "rule {:?} has both a detection and a correlation",
                    rule.title
                )))
            }
            (None, None) => {
                return Err(<D::Error as de::Error>::custom(format!(
                    "rule {:?} has neither a detection nor a correlation",
                    rule.title
                )))
            }
        };

        Ok(SigmaRule {
            title: rule.title,
            id: rule.id,
            name: rule.name,
            description: rule.description,
            references: rule.references,
            author: rule.author,
            date: rule.date,
            modified: rule.modified,
            status: rule.status,
            license: rule.license,
            tags: rule.tags,
            falsepositives: rule.falsepositives,
            level: rule.level,
            rule: rule_type,
        })
    }
}
