use std::str::FromStr;

use log::warn;
use serde::Deserialize;

use super::rule::SigmaRule;
use crate::error::{Result, SigmaError};

/// An ordered set of Sigma rules, as read from one or more YAML documents.
#[derive(Debug, Default)]
pub struct SigmaCollection {
    rules: Vec<SigmaRule>,
}

impl SigmaCollection {
    /// Loads every `*.yml` file below `path`.
    ///
    /// Files that cannot be read or parsed are logged and skipped. Returns
    /// the number of rules added.
    pub fn load_ruleset(&mut self, path: &str) -> Result<usize> {
        let rules = glob::glob(format!("{}/**/*.yml", path).as_str())?
            .filter_map(std::result::Result::ok)
            .filter_map(|entry| {
                std::fs::read_to_string(&entry)
                    .map_err(|e| {
                        warn!("error reading file: {} ({})", entry.to_string_lossy(), e);
                        e
                    })
                    .ok()
                    .and_then(|s| {
                        s.parse::<SigmaCollection>()
                            .map_err(|e| {
                                warn!("error parsing rule: {} ({})", entry.to_string_lossy(), e);
                                e
                            })
                            .ok()
                    })
            })
            .flat_map(|collection| collection.rules)
            .collect::<Vec<_>>();

        let additions = rules.len();
        self.rules.extend(rules);
        Ok(additions)
    }

    pub fn add(&mut self, rule: SigmaRule) {
        self.rules.push(rule);
    }

    pub fn extend(&mut self, other: SigmaCollection) {
        self.rules.extend(other.rules);
    }

    /// Looks a rule up by id or name.
    pub fn get(&self, reference: &str) -> Option<&SigmaRule> {
        self.rules.iter().find(|rule| rule.is_referenced_by(reference))
    }

    pub fn rules(&self) -> &[SigmaRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromStr for SigmaCollection {
    type Err = SigmaError;

    /// Parses a stream of `---` separated rule documents.
    fn from_str(s: &str) -> Result<Self> {
        let rules = serde_yaml::Deserializer::from_str(s)
            .map(SigmaRule::deserialize)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(SigmaCollection { rules })
    }
}
