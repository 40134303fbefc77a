//! The MongoDB backend: condition trees to query documents, correlations to
//! aggregation pipelines.
//!
//! ```rust
//! use sigmars_mongodb::{ConditionNode, MongoDbBackend};
//!
//! let backend = MongoDbBackend::new();
//! let query = backend
//!     .translate(&ConditionNode::field_equals("Image", "*iexplore.exe"))
//!     .unwrap();
//! assert_eq!(query, r#"{ "Image": { "$regex": "iexplore\\.exe$" } }"#);
//! ```

mod condition;
mod config;
mod correlation;
mod escape;
mod leaf;
pub mod template;
mod value;

use std::collections::HashSet;

use log::debug;

pub use config::{BackendOptions, Dialect};

use crate::ast::{AggregationSpec, RuleQuery};
use crate::collection::SigmaCollection;
use crate::correlation::Correlation;
use crate::error::{Result, SigmaError};
use crate::rule::{RuleType, SigmaRule};

#[derive(Debug, Clone)]
pub struct MongoDbBackend {
    dialect: Dialect,
    options: BackendOptions,
}

impl MongoDbBackend {
    pub fn new() -> Self {
        MongoDbBackend::with_dialect(Dialect::MONGODB)
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        MongoDbBackend {
            dialect,
            options: BackendOptions::default(),
        }
    }

    /// Creates a backend from caller options, rejecting unknown correlation
    /// methods.
    pub fn with_options(options: BackendOptions) -> Result<Self> {
        if options.correlation_method != "aggregate" {
            return Err(SigmaError::InvalidOption(format!(
                "unknown correlation method {:?}",
                options.correlation_method
            )));
        }
        Ok(MongoDbBackend {
            dialect: Dialect::MONGODB,
            options,
        })
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn options(&self) -> &BackendOptions {
        &self.options
    }

    /// Converts every rule of `collection`, in order.
    ///
    /// Rules referenced by a correlation that does not set `generate` are
    /// only used inside that correlation's pipeline.
    pub fn convert(&self, collection: &SigmaCollection) -> Result<Vec<String>> {
        let suppressed = collection
            .rules()
            .iter()
            .filter_map(|rule| match &rule.rule {
                RuleType::Correlation(correlation) if !correlation.generate => {
                    Some(correlation.rules.iter().map(String::as_str))
                }
                _ => None,
            })
            .flatten()
            .collect::<HashSet<&str>>();

        let mut queries = Vec::new();
        for rule in collection.rules() {
            if suppressed.iter().any(|reference| rule.is_referenced_by(reference)) {
                debug!("skipping rule {:?}, only used by correlations", rule.title);
                continue;
            }
            queries.extend(self.convert_rule(rule, collection)?);
        }
        Ok(queries)
    }

    /// Converts one rule: a query per detection condition, or a single
    /// pipeline for a correlation, whose referenced rules are looked up in
    /// `collection`.
    pub fn convert_rule(&self, rule: &SigmaRule, collection: &SigmaCollection) -> Result<Vec<String>> {
        debug!("converting rule {:?}", rule.title);
        match &rule.rule {
            RuleType::Detection(detection) => detection
                .conditions()
                .iter()
                .map(|condition| self.translate(condition))
                .collect(),
            RuleType::Correlation(correlation) => {
                let spec = self.aggregation_spec(correlation, collection)?;
                Ok(vec![self.pipeline(&self.compile(&spec)?)])
            }
        }
    }

    /// Resolves and converts the rules a correlation refers to.
    pub fn aggregation_spec(
        &self,
        correlation: &Correlation,
        collection: &SigmaCollection,
    ) -> Result<AggregationSpec> {
        let rules = correlation
            .rules
            .iter()
            .map(|reference| {
                let rule = collection
                    .get(reference)
                    .ok_or_else(|| SigmaError::UnknownRuleRef(reference.clone()))?;
                let RuleType::Detection(detection) = &rule.rule else {
                    return Err(SigmaError::Unsupported(format!(
                        "correlation over correlation rule {:?}",
                        reference
                    )));
                };
                let query = match detection.conditions() {
                    [condition] => self.translate(condition)?,
                    _ => {
                        return Err(SigmaError::Unsupported(format!(
                            "correlation over rule {:?} with several conditions",
                            reference
                        )))
                    }
                };
                Ok(RuleQuery {
                    id: rule.identifier().unwrap_or(reference.as_str()).to_string(),
                    query,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (kind, threshold) = correlation.kind()?;
        Ok(AggregationSpec {
            kind,
            timespan: correlation.timespan,
            group_by: correlation.group_by(),
            threshold,
            rules,
        })
    }
}

impl Default for MongoDbBackend {
    fn default() -> Self {
        MongoDbBackend::new()
    }
}
