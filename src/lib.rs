//! [`Sigma`] rule conversion to MongoDB
//!
//! Converts the detection logic of Sigma rules into MongoDB query
//! documents, and correlation rules into aggregation pipelines.
//!
//! ```rust
//! use sigmars_mongodb::{MongoDbBackend, SigmaCollection};
//!
//! let collection: SigmaCollection = r#"
//! title: Whoami
//! logsource:
//!     category: process_creation
//! detection:
//!     selection:
//!         CommandLine|contains: whoami
//!     condition: selection
//! "#
//! .parse()
//! .unwrap();
//!
//! let queries = MongoDbBackend::new().convert(&collection).unwrap();
//! assert_eq!(queries, vec![r#"{ "CommandLine": { "$regex": "whoami" } }"#]);
//! ```
//!
//! [`Sigma`]: https://sigmahq.io/
//!
mod collection;
mod detection;

pub mod ast;
pub mod backend;
pub mod correlation;
pub mod error;
pub mod rule;

pub use ast::{AggregationSpec, CompareOp, ConditionNode, Leaf, SigmaString, Value};
pub use backend::{BackendOptions, Dialect, MongoDbBackend};
pub use collection::SigmaCollection;
pub use detection::DetectionRule;
pub use error::{Result, SigmaError};
pub use rule::SigmaRule;

#[cfg(test)]
mod tests;
