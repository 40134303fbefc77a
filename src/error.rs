use thiserror::Error;

/// Errors raised while loading Sigma rules or converting them to MongoDB queries.
#[derive(Debug, Error)]
pub enum SigmaError {
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid condition: {0}")]
    Condition(String),

    #[error("invalid detection: {0}")]
    InvalidDetection(String),

    #[error("invalid modifier: {0}")]
    InvalidModifier(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("invalid correlation rule: {0}")]
    InvalidCorrelation(String),

    #[error("invalid timespan: {0}")]
    InvalidTimespan(String),

    #[error("unknown rule reference: {0}")]
    UnknownRuleRef(String),

    /// A construct the MongoDB backend cannot express.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid field name: {0:?}")]
    InvalidFieldName(String),

    #[error("invalid expansion: {0}")]
    InvalidExpansion(String),

    #[error("empty {0} group")]
    EmptyGroup(&'static str),

    #[error("invalid backend option: {0}")]
    InvalidOption(String),

    #[error("glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, SigmaError>;
