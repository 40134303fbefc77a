mod rule;

pub use rule::{Correlation, CorrelationCondition, CorrelationType};
