mod condition;
mod rule;
mod selection;

pub(crate) mod detection;

pub use rule::DetectionRule;
