pub mod expression_based;

pub use expression_based::*;

use crate::model::{Feature, ScorerResult};

pub trait Scorer: Send + Sync {
    /// Returns the rules that fired for the given raw features
    fn score(&self, features: &[Feature]) -> Vec<ScorerResult>;
}
