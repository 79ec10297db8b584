pub mod random_forest;

pub use random_forest::*;

use crate::{errors::PredictionError, model::ClassLabel};

/// A pre-trained binary classifier over a fixed-width numeric vector.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
pub trait Classifier: Send + Sync {
    /// Width of the vector the classifier was trained on
    fn n_features(&self) -> usize;

    /// Column names in training order, when the artifact carries them
    fn feature_names(&self) -> Option<Vec<String>>;

    /// `[p0, p1]`, summing to 1
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], PredictionError>;
}

impl ClassLabel {
    /// Argmax over `[p0, p1]`; a tie resolves to the first class.
    pub fn from_probabilities(probabilities: [f64; 2]) -> Self {
        if probabilities[1] > probabilities[0] {
            ClassLabel::Rto
        } else {
            ClassLabel::NotRto
        }
    }
}

pub fn predict<C: Classifier + ?Sized>(
    classifier: &C,
    features: &[f64],
) -> Result<ClassLabel, PredictionError> {
    classifier
        .predict_proba(features)
        .map(ClassLabel::from_probabilities)
}
