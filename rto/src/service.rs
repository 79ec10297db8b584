use common::config::Config;
use processing::{
    classifier::RandomForestClassifier,
    errors::{ArtifactLoadError, PredictionError},
    predictor::Predictor,
    scaling::ScalingStatistics,
};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::{
    encoder::{CategoryPolicy, RtoEncoder},
    model::RawOrderRecord,
    risk::{RiskFactorScorer, default_recommendations},
};

pub type RtoPredictor = Predictor<RtoEncoder, RandomForestClassifier>;

impl From<&Config> for CategoryPolicy {
    fn from(config: &Config) -> Self {
        if config.encoder.strict_categories {
            CategoryPolicy::Strict
        } else {
            CategoryPolicy::Permissive
        }
    }
}

/// Loads both artifacts once; any failure here is fatal for the process.
pub fn load_predictor(config: &Config) -> Result<RtoPredictor, ArtifactLoadError> {
    let stats = ScalingStatistics::load(&config.common.scaling_path)?;
    let policy = CategoryPolicy::from(config);
    let encoder = RtoEncoder::from_statistics(&stats, policy)?;
    let classifier = RandomForestClassifier::load(&config.common.model_path)?;

    info!(?policy, "Building RTO predictor");
    Predictor::new(
        encoder,
        classifier,
        Box::new(RiskFactorScorer::new(&config.risk)),
        default_recommendations(),
    )
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record {index}: {source}")]
    Prediction {
        index: usize,
        #[source]
        source: PredictionError,
    },
}

/// Scores one JSON record, or an array of them, into the matching JSON shape.
///
/// An array is all-or-nothing: the first bad record fails the whole batch.
pub fn predict_json(predictor: &RtoPredictor, input: &str) -> Result<Value, BatchError> {
    match serde_json::from_str::<Value>(input)? {
        Value::Array(items) => {
            let mut predictions = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                predictions.push(predict_value(predictor, item, index)?);
            }
            Ok(Value::Array(predictions))
        }
        value => predict_value(predictor, value, 0),
    }
}

fn predict_value(predictor: &RtoPredictor, value: Value, index: usize) -> Result<Value, BatchError> {
    let record: RawOrderRecord = serde_json::from_value(value)
        .map_err(|source| BatchError::Record { index, source })?;
    let prediction = predictor
        .predict(&record)
        .map_err(|source| BatchError::Prediction { index, source })?;
    Ok(serde_json::to_value(prediction)?)
}
