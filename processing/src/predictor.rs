use std::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    classifier::Classifier,
    errors::{ArtifactLoadError, EncodingError, PredictionError},
    model::{ClassLabel, Prediction, Processible},
    scorers::Scorer,
};

/// Fixed-width numeric encoding of one record plus any soft diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub values: Vec<f64>,
    pub diagnostics: Vec<String>,
}

/// Turns a raw record into the vector a classifier was trained on.
pub trait FeatureEncoder: Send + Sync {
    type Record: Processible;

    /// Slot names in positional order
    fn column_names(&self) -> Vec<String>;

    fn width(&self) -> usize {
        self.column_names().len()
    }

    fn encode_record(&self, record: &Self::Record) -> Result<EncodedRecord, EncodingError>;
}

/// Encode, classify and explain. Risk factors are derived from the raw
/// record, never from the encoded vector.
pub struct Predictor<E: FeatureEncoder, C: Classifier> {
    encoder: E,
    classifier: C,
    risk_scorer: Box<dyn Scorer>,
    recommendations: Vec<String>,
}

impl<E, C> Predictor<E, C>
where
    E: FeatureEncoder,
    C: Classifier,
{
    pub fn new(
        encoder: E,
        classifier: C,
        risk_scorer: Box<dyn Scorer>,
        recommendations: Vec<String>,
    ) -> Result<Self, ArtifactLoadError> {
        let columns = encoder.column_names();
        if columns.len() != classifier.n_features() {
            return Err(ArtifactLoadError::SchemaMismatch(format!(
                "encoder produces {} features, classifier expects {}",
                columns.len(),
                classifier.n_features()
            )));
        }
        if let Some(names) = classifier.feature_names() {
            if let Some((pos, (expected, actual))) = names
                .iter()
                .zip(columns.iter())
                .enumerate()
                .find(|(_, (expected, actual))| expected != actual)
            {
                return Err(ArtifactLoadError::SchemaMismatch(format!(
                    "column {} is '{}' in the classifier but '{}' in the encoder",
                    pos, expected, actual
                )));
            }
        }

        info!("Initializing predictor with {} features", columns.len());
        Ok(Self {
            encoder,
            classifier,
            risk_scorer,
            recommendations,
        })
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn predict(&self, record: &E::Record) -> Result<Prediction, PredictionError> {
        let started = Instant::now();

        let encoded = self.encoder.encode_record(record)?;
        debug!("Encoded record into {} slots", encoded.values.len());

        let probabilities = self.classifier.predict_proba(&encoded.values)?;
        let sum = probabilities[0] + probabilities[1];
        if (sum - 1.0).abs() > 1e-6 {
            warn!("Classifier probabilities sum to {}", sum);
        }
        let label = ClassLabel::from_probabilities(probabilities);

        let (risk_factors, recommendations) = match label {
            ClassLabel::Rto => {
                let triggered = self.risk_scorer.score(&record.extract_features());
                (
                    triggered.into_iter().map(|r| r.description).collect(),
                    self.recommendations.clone(),
                )
            }
            ClassLabel::NotRto => (Vec::new(), Vec::new()),
        };

        metrics::histogram!("rto_predict_seconds").record(started.elapsed().as_secs_f64());
        metrics::counter!("rto_predictions_total", "label" => label.to_string()).increment(1);
        info!(
            label = %label,
            probability = probabilities[1],
            risk_factors = risk_factors.len(),
            "Prediction complete"
        );

        Ok(Prediction {
            label,
            probability: probabilities[1],
            probabilities,
            risk_factors,
            recommendations,
            warnings: encoded.diagnostics,
        })
    }
}
