use chrono::{DateTime, Utc};
use evalexpr::Value as EvalValue;
use serde::{Deserialize, Serialize};
use strum_macros::Display as EnumDisplay;

/// A raw (pre-encoding) attribute of a record, as seen by rule-based scorers.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub name: String,
    pub value: Box<FeatureValue>,
}

impl Feature {
    pub fn new(name: impl Into<String>, value: FeatureValue) -> Self {
        Self {
            name: name.into(),
            value: Box::new(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Int(i64),
    Double(f64),
    String(String),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

impl From<FeatureValue> for EvalValue {
    fn from(value: FeatureValue) -> Self {
        match value {
            FeatureValue::Int(v) => EvalValue::Int(v),
            FeatureValue::Double(v) => EvalValue::Float(v),
            FeatureValue::String(v) => EvalValue::String(v),
            FeatureValue::Bool(v) => EvalValue::Boolean(v),
            FeatureValue::DateTime(v) => EvalValue::Int(v.timestamp_millis()),
        }
    }
}

/// Records that expose their raw attributes to rule-based scorers.
pub trait Processible: Send + Sync {
    fn extract_features(&self) -> Vec<Feature>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorerResult {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumDisplay)]
#[serde(rename_all = "snake_case")]
pub enum ClassLabel {
    #[strum(to_string = "not_rto")]
    NotRto,
    #[strum(to_string = "rto")]
    Rto,
}

impl ClassLabel {
    pub fn as_int(self) -> u8 {
        match self {
            ClassLabel::NotRto => 0,
            ClassLabel::Rto => 1,
        }
    }
}

/// Outcome of screening one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: ClassLabel,
    /// Probability of RTO (class 1)
    pub probability: f64,
    /// `[p0, p1]` as reported by the classifier
    pub probabilities: [f64; 2],
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

impl Prediction {
    pub fn is_high_risk(&self) -> bool {
        self.label == ClassLabel::Rto
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_values_convert_to_eval_values() {
        assert_eq!(EvalValue::from(FeatureValue::Int(3)), EvalValue::Int(3));
        assert_eq!(
            EvalValue::from(FeatureValue::String("MPD".to_string())),
            EvalValue::String("MPD".to_string())
        );
        assert_eq!(EvalValue::from(FeatureValue::Bool(true)), EvalValue::Boolean(true));

        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(
            EvalValue::from(FeatureValue::DateTime(ts)),
            EvalValue::Int(1_700_000_000_000)
        );
    }

    #[test]
    fn test_class_label_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&ClassLabel::Rto).unwrap(), "\"rto\"");
        assert_eq!(
            serde_json::to_string(&ClassLabel::NotRto).unwrap(),
            "\"not_rto\""
        );
        assert_eq!(ClassLabel::Rto.to_string(), "rto");
        assert_eq!(ClassLabel::Rto.as_int(), 1);
    }
}
