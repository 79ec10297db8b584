
use common::config::{BackendConfig, CommonConfig, Config, EncoderConfig, RiskConfig};
use common::test_helpers::write_temp_artifact;
use processing::{
    classifier::Classifier,
    errors::{ArtifactLoadError, EncodingError, PredictionError, ValidationError},
    model::ClassLabel,
};
use rto::{BatchError, DistrictInput, FeatureSchema, load_predictor, predict_json};
use serde_json::{Value, json};

use test_helpers::{reference_record, reference_record_json, risky_record};

fn shipped_config(strict: bool) -> Config {
    let models = concat!(env!("CARGO_MANIFEST_DIR"), "/models");
    Config {
        common: CommonConfig {
            project_name: "rto".to_string(),
            model_path: format!("{}/random_forest.json", models),
            scaling_path: format!("{}/scaling_stats.json", models),
        },
        encoder: EncoderConfig {
            strict_categories: strict,
        },
        risk: RiskConfig::default(),
        backend: BackendConfig::default(),
    }
}

#[test]
fn test_shipped_artifacts_load() {
    let predictor = load_predictor(&shipped_config(false)).unwrap();
    assert_eq!(predictor.classifier().n_features(), FeatureSchema::WIDTH);
    assert_eq!(
        predictor.classifier().feature_names().unwrap(),
        FeatureSchema::columns().to_vec()
    );
}

#[test]
fn test_reference_record_is_low_risk() {
    let predictor = load_predictor(&shipped_config(false)).unwrap();
    let prediction = predictor.predict(&reference_record()).unwrap();

    assert_eq!(prediction.label, ClassLabel::NotRto);
    assert!(prediction.probability > 0.0 && prediction.probability < 0.5);
    assert!((prediction.probabilities[0] + prediction.probabilities[1] - 1.0).abs() < 1e-9);
    assert!(prediction.risk_factors.is_empty());
}

#[test]
fn test_risky_record_lists_all_factors() {
    let predictor = load_predictor(&shipped_config(false)).unwrap();
    let prediction = predictor.predict(&risky_record()).unwrap();

    assert_eq!(prediction.label, ClassLabel::Rto);
    assert!(prediction.probability > 0.5);
    assert_eq!(prediction.risk_factors.len(), 4);
    assert_eq!(prediction.recommendations.len(), 4);
}

#[test]
fn test_prediction_is_repeatable() {
    let predictor = load_predictor(&shipped_config(false)).unwrap();
    let first = predictor.predict(&risky_record()).unwrap();
    let second = predictor.predict(&risky_record()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_validation_error_produces_no_prediction() {
    let predictor = load_predictor(&shipped_config(false)).unwrap();
    let mut record = reference_record();
    record.order_confirmed_at = record.order_placed_at - chrono::TimeDelta::minutes(1);

    let err = predictor.predict(&record).unwrap_err();
    assert!(matches!(
        err,
        PredictionError::Encoding(EncodingError::Validation(
            ValidationError::ConfirmationBeforePlacement { .. }
        ))
    ));
}

#[test]
fn test_strict_config_rejects_unknown_district() {
    let predictor = load_predictor(&shipped_config(true)).unwrap();
    let mut record = reference_record();
    record.district = DistrictInput::from("Atlantis");

    let err = predictor.predict(&record).unwrap_err();
    assert!(matches!(
        err,
        PredictionError::Encoding(EncodingError::UnknownCategory { .. })
    ));
}

#[test]
fn test_missing_model_is_fatal() {
    let mut config = shipped_config(false);
    config.common.model_path = "/nowhere/random_forest.json".to_string();
    assert!(matches!(
        load_predictor(&config).err().unwrap(),
        ArtifactLoadError::Io { .. }
    ));
}

#[test]
fn test_scaling_without_delivery_charge_is_fatal() {
    let stats = write_temp_artifact(r#"{"columns": {"OrderValue": {"min": 0, "max": 100}}}"#).unwrap();
    let mut config = shipped_config(false);
    config.common.scaling_path = stats.path().to_string_lossy().to_string();

    let err = load_predictor(&config).err().unwrap();
    assert!(err.to_string().contains("DeliveryCharge"));
}

#[test]
fn test_narrow_model_is_a_schema_mismatch() {
    let forest = write_temp_artifact(
        r#"{
            "n_features": 3,
            "trees": [{
                "children_left": [-1],
                "children_right": [-1],
                "feature": [-2],
                "threshold": [-2.0],
                "value": [[1.0, 1.0]]
            }]
        }"#,
    )
    .unwrap();
    let mut config = shipped_config(false);
    config.common.model_path = forest.path().to_string_lossy().to_string();

    assert!(matches!(
        load_predictor(&config).err().unwrap(),
        ArtifactLoadError::SchemaMismatch(_)
    ));
}

fn risky_record_json() -> Value {
    let mut record = reference_record_json();
    record["orderValue"] = json!(20000);
    record["district"] = json!("Bhola");
    record["deliveryCharge"] = json!(130);
    record["orderConfirmedAt"] = json!("2024-01-04T10:00");
    record
}

#[test]
fn test_predict_json_single_record() {
    let predictor = load_predictor(&shipped_config(false)).unwrap();
    let output = predict_json(&predictor, &reference_record_json().to_string()).unwrap();

    assert_eq!(output["label"], json!("not_rto"));
    assert_eq!(output["risk_factors"], json!([]));
}

#[test]
fn test_predict_json_array_keeps_order() {
    let predictor = load_predictor(&shipped_config(false)).unwrap();
    let mut lowercase = reference_record_json();
    lowercase["district"] = json!("dhaka");
    let input = json!([risky_record_json(), lowercase]).to_string();

    let output = predict_json(&predictor, &input).unwrap();
    let predictions = output.as_array().unwrap();

    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0]["label"], json!("rto"));
    assert_eq!(predictions[0]["risk_factors"].as_array().unwrap().len(), 4);
    assert_eq!(predictions[1]["warnings"].as_array().unwrap().len(), 1);
}

#[test]
fn test_predict_json_array_fails_on_any_bad_record() {
    let predictor = load_predictor(&shipped_config(false)).unwrap();
    let mut early = reference_record_json();
    early["orderConfirmedAt"] = json!("2024-01-01T09:59");
    let mut bad_payment = reference_record_json();
    bad_payment["paymentType"] = json!("CASH");

    let input = json!([reference_record_json(), early]).to_string();
    let err = predict_json(&predictor, &input).unwrap_err();
    assert!(matches!(
        err,
        BatchError::Prediction {
            index: 1,
            source: PredictionError::Encoding(EncodingError::Validation(_))
        }
    ));

    let input = json!([bad_payment, reference_record_json()]).to_string();
    let err = predict_json(&predictor, &input).unwrap_err();
    assert!(matches!(err, BatchError::Record { index: 0, .. }));
}

#[test]
fn test_predict_json_rejects_malformed_input() {
    let predictor = load_predictor(&shipped_config(false)).unwrap();
    let err = predict_json(&predictor, "{not json").unwrap_err();
    assert!(matches!(err, BatchError::Json(_)));
}
