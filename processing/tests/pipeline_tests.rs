use axum::body::Body;
use common::test_helpers::{TestError, TestResult, test_utils, write_temp_artifact};
use common::{test_assert, test_assert_eq};
use http::StatusCode;
use http_body_util::BodyExt;
use processing::{
    classifier::RandomForestClassifier,
    errors::{ArtifactLoadError, EncodingError, ValidationError},
    executable_utils::{AppState, build_router},
    model::{ClassLabel, Feature, FeatureValue, Prediction, Processible},
    predictor::{EncodedRecord, FeatureEncoder, Predictor},
    scorers::{ExpressionBasedScorer, ExpressionRule},
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceExt;

const FOREST: &str = r#"{
    "n_features": 2,
    "feature_names": ["Weight", "IsFragile"],
    "trees": [
        {
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [0, -2, -2],
            "threshold": [0.5, -2.0, -2.0],
            "value": [[10.0, 10.0], [9.0, 1.0], [1.0, 9.0]]
        }
    ]
}"#;

#[derive(Debug, Deserialize)]
struct Parcel {
    weight: f64,
    fragile: bool,
}

impl Processible for Parcel {
    fn extract_features(&self) -> Vec<Feature> {
        vec![
            Feature::new("weight", FeatureValue::Double(self.weight)),
            Feature::new("fragile", FeatureValue::Bool(self.fragile)),
        ]
    }
}

struct ParcelEncoder;

impl FeatureEncoder for ParcelEncoder {
    type Record = Parcel;

    fn column_names(&self) -> Vec<String> {
        vec!["Weight".to_string(), "IsFragile".to_string()]
    }

    fn encode_record(&self, record: &Parcel) -> Result<EncodedRecord, EncodingError> {
        if record.weight < 0.0 {
            return Err(ValidationError::NegativeAmount {
                field: "weight",
                value: record.weight,
            }
            .into());
        }
        Ok(EncodedRecord {
            values: vec![
                (record.weight / 20.0).clamp(0.0, 1.0),
                if record.fragile { 1.0 } else { 0.0 },
            ],
            diagnostics: Vec::new(),
        })
    }
}

fn parcel_predictor() -> Predictor<ParcelEncoder, RandomForestClassifier> {
    let artifact = write_temp_artifact(FOREST).unwrap();
    let classifier = RandomForestClassifier::load(artifact.path()).unwrap();
    let scorer = ExpressionBasedScorer::new_with_expressions(vec![ExpressionRule::new(
        "heavy",
        "Heavy parcels come back more often",
        "weight > 10.0",
    )]);
    Predictor::new(
        ParcelEncoder,
        classifier,
        Box::new(scorer),
        vec!["Call the customer".to_string()],
    )
    .unwrap()
}

#[test]
fn test_forest_drives_label() {
    let predictor = parcel_predictor();

    let heavy = predictor
        .predict(&Parcel {
            weight: 15.0,
            fragile: false,
        })
        .unwrap();
    assert_eq!(heavy.label, ClassLabel::Rto);
    assert!((heavy.probability - 0.9).abs() < 1e-12);
    assert_eq!(heavy.risk_factors, vec!["Heavy parcels come back more often"]);
    assert_eq!(heavy.recommendations, vec!["Call the customer"]);

    let light = predictor
        .predict(&Parcel {
            weight: 4.0,
            fragile: true,
        })
        .unwrap();
    assert_eq!(light.label, ClassLabel::NotRto);
    assert!((light.probabilities[0] - 0.9).abs() < 1e-12);
    assert!(light.risk_factors.is_empty());
    assert!(light.recommendations.is_empty());
}

#[test]
fn test_reordered_feature_names_are_rejected() {
    let swapped = FOREST.replace(
        r#"["Weight", "IsFragile"]"#,
        r#"["IsFragile", "Weight"]"#,
    );
    let artifact = write_temp_artifact(&swapped).unwrap();
    let classifier = RandomForestClassifier::load(artifact.path()).unwrap();

    let err = Predictor::new(
        ParcelEncoder,
        classifier,
        Box::new(ExpressionBasedScorer::new()),
        Vec::new(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, ArtifactLoadError::SchemaMismatch(_)));
}

#[tokio::test]
async fn test_predict_endpoint_round_trip() -> TestResult {
    let state = AppState {
        predictor: Arc::new(parcel_predictor()),
        metrics: None,
    };
    let app = build_router(state, None).map_err(TestError::service)?;

    let request = test_utils::build_request(
        "POST",
        "/predict",
        Some(r#"{"weight": 18.0, "fragile": true}"#.to_string()),
    )?
    .map(Body::from);
    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(TestError::service)?;
    test_utils::check_status_code(response.status(), StatusCode::OK)?;

    let bytes = response
        .into_body()
        .collect()
        .await
        .map_err(TestError::service)?
        .to_bytes();
    let prediction: Prediction = serde_json::from_slice(&bytes)?;
    test_assert_eq!(prediction.label, ClassLabel::Rto);
    test_assert!(prediction.is_high_risk());

    let request = test_utils::build_request(
        "POST",
        "/predict",
        Some(r#"{"weight": -1.0, "fragile": false}"#.to_string()),
    )?
    .map(Body::from);
    let response = app
        .oneshot(request)
        .await
        .map_err(TestError::service)?;
    test_utils::check_status_code(response.status(), StatusCode::UNPROCESSABLE_ENTITY)?;

    Ok(())
}

#[tokio::test]
async fn test_schema_lists_encoder_columns() -> TestResult {
    let state = AppState {
        predictor: Arc::new(parcel_predictor()),
        metrics: None,
    };
    let app = build_router(state, None).map_err(TestError::service)?;

    let request = test_utils::build_request("GET", "/schema", None)?.map(Body::from);
    let response = app
        .oneshot(request)
        .await
        .map_err(TestError::service)?;
    test_utils::check_status_code(response.status(), StatusCode::OK)?;

    let bytes = response
        .into_body()
        .collect()
        .await
        .map_err(TestError::service)?
        .to_bytes();
    let columns: Vec<String> = serde_json::from_slice(&bytes)?;
    test_assert_eq!(columns, vec!["Weight".to_string(), "IsFragile".to_string()]);

    Ok(())
}
