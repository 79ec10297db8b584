use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use common::config::{BackendConfig, Config};
use http::header;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::de::DeserializeOwned;
use std::{error::Error, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use crate::{
    classifier::Classifier,
    predictor::{FeatureEncoder, Predictor},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "target/debug/config/total_config.yaml")]
    pub config: String,
}

pub fn initialize_executable() -> Result<Config, Box<dyn Error + Send + Sync>> {
    let args = Args::parse();
    load_config(&args.config)
}

pub fn load_config(config_path: &str) -> Result<Config, Box<dyn Error + Send + Sync>> {
    eprintln!("Loading config from: {}", config_path);
    let config = Config::load(config_path)
        .map_err(|e| format!("Failed to load config {}: {}", config_path, e))?;
    Ok(config)
}

/// RUST_LOG wins over the configured level when set. Logs go to stderr.
pub fn initialize_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub struct AppState<E: FeatureEncoder, C: Classifier> {
    pub predictor: Arc<Predictor<E, C>>,
    pub metrics: Option<PrometheusHandle>,
}

impl<E: FeatureEncoder, C: Classifier> Clone for AppState<E, C> {
    fn clone(&self) -> Self {
        Self {
            predictor: self.predictor.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

pub fn build_router<E, C>(
    state: AppState<E, C>,
    allowed_origin: Option<&str>,
) -> Result<Router, Box<dyn Error + Send + Sync>>
where
    E: FeatureEncoder + 'static,
    E::Record: DeserializeOwned + Send + 'static,
    C: Classifier + 'static,
{
    let cors = match allowed_origin {
        Some(origin) => CorsLayer::new().allow_origin(origin.parse::<header::HeaderValue>()?),
        None => CorsLayer::new().allow_origin(Any),
    };

    let app = Router::new()
        .route("/predict", post(predict_order::<E, C>))
        .route("/schema", get(feature_schema::<E, C>))
        .route("/metrics", get(render_metrics::<E, C>))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors.allow_methods(Any).allow_headers(Any))
        .with_state(state);

    Ok(app)
}

pub async fn run_backend<E, C>(
    config: BackendConfig,
    predictor: Predictor<E, C>,
) -> Result<(), Box<dyn Error + Send + Sync>>
where
    E: FeatureEncoder + 'static,
    E::Record: DeserializeOwned + Send + 'static,
    C: Classifier + 'static,
{
    let metrics = PrometheusBuilder::new().install_recorder()?;
    let state = AppState {
        predictor: Arc::new(predictor),
        metrics: Some(metrics),
    };
    let app = build_router(state, config.allowed_origin.as_deref())?;

    tracing::info!("Starting backend service at {}", config.server_address);
    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub async fn predict_order<E, C>(
    State(state): State<AppState<E, C>>,
    Json(record): Json<E::Record>,
) -> Response
where
    E: FeatureEncoder + 'static,
    E::Record: DeserializeOwned + Send + 'static,
    C: Classifier + 'static,
{
    match state.predictor.predict(&record) {
        Ok(prediction) => (StatusCode::OK, Json(prediction)).into_response(),
        Err(e) if e.is_client_error() => {
            tracing::info!(error = %e, "Rejected order record");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to score order record");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn feature_schema<E, C>(State(state): State<AppState<E, C>>) -> Json<Vec<String>>
where
    E: FeatureEncoder + 'static,
    C: Classifier + 'static,
{
    Json(state.predictor.encoder().column_names())
}

pub async fn render_metrics<E, C>(State(state): State<AppState<E, C>>) -> Response
where
    E: FeatureEncoder + 'static,
    C: Classifier + 'static,
{
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}
