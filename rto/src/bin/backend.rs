use std::error::Error;

use processing::executable_utils::{initialize_executable, initialize_tracing, run_backend};
use rto::load_predictor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = initialize_executable()?;
    initialize_tracing(&config.backend.log_level);
    let predictor = load_predictor(&config)?;
    run_backend(config.backend, predictor).await
}
