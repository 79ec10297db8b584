pub mod encoder;
pub mod model;
pub mod risk;
pub mod schema;
pub mod service;

pub use encoder::{CategoryPolicy, FeatureVector, RtoEncoder};
pub use model::{District, DistrictInput, OrderSource, OrderType, PaymentType, RawOrderRecord};
pub use schema::FeatureSchema;
pub use service::{BatchError, RtoPredictor, load_predictor, predict_json};
