pub mod classifier;
pub mod errors;
pub mod executable_utils;
pub mod model;
pub mod predictor;
pub mod scaling;
pub mod scorers;
