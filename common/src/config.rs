use serde::Deserialize;
use std::{error::Error, fs};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CommonConfig {
    pub project_name: String,
    /// Path to the exported classifier artifact (JSON)
    pub model_path: String,
    /// Path to the persisted min-max statistics (JSON)
    pub scaling_path: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EncoderConfig {
    /// Reject unknown districts instead of encoding them as all zeros
    #[serde(default)]
    pub strict_categories: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RiskConfig {
    #[serde(default = "default_low_risk_districts")]
    pub low_risk_districts: Vec<String>,
    #[serde(default = "default_high_delivery_charge")]
    pub high_delivery_charge: f64,
    #[serde(default = "default_max_confirmation_days")]
    pub max_confirmation_days: i64,
}

fn default_low_risk_districts() -> Vec<String> {
    vec![
        "Dhaka".to_string(),
        "Chittagong City".to_string(),
        "Gazipur".to_string(),
    ]
}

fn default_high_delivery_charge() -> f64 {
    100.0
}

fn default_max_confirmation_days() -> i64 {
    2
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            low_risk_districts: default_low_risk_districts(),
            high_delivery_charge: default_high_delivery_charge(),
            max_confirmation_days: default_max_confirmation_days(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BackendConfig {
    pub server_address: String,
    pub log_level: String,
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub common: CommonConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    pub backend: BackendConfig,
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let contents = fs::read_to_string(config_path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let config = serde_yml::from_str(contents)?;

        Ok(config)
    }
}
