//! Operator-facing risk factors. These read the raw record, never the
//! encoded vector.

use common::config::RiskConfig;
use processing::{
    model::{Feature, FeatureValue, ScorerResult},
    scorers::{ExpressionBasedScorer, ExpressionRule, Scorer},
};
use std::collections::HashSet;

pub const LOW_RISK_DISTRICT_FEATURE: &str = "is_low_risk_district";

pub fn default_risk_rules(config: &RiskConfig) -> Vec<ExpressionRule> {
    vec![
        ExpressionRule::new(
            "high_risk_district",
            "Order from a high-risk district",
            format!("!{}", LOW_RISK_DISTRICT_FEATURE),
        ),
        ExpressionRule::new(
            "mobile_payment_on_delivery",
            "Mobile payment on delivery has higher RTO risk",
            "payment_type == \"MPD\"",
        ),
        ExpressionRule::new(
            "high_delivery_charge",
            "High delivery charge may increase RTO risk",
            format!("delivery_charge > {:?}", config.high_delivery_charge),
        ),
        ExpressionRule::new(
            "long_confirmation_delay",
            "Long confirmation delay increases RTO risk",
            format!("confirmation_latency_days > {}", config.max_confirmation_days),
        ),
    ]
}

pub fn default_recommendations() -> Vec<String> {
    [
        "Verify customer contact information",
        "Consider alternative payment methods",
        "Ensure proper customer communication",
        "Verify delivery address thoroughly",
    ]
    .iter()
    .map(|r| r.to_string())
    .collect()
}

/// Expression rules plus the configured low-risk district set, which is
/// exposed to the rules as a boolean feature.
pub struct RiskFactorScorer {
    low_risk_districts: HashSet<String>,
    rules: ExpressionBasedScorer,
}

impl RiskFactorScorer {
    pub fn new(config: &RiskConfig) -> Self {
        Self::with_rules(
            config.low_risk_districts.iter().cloned(),
            default_risk_rules(config),
        )
    }

    pub fn with_rules(
        low_risk_districts: impl IntoIterator<Item = String>,
        rules: Vec<ExpressionRule>,
    ) -> Self {
        Self {
            low_risk_districts: low_risk_districts.into_iter().collect(),
            rules: ExpressionBasedScorer::new_with_expressions(rules),
        }
    }

    fn is_low_risk(&self, features: &[Feature]) -> bool {
        features
            .iter()
            .find(|f| f.name == "district")
            .map(|f| match f.value.as_ref() {
                FeatureValue::String(district) => self.low_risk_districts.contains(district),
                _ => false,
            })
            .unwrap_or(false)
    }
}

impl Scorer for RiskFactorScorer {
    fn score(&self, features: &[Feature]) -> Vec<ScorerResult> {
        let mut features = features.to_vec();
        let low_risk = self.is_low_risk(&features);
        features.push(Feature::new(
            LOW_RISK_DISTRICT_FEATURE,
            FeatureValue::Bool(low_risk),
        ));
        self.rules.score(&features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{District, DistrictInput, OrderSource, OrderType, PaymentType, RawOrderRecord};
    use chrono::NaiveDate;
    use processing::model::Processible;

    fn record() -> RawOrderRecord {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        RawOrderRecord {
            order_value: 1200.0,
            payment_type: PaymentType::Adc,
            district: DistrictInput::Known(District::Dhaka),
            order_source: OrderSource::Android,
            order_type: OrderType::Normal,
            delivery_charge: 60.0,
            order_placed_at: day.and_hms_opt(9, 0, 0).unwrap(),
            order_confirmed_at: day.and_hms_opt(9, 30, 0).unwrap(),
            is_cart_order: true,
            is_promotional: false,
        }
    }

    fn factors(record: &RawOrderRecord) -> Vec<String> {
        RiskFactorScorer::new(&RiskConfig::default())
            .score(&record.extract_features())
            .into_iter()
            .map(|r| r.description)
            .collect()
    }

    #[test]
    fn test_clean_record_has_no_factors() {
        assert!(factors(&record()).is_empty());
    }

    #[test]
    fn test_all_factors() {
        let mut record = record();
        record.district = DistrictInput::Known(District::Bhola);
        record.payment_type = PaymentType::Mpd;
        record.delivery_charge = 130.0;
        record.order_confirmed_at = record.order_placed_at + chrono::TimeDelta::days(3);

        assert_eq!(
            factors(&record),
            vec![
                "Order from a high-risk district",
                "Mobile payment on delivery has higher RTO risk",
                "High delivery charge may increase RTO risk",
                "Long confirmation delay increases RTO risk",
            ]
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        let mut record = record();
        record.delivery_charge = 100.0;
        // 2 days 23 hours floors to 2
        record.order_confirmed_at =
            record.order_placed_at + chrono::TimeDelta::days(2) + chrono::TimeDelta::hours(23);
        assert!(factors(&record).is_empty());
    }

    #[test]
    fn test_unknown_district_is_high_risk() {
        let mut record = record();
        record.district = DistrictInput::from("Atlantis");
        assert_eq!(factors(&record), vec!["Order from a high-risk district"]);
    }

    #[test]
    fn test_configured_low_risk_set() {
        let config = RiskConfig {
            low_risk_districts: vec!["Sylhet City".to_string()],
            high_delivery_charge: 50.0,
            max_confirmation_days: 2,
        };
        let mut record = record();
        record.district = DistrictInput::Known(District::SylhetCity);

        let results = RiskFactorScorer::new(&config).score(&record.extract_features());
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["high_delivery_charge"]);
    }

    #[test]
    fn test_recommendations() {
        assert_eq!(default_recommendations().len(), 4);
    }
}
