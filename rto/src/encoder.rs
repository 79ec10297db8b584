//! Raw order record → the 84-slot vector the classifier was trained on.

use processing::{
    errors::{ArtifactLoadError, EncodingError},
    predictor::{EncodedRecord, FeatureEncoder},
    scaling::{MinMaxStats, ScalingStatistics},
};
use tracing::{debug, warn};

use crate::{
    model::{DistrictInput, RawOrderRecord},
    schema::FeatureSchema,
};

pub const ORDER_VALUE_COLUMN: &str = "OrderValue";
pub const DELIVERY_CHARGE_COLUMN: &str = "DeliveryCharge";

/// What to do with a district outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryPolicy {
    /// Leave every district slot at 0 and report a diagnostic
    #[default]
    Permissive,
    /// Fail with `EncodingError::UnknownCategory`
    Strict,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FeatureSchema::WIDTH],
}

impl FeatureVector {
    fn zeros() -> Self {
        Self {
            values: [0.0; FeatureSchema::WIDTH],
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        FeatureSchema::index_of(column).map(|i| self.values[i])
    }

    pub fn named(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        FeatureSchema::columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values.to_vec()
    }
}

#[derive(Debug, Clone)]
pub struct RtoEncoder {
    order_value: MinMaxStats,
    delivery_charge: MinMaxStats,
    policy: CategoryPolicy,
}

impl RtoEncoder {
    pub fn new(order_value: MinMaxStats, delivery_charge: MinMaxStats, policy: CategoryPolicy) -> Self {
        Self {
            order_value,
            delivery_charge,
            policy,
        }
    }

    pub fn from_statistics(
        stats: &ScalingStatistics,
        policy: CategoryPolicy,
    ) -> Result<Self, ArtifactLoadError> {
        Ok(Self::new(
            stats.column(ORDER_VALUE_COLUMN)?,
            stats.column(DELIVERY_CHARGE_COLUMN)?,
            policy,
        ))
    }

    pub fn policy(&self) -> CategoryPolicy {
        self.policy
    }

    pub fn encode(&self, record: &RawOrderRecord) -> Result<FeatureVector, EncodingError> {
        self.encode_with_diagnostics(record).map(|(vector, _)| vector)
    }

    pub fn encode_with_diagnostics(
        &self,
        record: &RawOrderRecord,
    ) -> Result<(FeatureVector, Vec<String>), EncodingError> {
        record.validate()?;

        let mut diagnostics = Vec::new();
        let mut vector = FeatureVector::zeros();
        let slots = &mut vector.values;

        slots[FeatureSchema::ORDER_VALUE] = self.order_value.transform(record.order_value);
        slots[FeatureSchema::DELIVERY_CHARGE] = self.delivery_charge.transform(record.delivery_charge);
        slots[FeatureSchema::IS_CART_ORDER] = flag(record.is_cart_order);
        slots[FeatureSchema::IS_PROMOTIONAL] = flag(record.is_promotional);
        slots[FeatureSchema::CONFIRMATION_LATENCY] = record.confirmation_latency_hours();

        slots[FeatureSchema::order_type_slot(record.order_type)] = 1.0;
        slots[FeatureSchema::payment_type_slot(record.payment_type)] = 1.0;
        slots[FeatureSchema::order_source_slot(record.order_source)] = 1.0;

        match &record.district {
            DistrictInput::Known(district) => {
                slots[FeatureSchema::district_slot(*district)] = 1.0;
            }
            DistrictInput::Unknown(raw) => match self.policy {
                CategoryPolicy::Strict => {
                    return Err(EncodingError::UnknownCategory {
                        field: "district",
                        value: raw.clone(),
                    });
                }
                CategoryPolicy::Permissive => {
                    warn!(district = %raw, "Unknown district, all district slots left at 0");
                    diagnostics.push(format!(
                        "Unknown district '{}'; encoded without a district",
                        raw
                    ));
                }
            },
        }

        debug!(
            latency_hours = slots[FeatureSchema::CONFIRMATION_LATENCY],
            "Encoded order record"
        );
        Ok((vector, diagnostics))
    }
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

impl FeatureEncoder for RtoEncoder {
    type Record = RawOrderRecord;

    fn column_names(&self) -> Vec<String> {
        FeatureSchema::columns().to_vec()
    }

    fn width(&self) -> usize {
        FeatureSchema::WIDTH
    }

    fn encode_record(&self, record: &RawOrderRecord) -> Result<EncodedRecord, EncodingError> {
        let (vector, diagnostics) = self.encode_with_diagnostics(record)?;
        Ok(EncodedRecord {
            values: vector.into_vec(),
            diagnostics,
        })
    }
}
