use chrono::{NaiveDateTime, TimeDelta};
use processing::{
    errors::ValidationError,
    model::{Feature, FeatureValue, Processible},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use strum_macros::{AsRefStr, Display, EnumCount, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    EnumIter, EnumCount, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PaymentType {
    Adc,
    Emi,
    /// Mobile payment on delivery
    Mpd,
    Mps,
    Ops,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    EnumIter, EnumCount, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OrderSource {
    Android,
    Desktop,
    MobileSite,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    EnumIter, EnumCount, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderType {
    Express,
    Normal,
}

/// Delivery districts known to the classifier, in training column order.
///
/// The string forms are the training-time labels verbatim, including the
/// lowercase `khulna` entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    EnumIter, EnumCount, EnumString, AsRefStr, Display,
)]
pub enum District {
    Bagerhat,
    Bandarban,
    Barguna,
    Barisal,
    Bhola,
    Bogra,
    Brahmanbaria,
    Chandpur,
    #[strum(serialize = "Chapai-Nawabganj")]
    ChapaiNawabganj,
    #[strum(serialize = "Chittagong (Outside City)")]
    ChittagongOutsideCity,
    #[strum(serialize = "Chittagong City")]
    ChittagongCity,
    Chuadanga,
    Comilla,
    #[strum(serialize = "Cox's-Bazar")]
    CoxsBazar,
    Dhaka,
    #[strum(serialize = "Dhaka (Outside City)")]
    DhakaOutsideCity,
    Dinajpur,
    Faridpur,
    Feni,
    Gaibandha,
    Gazipur,
    Gopalganj,
    Habiganj,
    Jamalpur,
    Jessore,
    Jhalokati,
    Jhenaidah,
    Joypurhat,
    Khagrachhari,
    Kishoreganj,
    Kurigram,
    Kushtia,
    Lakshmipur,
    Lalmonirhat,
    Madaripur,
    Magura,
    Manikganj,
    Meherpur,
    Moulvibazar,
    Munshiganj,
    Mymensingh,
    Naogaon,
    Narail,
    Narayanganj,
    Narsingdi,
    Natore,
    Netrokona,
    Nilphamari,
    Noakhali,
    Pabna,
    Panchagarh,
    Patuakhali,
    Pirojpur,
    Rajbari,
    #[strum(serialize = "Rajshahi (Outside City)")]
    RajshahiOutsideCity,
    #[strum(serialize = "Rajshahi City")]
    RajshahiCity,
    Rangamati,
    Rangpur,
    Satkhira,
    Shariatpur,
    Sherpur,
    Sirajganj,
    Sunamganj,
    #[strum(serialize = "Sylhet (Outside City)")]
    SylhetOutsideCity,
    #[strum(serialize = "Sylhet City")]
    SylhetCity,
    Tangail,
    Thakurgaon,
    #[strum(serialize = "khulna (Outside City)")]
    KhulnaOutsideCity,
    #[strum(serialize = "khulna City")]
    KhulnaCity,
}

/// A district as entered by the operator. Matching against the known set is
/// exact; anything else is carried through as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistrictInput {
    Known(District),
    Unknown(String),
}

impl DistrictInput {
    pub fn known(&self) -> Option<District> {
        match self {
            DistrictInput::Known(district) => Some(*district),
            DistrictInput::Unknown(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DistrictInput::Known(district) => district.as_ref(),
            DistrictInput::Unknown(raw) => raw,
        }
    }
}

impl From<District> for DistrictInput {
    fn from(district: District) -> Self {
        DistrictInput::Known(district)
    }
}

impl From<&str> for DistrictInput {
    fn from(raw: &str) -> Self {
        match District::from_str(raw) {
            Ok(district) => DistrictInput::Known(district),
            Err(_) => DistrictInput::Unknown(raw.to_string()),
        }
    }
}

impl fmt::Display for DistrictInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DistrictInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DistrictInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(DistrictInput::from(raw.as_str()))
    }
}

/// One order as entered before dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawOrderRecord {
    pub order_value: f64,
    pub payment_type: PaymentType,
    pub district: DistrictInput,
    pub order_source: OrderSource,
    pub order_type: OrderType,
    pub delivery_charge: f64,
    #[serde(with = "order_timestamp")]
    pub order_placed_at: NaiveDateTime,
    #[serde(with = "order_timestamp")]
    pub order_confirmed_at: NaiveDateTime,
    #[serde(deserialize_with = "yes_no::deserialize")]
    pub is_cart_order: bool,
    #[serde(deserialize_with = "yes_no::deserialize")]
    pub is_promotional: bool,
}

impl RawOrderRecord {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_amount("orderValue", self.order_value)?;
        check_amount("deliveryCharge", self.delivery_charge)?;
        if self.order_confirmed_at < self.order_placed_at {
            return Err(ValidationError::ConfirmationBeforePlacement {
                placed: self.order_placed_at,
                confirmed: self.order_confirmed_at,
            });
        }
        Ok(())
    }

    /// Signed interval from placement to confirmation
    pub fn confirmation_latency(&self) -> TimeDelta {
        self.order_confirmed_at - self.order_placed_at
    }

    /// Absolute latency in hours; never negative even for unvalidated records
    pub fn confirmation_latency_hours(&self) -> f64 {
        let latency = self.confirmation_latency();
        let seconds = latency.num_seconds() as f64 + latency.subsec_nanos() as f64 / 1e9;
        (seconds / 3600.0).abs()
    }

    /// Whole days, floored
    pub fn confirmation_latency_days(&self) -> i64 {
        self.confirmation_latency().num_seconds().div_euclid(86_400)
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteAmount { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeAmount { field, value });
    }
    Ok(())
}

impl Processible for RawOrderRecord {
    fn extract_features(&self) -> Vec<Feature> {
        vec![
            Feature::new("order_value", FeatureValue::Double(self.order_value)),
            Feature::new("delivery_charge", FeatureValue::Double(self.delivery_charge)),
            Feature::new(
                "payment_type",
                FeatureValue::String(self.payment_type.to_string()),
            ),
            Feature::new("district", FeatureValue::String(self.district.to_string())),
            Feature::new(
                "order_source",
                FeatureValue::String(self.order_source.to_string()),
            ),
            Feature::new("order_type", FeatureValue::String(self.order_type.to_string())),
            Feature::new("is_cart_order", FeatureValue::Bool(self.is_cart_order)),
            Feature::new("is_promotional", FeatureValue::Bool(self.is_promotional)),
            Feature::new(
                "order_placed_at",
                FeatureValue::DateTime(self.order_placed_at.and_utc()),
            ),
            Feature::new(
                "confirmation_latency_hours",
                FeatureValue::Double(self.confirmation_latency_hours()),
            ),
            Feature::new(
                "confirmation_latency_days",
                FeatureValue::Int(self.confirmation_latency_days()),
            ),
        ]
    }
}

/// Timestamps as operators enter them: a date, optionally with a time of day.
pub mod order_timestamp {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    /// Dates without a time of day mean midnight.
    pub fn parse(raw: &str) -> Result<NaiveDateTime, String> {
        let raw = raw.trim();
        for format in DATETIME_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(parsed);
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|date| date.and_time(NaiveTime::MIN))
            .map_err(|_| format!("invalid timestamp '{}', expected YYYY-MM-DD[THH:MM[:SS]]", raw))
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(OUTPUT_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }
}

/// Booleans as JSON booleans or the `Yes` / `No` answers of the order form.
pub mod yes_no {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Answer {
        Bool(bool),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Answer::deserialize(deserializer)? {
            Answer::Bool(value) => Ok(value),
            Answer::Text(text) if text.eq_ignore_ascii_case("yes") => Ok(true),
            Answer::Text(text) if text.eq_ignore_ascii_case("no") => Ok(false),
            Answer::Text(text) => Err(D::Error::custom(format!(
                "expected true, false, \"Yes\" or \"No\", got \"{}\"",
                text
            ))),
        }
    }
}
