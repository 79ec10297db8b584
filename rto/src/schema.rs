//! The positional column layout shared by the encoder and the classifier.
//!
//! The classifier indexes features by position, so the layout is spelled out
//! once here and every slot index is derived from it.

use strum::{EnumCount, IntoEnumIterator};

use crate::model::{District, OrderSource, OrderType, PaymentType};

pub struct FeatureSchema;

impl FeatureSchema {
    pub const ORDER_VALUE: usize = 0;
    pub const DELIVERY_CHARGE: usize = 1;
    pub const IS_CART_ORDER: usize = 2;
    pub const IS_PROMOTIONAL: usize = 3;
    pub const CONFIRMATION_LATENCY: usize = 4;

    pub const ORDER_TYPE_OFFSET: usize = 5;
    pub const PAYMENT_TYPE_OFFSET: usize = Self::ORDER_TYPE_OFFSET + OrderType::COUNT;
    pub const DISTRICT_OFFSET: usize = Self::PAYMENT_TYPE_OFFSET + PaymentType::COUNT;
    pub const ORDER_SOURCE_OFFSET: usize = Self::DISTRICT_OFFSET + District::COUNT;

    pub const WIDTH: usize = Self::ORDER_SOURCE_OFFSET + OrderSource::COUNT;

    pub fn columns() -> &'static [String] {
        &COLUMNS
    }

    pub fn index_of(column: &str) -> Option<usize> {
        COLUMNS.iter().position(|c| c == column)
    }

    pub fn order_type_slot(order_type: OrderType) -> usize {
        Self::ORDER_TYPE_OFFSET + order_type as usize
    }

    pub fn payment_type_slot(payment_type: PaymentType) -> usize {
        Self::PAYMENT_TYPE_OFFSET + payment_type as usize
    }

    pub fn district_slot(district: District) -> usize {
        Self::DISTRICT_OFFSET + district as usize
    }

    pub fn order_source_slot(order_source: OrderSource) -> usize {
        Self::ORDER_SOURCE_OFFSET + order_source as usize
    }
}

const _: () = assert!(FeatureSchema::WIDTH == 84);

lazy_static::lazy_static! {
    static ref COLUMNS: Vec<String> = {
        let mut columns: Vec<String> = [
            "OrderValue",
            "DeliveryCharge",
            "IsCartOrder",
            "OrderFromPromotionalEvent",
            "ConfirmationLatency",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        columns.extend(OrderType::iter().map(|v| format!("OrderType_{}", v.as_ref())));
        columns.extend(PaymentType::iter().map(|v| format!("PaymentType_{}", v.as_ref())));
        columns.extend(District::iter().map(|v| format!("District_{}", v.as_ref())));
        columns.extend(OrderSource::iter().map(|v| format!("OrderSource_{}", v.as_ref())));
        columns
    };
}
