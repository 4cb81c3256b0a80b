//! Order price computation.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Orders whose items total strictly more than this ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = dec!(500);

/// Flat shipping charge below the free-shipping threshold.
pub const FLAT_SHIPPING_PRICE: Decimal = dec!(50);

/// Tax rate applied to the items total.
pub const TAX_RATE: Decimal = dec!(0.18);

/// Price of one line: unit price times quantity.
pub fn line_total(price: Decimal, qty: u32) -> Decimal {
    price * Decimal::from(qty)
}

/// Totals computed once when an order is placed and never recomputed.
///
/// `total_amount == items_price + shipping_price + tax_price` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub items_price: Decimal,
    pub shipping_price: Decimal,
    pub tax_price: Decimal,
    pub total_amount: Decimal,
}

impl PriceBreakdown {
    pub fn from_items_price(items_price: Decimal) -> Self {
        let shipping_price = if items_price > FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING_PRICE
        };
        let tax_price =
            (items_price * TAX_RATE).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self {
            items_price,
            shipping_price,
            tax_price,
            total_amount: items_price + shipping_price + tax_price,
        }
    }

    /// Total in minor currency units (paise, cents), rounded to the nearest unit.
    pub fn total_minor_units(&self) -> i64 {
        use rust_decimal::prelude::ToPrimitive as _;
        (self.total_amount * dec!(100))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(i64::MAX)
    }
}
