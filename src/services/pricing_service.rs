use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::booking::{CoverageTier, PricingBreakdown};
use crate::models::vehicle::CustomPrice;

/// Flat per-day surcharge for the `full` damage-waiver tier, in cents.
const FULL_COVERAGE_DAILY_CENTS: i64 = 1500;

/// Per-day extras prices. Two tables exist in the product: the
/// customer-facing quote widget and the persisted booking form carry
/// slightly different numbers, so callers inject the applicable table
/// instead of this module hard-coding one.
#[derive(Debug, Clone, Copy)]
pub struct ExtrasPriceTable {
    pub name: &'static str,
    prices: &'static [(&'static str, i64)],
}

impl ExtrasPriceTable {
    /// Price per day for one extra, in cents. Unknown extras price at
    /// zero; the table is authoritative for what can be charged.
    pub fn daily_cents(&self, extra: &str) -> i64 {
        self.prices
            .iter()
            .find(|(name, _)| *name == extra)
            .map(|(_, cents)| *cents)
            .unwrap_or(0)
    }
}

/// Table persisted with bookings created through the booking form.
pub const BOOKING_EXTRAS: ExtrasPriceTable = ExtrasPriceTable {
    name: "booking",
    prices: &[
        ("additionalDriver", 550),
        ("childSeat", 350),
        ("gpsNavigation", 400),
        ("wifiHotspot", 460),
        ("roofRack", 300),
    ],
};

/// Table shown by the customer-facing quote widget. The numbers diverge
/// from the booking table for some extras; reconciling them is a product
/// decision, not ours.
pub const QUOTE_EXTRAS: ExtrasPriceTable = ExtrasPriceTable {
    name: "quote",
    prices: &[
        ("additionalDriver", 500),
        ("childSeat", 300),
        ("gpsNavigation", 450),
        ("wifiHotspot", 460),
        ("roofRack", 250),
    ],
};

pub struct PricingService;

impl PricingService {
    /// Chargeable day count for the booking-form path: the difference in
    /// calendar days, floored at 1 so a same-day or inverted range never
    /// yields a zero or negative-day booking.
    pub fn rental_days(pickup_date: NaiveDate, return_date: NaiveDate) -> i64 {
        (return_date - pickup_date).num_days().max(1)
    }

    pub fn coverage_daily_cost(coverage: CoverageTier) -> Decimal {
        match coverage {
            CoverageTier::Full => Decimal::new(FULL_COVERAGE_DAILY_CENTS, 2),
            CoverageTier::Basic => Decimal::ZERO,
        }
    }

    /// Per-day cost of the selected extras under the given price table.
    pub fn extras_daily_cost(
        add_ons: &BTreeMap<String, bool>,
        table: &ExtrasPriceTable,
    ) -> Decimal {
        let cents: i64 = add_ons
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(name, _)| table.daily_cents(name))
            .sum();
        Decimal::new(cents, 2)
    }

    /// Itemized breakdown for the booking-creation path:
    /// total = (base + coverage + extras) * rental_days.
    pub fn compute_breakdown(
        base_daily_rate: Decimal,
        coverage: CoverageTier,
        add_ons: &BTreeMap<String, bool>,
        table: &ExtrasPriceTable,
        rental_days: i64,
    ) -> PricingBreakdown {
        let coverage_cost = Self::coverage_daily_cost(coverage);
        let extras_cost = Self::extras_daily_cost(add_ons, table);
        let total_daily_rate = base_daily_rate + coverage_cost + extras_cost;
        let total_cost = total_daily_rate * Decimal::from(rental_days);

        PricingBreakdown {
            base_daily_rate,
            coverage_cost,
            extras_cost,
            total_daily_rate,
            total_cost,
        }
    }

    /// Calendar-aware quote for the availability path: every date the
    /// vehicle is out, both endpoints included, priced day by day. A
    /// custom override replaces the base rate entirely for its date, so
    /// this never collapses to rate * days when an override intersects
    /// the range.
    pub fn quote_range(
        base_daily_rate: Decimal,
        custom_prices: &[CustomPrice],
        pickup_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Decimal {
        let mut total = Decimal::ZERO;
        let mut day = pickup_date;
        while day <= return_date {
            let rate = custom_prices
                .iter()
                .find(|cp| cp.date == day)
                .map(|cp| cp.price)
                .unwrap_or(base_daily_rate);
            total += rate;
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        total
    }
}
