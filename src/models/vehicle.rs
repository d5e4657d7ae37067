use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Admin-set price for one vehicle on one calendar date, replacing the
/// base daily rate for that date. At most one override exists per date;
/// a later write for the same date replaces the earlier one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPrice {
    pub date: NaiveDate,
    pub price: Decimal,
    pub label: String,
    #[serde(rename = "type")]
    pub price_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub base_daily_rate: Decimal,
    pub currency: String,
    #[serde(default)]
    pub custom_prices: Vec<CustomPrice>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Vehicle {
    /// Effective daily rate for one calendar date: the custom override
    /// if one exists, otherwise the base rate. Overrides are never
    /// blended with the base rate.
    pub fn rate_for_date(&self, date: NaiveDate) -> Decimal {
        self.custom_prices
            .iter()
            .find(|cp| cp.date == date)
            .map(|cp| cp.price)
            .unwrap_or(self.base_daily_rate)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInput {
    pub name: Option<String>,
    pub base_daily_rate: Option<Decimal>,
    pub currency: Option<String>,
}

/// Calendar pricing edit payload; the date arrives as a `YYYY-MM-DD`
/// string from the admin calendar widget.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomPriceInput {
    pub date: Option<String>,
    pub price: Option<Decimal>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub price_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle_with_override(date: NaiveDate, price: Decimal) -> Vehicle {
        Vehicle {
            id: None,
            name: "Compact".to_string(),
            base_daily_rate: Decimal::new(8000, 2),
            currency: "EUR".to_string(),
            custom_prices: vec![CustomPrice {
                date,
                price,
                label: "Holiday".to_string(),
                price_type: "custom".to_string(),
            }],
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_override_wins_over_base_rate() {
        let holiday = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        let vehicle = vehicle_with_override(holiday, Decimal::new(12000, 2));

        assert_eq!(vehicle.rate_for_date(holiday), Decimal::new(12000, 2));
        assert_eq!(
            vehicle.rate_for_date(NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()),
            Decimal::new(8000, 2)
        );
    }
}
