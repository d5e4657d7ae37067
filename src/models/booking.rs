use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of a booking. Only `Confirmed` and `InProgress`
/// bookings block the vehicle for other reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "in_progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a booking in this status reserves its date range against
    /// new bookings for the same vehicle.
    pub fn blocks_availability(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Legal edges: pending -> confirmed -> in_progress -> completed,
    /// with cancelled reachable from any non-terminal state. Terminal
    /// states accept no further transitions.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, target) {
            (BookingStatus::Pending, BookingStatus::Confirmed) => true,
            (BookingStatus::Confirmed, BookingStatus::InProgress) => true,
            (BookingStatus::InProgress, BookingStatus::Completed) => true,
            (_, BookingStatus::Cancelled) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Customer contact details captured on the booking form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub country_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
}

impl ClientInfo {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Vehicle identity and rate captured at booking time. Later changes to
/// the vehicle record do not alter historical bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub vehicle_id: ObjectId,
    pub name: String,
    pub base_daily_rate: Decimal,
    pub currency: String,
}

/// Damage-waiver level, charged as a flat per-day surcharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageTier {
    Basic,
    Full,
}

impl Default for CoverageTier {
    fn default() -> Self {
        CoverageTier::Basic
    }
}

/// Itemized cost breakdown persisted with the booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub base_daily_rate: Decimal,
    pub coverage_cost: Decimal,
    pub extras_cost: Decimal,
    pub total_daily_rate: Decimal,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub reference: String,
    pub client_info: ClientInfo,
    pub vehicle: VehicleSnapshot,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    pub pickup_location: String,
    pub rental_days: i64,
    pub cdw_coverage: CoverageTier,
    #[serde(default)]
    pub add_ons: BTreeMap<String, bool>,
    pub pricing: PricingBreakdown,
    pub status: BookingStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Booking request payload as the storefront submits it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingInput {
    pub client_info: Option<ClientInfo>,
    pub vehicle_id: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub pickup_location: Option<String>,
    pub rental_days: Option<i64>,
    #[serde(default)]
    pub cdw_coverage: Option<CoverageTier>,
    #[serde(default)]
    pub add_ons: Option<BTreeMap<String, bool>>,
}
