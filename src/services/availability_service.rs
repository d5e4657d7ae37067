use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Client;
use serde::Serialize;

use crate::models::booking::Booking;

/// One existing booking standing in the way of a candidate date range,
/// shaped for display on the storefront's conflict message.
#[derive(Debug, Clone, Serialize)]
pub struct BookingConflict {
    pub reference: String,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    pub customer_name: String,
}

pub struct AvailabilityService;

impl AvailabilityService {
    /// Closed-interval overlap. Bookings that merely touch at a boundary
    /// date count as conflicting: the vehicle cannot turn over to a new
    /// customer on the same calendar day it comes back.
    pub fn ranges_overlap(
        candidate_start: NaiveDate,
        candidate_end: NaiveDate,
        existing_start: NaiveDate,
        existing_end: NaiveDate,
    ) -> bool {
        candidate_start <= existing_end && candidate_end >= existing_start
    }

    /// All bookings blocking the candidate range for one vehicle. Only
    /// `confirmed` and `in_progress` bookings reserve their dates;
    /// pending, completed and cancelled ones do not. A vehicle with no
    /// bookings at all is trivially available.
    ///
    /// Dates persist as ISO `YYYY-MM-DD` strings, so the range operators
    /// below compare them correctly without any time-of-day component.
    pub async fn find_conflicts(
        client: &Client,
        vehicle_id: ObjectId,
        pickup_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Result<Vec<BookingConflict>, mongodb::error::Error> {
        let collection: mongodb::Collection<Booking> =
            client.database("fleetbook").collection("Bookings");

        let filter = doc! {
            "vehicle.vehicle_id": vehicle_id,
            "status": { "$in": ["confirmed", "in_progress"] },
            "pickup_date": { "$lte": return_date.to_string() },
            "return_date": { "$gte": pickup_date.to_string() },
        };

        let bookings = collection.find(filter).await?.try_collect::<Vec<Booking>>().await?;

        Ok(bookings
            .into_iter()
            .map(|booking| BookingConflict {
                reference: booking.reference,
                pickup_date: booking.pickup_date,
                return_date: booking.return_date,
                customer_name: booking.client_info.display_name(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_disjoint_ranges_do_not_overlap() {
        assert!(!AvailabilityService::ranges_overlap(
            date(2024, 6, 1),
            date(2024, 6, 5),
            date(2024, 6, 10),
            date(2024, 6, 15),
        ));
        assert!(!AvailabilityService::ranges_overlap(
            date(2024, 6, 20),
            date(2024, 6, 25),
            date(2024, 6, 10),
            date(2024, 6, 15),
        ));
    }

    #[test]
    fn test_boundary_touch_counts_as_conflict() {
        // Existing booking 2024-06-10 -> 2024-06-15; a request starting
        // on the return day is rejected (no same-day turnover).
        assert!(AvailabilityService::ranges_overlap(
            date(2024, 6, 15),
            date(2024, 6, 18),
            date(2024, 6, 10),
            date(2024, 6, 15),
        ));
        assert!(AvailabilityService::ranges_overlap(
            date(2024, 6, 5),
            date(2024, 6, 10),
            date(2024, 6, 10),
            date(2024, 6, 15),
        ));
    }

    #[test]
    fn test_candidate_start_inside_existing() {
        assert!(AvailabilityService::ranges_overlap(
            date(2024, 6, 12),
            date(2024, 6, 20),
            date(2024, 6, 10),
            date(2024, 6, 15),
        ));
    }

    #[test]
    fn test_candidate_end_inside_existing() {
        assert!(AvailabilityService::ranges_overlap(
            date(2024, 6, 5),
            date(2024, 6, 12),
            date(2024, 6, 10),
            date(2024, 6, 15),
        ));
    }

    #[test]
    fn test_candidate_contains_existing() {
        assert!(AvailabilityService::ranges_overlap(
            date(2024, 6, 1),
            date(2024, 6, 30),
            date(2024, 6, 10),
            date(2024, 6, 15),
        ));
    }

    #[test]
    fn test_existing_contains_candidate() {
        assert!(AvailabilityService::ranges_overlap(
            date(2024, 6, 11),
            date(2024, 6, 14),
            date(2024, 6, 10),
            date(2024, 6, 15),
        ));
    }
}
