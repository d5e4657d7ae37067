use actix_web::{web, HttpResponse, Responder};
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use mongodb::Client;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::booking::{Booking, BookingStatus};

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

/// Lifecycle transition from the admin booking screen. Moving a booking
/// into or out of `confirmed`/`in_progress` changes what future
/// availability checks see for that vehicle.
pub async fn update_status(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<StatusUpdate>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Booking> =
        client.database("fleetbook").collection("Bookings");

    let target = match input.status.as_deref().and_then(BookingStatus::parse) {
        Some(status) => status,
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid status: expected one of pending, confirmed, in_progress, completed, cancelled"
            }));
        }
    };

    let booking_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Invalid booking ID format" }));
        }
    };

    let booking = match collection.find_one(doc! { "_id": booking_id }).await {
        Ok(Some(booking)) => booking,
        Ok(None) => return HttpResponse::NotFound().body("Booking not found"),
        Err(err) => {
            eprintln!("Error fetching booking: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch booking");
        }
    };

    if !booking.status.can_transition_to(target) {
        return HttpResponse::Conflict().json(serde_json::json!({
            "error": format!(
                "Cannot move booking {} from {} to {}",
                booking.reference, booking.status, target
            )
        }));
    }

    let update = doc! {
        "$set": {
            "status": target.as_str(),
            "updated_at": Utc::now().to_rfc3339(),
        }
    };

    // The filter pins the status this handler just checked, so a
    // concurrent transition that got there first makes this write match
    // nothing instead of overwriting it.
    match collection
        .update_one(transition_filter(booking_id, booking.status), update)
        .await
    {
        Ok(result) => {
            if result.matched_count == 0 {
                return HttpResponse::Conflict().json(serde_json::json!({
                    "error": format!(
                        "Booking {} was updated by someone else, reload and retry",
                        booking.reference
                    )
                }));
            }
            HttpResponse::Ok().json(serde_json::json!({
                "reference": booking.reference,
                "status": target.as_str(),
            }))
        }
        Err(err) => {
            eprintln!("Error updating booking status: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to update booking status")
        }
    }
}

fn transition_filter(booking_id: ObjectId, observed: BookingStatus) -> bson::Document {
    doc! { "_id": booking_id, "status": observed.as_str() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_update_is_conditional_on_observed_status() {
        let booking_id = ObjectId::new();
        let filter = transition_filter(booking_id, BookingStatus::Confirmed);

        assert_eq!(filter.get_object_id("_id").unwrap(), booking_id);
        assert_eq!(
            filter.get_str("status").unwrap(),
            "confirmed",
            "the write must only match the status the guard check saw"
        );
    }
}
