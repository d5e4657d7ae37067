use actix_web::{web, HttpResponse, Responder};
use bson::doc;
use futures::TryStreamExt;
use mongodb::Client;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::booking::{Booking, BookingInput};
use crate::services::booking_service::{self, BookingError, VehicleLocks};

pub fn error_response(err: BookingError) -> HttpResponse {
    match err {
        BookingError::Validation(msg) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": msg }))
        }
        BookingError::VehicleNotFound(id) => HttpResponse::NotFound()
            .json(serde_json::json!({ "error": format!("Vehicle not found: {}", id) })),
        BookingError::DateConflict(conflicts) => HttpResponse::Conflict().json(serde_json::json!({
            "error": "Vehicle is not available for the selected dates",
            "message": format!("{} conflicting booking(s) found", conflicts.len()),
            "conflicts": conflicts,
        })),
        BookingError::Database(msg) => {
            eprintln!("Database error while handling booking: {}", msg);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Failed to process booking" }))
        }
        BookingError::ReferenceExhausted => HttpResponse::InternalServerError()
            .json(serde_json::json!({ "error": "Could not generate a unique booking reference" })),
    }
}

pub async fn create_booking(
    data: web::Data<Arc<Client>>,
    locks: web::Data<VehicleLocks>,
    input: web::Json<BookingInput>,
) -> impl Responder {
    let client = data.into_inner();

    match booking_service::create_booking(&client, &locks, input.into_inner()).await {
        Ok(booking) => HttpResponse::Created().json(booking),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub email: Option<String>,
    pub reference: Option<String>,
}

/// Self-service lookup: bookings for a customer email, optionally
/// narrowed to a single reference, newest first.
pub async fn get_bookings(
    data: web::Data<Arc<Client>>,
    query: web::Query<BookingQuery>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Booking> =
        client.database("fleetbook").collection("Bookings");

    let email = match query.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Missing required field: email" }));
        }
    };

    let mut filter = doc! { "client_info.email": email.as_str() };
    if let Some(reference) = query.reference.as_deref().map(str::trim) {
        if !reference.is_empty() {
            filter.insert("reference", reference);
        }
    }

    match collection.find(filter).sort(doc! { "created_at": -1 }).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Booking>>().await {
            Ok(bookings) => HttpResponse::Ok().json(bookings),
            Err(err) => {
                eprintln!("Error retrieving bookings: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to retrieve bookings")
            }
        },
        Err(err) => {
            eprintln!("Error fetching bookings: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch bookings")
        }
    }
}
