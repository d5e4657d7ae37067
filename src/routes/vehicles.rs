use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Client;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::vehicle::Vehicle;
use crate::services::availability_service::AvailabilityService;
use crate::services::pricing_service::PricingService;

pub async fn get_vehicle(data: web::Data<Arc<Client>>, path: web::Path<String>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Vehicle> =
        client.database("fleetbook").collection("Vehicles");

    let vehicle_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Invalid vehicle ID format" }));
        }
    };

    match collection.find_one(doc! { "_id": vehicle_id }).await {
        Ok(Some(vehicle)) => HttpResponse::Ok().json(vehicle),
        Ok(None) => HttpResponse::NotFound().body("Vehicle not found"),
        Err(err) => {
            eprintln!("Error fetching vehicle: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch vehicle")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub pickup_date: Option<String>,
    pub return_date: Option<String>,
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, HttpResponse> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
        HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": format!("Missing required field: {}", field) }))
    })?;

    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Invalid date for {}: expected YYYY-MM-DD", field)
        }))
    })
}

/// Availability check plus a calendar-aware quote for the range. The
/// quote resolves each day against the vehicle's custom price
/// overrides, so holiday pricing shows up before the customer commits.
pub async fn check_availability(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    query: web::Query<AvailabilityQuery>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Vehicle> =
        client.database("fleetbook").collection("Vehicles");

    let vehicle_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Invalid vehicle ID format" }));
        }
    };

    let pickup_date = match parse_date(query.pickup_date.as_deref(), "pickup_date") {
        Ok(date) => date,
        Err(resp) => return resp,
    };
    let return_date = match parse_date(query.return_date.as_deref(), "return_date") {
        Ok(date) => date,
        Err(resp) => return resp,
    };

    if return_date < pickup_date {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "return_date must not be before pickup_date"
        }));
    }

    let vehicle = match collection.find_one(doc! { "_id": vehicle_id }).await {
        Ok(Some(vehicle)) => vehicle,
        Ok(None) => return HttpResponse::NotFound().body("Vehicle not found"),
        Err(err) => {
            eprintln!("Error fetching vehicle: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch vehicle");
        }
    };

    let conflicts =
        match AvailabilityService::find_conflicts(&client, vehicle_id, pickup_date, return_date)
            .await
        {
            Ok(conflicts) => conflicts,
            Err(err) => {
                eprintln!("Error checking availability: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to check availability");
            }
        };

    let quote_total = PricingService::quote_range(
        vehicle.base_daily_rate,
        &vehicle.custom_prices,
        pickup_date,
        return_date,
    );

    HttpResponse::Ok().json(serde_json::json!({
        "available": conflicts.is_empty(),
        "conflicts": conflicts,
        "quote": {
            "currency": vehicle.currency,
            "pickup_date": pickup_date,
            "return_date": return_date,
            "total": quote_total,
        },
    }))
}
