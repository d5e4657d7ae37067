use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use mongodb::Client;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::models::vehicle::{Vehicle, VehicleInput};

pub async fn create_vehicle(
    data: web::Data<Arc<Client>>,
    input: web::Json<VehicleInput>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Vehicle> =
        client.database("fleetbook").collection("Vehicles");

    let input = input.into_inner();

    let name = match input.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Missing required field: name" }));
        }
    };

    let base_daily_rate = match input.base_daily_rate {
        Some(rate) if rate > Decimal::ZERO => rate,
        Some(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "baseDailyRate must be greater than zero" }));
        }
        None => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Missing required field: baseDailyRate" }));
        }
    };

    let now = Utc::now();
    let mut vehicle = Vehicle {
        id: None,
        name,
        base_daily_rate,
        currency: input.currency.unwrap_or_else(|| "EUR".to_string()),
        custom_prices: Vec::new(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    match collection.insert_one(&vehicle).await {
        Ok(result) => {
            vehicle.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(vehicle)
        }
        Err(err) => {
            eprintln!("Error creating vehicle: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to create vehicle")
        }
    }
}
