use actix_web::{web, HttpResponse, Responder};
use chrono::{NaiveDate, Utc};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Client;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::models::vehicle::{CustomPrice, CustomPriceInput, Vehicle};

fn parse_vehicle_id(raw: &str) -> Result<ObjectId, HttpResponse> {
    ObjectId::parse_str(raw).map_err(|_| {
        HttpResponse::BadRequest().json(serde_json::json!({ "error": "Invalid vehicle ID format" }))
    })
}

/// Single-stage pipeline replacing the override for one date: filter
/// out any entry carrying that date and append the new one in the same
/// write. One document update, so concurrent edits for the same date
/// cannot leave two overrides behind, and a failed write leaves the
/// existing override untouched.
fn replace_override_update(custom_price: &CustomPrice) -> Vec<mongodb::bson::Document> {
    let date_str = custom_price.date.to_string();
    let entry = doc! {
        "date": date_str.as_str(),
        "price": custom_price.price.to_string(),
        "label": custom_price.label.as_str(),
        "type": custom_price.price_type.as_str(),
    };

    vec![doc! {
        "$set": {
            "custom_prices": {
                "$concatArrays": [
                    {
                        "$filter": {
                            "input": { "$ifNull": ["$custom_prices", []] },
                            "as": "cp",
                            "cond": { "$ne": ["$$cp.date", date_str.as_str()] },
                        }
                    },
                    [entry],
                ]
            },
            "updated_at": Utc::now().to_rfc3339(),
        }
    }]
}

pub async fn get_pricing(data: web::Data<Arc<Client>>, path: web::Path<String>) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Vehicle> =
        client.database("fleetbook").collection("Vehicles");

    let vehicle_id = match parse_vehicle_id(path.as_str()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match collection.find_one(doc! { "_id": vehicle_id }).await {
        Ok(Some(vehicle)) => HttpResponse::Ok().json(vehicle.custom_prices),
        Ok(None) => HttpResponse::NotFound().body("Vehicle not found"),
        Err(err) => {
            eprintln!("Error fetching vehicle pricing: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch vehicle pricing")
        }
    }
}

/// Add or replace the price override for one calendar date in a single
/// atomic write, so the one-override-per-date invariant holds and the
/// last write for a date wins.
pub async fn upsert_price(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<CustomPriceInput>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Vehicle> =
        client.database("fleetbook").collection("Vehicles");

    let vehicle_id = match parse_vehicle_id(path.as_str()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let input = input.into_inner();

    let date = match input
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
    {
        Some(Ok(date)) => date,
        Some(Err(_)) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Invalid date: expected YYYY-MM-DD" }));
        }
        None => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Missing required field: date" }));
        }
    };

    let price = match input.price {
        Some(price) if price > Decimal::ZERO => price,
        Some(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Price must be greater than zero" }));
        }
        None => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Missing required field: price" }));
        }
    };

    let custom_price = CustomPrice {
        date,
        price,
        label: input.label.unwrap_or_default(),
        price_type: input.price_type.unwrap_or_else(|| "custom".to_string()),
    };

    let update = replace_override_update(&custom_price);

    match collection.update_one(doc! { "_id": vehicle_id }, update).await {
        Ok(result) => {
            if result.matched_count == 0 {
                return HttpResponse::NotFound().body("Vehicle not found");
            }
            HttpResponse::Ok().json(custom_price)
        }
        Err(err) => {
            eprintln!("Error adding price override: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to update vehicle pricing")
        }
    }
}

pub async fn remove_price(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Vehicle> =
        client.database("fleetbook").collection("Vehicles");

    let (vehicle_id_raw, date_raw) = path.into_inner();
    let vehicle_id = match parse_vehicle_id(&vehicle_id_raw) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let date = match NaiveDate::parse_from_str(date_raw.trim(), "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": "Invalid date: expected YYYY-MM-DD" }));
        }
    };

    let update = doc! {
        "$pull": { "custom_prices": { "date": date.to_string() } },
        "$set": { "updated_at": Utc::now().to_rfc3339() },
    };

    match collection.update_one(doc! { "_id": vehicle_id }, update).await {
        Ok(result) => {
            if result.matched_count == 0 {
                return HttpResponse::NotFound().body("Vehicle not found");
            }
            HttpResponse::Ok().body("Price override removed")
        }
        Err(err) => {
            eprintln!("Error removing price override: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to update vehicle pricing")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_replacement_is_one_atomic_write() {
        let custom_price = CustomPrice {
            date: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
            price: Decimal::new(12000, 2),
            label: "Holiday".to_string(),
            price_type: "custom".to_string(),
        };

        let stages = replace_override_update(&custom_price);
        assert_eq!(stages.len(), 1, "replacement must be a single update stage");

        let set = stages[0].get_document("$set").unwrap();
        let concat = set
            .get_document("custom_prices")
            .unwrap()
            .get_array("$concatArrays")
            .unwrap();
        assert_eq!(concat.len(), 2);

        // The same write drops any existing entry for the date...
        let filter = concat[0]
            .as_document()
            .unwrap()
            .get_document("$filter")
            .unwrap();
        let cond = filter.get_document("cond").unwrap().get_array("$ne").unwrap();
        assert_eq!(cond[1].as_str(), Some("2024-07-04"));

        // ...and appends the replacement.
        let appended = concat[1].as_array().unwrap()[0].as_document().unwrap();
        assert_eq!(appended.get_str("date").unwrap(), "2024-07-04");
        assert_eq!(appended.get_str("price").unwrap(), "120.00");
        assert_eq!(appended.get_str("label").unwrap(), "Holiday");
        assert_eq!(appended.get_str("type").unwrap(), "custom");
    }
}
