use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use mongodb::Client;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

use crate::models::booking::{Booking, BookingInput, BookingStatus, ClientInfo, VehicleSnapshot};
use crate::models::vehicle::Vehicle;
use crate::services::availability_service::{AvailabilityService, BookingConflict};
use crate::services::pricing_service::{PricingService, BOOKING_EXTRAS};
use crate::services::reference_service;

/// How many fresh references to try when the unique index on
/// `reference` rejects an insert before giving up.
const MAX_REFERENCE_ATTEMPTS: usize = 5;

#[derive(Debug)]
pub enum BookingError {
    /// Missing or malformed input; the message names the field.
    Validation(String),
    VehicleNotFound(String),
    /// Candidate range overlaps existing active bookings.
    DateConflict(Vec<BookingConflict>),
    Database(String),
    /// Every generated reference collided with an existing booking.
    ReferenceExhausted,
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::Validation(msg) => write!(f, "Validation error: {}", msg),
            BookingError::VehicleNotFound(id) => write!(f, "Vehicle not found: {}", id),
            BookingError::DateConflict(conflicts) => write!(
                f,
                "Vehicle is not available: {} conflicting booking(s) found",
                conflicts.len()
            ),
            BookingError::Database(msg) => write!(f, "Database error: {}", msg),
            BookingError::ReferenceExhausted => {
                write!(f, "Could not generate a unique booking reference")
            }
        }
    }
}

impl std::error::Error for BookingError {}

/// One async mutex per vehicle id. Holding the vehicle's lock across
/// the availability check and the insert closes the window where two
/// overlapping requests both see "available" and both write.
#[derive(Default)]
pub struct VehicleLocks {
    inner: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl VehicleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, vehicle_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap();
        // Entries nobody holds anymore can be dropped; whoever asks next
        // gets a fresh mutex. Keeps the map from growing unboundedly.
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        map.entry(vehicle_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Status assigned to freshly created bookings. The storefront goes
/// straight to `confirmed`; deployments that want an approval step set
/// BOOKING_INITIAL_STATUS=pending.
pub fn initial_status() -> BookingStatus {
    std::env::var("BOOKING_INITIAL_STATUS")
        .ok()
        .and_then(|value| BookingStatus::parse(&value))
        .unwrap_or(BookingStatus::Confirmed)
}

fn require_text(value: &Option<String>, field: &str) -> Result<String, BookingError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(BookingError::Validation(format!(
            "Missing required field: {}",
            field
        ))),
    }
}

fn is_valid_email(email: &str) -> bool {
    let re = regex::Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
    );
    re.unwrap().is_match(email)
}

fn validate_client_info(client_info: &Option<ClientInfo>) -> Result<ClientInfo, BookingError> {
    let info = client_info.as_ref().ok_or_else(|| {
        BookingError::Validation("Missing required field: clientInfo".to_string())
    })?;

    let checks = [
        (&info.first_name, "clientInfo.firstName"),
        (&info.last_name, "clientInfo.lastName"),
        (&info.email, "clientInfo.email"),
        (&info.phone_number, "clientInfo.phoneNumber"),
        (&info.country_code, "clientInfo.countryCode"),
    ];
    for (value, field) in checks {
        if value.trim().is_empty() {
            return Err(BookingError::Validation(format!(
                "Missing required field: {}",
                field
            )));
        }
    }

    if !is_valid_email(&info.email) {
        return Err(BookingError::Validation(
            "Invalid email address: clientInfo.email".to_string(),
        ));
    }

    Ok(info.clone())
}

/// The full booking-creation flow: validate, resolve the vehicle, check
/// availability, price, stamp a reference and persist. The whole
/// check-then-insert section runs under the vehicle's lock so two
/// overlapping requests cannot both pass the availability check.
pub async fn create_booking(
    client: &Client,
    locks: &VehicleLocks,
    input: BookingInput,
) -> Result<Booking, BookingError> {
    let client_info = validate_client_info(&input.client_info)?;
    let vehicle_id_raw = require_text(&input.vehicle_id, "vehicleId")?;
    let pickup_date = input
        .pickup_date
        .ok_or_else(|| BookingError::Validation("Missing required field: pickupDate".to_string()))?;
    let return_date = input
        .return_date
        .ok_or_else(|| BookingError::Validation("Missing required field: returnDate".to_string()))?;
    let pickup_location = require_text(&input.pickup_location, "pickupLocation")?;
    if input.rental_days.is_none() {
        return Err(BookingError::Validation(
            "Missing required field: rentalDays".to_string(),
        ));
    }

    let vehicle_id = ObjectId::parse_str(&vehicle_id_raw)
        .map_err(|_| BookingError::Validation("Invalid vehicleId format".to_string()))?;

    let coverage = input.cdw_coverage.unwrap_or_default();
    let add_ons: BTreeMap<String, bool> = input.add_ons.unwrap_or_default();

    // Client-side day counts are untrusted; recompute from the range.
    let rental_days = PricingService::rental_days(pickup_date, return_date);

    let vehicles: mongodb::Collection<Vehicle> =
        client.database("fleetbook").collection("Vehicles");
    let bookings: mongodb::Collection<Booking> =
        client.database("fleetbook").collection("Bookings");

    // Resolve the vehicle before taking its lock: existence is not part
    // of the race being guarded, and unknown ids must not leave lock
    // entries behind.
    let vehicle = vehicles
        .find_one(mongodb::bson::doc! { "_id": vehicle_id })
        .await
        .map_err(|err| BookingError::Database(err.to_string()))?
        .ok_or_else(|| BookingError::VehicleNotFound(vehicle_id_raw.clone()))?;

    let vehicle_lock = locks.lock_for(&vehicle_id_raw);
    let _guard = vehicle_lock.lock().await;

    let conflicts =
        AvailabilityService::find_conflicts(client, vehicle_id, pickup_date, return_date)
            .await
            .map_err(|err| BookingError::Database(err.to_string()))?;
    if !conflicts.is_empty() {
        return Err(BookingError::DateConflict(conflicts));
    }

    let pricing = PricingService::compute_breakdown(
        vehicle.base_daily_rate,
        coverage,
        &add_ons,
        &BOOKING_EXTRAS,
        rental_days,
    );

    let now = Utc::now();
    let mut booking = Booking {
        id: None,
        reference: String::new(),
        client_info,
        vehicle: VehicleSnapshot {
            vehicle_id,
            name: vehicle.name.clone(),
            base_daily_rate: vehicle.base_daily_rate,
            currency: vehicle.currency.clone(),
        },
        pickup_date,
        return_date,
        pickup_location,
        rental_days,
        cdw_coverage: coverage,
        add_ons,
        pricing,
        status: initial_status(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    // The unique index on `reference` is the real uniqueness guarantee;
    // on a duplicate-key rejection we mint a new reference and retry.
    for _attempt in 0..MAX_REFERENCE_ATTEMPTS {
        booking.reference = reference_service::generate_reference();

        match bookings.insert_one(&booking).await {
            Ok(result) => {
                booking.id = result.inserted_id.as_object_id();
                return Ok(booking);
            }
            Err(err) if is_duplicate_key(&err) => {
                log::warn!(
                    "Booking reference {} collided, regenerating",
                    booking.reference
                );
                continue;
            }
            Err(err) => return Err(BookingError::Database(err.to_string())),
        }
    }

    Err(BookingError::ReferenceExhausted)
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(write_err)) => {
            write_err.code == 11000
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn client_info() -> ClientInfo {
        ClientInfo {
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            email: "ana@example.com".to_string(),
            phone_number: "912345678".to_string(),
            country_code: "+351".to_string(),
            company: None,
            flight_number: None,
            promo_code: None,
        }
    }

    #[test]
    fn test_client_info_validation_names_the_field() {
        let err = validate_client_info(&None).unwrap_err();
        assert!(err.to_string().contains("clientInfo"));

        let mut info = client_info();
        info.phone_number = "  ".to_string();
        let err = validate_client_info(&Some(info)).unwrap_err();
        assert!(err.to_string().contains("clientInfo.phoneNumber"));
    }

    #[test]
    fn test_malformed_email_is_rejected() {
        let mut info = client_info();
        info.email = "not-an-email".to_string();
        let err = validate_client_info(&Some(info)).unwrap_err();
        assert!(err.to_string().contains("clientInfo.email"));

        assert!(is_valid_email("ana@example.com"));
        assert!(!is_valid_email("ana@"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_lock_registry_hands_out_one_lock_per_vehicle() {
        let locks = VehicleLocks::new();
        let a = locks.lock_for("v1");
        let b = locks.lock_for("v1");
        let c = locks.lock_for("v2");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_lock_registry_prunes_released_entries() {
        let locks = VehicleLocks::new();
        let held = locks.lock_for("v1");
        let released = locks.lock_for("v2");
        drop(released);

        let _other = locks.lock_for("v3");

        let map = locks.inner.lock().unwrap();
        assert!(map.contains_key("v1"), "held entries survive");
        assert!(!map.contains_key("v2"), "released entries are pruned");
        assert!(map.contains_key("v3"));
        drop(map);
        drop(held);
    }

    /// Two concurrent overlapping requests against a shared store: the
    /// per-vehicle lock serializes check-then-insert, so exactly one
    /// can win.
    #[test]
    fn test_overlapping_attempts_only_one_succeeds() {
        tokio_test::block_on(overlapping_attempts());
    }

    async fn overlapping_attempts() {
        let locks = Arc::new(VehicleLocks::new());
        let store: Arc<StdMutex<Vec<(NaiveDate, NaiveDate)>>> =
            Arc::new(StdMutex::new(Vec::new()));

        let pickup = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let ret = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        let attempt = |locks: Arc<VehicleLocks>,
                       store: Arc<StdMutex<Vec<(NaiveDate, NaiveDate)>>>| async move {
            let lock = locks.lock_for("v1");
            let _guard = lock.lock().await;

            let conflict = store
                .lock()
                .unwrap()
                .iter()
                .any(|(start, end)| pickup <= *end && ret >= *start);
            if conflict {
                return false;
            }
            store.lock().unwrap().push((pickup, ret));
            true
        };

        let (first, second) = futures::join!(
            attempt(locks.clone(), store.clone()),
            attempt(locks.clone(), store.clone())
        );

        assert_eq!(
            first as u32 + second as u32,
            1,
            "exactly one overlapping attempt may succeed"
        );
        assert_eq!(store.lock().unwrap().len(), 1);
    }

    #[test]
    #[serial_test::serial]
    fn test_initial_status_defaults_to_confirmed() {
        std::env::remove_var("BOOKING_INITIAL_STATUS");
        assert_eq!(initial_status(), BookingStatus::Confirmed);
    }

    #[test]
    #[serial_test::serial]
    fn test_initial_status_honors_configuration() {
        std::env::set_var("BOOKING_INITIAL_STATUS", "pending");
        assert_eq!(initial_status(), BookingStatus::Pending);
        std::env::remove_var("BOOKING_INITIAL_STATUS");
    }
}
