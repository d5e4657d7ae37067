use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use fleetbook_api::{db, routes, services::booking_service::VehicleLocks};

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        println!("Release mode");
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);
    println!("Attempting to bind to {}:{}", host, port);

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    println!("Got MongoDB URI, attempting connection...");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;
    println!("MongoDB connection established");

    if let Err(e) = db::mongo::ensure_indexes(&client).await {
        eprintln!("WARNING: Failed to create indexes: {}", e);
        eprintln!("The unique booking reference constraint may not be enforced");
    }

    let vehicle_locks = web::Data::new(VehicleLocks::new());

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .route("/health", web::get().to(routes::health::health_check))
            .app_data(web::Data::new(client.clone()))
            .app_data(vehicle_locks.clone())
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/bookings")
                            .route("", web::post().to(routes::bookings::create_booking))
                            .route("", web::get().to(routes::bookings::get_bookings)),
                    )
                    .service(
                        web::scope("/vehicles")
                            .route("/{id}", web::get().to(routes::vehicles::get_vehicle))
                            .route(
                                "/{id}/availability",
                                web::get().to(routes::vehicles::check_availability),
                            ),
                    )
                    .configure(routes::admin::config),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
