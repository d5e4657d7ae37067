use actix_web::web;

pub mod bookings;
pub mod pricing;
pub mod vehicles;

// Back-office surface. Session checks happen upstream; these handlers
// only see requests the gateway already let through.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/vehicles", web::post().to(vehicles::create_vehicle))
            .route(
                "/bookings/{id}/status",
                web::put().to(bookings::update_status),
            )
            .route(
                "/vehicles/{id}/pricing",
                web::get().to(pricing::get_pricing),
            )
            .route(
                "/vehicles/{id}/pricing",
                web::put().to(pricing::upsert_price),
            )
            .route(
                "/vehicles/{id}/pricing/{date}",
                web::delete().to(pricing::remove_price),
            ),
    );
}
