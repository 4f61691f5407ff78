use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;

use crate::config::{create_cors_layer, with_security_headers};
use crate::handlers::{bookings, health_check, pricing, tickets};

pub fn create_routes(pool: PgPool) -> Router {
    let api = Router::new()
        .route(
            "/bookings",
            post(bookings::create_booking).get(bookings::list_bookings),
        )
        .route(
            "/bookings/:id",
            get(bookings::get_booking).patch(bookings::update_booking),
        )
        .route("/tickets", get(tickets::list_tickets))
        .route("/pricing/current-price/:event_id", get(pricing::current_price))
        .route(
            "/pricing/tiers/:event_id",
            get(pricing::list_tiers).post(pricing::create_tier),
        )
        .route(
            "/pricing/tiers/:event_id/defaults",
            post(pricing::create_default_tiers),
        )
        .route("/pricing/history/:event_id", get(pricing::price_history));

    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(create_cors_layer())
        .with_state(pool);

    with_security_headers(router)
}
