//! In-memory transit backend used by the client's tests and for local demos.
//!
//! Every route lives under `/api`, matching the production base URL layout.

pub mod db;
pub mod error;
mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};

use db::{Db, Store};
use handlers::*;

pub fn router(db: Db) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/buses", get(list_buses).post(create_bus))
        .route("/buses/{id}/seats", get(bus_seats))
        .route("/buses/{id}/update-location", post(update_bus_location))
        .route("/buses/{id}/announcements", get(bus_announcements))
        .route("/seats/{id}/reserve", post(reserve_seat))
        .route("/seats/{id}/cancel", post(cancel_seat))
        .route("/bookings", post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/confirm", post(confirm_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/payments", post(create_payment))
        .route("/wallet/{id}", get(wallet_balance))
        .route("/wallet/{id}/add-money", post(add_money))
        .route("/wallet/{id}/transactions", get(wallet_transactions))
        .route("/gps/buses/active/locations", get(active_bus_locations))
        .route("/gps/buses/{id}/log", post(log_gps))
        .route("/gps/buses/{id}/latest", get(latest_gps))
        .route("/gps/buses/{id}/history", get(gps_history))
        .route("/gps/buses/{id}/route-stops", get(route_stops))
        .route("/gps/buses/{id}/route-stops/{stop_id}/arrive", post(mark_stop_arrival))
        .route("/gps/buses/{id}/calculate-eta", get(calculate_eta))
        .route("/next-stop", post(next_stop))
        .route("/statistics/dashboard", get(dashboard_stats))
        .route("/emergencies", get(active_emergencies).post(report_emergency))
        .route("/emergencies/{id}/resolve", post(resolve_emergency))
        .route("/lost-items", get(lost_items).post(report_lost_item))
        .route("/lost-items/{id}/mark-found", post(mark_item_found))
        .route("/lost-items/{id}/claim", post(claim_item))
        .route("/wakeup-alerts", post(create_wakeup_alert))
        .route("/users/{id}/wakeup-alerts", get(user_wakeup_alerts))
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/admin/buses/manage", get(admin_buses))
        .route("/admin/buses/{id}/status", put(update_bus_status))
        .route("/admin/users/manage", get(admin_users))
        .route("/admin/payments/manage", get(admin_payments))
        .route("/admin/analytics/revenue", get(revenue_analytics))
        .route("/admin/analytics/bookings", get(booking_analytics))
        .route("/admin/reports/daily", post(daily_report))
        .route("/admin/logs", get(admin_logs))
        .with_state(db);
    Router::new().nest("/api", api)
}

/// An empty backend.
pub fn app() -> Router {
    router(Arc::new(RwLock::new(Store::default())))
}

/// A backend preloaded with [`Store::seeded`] demo data.
pub fn seeded_app() -> Router {
    router(Arc::new(RwLock::new(Store::seeded())))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_seeded(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, seeded_app()).await
}
