//! Client core for the bus transit platform.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The host supplies a
//! [`Transport`] to run the round-trip; [`ApiClient`] adds the request
//! timeout on top. Feature managers cache the last server response per
//! feature area, [`gps::GpsTracker`] drives live tracking, and
//! [`pages::Navigator`] decides which page and loader run.
//!
//! # Design
//! - `TransitClient` holds the base URL and the session credentials; each
//!   endpoint is a `build_*` method returning a typed [`Call`].
//! - Traits sit at every host seam: [`Transport`], [`SessionStorage`],
//!   [`gps::Geolocation`], [`gps::Announcer`] and [`pages::PageLoader`].
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod gps;
pub mod http;
pub mod managers;
pub mod pages;
pub mod storage;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{Call, Credentials, TransitClient};
pub use config::ApiConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use managers::{
    AdminManager, AuthManager, BookingManager, BusManager, DashboardManager, FleetManager, WalletManager,
};
pub use storage::{MemoryStorage, SessionStorage};
pub use transport::{ApiClient, Transport};
