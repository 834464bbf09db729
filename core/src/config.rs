//! API configuration: base URL, request timeout and endpoint templates.
//!
//! Templates use `:name` placeholders which [`fill_template`] replaces.

use std::time::Duration;

use log::{info, warn};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

pub const BASE_URL_VAR: &str = "TRANSIT_API_URL";
pub const TIMEOUT_VAR: &str = "TRANSIT_API_TIMEOUT_MS";

/// Endpoint templates relative to the base URL.
pub mod endpoints {
    pub const AUTH_REGISTER: &str = "/auth/register";
    pub const AUTH_LOGIN: &str = "/auth/login";

    pub const BUSES: &str = "/buses";
    pub const BUS_SEATS: &str = "/buses/:busId/seats";
    pub const BUS_UPDATE_LOCATION: &str = "/buses/:busId/update-location";
    pub const BUS_ANNOUNCEMENTS: &str = "/buses/:busId/announcements";

    pub const SEAT_RESERVE: &str = "/seats/:seatId/reserve";
    pub const SEAT_CANCEL: &str = "/seats/:seatId/cancel";

    pub const BOOKINGS: &str = "/bookings";
    pub const BOOKING: &str = "/bookings/:bookingId";
    pub const BOOKING_CONFIRM: &str = "/bookings/:bookingId/confirm";
    pub const BOOKING_CANCEL: &str = "/bookings/:bookingId/cancel";

    pub const PAYMENTS: &str = "/payments";

    pub const WALLET: &str = "/wallet/:userId";
    pub const WALLET_ADD_MONEY: &str = "/wallet/:userId/add-money";
    pub const WALLET_TRANSACTIONS: &str = "/wallet/:userId/transactions";

    pub const GPS_LOG: &str = "/gps/buses/:busId/log";
    pub const GPS_LATEST: &str = "/gps/buses/:busId/latest";
    pub const GPS_HISTORY: &str = "/gps/buses/:busId/history";
    pub const GPS_ACTIVE: &str = "/gps/buses/active/locations";
    pub const GPS_ROUTE_STOPS: &str = "/gps/buses/:busId/route-stops";
    pub const GPS_STOP_ARRIVE: &str = "/gps/buses/:busId/route-stops/:stopId/arrive";
    pub const GPS_ETA: &str = "/gps/buses/:busId/calculate-eta";
    pub const NEXT_STOP: &str = "/next-stop";

    pub const STATISTICS_DASHBOARD: &str = "/statistics/dashboard";

    pub const EMERGENCIES: &str = "/emergencies";
    pub const EMERGENCY_RESOLVE: &str = "/emergencies/:emergencyId/resolve";

    pub const LOST_ITEMS: &str = "/lost-items";
    pub const LOST_ITEM_MARK_FOUND: &str = "/lost-items/:itemId/mark-found";
    pub const LOST_ITEM_CLAIM: &str = "/lost-items/:itemId/claim";

    pub const WAKEUP_ALERTS: &str = "/wakeup-alerts";
    pub const USER_WAKEUP_ALERTS: &str = "/users/:userId/wakeup-alerts";

    pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";
    pub const ADMIN_BUSES: &str = "/admin/buses/manage";
    pub const ADMIN_BUS_STATUS: &str = "/admin/buses/:busId/status";
    pub const ADMIN_USERS: &str = "/admin/users/manage";
    pub const ADMIN_PAYMENTS: &str = "/admin/payments/manage";
    pub const ADMIN_REVENUE: &str = "/admin/analytics/revenue";
    pub const ADMIN_BOOKING_ANALYTICS: &str = "/admin/analytics/bookings";
    pub const ADMIN_DAILY_REPORT: &str = "/admin/reports/daily";
    pub const ADMIN_LOGS: &str = "/admin/logs";
}

/// Where the API lives and how long a call may take.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `TRANSIT_API_URL` and `TRANSIT_API_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        match lookup(BASE_URL_VAR) {
            Some(url) if !url.trim().is_empty() => config.base_url = url.trim().to_string(),
            Some(_) => warn!("{BASE_URL_VAR} is empty, using default: {DEFAULT_BASE_URL}"),
            None => info!("{BASE_URL_VAR} not set, using default: {DEFAULT_BASE_URL}"),
        }

        match lookup(TIMEOUT_VAR).map(|raw| raw.trim().parse::<u64>()) {
            Some(Ok(ms)) if ms > 0 => config.timeout = Duration::from_millis(ms),
            Some(Ok(_)) => warn!("{TIMEOUT_VAR} must be positive, keeping {DEFAULT_TIMEOUT:?}"),
            Some(Err(e)) => warn!("Invalid {TIMEOUT_VAR} value: {e}, keeping {DEFAULT_TIMEOUT:?}"),
            None => info!("{TIMEOUT_VAR} not set, using default: {DEFAULT_TIMEOUT:?}"),
        }

        config
    }
}

/// Replace each `:key` in `template` with its value.
pub fn fill_template(template: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(template.to_string(), |url, (key, value)| {
        url.replace(&format!(":{key}"), value)
    })
}
