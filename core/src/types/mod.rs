//! Domain DTOs for the transit API.
//!
//! # Design
//! These types mirror the server's JSON but are defined independently of the
//! mock-server crate; the integration tests catch schema drift. Response
//! types default their optional fields so older servers that omit them still
//! parse.

pub mod admin;
pub mod auth;
pub mod booking;
pub mod bus;
pub mod gps;
pub mod safety;
pub mod stats;
pub mod wallet;

use serde::{Deserialize, Serialize};

pub use admin::{
    AdminBus, AdminDashboard, AdminLog, AdminPage, AdminPayment, AdminUser, BookingAnalytics, BusStatus,
    BusStatusUpdate, DailyReport, ReportTotals, ReportedLocation, RevenueAnalytics,
};
pub use auth::{AccountType, Gender, LoginRequest, LoginResponse, RegisterDraft, RegisterRequest, RegisterResponse, User};
pub use booking::{
    Booking, BookingDraft, BookingReceipt, BookingStatus, CancelBooking, CreateBooking, CreatePayment,
    PaymentMethod, PaymentReceipt,
};
pub use bus::{Announcement, Bus, BusPage, CreateBus, CreatedBus, ReserveSeat, Seat, SeatReservation};
pub use gps::{
    ActiveBusLocation, GeoPoint, GpsFix, GpsLog, NextStop, NextStopQuery, NextStopResponse, RouteStop, StopEta,
};
pub use safety::{
    CreateWakeupAlert, Emergency, LostItem, LostItemStatus, MarkFound, ReportEmergency, ReportLostItem,
    WakeupAlert,
};
pub use stats::{DashboardStats, FormattedStats, PaymentStats, UserStats};
pub use wallet::{AddMoney, AddMoneyReceipt, Transaction, TransactionKind, WalletBalance};

pub type UserId = u64;
pub type BusId = u64;
pub type SeatId = u64;
pub type BookingId = u64;

/// Acknowledgement body for endpoints that only report success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Empty JSON object sent to action endpoints (`confirm`, `claim`, ...).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EmptyBody {}

/// Format an amount the way the UI shows rupees: `₹1234.50`.
pub fn format_rupees(amount: f64) -> String {
    format!("₹{amount:.2}")
}
