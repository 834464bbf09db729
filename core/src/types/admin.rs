use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking::default_currency;
use super::{AccountType, BookingId, BusId, Gender, GeoPoint, PaymentMethod, UserId};

/// Body of `GET /admin/dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminDashboard {
    pub buses: FleetSummary,
    pub users: UserSummary,
    pub seats: SeatSummary,
    pub revenue: RevenueSummary,
    pub bookings: BookingSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetSummary {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSummary {
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatSummary {
    pub total: u64,
    pub reserved: u64,
    pub available: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueSummary {
    pub today: f64,
    pub total: f64,
    pub currency: String,
}

impl Default for RevenueSummary {
    fn default() -> Self {
        Self {
            today: 0.0,
            total: 0.0,
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingSummary {
    pub today: u64,
    pub total: u64,
    pub confirmed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusStatus {
    Active,
    Inactive,
    Maintenance,
}

impl BusStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BusStatus::Active => "active",
            BusStatus::Inactive => "inactive",
            BusStatus::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for BusStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BusStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BusStatus::Active),
            "inactive" => Ok(BusStatus::Inactive),
            "maintenance" => Ok(BusStatus::Maintenance),
            other => Err(format!("unknown bus status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusStatusUpdate {
    pub status: BusStatus,
}

/// One page of an admin listing. The server names the list after what it
/// holds (`buses`, `users`, `payments`, `logs`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct AdminPage<T> {
    #[serde(alias = "buses", alias = "users", alias = "payments", alias = "logs", default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub current_page: u64,
}

/// A bus as the fleet manager sees it, whatever its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminBus {
    pub id: BusId,
    pub bus_number: String,
    #[serde(default)]
    pub driver_name: String,
    #[serde(default)]
    pub driver_phone: String,
    #[serde(default)]
    pub route: String,
    pub total_seats: u32,
    #[serde(default)]
    pub reserved_seats: u32,
    #[serde(default)]
    pub available_seats: u32,
    pub status: BusStatus,
    #[serde(default)]
    pub current_location: ReportedLocation,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportedLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ReportedLocation {
    pub fn point(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub gender: Gender,
    pub account_type: AccountType,
    /// Bookings the user has made.
    #[serde(default)]
    pub bookings: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminPayment {
    pub id: u64,
    pub transaction_id: String,
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub booking_id: Option<BookingId>,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_status: String,
    #[serde(default)]
    pub gateway: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Completed payments over the last `period_days`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueAnalytics {
    pub total_revenue: f64,
    pub period_days: u32,
    /// Keyed by `YYYY-MM-DD`.
    pub revenue_by_date: BTreeMap<String, f64>,
    pub revenue_by_method: BTreeMap<String, f64>,
    pub total_transactions: u64,
    pub average_transaction: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingAnalytics {
    pub total_bookings: u64,
    pub status_breakdown: BTreeMap<String, u64>,
    pub period_days: u32,
}

/// Body of `POST /admin/reports/daily`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    #[serde(default)]
    pub message: String,
    pub report_id: u64,
    #[serde(default)]
    pub data: ReportTotals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportTotals {
    /// Today's completed payments.
    pub total_revenue: f64,
    /// Bookings made today.
    pub total_bookings: u64,
    pub total_users: u64,
    pub total_buses: u64,
    pub active_buses: u64,
}

/// An audited admin action, such as a bus status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLog {
    pub id: u64,
    #[serde(default)]
    pub admin_name: Option<String>,
    pub action: String,
    pub entity_type: String,
    #[serde(default)]
    pub entity_id: Option<u64>,
    #[serde(default)]
    pub changes: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_page_reads_any_list_name() {
        let page: AdminPage<AdminLog> = serde_json::from_str(
            r#"{"logs":[{"id":9,"admin_name":"Transit Admin","action":"UPDATE_STATUS","entity_type":"bus",
                "entity_id":5,"changes":{"old_status":"active","new_status":"maintenance"},
                "timestamp":"2025-03-14T09:30:00Z"}],"total":1,"pages":1,"current_page":1}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].changes.as_ref().unwrap()["new_status"], "maintenance");

        let empty: AdminPage<AdminUser> = serde_json::from_str(r#"{"users":[],"total":0}"#).unwrap();
        assert!(empty.items.is_empty());
        assert_eq!(empty.pages, 0);
    }

    #[test]
    fn bus_location_needs_both_coordinates() {
        let bus: AdminBus = serde_json::from_str(
            r#"{"id":5,"bus_number":"DL-1PC-0001","total_seats":40,"status":"maintenance",
                "current_location":{"latitude":28.6,"longitude":null}}"#,
        )
        .unwrap();
        assert_eq!(bus.status, BusStatus::Maintenance);
        assert_eq!(bus.current_location.point(), None);
    }

    #[test]
    fn bus_status_parses_its_wire_name() {
        assert_eq!("inactive".parse::<BusStatus>(), Ok(BusStatus::Inactive));
        assert!("parked".parse::<BusStatus>().is_err());
        assert_eq!(BusStatus::Maintenance.to_string(), "maintenance");
    }
}
