use serde::{Deserialize, Serialize};

use super::format_rupees;

/// Body of `GET /statistics/dashboard`. Every counter defaults to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_buses: u64,
    pub active_buses: u64,
    pub total_bookings: u64,
    pub confirmed_bookings: u64,
    pub total_revenue: f64,
    pub user_stats: UserStats,
    pub payment_stats: PaymentStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub total_users: u64,
    pub passengers: u64,
    pub drivers: u64,
    pub workers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentStats {
    pub total_payments: u64,
    pub completed: u64,
    pub failed: u64,
    pub refunded: u64,
}

/// Dashboard counters ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedStats {
    pub total_users: u64,
    pub total_buses: u64,
    pub active_buses: u64,
    pub total_bookings: u64,
    pub confirmed_bookings: u64,
    pub total_revenue: String,
    pub passengers: u64,
    pub completed_payments: u64,
}

impl DashboardStats {
    /// Top-level counter by its JSON name; unknown keys read as zero.
    pub fn stat(&self, key: &str) -> f64 {
        match key {
            "total_users" => self.total_users as f64,
            "total_buses" => self.total_buses as f64,
            "active_buses" => self.active_buses as f64,
            "total_bookings" => self.total_bookings as f64,
            "confirmed_bookings" => self.confirmed_bookings as f64,
            "total_revenue" => self.total_revenue,
            _ => 0.0,
        }
    }

    pub fn formatted(&self) -> FormattedStats {
        FormattedStats {
            total_users: self.total_users,
            total_buses: self.total_buses,
            active_buses: self.active_buses,
            total_bookings: self.total_bookings,
            confirmed_bookings: self.confirmed_bookings,
            total_revenue: format_rupees(self.total_revenue),
            passengers: self.user_stats.passengers,
            completed_payments: self.payment_stats.completed,
        }
    }
}
