//! In-memory tables for the mock transit backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

pub type Db = Arc<RwLock<Store>>;

/// Share of each new bus's seats reserved for women, counted from seat 1.
pub const WOMEN_SEAT_SHARE: f64 = 0.2;
pub const DEFAULT_TOTAL_SEATS: u32 = 50;
/// Assumed bus speed for arrival estimates.
pub const AVERAGE_SPEED_KMH: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub password: String,
    pub account_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BusRecord {
    pub id: u64,
    pub bus_number: String,
    pub driver_name: String,
    pub driver_phone: String,
    pub route: String,
    pub total_seats: u32,
    pub status: String,
    pub current_lat: Option<f64>,
    pub current_lng: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SeatRecord {
    pub id: u64,
    pub bus_id: u64,
    pub seat_number: u32,
    pub is_women_seat: bool,
    pub reserved_by: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingRecord {
    pub id: u64,
    pub booking_ref: String,
    pub user_id: u64,
    pub bus_id: u64,
    pub seat_id: u64,
    pub travel_date: NaiveDate,
    pub price: f64,
    pub status: String,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub id: u64,
    pub transaction_id: String,
    pub user_id: u64,
    pub booking_id: Option<u64>,
    pub amount: f64,
    pub method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletTransaction {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    pub description: String,
    pub balance_before: f64,
    pub balance_after: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct WalletRecord {
    pub id: u64,
    pub balance: f64,
    /// Oldest first.
    pub transactions: Vec<WalletTransaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GpsRecord {
    pub bus_id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub heading: f64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementRecord {
    pub id: u64,
    #[serde(skip)]
    pub bus_id: u64,
    pub message: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmergencyRecord {
    pub id: u64,
    pub bus_id: u64,
    pub user_id: Option<u64>,
    pub emergency_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LostItemRecord {
    pub id: u64,
    pub item_name: String,
    pub item_description: String,
    pub status: String,
    pub reported_by: u64,
    pub found_by: Option<String>,
    pub location_found: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WakeupAlertRecord {
    pub id: u64,
    pub user_id: u64,
    pub bus_id: u64,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lng: f64,
    pub alert_before_time: u32,
    pub is_active: bool,
}

/// A stop on a bus route, used for next-stop lookups and arrival estimates.
#[derive(Debug, Clone)]
pub struct StopRecord {
    pub id: u64,
    pub bus_id: u64,
    /// 1-based position along the route.
    pub stop_order: u32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

/// An audited admin change. `changes` holds the before and after values.
#[derive(Debug, Clone)]
pub struct AdminLogRecord {
    pub id: u64,
    pub admin_id: u64,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<u64>,
    pub changes: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRecord {
    #[serde(skip)]
    pub id: u64,
    #[serde(skip)]
    pub report_date: NaiveDate,
    pub total_revenue: f64,
    pub total_bookings: usize,
    pub total_users: usize,
    pub total_buses: usize,
    pub active_buses: usize,
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    pub users: BTreeMap<u64, UserRecord>,
    pub buses: BTreeMap<u64, BusRecord>,
    pub seats: BTreeMap<u64, SeatRecord>,
    pub bookings: BTreeMap<u64, BookingRecord>,
    pub payments: Vec<PaymentRecord>,
    /// Keyed by user id.
    pub wallets: BTreeMap<u64, WalletRecord>,
    pub gps: Vec<GpsRecord>,
    pub announcements: Vec<AnnouncementRecord>,
    pub emergencies: BTreeMap<u64, EmergencyRecord>,
    pub lost_items: BTreeMap<u64, LostItemRecord>,
    pub wakeup_alerts: BTreeMap<u64, WakeupAlertRecord>,
    pub stops: Vec<StopRecord>,
    /// Oldest first.
    pub admin_logs: Vec<AdminLogRecord>,
    pub reports: Vec<ReportRecord>,
}

impl Store {
    /// Ids are unique across every table, which keeps test output unambiguous.
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn insert_user(&mut self, mut user: UserRecord) -> u64 {
        let id = self.next_id();
        user.id = id;
        self.users.insert(id, user);
        self.wallet_mut(id);
        id
    }

    /// Create a bus with its seats; the first fifth are women-only.
    pub fn insert_bus(&mut self, mut bus: BusRecord) -> u64 {
        let id = self.next_id();
        bus.id = id;
        let women_seats = (f64::from(bus.total_seats) * WOMEN_SEAT_SHARE) as u32;
        for seat_number in 1..=bus.total_seats {
            let seat_id = self.next_id();
            self.seats.insert(
                seat_id,
                SeatRecord {
                    id: seat_id,
                    bus_id: id,
                    seat_number,
                    is_women_seat: seat_number <= women_seats,
                    reserved_by: None,
                },
            );
        }
        self.buses.insert(id, bus);
        id
    }

    pub fn wallet_mut(&mut self, user_id: u64) -> &mut WalletRecord {
        if !self.wallets.contains_key(&user_id) {
            let id = self.next_id();
            self.wallets.insert(
                user_id,
                WalletRecord {
                    id,
                    ..WalletRecord::default()
                },
            );
        }
        self.wallets.entry(user_id).or_default()
    }

    /// Apply a signed amount to a wallet and record the transaction.
    pub fn post_transaction(&mut self, user_id: u64, kind: &str, amount: f64, description: &str) -> f64 {
        let id = self.next_id();
        let wallet = self.wallet_mut(user_id);
        let before = wallet.balance;
        let after = match kind {
            "debit" => before - amount,
            _ => before + amount,
        };
        wallet.balance = after;
        wallet.transactions.push(WalletTransaction {
            id,
            kind: kind.to_string(),
            amount,
            description: description.to_string(),
            balance_before: before,
            balance_after: after,
            date: Utc::now(),
        });
        after
    }

    pub fn bus_seats(&self, bus_id: u64) -> impl Iterator<Item = &SeatRecord> {
        self.seats.values().filter(move |seat| seat.bus_id == bus_id)
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.users
            .get(&user_id)
            .is_some_and(|user| user.account_type == "admin")
    }

    pub fn latest_fix(&self, bus_id: u64) -> Option<&GpsRecord> {
        self.gps.iter().rev().find(|fix| fix.bus_id == bus_id)
    }

    /// Where the bus is now: its latest fix, else the last location it reported.
    pub fn bus_position(&self, bus_id: u64) -> Option<(f64, f64)> {
        if let Some(fix) = self.latest_fix(bus_id) {
            return Some((fix.latitude, fix.longitude));
        }
        let bus = self.buses.get(&bus_id)?;
        bus.current_lat.zip(bus.current_lng)
    }

    /// Stops of one route in travel order.
    pub fn route_stops(&self, bus_id: u64) -> Vec<&StopRecord> {
        let mut stops: Vec<&StopRecord> = self.stops.iter().filter(|stop| stop.bus_id == bus_id).collect();
        stops.sort_by_key(|stop| stop.stop_order);
        stops
    }

    pub fn add_stop(&mut self, bus_id: u64, name: &str, latitude: f64, longitude: f64) -> u64 {
        let id = self.next_id();
        let stop_order = self.stops.iter().filter(|stop| stop.bus_id == bus_id).count() as u32 + 1;
        self.stops.push(StopRecord {
            id,
            bus_id,
            stop_order,
            name: name.to_string(),
            latitude,
            longitude,
            actual_arrival: None,
            is_completed: false,
        });
        id
    }

    pub fn log_admin_action(
        &mut self,
        admin_id: u64,
        action: &str,
        entity_type: &str,
        entity_id: Option<u64>,
        changes: Value,
    ) {
        let id = self.next_id();
        self.admin_logs.push(AdminLogRecord {
            id,
            admin_id,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            changes,
            timestamp: Utc::now(),
        });
    }

    pub fn completed_payments(&self) -> impl Iterator<Item = &PaymentRecord> {
        self.payments.iter().filter(|payment| payment.status == "completed")
    }

    /// Demo data: two users, three buses with route stops, an announcement.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        store.insert_user(user("Transit Admin", "admin@transit.test", "other", "admin123", "admin"));
        store.insert_user(user("Asha Verma", "asha@example.com", "female", "secret1", "passenger"));

        let routes = [
            (
                "DL-1PC-0001",
                "Ravi Kumar",
                "Kashmere Gate - Saket",
                [
                    ("Kashmere Gate", 28.6675, 77.2282),
                    ("Connaught Place", 28.6315, 77.2167),
                    ("AIIMS", 28.5672, 77.2100),
                    ("Saket", 28.5245, 77.2066),
                ],
            ),
            (
                "DL-1PC-0002",
                "Meena Singh",
                "Anand Vihar - Dwarka",
                [
                    ("Anand Vihar", 28.6469, 77.3152),
                    ("ITO", 28.6289, 77.2405),
                    ("Rajouri Garden", 28.6492, 77.1226),
                    ("Dwarka Sector 21", 28.5523, 77.0583),
                ],
            ),
            (
                "DL-1PC-0003",
                "Imran Khan",
                "Noida City Centre - Gurugram",
                [
                    ("Noida City Centre", 28.5747, 77.3560),
                    ("Ashram", 28.5712, 77.2590),
                    ("Dhaula Kuan", 28.5918, 77.1615),
                    ("Cyber City", 28.4950, 77.0895),
                ],
            ),
        ];
        for (bus_number, driver, route, stops) in routes {
            let bus_id = store.insert_bus(BusRecord {
                id: 0,
                bus_number: bus_number.to_string(),
                driver_name: driver.to_string(),
                driver_phone: "9876543210".to_string(),
                route: route.to_string(),
                total_seats: 40,
                status: "active".to_string(),
                current_lat: Some(stops[0].1),
                current_lng: Some(stops[0].2),
                created_at: Utc::now(),
            });
            for (name, latitude, longitude) in stops {
                store.add_stop(bus_id, name, latitude, longitude);
            }
            let id = store.next_id();
            store.announcements.push(AnnouncementRecord {
                id,
                bus_id,
                message: format!("{route} service running on schedule"),
                created_at: Utc::now().to_rfc3339(),
            });
        }
        store
    }
}

fn user(name: &str, email: &str, gender: &str, password: &str, account_type: &str) -> UserRecord {
    UserRecord {
        id: 0,
        name: name.to_string(),
        email: email.to_string(),
        phone: "9000000000".to_string(),
        gender: gender.to_string(),
        password: password.to_string(),
        account_type: account_type.to_string(),
        created_at: Utc::now(),
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
