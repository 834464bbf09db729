use serde::{Deserialize, Serialize};

use super::gps::GeoPoint;
use super::{BusId, SeatId, UserId};

/// A bus as listed by `GET /buses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub bus_number: String,
    pub route: String,
    #[serde(default)]
    pub driver_name: String,
    pub total_seats: u32,
    #[serde(default)]
    pub available_seats: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_lng: Option<f64>,
}

impl Bus {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.current_lat, self.current_lng) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        }
    }
}

/// One page of `GET /buses`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusPage {
    #[serde(default)]
    pub buses: Vec<Bus>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub current_page: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBus {
    pub bus_number: String,
    pub driver_name: String,
    pub driver_phone: String,
    pub route: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_seats: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedBus {
    #[serde(default)]
    pub message: String,
    pub bus_id: BusId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub seat_id: SeatId,
    pub seat_number: u32,
    pub is_reserved: bool,
    #[serde(default)]
    pub is_women_seat: bool,
    #[serde(default)]
    pub reserved_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveSeat {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatReservation {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub seat_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    #[serde(default)]
    pub id: Option<u64>,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_without_coordinates_has_no_location() {
        let bus: Bus = serde_json::from_str(
            r#"{"id":1,"bus_number":"DL-1PC-0001","route":"Kashmere Gate - Saket","driver_name":"Ravi","total_seats":40,"available_seats":38}"#,
        )
        .unwrap();
        assert!(bus.location().is_none());
        assert_eq!(bus.available_seats, 38);
    }

    #[test]
    fn seat_category_defaults_to_general() {
        let seat: Seat = serde_json::from_str(r#"{"seat_id":9,"seat_number":3,"is_reserved":false}"#).unwrap();
        assert!(!seat.is_women_seat);
        assert!(seat.reserved_by.is_none());
    }
}
