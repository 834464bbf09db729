use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BusId;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// Body of `POST /gps/buses/:busId/log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsLog {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub heading: f64,
}

/// One recorded position of a bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    #[serde(default)]
    pub bus_id: Option<BusId>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub heading: f64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveBusLocation {
    pub bus_id: BusId,
    pub bus_number: String,
    #[serde(default)]
    pub driver_name: String,
    #[serde(default)]
    pub route: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub heading: f64,
    pub timestamp: NaiveDateTime,
}

/// A stop on a bus route, in travel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub id: u64,
    pub stop_order: u32,
    pub stop_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub estimated_arrival: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_arrival: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
}

impl RouteStop {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Arrival estimate for a stop the bus has not reached yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopEta {
    pub stop_id: u64,
    pub stop_name: String,
    pub stop_order: u32,
    pub distance_km: f64,
    pub eta_minutes: u32,
}

/// Body of `POST /next-stop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextStopQuery {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "busId")]
    pub bus_id: Option<BusId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NextStopResponse {
    #[serde(rename = "nextStop", default)]
    pub next_stop: Option<NextStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStop {
    pub name: String,
    /// Kilometres from the position that was sent.
    #[serde(default)]
    pub distance: Option<f64>,
    /// Minutes until arrival.
    #[serde(rename = "estimatedTime", default)]
    pub estimated_time: Option<u32>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl NextStop {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_same_point_is_zero() {
        let p = GeoPoint::new(28.6139, 77.2090);
        assert!(p.distance_km(&p).abs() < 1e-9);
    }

    #[test]
    fn distance_matches_known_pair() {
        // Connaught Place to India Gate, roughly 2.4 km.
        let cp = GeoPoint::new(28.6315, 77.2167);
        let gate = GeoPoint::new(28.6129, 77.2295);
        let d = cp.distance_km(&gate);
        assert!((2.2..2.6).contains(&d), "got {d}");
    }

    #[test]
    fn next_stop_uses_camel_case_fields() {
        let response: NextStopResponse = serde_json::from_str(
            r#"{"nextStop":{"name":"Saket","distance":1.234,"estimatedTime":4,"latitude":28.52,"longitude":77.21}}"#,
        )
        .unwrap();
        let stop = response.next_stop.unwrap();
        assert_eq!(stop.estimated_time, Some(4));
        assert!(stop.location().is_some());
    }

    #[test]
    fn gps_fix_parses_naive_iso_timestamp() {
        let fix: GpsFix = serde_json::from_str(
            r#"{"latitude":28.6,"longitude":77.2,"speed":31.5,"heading":90.0,"timestamp":"2025-01-02T10:00:00.123456"}"#,
        )
        .unwrap();
        assert_eq!(fix.speed, 31.5);
        assert!(fix.bus_id.is_none());
    }
}
