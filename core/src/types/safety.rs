use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BusId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEmergency {
    pub bus_id: BusId,
    pub user_id: UserId,
    /// accident, medical, security, ...
    pub emergency_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emergency {
    pub id: u64,
    pub bus_id: BusId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub emergency_type: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLostItem {
    pub item_name: String,
    pub item_description: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LostItemStatus {
    #[default]
    Lost,
    Found,
    Claimed,
}

impl LostItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LostItemStatus::Lost => "lost",
            LostItemStatus::Found => "found",
            LostItemStatus::Claimed => "claimed",
        }
    }
}

impl fmt::Display for LostItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostItem {
    pub id: u64,
    pub item_name: String,
    #[serde(default)]
    pub item_description: String,
    #[serde(default)]
    pub status: LostItemStatus,
    #[serde(default)]
    pub found_by: Option<String>,
    #[serde(default)]
    pub location_found: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkFound {
    pub worker_id: UserId,
    pub location_found: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWakeupAlert {
    pub user_id: UserId,
    pub bus_id: BusId,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lng: f64,
    /// Seconds before arrival at which to alert.
    pub alert_before_time: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeupAlert {
    pub id: u64,
    pub user_id: UserId,
    pub bus_id: BusId,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lng: f64,
    #[serde(default)]
    pub alert_before_time: u32,
    #[serde(default)]
    pub is_active: bool,
}
