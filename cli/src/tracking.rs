//! Terminal stand-ins for the location source and speech engine.
//!
//! Fixes arrive as `lat,lng[,accuracy]` lines; the caller reads them and
//! hands each parsed [`Position`] to the tracker.

use chrono::Utc;
use log::info;
use transit_core::gps::{Announcer, Geolocation, LocationError, Position, Utterance, WatchId, WatchOptions};

/// Accuracy assumed when a line gives none, in metres.
pub const DEFAULT_ACCURACY_M: f64 = 10.0;

/// Watch handles for a line-fed location source.
#[derive(Debug, Default)]
pub struct LineLocation {
    next_id: u32,
    active: Option<WatchId>,
}

impl LineLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<WatchId> {
        self.active
    }
}

impl Geolocation for LineLocation {
    fn watch_position(&mut self, options: &WatchOptions) -> Result<WatchId, LocationError> {
        self.next_id += 1;
        let id = WatchId(self.next_id);
        info!(
            "Watching stdin positions (high accuracy: {}, timeout {:?})",
            options.enable_high_accuracy, options.timeout
        );
        self.active = Some(id);
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        if self.active == Some(id) {
            self.active = None;
        }
    }
}

/// Prints announcements instead of speaking them.
#[derive(Debug, Default)]
pub struct ConsoleAnnouncer {
    spoken: Vec<String>,
}

impl ConsoleAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> &[String] {
        &self.spoken
    }
}

impl Announcer for ConsoleAnnouncer {
    fn speak(&mut self, utterance: &Utterance) {
        println!("[voice] {}", utterance.text);
        self.spoken.push(utterance.text.clone());
    }

    fn cancel(&mut self) {}
}

/// Parse `lat,lng[,accuracy]`. Anything else is an unavailable position.
pub fn parse_fix(line: &str) -> Result<Position, LocationError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let number = |raw: &str| raw.parse::<f64>().ok().filter(|value| value.is_finite());
    let (latitude, longitude, accuracy) = match fields.as_slice() {
        [lat, lng] => (number(lat), number(lng), Some(DEFAULT_ACCURACY_M)),
        [lat, lng, accuracy] => (number(lat), number(lng), number(accuracy)),
        _ => return Err(LocationError::PositionUnavailable),
    };
    match (latitude, longitude, accuracy) {
        (Some(latitude), Some(longitude), Some(accuracy))
            if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) =>
        {
            Ok(Position {
                latitude,
                longitude,
                accuracy,
                timestamp: Utc::now(),
            })
        }
        _ => Err(LocationError::PositionUnavailable),
    }
}
