//! Live position tracking.
//!
//! # Design
//! `GpsTracker` is a two-state machine (`Idle`, `Active`). The host owns the
//! actual location source and speech engine and plugs them in through
//! [`Geolocation`] and [`Announcer`]; it then feeds every fix to
//! [`GpsTracker::on_position`]. Fixes that arrive while idle are dropped, so
//! a late callback after `stop` cannot move the map.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::error::ApiError;
use crate::transport::{ApiClient, Transport};
use crate::types::{BusId, GeoPoint, NextStop, NextStopQuery};

/// Trail points closer than this to the previous one are not recorded.
pub const TRAIL_SPACING_KM: f64 = 1.0;

/// Handle returned by [`Geolocation::watch_position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Permission denied. Please enable location access.")]
    PermissionDenied,
    #[error("Location unavailable.")]
    PositionUnavailable,
    #[error("Location request timeout.")]
    Timeout,
    #[error("Geolocation not supported")]
    Unsupported,
}

impl LocationError {
    /// Map a standard geolocation error code (1, 2, 3).
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::PermissionDenied),
            2 => Some(Self::PositionUnavailable),
            3 => Some(Self::Timeout),
            _ => None,
        }
    }
}

/// A location source that pushes fixes until the watch is cleared.
pub trait Geolocation {
    fn watch_position(&mut self, options: &WatchOptions) -> Result<WatchId, LocationError>;
    fn clear_watch(&mut self, id: WatchId);
}

/// One location fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres.
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn signal_quality(&self) -> SignalQuality {
        SignalQuality::from_accuracy(self.accuracy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SignalQuality {
    pub fn from_accuracy(metres: f64) -> Self {
        if metres < 20.0 {
            Self::Excellent
        } else if metres < 50.0 {
            Self::Good
        } else if metres < 100.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Text-to-speech output.
pub trait Announcer {
    fn speak(&mut self, utterance: &Utterance);
    /// Drop anything queued or playing.
    fn cancel(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSettings {
    pub enabled: bool,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Active(WatchId),
}

/// What the map shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapState {
    pub user_marker: Option<GeoPoint>,
    pub next_stop_marker: Option<GeoPoint>,
    pub trail: Vec<GeoPoint>,
}

impl MapState {
    fn move_user(&mut self, point: GeoPoint) {
        self.user_marker = Some(point);
        let extend = self
            .trail
            .last()
            .map_or(true, |last| last.distance_km(&point) > TRAIL_SPACING_KM);
        if extend {
            self.trail.push(point);
        }
    }
}

/// `Next stop: Saket. Distance: 1.25 kilometers`
pub fn announcement_text(stop: &NextStop) -> String {
    format!(
        "Next stop: {}. Distance: {:.2} kilometers",
        stop.name,
        stop.distance.unwrap_or(0.0)
    )
}

#[derive(Debug)]
pub struct GpsTracker<G, A> {
    geolocation: G,
    announcer: A,
    bus_id: Option<BusId>,
    state: TrackingState,
    voice: VoiceSettings,
    position: Option<Position>,
    next_stop: Option<NextStop>,
    map: MapState,
    last_error: Option<LocationError>,
}

impl<G: Geolocation, A: Announcer> GpsTracker<G, A> {
    pub fn new(geolocation: G, announcer: A) -> Self {
        Self {
            geolocation,
            announcer,
            bus_id: None,
            state: TrackingState::Idle,
            voice: VoiceSettings::default(),
            position: None,
            next_stop: None,
            map: MapState::default(),
            last_error: None,
        }
    }

    /// Bus whose route the next-stop lookup should follow.
    pub fn with_bus(mut self, bus_id: BusId) -> Self {
        self.bus_id = Some(bus_id);
        self
    }

    /// Subscribe to the location source. Starting twice keeps the first watch.
    pub fn start(&mut self) -> Result<WatchId, LocationError> {
        if let TrackingState::Active(id) = self.state {
            return Ok(id);
        }
        info!("Starting location tracking");
        let id = self.geolocation.watch_position(&WatchOptions::default()).inspect_err(|e| {
            error!("Error starting tracking: {e}");
        })?;
        self.state = TrackingState::Active(id);
        self.last_error = None;
        Ok(id)
    }

    /// Unsubscribe, silence pending speech and turn voice off.
    pub fn stop(&mut self) {
        let TrackingState::Active(id) = self.state else {
            return;
        };
        self.geolocation.clear_watch(id);
        self.announcer.cancel();
        self.voice.enabled = false;
        self.state = TrackingState::Idle;
        info!("Tracking stopped");
    }

    pub fn toggle(&mut self) -> Result<TrackingState, LocationError> {
        if self.is_active() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.state)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TrackingState::Active(_))
    }

    /// Handle one fix: move the map, then ask the server for the next stop.
    ///
    /// The map is updated even when the lookup fails.
    pub async fn on_position<T: Transport>(&mut self, api: &ApiClient<T>, position: Position) -> Result<(), ApiError> {
        if !self.is_active() {
            debug!("Ignoring position while idle");
            return Ok(());
        }
        debug!("Location: {:.4}, {:.4}", position.latitude, position.longitude);
        self.position = Some(position);
        self.map.move_user(position.point());

        let query = NextStopQuery {
            latitude: position.latitude,
            longitude: position.longitude,
            bus_id: self.bus_id,
        };
        let response = api.call(api.client().build_next_stop(&query)?).await?;
        if let Some(stop) = response.next_stop {
            self.map.next_stop_marker = stop.location();
            if self.voice.enabled {
                self.speak(&stop);
            }
            self.next_stop = Some(stop);
        }
        Ok(())
    }

    /// Record a location failure. Tracking stays active; the source may recover.
    pub fn on_error(&mut self, error: LocationError) {
        warn!("Location error: {error}");
        self.last_error = Some(error);
    }

    /// Flip voice announcements. Only allowed while tracking.
    pub fn toggle_voice(&mut self) -> Result<bool, ApiError> {
        if !self.is_active() {
            return Err(ApiError::validation("Please start tracking first"));
        }
        if self.voice.enabled {
            self.announcer.cancel();
            self.voice.enabled = false;
        } else {
            self.enable_voice();
        }
        Ok(self.voice.enabled)
    }

    fn enable_voice(&mut self) {
        self.voice.enabled = true;
        info!("Voice announcements enabled");
        if let Some(stop) = self.next_stop.clone() {
            self.speak(&stop);
        }
    }

    fn speak(&mut self, stop: &NextStop) {
        let utterance = Utterance {
            text: announcement_text(stop),
            rate: self.voice.rate,
            pitch: self.voice.pitch,
            volume: self.voice.volume,
        };
        debug!("Speaking: {}", utterance.text);
        self.announcer.speak(&utterance);
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn voice(&self) -> &VoiceSettings {
        &self.voice
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn next_stop(&self) -> Option<&NextStop> {
        self.next_stop.as_ref()
    }

    pub fn map(&self) -> &MapState {
        &self.map
    }

    pub fn last_error(&self) -> Option<LocationError> {
        self.last_error
    }

    pub fn geolocation(&self) -> &G {
        &self.geolocation
    }

    pub fn announcer(&self) -> &A {
        &self.announcer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{api, ScriptedTransport};

    #[derive(Debug, Default)]
    struct FakeSource {
        next_id: u32,
        active: Vec<WatchId>,
        options: Option<WatchOptions>,
        unsupported: bool,
    }

    impl Geolocation for FakeSource {
        fn watch_position(&mut self, options: &WatchOptions) -> Result<WatchId, LocationError> {
            if self.unsupported {
                return Err(LocationError::Unsupported);
            }
            self.next_id += 1;
            let id = WatchId(self.next_id);
            self.active.push(id);
            self.options = Some(*options);
            Ok(id)
        }

        fn clear_watch(&mut self, id: WatchId) {
            self.active.retain(|active| *active != id);
        }
    }

    #[derive(Debug, Default)]
    struct Recorder {
        spoken: Vec<Utterance>,
        cancels: usize,
    }

    impl Announcer for Recorder {
        fn speak(&mut self, utterance: &Utterance) {
            self.spoken.push(utterance.clone());
        }

        fn cancel(&mut self) {
            self.cancels += 1;
        }
    }

    const SAKET: &str = r#"{"nextStop":{"name":"Saket","distance":1.254,"estimatedTime":4,"latitude":28.5245,"longitude":77.2066}}"#;

    fn fix(latitude: f64, longitude: f64, accuracy: f64) -> Position {
        Position {
            latitude,
            longitude,
            accuracy,
            timestamp: Utc::now(),
        }
    }

    fn tracker() -> GpsTracker<FakeSource, Recorder> {
        GpsTracker::new(FakeSource::default(), Recorder::default())
    }

    #[test]
    fn start_and_stop_manage_the_watch() {
        let mut tracker = tracker();
        let id = tracker.start().unwrap();
        assert_eq!(tracker.state(), TrackingState::Active(id));
        assert_eq!(tracker.start().unwrap(), id);
        assert_eq!(tracker.geolocation().active, [id]);
        assert_eq!(tracker.geolocation().options, Some(WatchOptions::default()));

        tracker.stop();

        assert_eq!(tracker.state(), TrackingState::Idle);
        assert!(tracker.geolocation().active.is_empty());
        assert_eq!(tracker.announcer().cancels, 1);
    }

    #[test]
    fn unsupported_source_stays_idle() {
        let mut tracker = GpsTracker::new(
            FakeSource {
                unsupported: true,
                ..FakeSource::default()
            },
            Recorder::default(),
        );
        assert_eq!(tracker.toggle(), Err(LocationError::Unsupported));
        assert!(!tracker.is_active());
    }

    #[tokio::test]
    async fn positions_while_idle_are_ignored() {
        let api = api(ScriptedTransport::new());
        let mut tracker = tracker();

        tracker.on_position(&api, fix(28.6139, 77.2090, 10.0)).await.unwrap();

        assert!(tracker.position().is_none());
        assert!(tracker.map().trail.is_empty());
        assert!(api.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn fix_moves_markers_and_fetches_next_stop() {
        let api = api(ScriptedTransport::new().reply(200, SAKET));
        let mut tracker = tracker().with_bus(3);
        tracker.start().unwrap();

        tracker.on_position(&api, fix(28.6139, 77.2090, 35.0)).await.unwrap();

        assert_eq!(tracker.position().map(Position::signal_quality), Some(SignalQuality::Good));
        assert_eq!(tracker.map().user_marker, Some(GeoPoint::new(28.6139, 77.2090)));
        assert_eq!(tracker.map().next_stop_marker, Some(GeoPoint::new(28.5245, 77.2066)));
        assert_eq!(tracker.next_stop().map(|s| s.name.as_str()), Some("Saket"));
        assert!(tracker.announcer().spoken.is_empty());

        let request = &api.transport().requests()[0];
        assert_eq!(request.path, "http://transit.test/api/next-stop");
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["busId"], 3);
    }

    #[tokio::test]
    async fn trail_grows_only_past_one_kilometre() {
        let api = api(
            ScriptedTransport::new()
                .reply(200, r#"{"nextStop":null}"#)
                .reply(200, r#"{"nextStop":null}"#)
                .reply(200, r#"{"nextStop":null}"#),
        );
        let mut tracker = tracker();
        tracker.start().unwrap();

        tracker.on_position(&api, fix(28.6000, 77.2000, 5.0)).await.unwrap();
        // ~0.5 km north.
        tracker.on_position(&api, fix(28.6045, 77.2000, 5.0)).await.unwrap();
        // ~2.2 km north of the first point.
        tracker.on_position(&api, fix(28.6200, 77.2000, 5.0)).await.unwrap();

        let trail = &tracker.map().trail;
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[1], GeoPoint::new(28.6200, 77.2000));
        assert_eq!(tracker.map().user_marker, Some(GeoPoint::new(28.6200, 77.2000)));
    }

    #[tokio::test]
    async fn failed_lookup_still_moves_user_marker() {
        let api = api(ScriptedTransport::new().reply(500, r#"{"error":"routing offline"}"#));
        let mut tracker = tracker();
        tracker.start().unwrap();

        let err = tracker.on_position(&api, fix(28.6, 77.2, 150.0)).await.unwrap_err();

        assert_eq!(err.to_string(), "routing offline");
        assert_eq!(tracker.map().user_marker, Some(GeoPoint::new(28.6, 77.2)));
        assert_eq!(tracker.position().map(Position::signal_quality), Some(SignalQuality::Poor));
    }

    #[tokio::test]
    async fn enabling_voice_announces_current_stop() {
        let api = api(ScriptedTransport::new().reply(200, SAKET).reply(200, SAKET));
        let mut tracker = tracker();
        tracker.start().unwrap();
        tracker.on_position(&api, fix(28.6139, 77.2090, 10.0)).await.unwrap();

        assert!(tracker.toggle_voice().unwrap());

        let spoken = &tracker.announcer().spoken;
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, "Next stop: Saket. Distance: 1.25 kilometers");
        assert_eq!(spoken[0].rate, 0.9);
        assert_eq!(spoken[0].volume, 1.0);

        tracker.on_position(&api, fix(28.6140, 77.2091, 10.0)).await.unwrap();
        assert_eq!(tracker.announcer().spoken.len(), 2);
    }

    #[test]
    fn voice_requires_active_tracking() {
        let mut tracker = tracker();
        let err = tracker.toggle_voice().unwrap_err();
        assert_eq!(err.to_string(), "Please start tracking first");
        assert!(!tracker.voice().enabled);
    }

    #[test]
    fn stopping_turns_voice_off() {
        let mut tracker = tracker();
        tracker.start().unwrap();
        tracker.toggle_voice().unwrap();
        assert!(tracker.voice().enabled);

        tracker.stop();

        assert!(!tracker.voice().enabled);
    }

    #[test]
    fn location_errors_keep_tracking() {
        let mut tracker = tracker();
        tracker.start().unwrap();
        tracker.on_error(LocationError::from_code(1).unwrap());
        assert!(tracker.is_active());
        assert_eq!(
            tracker.last_error().map(|e| e.to_string()).as_deref(),
            Some("Permission denied. Please enable location access.")
        );
        assert_eq!(LocationError::from_code(3), Some(LocationError::Timeout));
        assert_eq!(LocationError::from_code(9), None);
    }

    #[test]
    fn signal_quality_bands() {
        assert_eq!(SignalQuality::from_accuracy(19.9), SignalQuality::Excellent);
        assert_eq!(SignalQuality::from_accuracy(20.0), SignalQuality::Good);
        assert_eq!(SignalQuality::from_accuracy(99.0), SignalQuality::Fair);
        assert_eq!(SignalQuality::from_accuracy(100.0), SignalQuality::Poor);
    }

    #[test]
    fn missing_distance_reads_zero() {
        let stop = NextStop {
            name: "Saket".to_string(),
            distance: None,
            estimated_time: None,
            latitude: None,
            longitude: None,
        };
        assert_eq!(announcement_text(&stop), "Next stop: Saket. Distance: 0.00 kilometers");
    }
}
