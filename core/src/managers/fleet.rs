use log::{info, warn};

use crate::error::ApiError;
use crate::transport::{ApiClient, Transport};
use crate::types::{
    ActiveBusLocation, Announcement, BusId, GeoPoint, GpsFix, GpsLog, MessageResponse, RouteStop, StopEta,
};

pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

/// Live fleet data from the GPS service: where buses are, where they have
/// been, and how far each is from the stops ahead.
#[derive(Debug, Default)]
pub struct FleetManager {
    active: Vec<ActiveBusLocation>,
    latest: Option<GpsFix>,
    history: Vec<GpsFix>,
    route: Vec<RouteStop>,
    etas: Vec<StopEta>,
    announcements: Vec<Announcement>,
}

impl FleetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active buses that have reported at least one fix.
    pub async fn load_active_locations<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
    ) -> Result<&[ActiveBusLocation], ApiError> {
        self.active = api.call(api.client().build_active_bus_locations()).await?;
        info!("{} buses reporting", self.active.len());
        Ok(&self.active)
    }

    pub async fn load_latest<T: Transport>(&mut self, api: &ApiClient<T>, bus_id: BusId) -> Result<&GpsFix, ApiError> {
        let fix = api.call(api.client().build_latest_gps(bus_id)).await?;
        Ok(self.latest.insert(fix))
    }

    /// Up to `limit` fixes, oldest first.
    pub async fn load_history<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        bus_id: BusId,
        limit: u32,
    ) -> Result<&[GpsFix], ApiError> {
        self.history = api.call(api.client().build_gps_history(bus_id, limit)).await?;
        info!("Loaded {} fixes for bus {bus_id}", self.history.len());
        Ok(&self.history)
    }

    /// Report a fix from the bus's device. The server also moves the bus.
    pub async fn log_fix<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        bus_id: BusId,
        fix: &GpsLog,
    ) -> Result<MessageResponse, ApiError> {
        info!("Logging fix for bus {bus_id}: {}, {}", fix.latitude, fix.longitude);
        api.call(api.client().build_log_gps(bus_id, fix)?).await
    }

    /// Set the bus's reported location without recording a fix.
    pub async fn update_location<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        bus_id: BusId,
        location: GeoPoint,
    ) -> Result<MessageResponse, ApiError> {
        info!("Moving bus {bus_id} to {}, {}", location.latitude, location.longitude);
        api.call(api.client().build_update_bus_location(bus_id, location)?).await
    }

    pub async fn load_announcements<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        bus_id: BusId,
    ) -> Result<&[Announcement], ApiError> {
        self.announcements = api.call(api.client().build_bus_announcements(bus_id)).await?;
        Ok(&self.announcements)
    }

    /// Route stops, then the estimates for the ones still ahead.
    pub async fn load_route<T: Transport>(&mut self, api: &ApiClient<T>, bus_id: BusId) -> Result<&[RouteStop], ApiError> {
        self.route = api.call(api.client().build_route_stops(bus_id)).await?;
        self.etas = match api.call(api.client().build_calculate_eta(bus_id)).await {
            Ok(etas) => etas,
            Err(e) if e.is_not_found() => {
                warn!("No position for bus {bus_id}, showing stops without estimates");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        Ok(&self.route)
    }

    /// The cached stop is marked reached and its estimate dropped after the server agrees.
    pub async fn mark_arrival<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        bus_id: BusId,
        stop_id: u64,
    ) -> Result<MessageResponse, ApiError> {
        let response = api.call(api.client().build_mark_stop_arrival(bus_id, stop_id)?).await?;
        if let Some(stop) = self.route.iter_mut().find(|stop| stop.id == stop_id) {
            stop.is_completed = true;
        }
        self.etas.retain(|eta| eta.stop_id != stop_id);
        info!("Bus {bus_id} reached stop {stop_id}");
        Ok(response)
    }

    pub fn active(&self) -> &[ActiveBusLocation] {
        &self.active
    }

    pub fn latest(&self) -> Option<&GpsFix> {
        self.latest.as_ref()
    }

    pub fn history(&self) -> &[GpsFix] {
        &self.history
    }

    pub fn route(&self) -> &[RouteStop] {
        &self.route
    }

    pub fn etas(&self) -> &[StopEta] {
        &self.etas
    }

    pub fn announcements(&self) -> &[Announcement] {
        &self.announcements
    }

    /// First stop on the route not reached yet.
    pub fn upcoming_stop(&self) -> Option<&RouteStop> {
        self.route.iter().find(|stop| !stop.is_completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{api, ScriptedTransport};

    const ROUTE: &str = r#"[
        {"id":46,"stop_order":1,"stop_name":"Kashmere Gate","latitude":28.6675,"longitude":77.2282,"is_completed":false},
        {"id":47,"stop_order":2,"stop_name":"Connaught Place","latitude":28.6315,"longitude":77.2167,"is_completed":false}
    ]"#;
    const ETAS: &str = r#"[
        {"stop_id":46,"stop_name":"Kashmere Gate","stop_order":1,"distance_km":0.0,"eta_minutes":0},
        {"stop_id":47,"stop_name":"Connaught Place","stop_order":2,"distance_km":4.12,"eta_minutes":6}
    ]"#;

    #[tokio::test]
    async fn arrival_drops_the_estimate_only_after_success() {
        let api = api(
            ScriptedTransport::new()
                .reply(200, ROUTE)
                .reply(200, ETAS)
                .reply(404, r#"{"message":"Stop not found"}"#)
                .reply(200, r#"{"message":"Stop arrival recorded"}"#),
        );
        let mut fleet = FleetManager::new();
        fleet.load_route(&api, 5).await.unwrap();
        assert_eq!(fleet.upcoming_stop().map(|s| s.id), Some(46));

        assert!(fleet.mark_arrival(&api, 5, 46).await.is_err());
        assert_eq!(fleet.etas().len(), 2);

        fleet.mark_arrival(&api, 5, 46).await.unwrap();
        assert_eq!(fleet.etas().len(), 1);
        assert_eq!(fleet.upcoming_stop().map(|s| s.stop_name.as_str()), Some("Connaught Place"));
    }

    #[tokio::test]
    async fn route_without_position_has_no_estimates() {
        let api = api(
            ScriptedTransport::new()
                .reply(200, ROUTE)
                .reply(404, r#"{"message":"Bus not found or GPS data unavailable"}"#),
        );
        let mut fleet = FleetManager::new();

        let route = fleet.load_route(&api, 5).await.unwrap();

        assert_eq!(route.len(), 2);
        assert!(fleet.etas().is_empty());
    }

    #[tokio::test]
    async fn route_fails_on_server_error() {
        let api = api(ScriptedTransport::new().reply(200, ROUTE).reply(500, r#"{"error":"db down"}"#));
        let mut fleet = FleetManager::new();

        let err = fleet.load_route(&api, 5).await.unwrap_err();

        assert_eq!(err.to_string(), "db down");
    }

    #[tokio::test]
    async fn history_keeps_server_order() {
        let api = api(ScriptedTransport::new().reply(
            200,
            r#"[{"bus_id":5,"latitude":28.60,"longitude":77.21,"speed":30.0,"heading":180.0,"timestamp":"2025-03-14T09:30:00"},
                {"bus_id":5,"latitude":28.61,"longitude":77.21,"speed":32.0,"heading":180.0,"timestamp":"2025-03-14T09:31:00"}]"#,
        ));
        let mut fleet = FleetManager::new();

        let history = fleet.load_history(&api, 5, DEFAULT_HISTORY_LIMIT).await.unwrap();

        assert_eq!(history[1].latitude, 28.61);
        assert!(api.transport().requests()[0].path.ends_with("/gps/buses/5/history?limit=100"));
    }
}
