use log::{error, info};

use crate::error::ApiError;
use crate::transport::{ApiClient, Transport};
use crate::types::{Bus, BusId, BusPage, CreateBus, CreatedBus, MessageResponse, Seat, SeatId, SeatReservation, UserId};

pub const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Debug, Default)]
pub struct BusManager {
    buses: Vec<Bus>,
    total: u64,
    pages: u64,
    current_page: u64,
    selected_bus: Option<Bus>,
    seats: Vec<Seat>,
}

impl BusManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load_buses<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        page: u32,
        per_page: u32,
    ) -> Result<&[Bus], ApiError> {
        info!("Loading buses: page {page}");
        let BusPage {
            buses,
            total,
            pages,
            current_page,
        } = api.call(api.client().build_list_buses(page, per_page)).await?;
        self.buses = buses;
        self.total = total;
        self.pages = pages;
        self.current_page = current_page;
        info!("Loaded {} buses", self.buses.len());
        Ok(&self.buses)
    }

    /// Create a bus and refresh the first page so it shows up.
    pub async fn create_bus<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        input: &CreateBus,
    ) -> Result<CreatedBus, ApiError> {
        info!("Creating bus: {}", input.bus_number);
        let created = api.call(api.client().build_create_bus(input)?).await?;
        info!("Bus created: {}", created.bus_id);
        self.load_buses(api, 1, DEFAULT_PER_PAGE).await?;
        Ok(created)
    }

    /// Select a bus from the loaded page, then load its seats.
    pub async fn select_bus<T: Transport>(&mut self, api: &ApiClient<T>, bus_id: BusId) -> Result<&Bus, ApiError> {
        let Some(bus) = self.buses.iter().find(|bus| bus.id == bus_id).cloned() else {
            error!("Bus not found: {bus_id}");
            return Err(ApiError::validation("Bus not found"));
        };
        self.selected_bus = Some(bus);
        self.load_seats(api, bus_id).await?;
        self.selected_bus.as_ref().ok_or_else(|| ApiError::validation("Bus not found"))
    }

    pub async fn load_seats<T: Transport>(&mut self, api: &ApiClient<T>, bus_id: BusId) -> Result<&[Seat], ApiError> {
        info!("Loading seats for bus: {bus_id}");
        self.seats = api.call(api.client().build_bus_seats(bus_id)).await?;
        info!("Loaded {} seats", self.seats.len());
        Ok(&self.seats)
    }

    /// Reserve a seat. The cached seat flips only after the server agrees.
    pub async fn reserve_seat<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        seat_id: SeatId,
        user_id: UserId,
    ) -> Result<SeatReservation, ApiError> {
        info!("Reserving seat: {seat_id}");
        let reservation = api.call(api.client().build_reserve_seat(seat_id, user_id)?).await?;
        self.mark_seat(seat_id, true);
        info!("Seat reserved: {seat_id}");
        Ok(reservation)
    }

    pub async fn cancel_reservation<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        seat_id: SeatId,
    ) -> Result<MessageResponse, ApiError> {
        info!("Cancelling reservation: {seat_id}");
        let response = api.call(api.client().build_cancel_seat(seat_id)?).await?;
        self.mark_seat(seat_id, false);
        info!("Reservation cancelled: {seat_id}");
        Ok(response)
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn selected_bus(&self) -> Option<&Bus> {
        self.selected_bus.as_ref()
    }

    pub fn seat(&self, seat_id: SeatId) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.seat_id == seat_id)
    }

    /// `(current_page, pages, total)` of the last loaded page.
    pub fn pagination(&self) -> (u64, u64, u64) {
        (self.current_page, self.pages, self.total)
    }

    pub fn available_seats_count(&self) -> usize {
        self.seats.iter().filter(|seat| !seat.is_reserved).count()
    }

    pub fn reserved_seats_count(&self) -> usize {
        self.seats.iter().filter(|seat| seat.is_reserved).count()
    }

    /// Reserved share of the cached seats, in percent.
    pub fn seat_occupancy(&self) -> f64 {
        if self.seats.is_empty() {
            return 0.0;
        }
        self.reserved_seats_count() as f64 / self.seats.len() as f64 * 100.0
    }

    fn mark_seat(&mut self, seat_id: SeatId, reserved: bool) {
        if let Some(seat) = self.seats.iter_mut().find(|seat| seat.seat_id == seat_id) {
            seat.is_reserved = reserved;
        }
    }
}
