//! The terminal host: one `App` owns the API client, every manager and the
//! navigator, and turns a [`Command`] into text.

use std::io::Write;

use anyhow::{bail, Result};
use chrono::Utc;
use log::info;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use transit_core::gps::GpsTracker;
use transit_core::managers::{DEFAULT_LOGS_PER_PAGE, DEFAULT_PER_PAGE, DEFAULT_TRANSACTION_LIMIT};
use transit_core::pages::{Navigator, Page, PageLoader};
use transit_core::types::{
    format_rupees, Bus, BusId, BookingDraft, CreatePayment, CreateWakeupAlert, Emergency, GeoPoint, GpsLog,
    LostItem, LostItemStatus, MarkFound, RegisterDraft, ReportEmergency, ReportLostItem, SeatId, UserId,
    WakeupAlert,
};
use transit_core::{
    AdminManager, ApiClient, ApiConfig, ApiError, AuthManager, BookingManager, BusManager, DashboardManager,
    FleetManager, SessionStorage, Transport, WalletManager,
};

use crate::command::{AdminCommand, Command, USAGE};
use crate::render;
use crate::tracking::{parse_fix, ConsoleAnnouncer, LineLocation};

/// Seconds before arrival that a new wake-up alert fires.
pub const ALERT_LEAD_SECS: u32 = 300;

pub type Tracker = GpsTracker<LineLocation, ConsoleAnnouncer>;

pub struct App<T, S> {
    api: ApiClient<T>,
    auth: AuthManager<S>,
    buses: BusManager,
    bookings: BookingManager,
    wallet: WalletManager,
    dashboard: DashboardManager,
    admin: AdminManager,
    fleet: FleetManager,
    navigator: Navigator,
    emergencies: Vec<Emergency>,
    found_items: Vec<LostItem>,
    alerts: Vec<WakeupAlert>,
}

impl<T: Transport, S: SessionStorage> App<T, S> {
    /// Restores the session `storage` holds, credentials included.
    pub fn new(config: &ApiConfig, transport: T, storage: S) -> Self {
        let mut api = ApiClient::new(config, transport);
        let auth = AuthManager::new(storage);
        if let Some(credentials) = auth.stored_credentials() {
            info!("Restored session for user {}", credentials.user_id);
            api.set_credentials(credentials);
        }
        Self {
            api,
            auth,
            buses: BusManager::new(),
            bookings: BookingManager::new(),
            wallet: WalletManager::new(),
            dashboard: DashboardManager::new(),
            admin: AdminManager::new(),
            fleet: FleetManager::new(),
            navigator: Navigator::new(),
            emergencies: Vec::new(),
            found_items: Vec::new(),
            alerts: Vec::new(),
        }
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn auth(&self) -> &AuthManager<S> {
        &self.auth
    }

    pub fn buses(&self) -> &BusManager {
        &self.buses
    }

    pub fn wallet(&self) -> &WalletManager {
        &self.wallet
    }

    pub fn admin(&self) -> &AdminManager {
        &self.admin
    }

    pub fn fleet(&self) -> &FleetManager {
        &self.fleet
    }

    pub fn current_page(&self) -> Page {
        self.navigator.current()
    }

    fn user_id(&self) -> Result<UserId, ApiError> {
        Ok(self.auth.require_user()?.id)
    }

    pub async fn execute(&mut self, command: Command) -> Result<String> {
        let output = match command {
            Command::Help => USAGE.to_string(),
            Command::Login { email, password } => {
                let login = self.auth.login(&mut self.api, &email, &password).await?;
                format!("Logged in as {} ({}).", login.name, login.account_type)
            }
            Command::Register {
                name,
                email,
                phone,
                gender,
                password,
                confirm_password,
            } => {
                let draft = RegisterDraft {
                    name,
                    email,
                    phone,
                    gender,
                    password,
                    confirm_password,
                    account_type: None,
                };
                let registered = self.auth.register(&self.api, draft).await?;
                format!(
                    "Registered {} (user id {}). You can now log in.",
                    registered.name, registered.user_id
                )
            }
            Command::Logout => {
                self.auth.logout(&mut self.api)?;
                "Logged out.".to_string()
            }
            Command::Show(page) => self.show(page).await?,
            Command::Seats(bus) => {
                self.user_id()?;
                self.select_bus(bus).await?;
                render::seats(&self.buses)
            }
            Command::Reserve { bus, seat } => {
                let user_id = self.user_id()?;
                let seat_id = self.seat_on(bus, seat).await?;
                let reservation = self.buses.reserve_seat(&self.api, seat_id, user_id).await?;
                format!("{}\n{}", reservation.message, render::seats(&self.buses))
            }
            Command::CancelSeat { bus, seat } => {
                self.user_id()?;
                let seat_id = self.seat_on(bus, seat).await?;
                let response = self.buses.cancel_reservation(&self.api, seat_id).await?;
                format!("{}\n{}", response.message, render::seats(&self.buses))
            }
            Command::Book { bus, seat, date } => {
                let user_id = self.user_id()?;
                let seat_id = self.seat_on(bus, seat).await?;
                let draft = BookingDraft {
                    bus_id: Some(bus),
                    seat_id: Some(seat_id),
                    ..BookingDraft::new(date.unwrap_or_else(|| Utc::now().date_naive()))
                };
                let receipt = self.bookings.create_booking(&self.api, user_id, draft).await?;
                render::booking_receipt(receipt)
            }
            Command::Booking(id) => {
                self.user_id()?;
                render::booking(self.bookings.get_booking(&self.api, id).await?)
            }
            Command::Confirm(id) => {
                self.user_id()?;
                render::booking(self.bookings.confirm_booking(&self.api, id).await?)
            }
            Command::CancelBooking { id, reason } => {
                self.user_id()?;
                render::booking(self.bookings.cancel_booking(&self.api, id, reason.as_deref()).await?)
            }
            Command::Pay {
                booking,
                amount,
                method,
            } => {
                let input = CreatePayment {
                    user_id: self.user_id()?,
                    booking_id: Some(booking),
                    amount,
                    payment_method: method,
                };
                let receipt = self.bookings.pay(&self.api, &input).await?;
                format!(
                    "Payment {} ({}): {}",
                    receipt.payment_status,
                    receipt.transaction_id,
                    format_rupees(receipt.amount)
                )
            }
            Command::AddMoney(amount) => {
                let user_id = self.user_id()?;
                self.wallet.add_money(&self.api, user_id, amount).await?;
                format!("Added {}. New balance: {}", format_rupees(amount), self.wallet.format_balance())
            }
            Command::Emergency {
                bus,
                kind,
                description,
            } => self.report_emergency(bus, kind, description).await?,
            Command::ReportLost { name, description } => {
                let input = ReportLostItem {
                    item_name: name,
                    item_description: description,
                    user_id: self.user_id()?,
                };
                let item = self.api.call(self.api.client().build_report_lost_item(&input)?).await?;
                format!("Reported {} as lost (item #{}).", item.item_name, item.id)
            }
            Command::Resolve(emergency_id) => {
                self.user_id()?;
                let emergency = self
                    .api
                    .call(self.api.client().build_resolve_emergency(emergency_id)?)
                    .await?;
                self.emergencies.retain(|open| open.id != emergency.id);
                format!("Emergency #{} on bus {} {}.", emergency.id, emergency.bus_id, emergency.status)
            }
            Command::Found { item, location } => {
                let input = MarkFound {
                    worker_id: self.user_id()?,
                    location_found: location,
                };
                let item = self.api.call(self.api.client().build_mark_item_found(item, &input)?).await?;
                let place = item.location_found.as_deref().unwrap_or("unknown location");
                format!("Marked {} (item #{}) found at {place}.", item.item_name, item.id)
            }
            Command::Claim(item_id) => {
                self.user_id()?;
                let item = self.api.call(self.api.client().build_claim_item(item_id)?).await?;
                format!("Claimed {} (item #{}).", item.item_name, item.id)
            }
            Command::Alert { bus, stop, lat, lng } => {
                let input = CreateWakeupAlert {
                    user_id: self.user_id()?,
                    bus_id: bus,
                    stop_name: stop,
                    stop_lat: lat,
                    stop_lng: lng,
                    alert_before_time: ALERT_LEAD_SECS,
                };
                let alert = self.api.call(self.api.client().build_create_wakeup_alert(&input)?).await?;
                format!("Wake-up alert #{} set for {}.", alert.id, alert.stop_name)
            }
            Command::Fleet => render::active_buses(self.fleet.load_active_locations(&self.api).await?),
            Command::GpsLatest(bus) => render::gps_fix(self.fleet.load_latest(&self.api, bus).await?),
            Command::GpsHistory { bus, limit } => {
                render::gps_history(bus, self.fleet.load_history(&self.api, bus, limit).await?)
            }
            Command::GpsLog {
                bus,
                lat,
                lng,
                speed,
                heading,
            } => {
                self.user_id()?;
                let fix = GpsLog {
                    latitude: lat,
                    longitude: lng,
                    speed,
                    heading,
                };
                self.fleet.log_fix(&self.api, bus, &fix).await?.message
            }
            Command::MoveBus { bus, lat, lng } => {
                self.user_id()?;
                self.fleet
                    .update_location(&self.api, bus, GeoPoint::new(lat, lng))
                    .await?
                    .message
            }
            Command::Announcements(bus) => {
                render::announcements(bus, self.fleet.load_announcements(&self.api, bus).await?)
            }
            Command::Stops(bus) => {
                self.fleet.load_route(&self.api, bus).await?;
                render::route(&self.fleet)
            }
            Command::Arrive { bus, stop } => {
                self.user_id()?;
                let response = self.fleet.mark_arrival(&self.api, bus, stop).await?;
                format!("{}.", response.message)
            }
            Command::Admin(command) => {
                self.user_id()?;
                self.run_admin(command).await?
            }
            Command::Track { bus, voice } => {
                let input = BufReader::new(tokio::io::stdin());
                self.track(bus, voice, input, &mut std::io::stdout()).await?;
                String::new()
            }
        };
        Ok(output)
    }

    async fn run_admin(&mut self, command: AdminCommand) -> Result<String, ApiError> {
        let api = &self.api;
        let admin = &mut self.admin;
        let text = match command {
            AdminCommand::Dashboard => render::admin(self.dashboard.load_admin_dashboard(api).await?),
            AdminCommand::Buses { page } => render::admin_buses(admin.load_buses(api, page, DEFAULT_PER_PAGE).await?),
            AdminCommand::BusStatus { bus, status } => admin.update_bus_status(api, bus, status).await?.message,
            AdminCommand::Users { page } => render::admin_users(admin.load_users(api, page, DEFAULT_PER_PAGE).await?),
            AdminCommand::Payments { page, status } => render::admin_payments(
                admin
                    .load_payments(api, page, DEFAULT_PER_PAGE, status.as_deref())
                    .await?,
            ),
            AdminCommand::Revenue { days } => render::revenue(admin.load_revenue(api, days).await?),
            AdminCommand::Bookings { days } => render::booking_analytics(admin.load_booking_analytics(api, days).await?),
            AdminCommand::Report => render::daily_report(admin.generate_daily_report(api).await?),
            AdminCommand::Logs { page } => render::admin_logs(admin.load_logs(api, page, DEFAULT_LOGS_PER_PAGE).await?),
        };
        Ok(text)
    }

    /// Navigate to `requested` and render whatever page ends up shown.
    ///
    /// A loader error is returned after the page switch, so
    /// [`App::current_page`] still reports the new page.
    pub async fn show(&mut self, requested: Page) -> Result<String> {
        let logged_in = self.auth.is_logged_in();
        let mut navigator = std::mem::take(&mut self.navigator);
        let shown = navigator.show(requested, logged_in, self).await;
        self.navigator = navigator;
        Ok(self.render(shown?))
    }

    fn render(&self, page: Page) -> String {
        match page {
            Page::Home => render::home(self.auth.current_user()),
            Page::Auth => render::auth(),
            Page::Buses => render::buses(&self.buses),
            Page::Booking => match self.bookings.last_receipt() {
                Some(receipt) => render::booking_receipt(receipt),
                None => "Choose a seat with `transit book <bus> <seat> [date]`.".to_string(),
            },
            Page::Dashboard => render::dashboard(&self.dashboard.formatted_stats()),
            Page::Wallet => render::wallet(&self.wallet),
            Page::Emergency => format!(
                "{}\nReport with `transit emergency <bus> <type> <description>`.",
                render::emergencies(&self.emergencies)
            ),
            Page::LostFound => render::lost_items(&self.found_items),
            Page::Tracking => "Start with `transit track [bus] [--voice]`.".to_string(),
            Page::Alerts => render::alerts(&self.alerts),
        }
    }

    /// Feed fixes from `input` to a fresh tracker until EOF or a blank line.
    ///
    /// A bad line is reported as an unavailable position and tracking goes on.
    pub async fn track<R, W>(&mut self, bus: Option<BusId>, voice: bool, input: R, out: &mut W) -> Result<Tracker>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        self.show(Page::Tracking).await?;
        if self.navigator.current() != Page::Tracking {
            return Err(ApiError::NotAuthenticated.into());
        }

        let mut tracker = GpsTracker::new(LineLocation::new(), ConsoleAnnouncer::new());
        if let Some(bus) = bus {
            tracker = tracker.with_bus(bus);
        }
        tracker.start()?;
        if voice {
            tracker.toggle_voice()?;
        }
        writeln!(out, "Tracking started. Enter `lat,lng[,accuracy]` per line; a blank line stops.")?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                break;
            }
            match parse_fix(&line) {
                Ok(position) => {
                    if let Err(e) = tracker.on_position(&self.api, position).await {
                        writeln!(out, "Next stop unavailable: {e}")?;
                    }
                    writeln!(out, "{}", render::tracking(&tracker))?;
                }
                Err(e) => {
                    tracker.on_error(e);
                    writeln!(out, "{e}")?;
                }
            }
        }

        tracker.stop();
        writeln!(out, "Tracking stopped.")?;
        Ok(tracker)
    }

    async fn report_emergency(&mut self, bus_id: BusId, kind: String, description: String) -> Result<String> {
        let user_id = self.user_id()?;
        let bus = self.find_bus(bus_id).await?;
        let Some(location) = bus.location() else {
            bail!("Location of bus {} is unknown", bus.bus_number);
        };
        let input = ReportEmergency {
            bus_id,
            user_id,
            emergency_type: kind,
            latitude: location.latitude,
            longitude: location.longitude,
            description,
        };
        let emergency = self.api.call(self.api.client().build_report_emergency(&input)?).await?;
        Ok(format!(
            "Emergency #{} reported on bus {}. Help is on the way.",
            emergency.id, bus.bus_number
        ))
    }

    /// Page through the bus list until `bus_id` turns up.
    async fn find_bus(&mut self, bus_id: BusId) -> Result<Bus, ApiError> {
        let mut page = 1;
        loop {
            let listed = self.buses.load_buses(&self.api, page, DEFAULT_PER_PAGE).await?;
            if let Some(bus) = listed.iter().find(|bus| bus.id == bus_id) {
                return Ok(bus.clone());
            }
            let (_, pages, _) = self.buses.pagination();
            if u64::from(page) >= pages {
                return Err(ApiError::validation("Bus not found"));
            }
            page += 1;
        }
    }

    async fn select_bus(&mut self, bus_id: BusId) -> Result<(), ApiError> {
        self.find_bus(bus_id).await?;
        self.buses.select_bus(&self.api, bus_id).await?;
        Ok(())
    }

    /// Seat id for `seat_number` on `bus_id`, with that bus selected.
    async fn seat_on(&mut self, bus_id: BusId, seat_number: u32) -> Result<SeatId, ApiError> {
        self.select_bus(bus_id).await?;
        self.buses
            .seats()
            .iter()
            .find(|seat| seat.seat_number == seat_number)
            .map(|seat| seat.seat_id)
            .ok_or_else(|| ApiError::validation(format!("Seat {seat_number} not found")))
    }
}

impl<T: Transport, S: SessionStorage> PageLoader for App<T, S> {
    async fn load_buses(&mut self) -> Result<(), ApiError> {
        self.buses.load_buses(&self.api, 1, DEFAULT_PER_PAGE).await?;
        Ok(())
    }

    async fn load_dashboard(&mut self) -> Result<(), ApiError> {
        self.dashboard.load_stats(&self.api).await?;
        Ok(())
    }

    async fn load_wallet(&mut self) -> Result<(), ApiError> {
        let user_id = self.user_id()?;
        self.wallet.load_balance(&self.api, user_id).await?;
        self.wallet
            .load_transactions(&self.api, user_id, DEFAULT_TRANSACTION_LIMIT)
            .await?;
        Ok(())
    }

    /// Buses carry the locations a report needs.
    async fn prepare_emergency(&mut self) -> Result<(), ApiError> {
        self.buses.load_buses(&self.api, 1, DEFAULT_PER_PAGE).await?;
        self.emergencies = self.api.call(self.api.client().build_active_emergencies()).await?;
        Ok(())
    }

    async fn load_lost_found(&mut self) -> Result<(), ApiError> {
        self.found_items = self
            .api
            .call(self.api.client().build_lost_items(LostItemStatus::Found))
            .await?;
        Ok(())
    }

    async fn load_alerts(&mut self) -> Result<(), ApiError> {
        let user_id = self.user_id()?;
        self.alerts = self.api.call(self.api.client().build_user_wakeup_alerts(user_id)).await?;
        Ok(())
    }
}
