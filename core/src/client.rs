//! HTTP request builder and response parser for the transit API.
//!
//! # Design
//! `TransitClient` holds the base URL and, once someone logs in, the
//! session credentials. It never touches the network. Each endpoint has a
//! `build_*` method returning a [`Call`]: the `HttpRequest` to execute,
//! typed by the response it parses into. The caller runs the round-trip and
//! hands the `HttpResponse` to [`Call::parse`].

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{endpoints, fill_template};
use crate::error::ApiError;
use crate::http::{encode_query, HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    ActiveBusLocation, AddMoney, AddMoneyReceipt, AdminBus, AdminDashboard, AdminLog, AdminPage, AdminPayment,
    AdminUser, Announcement, Booking, BookingAnalytics, BookingId, BookingReceipt, BusId, BusPage, BusStatus,
    BusStatusUpdate, CancelBooking, CreateBooking, CreateBus, CreatePayment, CreateWakeupAlert, CreatedBus,
    DailyReport, DashboardStats, Emergency, EmptyBody, GeoPoint, GpsFix, GpsLog, LoginRequest, LoginResponse,
    LostItem, LostItemStatus, MarkFound, MessageResponse, NextStopQuery, NextStopResponse, PaymentReceipt,
    RegisterRequest, RegisterResponse, ReportEmergency, ReportLostItem, ReserveSeat, RevenueAnalytics, RouteStop,
    Seat, SeatId, SeatReservation, StopEta, Transaction, UserId, WakeupAlert, WalletBalance,
};

/// Identity attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: UserId,
}

/// A built request together with the type its response parses into.
pub struct Call<R> {
    pub request: HttpRequest,
    response: PhantomData<fn() -> R>,
}

impl<R> Call<R> {
    fn new(request: HttpRequest) -> Self {
        Self {
            request,
            response: PhantomData,
        }
    }
}

impl<R: DeserializeOwned> Call<R> {
    /// Any 2xx body is decoded as `R`; everything else becomes `ApiError::Http`.
    pub fn parse(&self, response: HttpResponse) -> Result<R, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_response(&response));
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

impl<R> Clone for Call<R> {
    fn clone(&self) -> Self {
        Call::new(self.request.clone())
    }
}

impl<R> fmt::Debug for Call<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call").field("request", &self.request).finish()
    }
}

/// Request builder for every transit endpoint.
#[derive(Debug, Clone)]
pub struct TransitClient {
    base_url: String,
    credentials: Option<Credentials>,
}

impl TransitClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.credentials = credentials;
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- auth ---------------------------------------------------------------

    pub fn build_register(&self, input: &RegisterRequest) -> Result<Call<RegisterResponse>, ApiError> {
        self.send_json(HttpMethod::Post, endpoints::AUTH_REGISTER.to_string(), input)
    }

    pub fn build_login(&self, email: &str, password: &str) -> Result<Call<LoginResponse>, ApiError> {
        let input = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(HttpMethod::Post, endpoints::AUTH_LOGIN.to_string(), &input)
    }

    // -- buses & seats ------------------------------------------------------

    pub fn build_list_buses(&self, page: u32, per_page: u32) -> Call<BusPage> {
        self.get_with_query(
            endpoints::BUSES.to_string(),
            &[("page", page.to_string()), ("per_page", per_page.to_string())],
        )
    }

    pub fn build_create_bus(&self, input: &CreateBus) -> Result<Call<CreatedBus>, ApiError> {
        self.send_json(HttpMethod::Post, endpoints::BUSES.to_string(), input)
    }

    pub fn build_bus_seats(&self, bus_id: BusId) -> Call<Vec<Seat>> {
        self.get(bus_path(endpoints::BUS_SEATS, bus_id))
    }

    pub fn build_update_bus_location(
        &self,
        bus_id: BusId,
        location: GeoPoint,
    ) -> Result<Call<MessageResponse>, ApiError> {
        self.send_json(
            HttpMethod::Post,
            bus_path(endpoints::BUS_UPDATE_LOCATION, bus_id),
            &location,
        )
    }

    pub fn build_bus_announcements(&self, bus_id: BusId) -> Call<Vec<Announcement>> {
        self.get(bus_path(endpoints::BUS_ANNOUNCEMENTS, bus_id))
    }

    pub fn build_reserve_seat(&self, seat_id: SeatId, user_id: UserId) -> Result<Call<SeatReservation>, ApiError> {
        self.send_json(
            HttpMethod::Post,
            seat_path(endpoints::SEAT_RESERVE, seat_id),
            &ReserveSeat { user_id },
        )
    }

    pub fn build_cancel_seat(&self, seat_id: SeatId) -> Result<Call<MessageResponse>, ApiError> {
        self.send_json(HttpMethod::Post, seat_path(endpoints::SEAT_CANCEL, seat_id), &EmptyBody {})
    }

    // -- bookings & payments ------------------------------------------------

    pub fn build_create_booking(&self, input: &CreateBooking) -> Result<Call<BookingReceipt>, ApiError> {
        self.send_json(HttpMethod::Post, endpoints::BOOKINGS.to_string(), input)
    }

    pub fn build_get_booking(&self, booking_id: BookingId) -> Call<Booking> {
        self.get(booking_path(endpoints::BOOKING, booking_id))
    }

    pub fn build_confirm_booking(&self, booking_id: BookingId) -> Result<Call<Booking>, ApiError> {
        self.send_json(
            HttpMethod::Post,
            booking_path(endpoints::BOOKING_CONFIRM, booking_id),
            &EmptyBody {},
        )
    }

    pub fn build_cancel_booking(&self, booking_id: BookingId, reason: Option<&str>) -> Result<Call<Booking>, ApiError> {
        let input = CancelBooking {
            reason: reason.map(str::to_string),
        };
        self.send_json(HttpMethod::Post, booking_path(endpoints::BOOKING_CANCEL, booking_id), &input)
    }

    pub fn build_create_payment(&self, input: &CreatePayment) -> Result<Call<PaymentReceipt>, ApiError> {
        self.send_json(HttpMethod::Post, endpoints::PAYMENTS.to_string(), input)
    }

    // -- wallet -------------------------------------------------------------

    pub fn build_wallet_balance(&self, user_id: UserId) -> Call<WalletBalance> {
        self.get(user_path(endpoints::WALLET, user_id))
    }

    pub fn build_add_money(&self, user_id: UserId, input: &AddMoney) -> Result<Call<AddMoneyReceipt>, ApiError> {
        self.send_json(HttpMethod::Post, user_path(endpoints::WALLET_ADD_MONEY, user_id), input)
    }

    pub fn build_wallet_transactions(&self, user_id: UserId, limit: u32) -> Call<Vec<Transaction>> {
        self.get_with_query(
            user_path(endpoints::WALLET_TRANSACTIONS, user_id),
            &[("limit", limit.to_string())],
        )
    }

    // -- gps ----------------------------------------------------------------

    pub fn build_log_gps(&self, bus_id: BusId, input: &GpsLog) -> Result<Call<MessageResponse>, ApiError> {
        self.send_json(HttpMethod::Post, bus_path(endpoints::GPS_LOG, bus_id), input)
    }

    pub fn build_latest_gps(&self, bus_id: BusId) -> Call<GpsFix> {
        self.get(bus_path(endpoints::GPS_LATEST, bus_id))
    }

    pub fn build_gps_history(&self, bus_id: BusId, limit: u32) -> Call<Vec<GpsFix>> {
        self.get_with_query(bus_path(endpoints::GPS_HISTORY, bus_id), &[("limit", limit.to_string())])
    }

    pub fn build_active_bus_locations(&self) -> Call<Vec<ActiveBusLocation>> {
        self.get(endpoints::GPS_ACTIVE.to_string())
    }

    pub fn build_route_stops(&self, bus_id: BusId) -> Call<Vec<RouteStop>> {
        self.get(bus_path(endpoints::GPS_ROUTE_STOPS, bus_id))
    }

    pub fn build_mark_stop_arrival(&self, bus_id: BusId, stop_id: u64) -> Result<Call<MessageResponse>, ApiError> {
        let (bus, stop) = (bus_id.to_string(), stop_id.to_string());
        let path = fill_template(endpoints::GPS_STOP_ARRIVE, &[("busId", bus.as_str()), ("stopId", stop.as_str())]);
        self.send_json(HttpMethod::Post, path, &EmptyBody {})
    }

    /// Estimates for the stops the bus has not reached yet.
    pub fn build_calculate_eta(&self, bus_id: BusId) -> Call<Vec<StopEta>> {
        self.get(bus_path(endpoints::GPS_ETA, bus_id))
    }

    pub fn build_next_stop(&self, input: &NextStopQuery) -> Result<Call<NextStopResponse>, ApiError> {
        self.send_json(HttpMethod::Post, endpoints::NEXT_STOP.to_string(), input)
    }

    // -- statistics ---------------------------------------------------------

    pub fn build_dashboard_stats(&self) -> Call<DashboardStats> {
        self.get(endpoints::STATISTICS_DASHBOARD.to_string())
    }

    // -- emergencies, lost & found, alerts ----------------------------------

    pub fn build_report_emergency(&self, input: &ReportEmergency) -> Result<Call<Emergency>, ApiError> {
        self.send_json(HttpMethod::Post, endpoints::EMERGENCIES.to_string(), input)
    }

    pub fn build_active_emergencies(&self) -> Call<Vec<Emergency>> {
        self.get(endpoints::EMERGENCIES.to_string())
    }

    pub fn build_resolve_emergency(&self, emergency_id: u64) -> Result<Call<Emergency>, ApiError> {
        let id = emergency_id.to_string();
        let path = fill_template(endpoints::EMERGENCY_RESOLVE, &[("emergencyId", id.as_str())]);
        self.send_json(HttpMethod::Post, path, &EmptyBody {})
    }

    pub fn build_report_lost_item(&self, input: &ReportLostItem) -> Result<Call<LostItem>, ApiError> {
        self.send_json(HttpMethod::Post, endpoints::LOST_ITEMS.to_string(), input)
    }

    pub fn build_lost_items(&self, status: LostItemStatus) -> Call<Vec<LostItem>> {
        self.get_with_query(endpoints::LOST_ITEMS.to_string(), &[("status", status.to_string())])
    }

    pub fn build_mark_item_found(&self, item_id: u64, input: &MarkFound) -> Result<Call<LostItem>, ApiError> {
        self.send_json(HttpMethod::Post, item_path(endpoints::LOST_ITEM_MARK_FOUND, item_id), input)
    }

    pub fn build_claim_item(&self, item_id: u64) -> Result<Call<LostItem>, ApiError> {
        self.send_json(HttpMethod::Post, item_path(endpoints::LOST_ITEM_CLAIM, item_id), &EmptyBody {})
    }

    pub fn build_create_wakeup_alert(&self, input: &CreateWakeupAlert) -> Result<Call<WakeupAlert>, ApiError> {
        self.send_json(HttpMethod::Post, endpoints::WAKEUP_ALERTS.to_string(), input)
    }

    pub fn build_user_wakeup_alerts(&self, user_id: UserId) -> Call<Vec<WakeupAlert>> {
        self.get(user_path(endpoints::USER_WAKEUP_ALERTS, user_id))
    }

    // -- admin --------------------------------------------------------------

    pub fn build_admin_dashboard(&self) -> Call<AdminDashboard> {
        self.as_admin(self.get(endpoints::ADMIN_DASHBOARD.to_string()))
    }

    pub fn build_update_bus_status(&self, bus_id: BusId, status: BusStatus) -> Result<Call<MessageResponse>, ApiError> {
        let call = self.send_json(
            HttpMethod::Put,
            bus_path(endpoints::ADMIN_BUS_STATUS, bus_id),
            &BusStatusUpdate { status },
        )?;
        Ok(self.as_admin(call))
    }

    pub fn build_admin_buses(&self, page: u32, per_page: u32) -> Call<AdminPage<AdminBus>> {
        self.as_admin(self.get_with_query(endpoints::ADMIN_BUSES.to_string(), &paging(page, per_page)))
    }

    pub fn build_admin_users(&self, page: u32, per_page: u32) -> Call<AdminPage<AdminUser>> {
        self.as_admin(self.get_with_query(endpoints::ADMIN_USERS.to_string(), &paging(page, per_page)))
    }

    /// Newest first; `status` keeps only payments in that state.
    pub fn build_admin_payments(
        &self,
        page: u32,
        per_page: u32,
        status: Option<&str>,
    ) -> Call<AdminPage<AdminPayment>> {
        let mut query = paging(page, per_page);
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        self.as_admin(self.get_with_query(endpoints::ADMIN_PAYMENTS.to_string(), &query))
    }

    pub fn build_revenue_analytics(&self, days: u32) -> Call<RevenueAnalytics> {
        self.as_admin(self.get_with_query(endpoints::ADMIN_REVENUE.to_string(), &[("days", days.to_string())]))
    }

    pub fn build_booking_analytics(&self, days: u32) -> Call<BookingAnalytics> {
        self.as_admin(self.get_with_query(
            endpoints::ADMIN_BOOKING_ANALYTICS.to_string(),
            &[("days", days.to_string())],
        ))
    }

    pub fn build_daily_report(&self) -> Result<Call<DailyReport>, ApiError> {
        let call = self.send_json(HttpMethod::Post, endpoints::ADMIN_DAILY_REPORT.to_string(), &EmptyBody {})?;
        Ok(self.as_admin(call))
    }

    pub fn build_admin_logs(&self, page: u32, per_page: u32) -> Call<AdminPage<AdminLog>> {
        self.as_admin(self.get_with_query(endpoints::ADMIN_LOGS.to_string(), &paging(page, per_page)))
    }

    // -- helpers ------------------------------------------------------------

    fn get<R>(&self, path: String) -> Call<R> {
        Call::new(self.request(HttpMethod::Get, &path, None))
    }

    fn get_with_query<R>(&self, path: String, query: &[(&str, String)]) -> Call<R> {
        let path = format!("{path}?{}", encode_query(query));
        Call::new(self.request(HttpMethod::Get, &path, None))
    }

    fn send_json<R, B: Serialize>(&self, method: HttpMethod, path: String, input: &B) -> Result<Call<R>, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(Call::new(self.request(method, &path, Some(body))))
    }

    fn request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let mut headers = Vec::new();
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(credentials) = &self.credentials {
            headers.push(("authorization".to_string(), format!("Bearer {}", credentials.token)));
        }
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers,
            body,
        }
    }

    /// Admin routes identify the caller through `x-user-id`.
    fn as_admin<R>(&self, mut call: Call<R>) -> Call<R> {
        if let Some(credentials) = &self.credentials {
            call.request
                .headers
                .push(("x-user-id".to_string(), credentials.user_id.to_string()));
        }
        call
    }
}

fn paging(page: u32, per_page: u32) -> Vec<(&'static str, String)> {
    vec![("page", page.to_string()), ("per_page", per_page.to_string())]
}

fn bus_path(template: &str, bus_id: BusId) -> String {
    let id = bus_id.to_string();
    fill_template(template, &[("busId", id.as_str())])
}

fn seat_path(template: &str, seat_id: SeatId) -> String {
    let id = seat_id.to_string();
    fill_template(template, &[("seatId", id.as_str())])
}

fn booking_path(template: &str, booking_id: BookingId) -> String {
    let id = booking_id.to_string();
    fill_template(template, &[("bookingId", id.as_str())])
}

fn user_path(template: &str, user_id: UserId) -> String {
    let id = user_id.to_string();
    fill_template(template, &[("userId", id.as_str())])
}

fn item_path(template: &str, item_id: u64) -> String {
    let id = item_id.to_string();
    fill_template(template, &[("itemId", id.as_str())])
}
