use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::info;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{
    haversine_km, AdminLogRecord, BookingRecord, BusRecord, Db, EmergencyRecord, GpsRecord, LostItemRecord,
    PaymentRecord, ReportRecord, StopRecord, Store, UserRecord, WakeupAlertRecord, AVERAGE_SPEED_KMH,
    DEFAULT_TOTAL_SEATS,
};
use crate::error::AppError;

type ApiResult<T> = Result<T, AppError>;
type Created = (StatusCode, Json<Value>);

fn created(body: Value) -> Created {
    (StatusCode::CREATED, Json(body))
}

/// `BK` followed by ten uppercase hex digits.
fn booking_ref() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("BK{}", &hex[..10])
}

fn transaction_id() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TXN{}", &hex[..12])
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": Utc::now().to_rfc3339() }))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterInput {
    name: String,
    email: String,
    phone: String,
    gender: String,
    password: String,
    account_type: Option<String>,
}

pub async fn register(State(db): State<Db>, Json(input): Json<RegisterInput>) -> ApiResult<Created> {
    let mut store = db.write().await;
    if store.users.values().any(|user| user.email == input.email) {
        return Err(AppError::bad_request("Email already registered"));
    }
    let name = input.name.clone();
    let user_id = store.insert_user(UserRecord {
        id: 0,
        name: input.name,
        email: input.email,
        phone: input.phone,
        gender: input.gender,
        password: input.password,
        account_type: input.account_type.unwrap_or_else(|| "passenger".to_string()),
        created_at: Utc::now(),
    });
    info!("registered user {user_id}");
    Ok(created(json!({
        "message": "Registration successful",
        "user_id": user_id,
        "name": name,
    })))
}

#[derive(Deserialize)]
pub struct LoginInput {
    email: String,
    password: String,
}

pub async fn login(State(db): State<Db>, Json(input): Json<LoginInput>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    let user = store
        .users
        .values()
        .find(|user| user.email == input.email && user.password == input.password)
        .ok_or(AppError::InvalidCredentials)?;
    Ok(Json(json!({
        "message": "Login successful",
        "user_id": user.id,
        "name": user.name,
        "email": user.email,
        "account_type": user.account_type,
    })))
}

// ---------------------------------------------------------------------------
// Buses & seats
// ---------------------------------------------------------------------------

const DEFAULT_PER_PAGE: u64 = 10;

#[derive(Deserialize, Default)]
pub struct Pagination {
    page: Option<u64>,
    per_page: Option<u64>,
}

impl Pagination {
    /// One page of `items` under `key`, with `total`, `pages` and `current_page`.
    /// Pages past the end are empty, however large the page number.
    fn envelope<T>(&self, key: &str, default_per_page: u64, items: Vec<T>, view: impl FnMut(T) -> Value) -> Value {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(default_per_page).max(1);
        let total = items.len() as u64;
        let skip = usize::try_from(page.saturating_sub(1).saturating_mul(per_page)).unwrap_or(usize::MAX);
        let take = usize::try_from(per_page).unwrap_or(usize::MAX);
        let rows: Vec<Value> = items.into_iter().skip(skip).take(take).map(view).collect();
        let mut body = json!({ "total": total, "pages": total.div_ceil(per_page), "current_page": page });
        body[key] = Value::Array(rows);
        body
    }
}

fn bus_view(store: &Store, bus: &BusRecord) -> Value {
    let available = store.bus_seats(bus.id).filter(|seat| seat.reserved_by.is_none()).count();
    json!({
        "id": bus.id,
        "bus_number": bus.bus_number,
        "driver_name": bus.driver_name,
        "route": bus.route,
        "total_seats": bus.total_seats,
        "available_seats": available,
        "current_lat": bus.current_lat,
        "current_lng": bus.current_lng,
    })
}

/// Active buses only, paginated.
pub async fn list_buses(State(db): State<Db>, Query(query): Query<Pagination>) -> Json<Value> {
    let store = db.read().await;
    let active: Vec<&BusRecord> = store.buses.values().filter(|bus| bus.status == "active").collect();
    Json(query.envelope("buses", DEFAULT_PER_PAGE, active, |bus| bus_view(&store, bus)))
}

#[derive(Deserialize)]
pub struct CreateBusInput {
    bus_number: String,
    driver_name: String,
    driver_phone: String,
    route: String,
    total_seats: Option<u32>,
}

pub async fn create_bus(State(db): State<Db>, Json(input): Json<CreateBusInput>) -> ApiResult<Created> {
    let mut store = db.write().await;
    if store.buses.values().any(|bus| bus.bus_number == input.bus_number) {
        return Err(AppError::bad_request("Bus number already exists"));
    }
    let bus_id = store.insert_bus(BusRecord {
        id: 0,
        bus_number: input.bus_number,
        driver_name: input.driver_name,
        driver_phone: input.driver_phone,
        route: input.route,
        total_seats: input.total_seats.unwrap_or(DEFAULT_TOTAL_SEATS),
        status: "active".to_string(),
        current_lat: None,
        current_lng: None,
        created_at: Utc::now(),
    });
    info!("created bus {bus_id}");
    Ok(created(json!({ "message": "Bus created successfully", "bus_id": bus_id })))
}

pub async fn bus_seats(State(db): State<Db>, Path(bus_id): Path<u64>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    if !store.buses.contains_key(&bus_id) {
        return Err(AppError::NotFound("Bus not found"));
    }
    let seats: Vec<Value> = store
        .bus_seats(bus_id)
        .map(|seat| {
            let reserved_by = seat
                .reserved_by
                .and_then(|user_id| store.users.get(&user_id))
                .map(|user| user.name.clone());
            json!({
                "seat_id": seat.id,
                "seat_number": seat.seat_number,
                "is_reserved": seat.reserved_by.is_some(),
                "is_women_seat": seat.is_women_seat,
                "reserved_by": reserved_by,
            })
        })
        .collect();
    Ok(Json(Value::Array(seats)))
}

#[derive(Deserialize)]
pub struct LocationInput {
    latitude: f64,
    longitude: f64,
}

pub async fn update_bus_location(
    State(db): State<Db>,
    Path(bus_id): Path<u64>,
    Json(input): Json<LocationInput>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let bus = store.buses.get_mut(&bus_id).ok_or(AppError::NotFound("Bus not found"))?;
    bus.current_lat = Some(input.latitude);
    bus.current_lng = Some(input.longitude);
    Ok(Json(json!({ "message": "Location updated" })))
}

pub async fn bus_announcements(State(db): State<Db>, Path(bus_id): Path<u64>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    if !store.buses.contains_key(&bus_id) {
        return Err(AppError::NotFound("Bus not found"));
    }
    let announcements: Vec<_> = store.announcements.iter().filter(|a| a.bus_id == bus_id).collect();
    Ok(Json(json!(announcements)))
}

#[derive(Deserialize)]
pub struct ReserveInput {
    user_id: u64,
}

pub async fn reserve_seat(
    State(db): State<Db>,
    Path(seat_id): Path<u64>,
    Json(input): Json<ReserveInput>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let gender = store.users.get(&input.user_id).map(|user| user.gender.clone());
    let (Some(gender), Some(seat)) = (gender, store.seats.get_mut(&seat_id)) else {
        return Err(AppError::NotFound("User or Seat not found"));
    };
    if seat.reserved_by.is_some() {
        return Err(AppError::bad_request("Seat already reserved"));
    }
    if seat.is_women_seat && gender != "female" {
        return Err(AppError::bad_request("This is a women-only seat"));
    }
    seat.reserved_by = Some(input.user_id);
    Ok(Json(json!({
        "message": "Seat reserved successfully",
        "seat_number": seat.seat_number,
    })))
}

pub async fn cancel_seat(State(db): State<Db>, Path(seat_id): Path<u64>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let seat = store.seats.get_mut(&seat_id).ok_or(AppError::NotFound("Seat not found"))?;
    if seat.reserved_by.take().is_none() {
        return Err(AppError::bad_request("Seat is not reserved"));
    }
    Ok(Json(json!({ "message": "Reservation cancelled" })))
}

// ---------------------------------------------------------------------------
// Bookings & payments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateBookingInput {
    user_id: u64,
    bus_id: u64,
    seat_id: u64,
    travel_date: Option<NaiveDate>,
    price: Option<f64>,
}

/// A booking holds its seat. A seat the same user already reserved can be booked.
pub async fn create_booking(State(db): State<Db>, Json(input): Json<CreateBookingInput>) -> ApiResult<Created> {
    let mut store = db.write().await;
    let bus_exists = store.buses.contains_key(&input.bus_id);
    let seat = store
        .seats
        .get_mut(&input.seat_id)
        .filter(|seat| bus_exists && seat.bus_id == input.bus_id)
        .ok_or(AppError::NotFound("Seat or Bus not found"))?;
    if seat.reserved_by.is_some_and(|holder| holder != input.user_id) {
        return Err(AppError::bad_request("Seat already reserved"));
    }
    seat.reserved_by = Some(input.user_id);

    let id = store.next_id();
    let booking = BookingRecord {
        id,
        booking_ref: booking_ref(),
        user_id: input.user_id,
        bus_id: input.bus_id,
        seat_id: input.seat_id,
        travel_date: input.travel_date.unwrap_or_else(|| Utc::now().date_naive()),
        price: input.price.unwrap_or(200.0),
        status: "pending".to_string(),
        cancellation_reason: None,
        created_at: Utc::now(),
    };
    let body = json!({
        "message": "Booking created",
        "booking_id": booking.id,
        "booking_ref": booking.booking_ref,
        "amount": booking.price,
        "currency": "INR",
    });
    info!("booking {} created", booking.booking_ref);
    store.bookings.insert(id, booking);
    Ok(created(body))
}

pub async fn get_booking(State(db): State<Db>, Path(booking_id): Path<u64>) -> ApiResult<Json<BookingRecord>> {
    let store = db.read().await;
    store
        .bookings
        .get(&booking_id)
        .cloned()
        .map(Json)
        .ok_or(AppError::NotFound("Booking not found"))
}

pub async fn confirm_booking(State(db): State<Db>, Path(booking_id): Path<u64>) -> ApiResult<Json<BookingRecord>> {
    let mut store = db.write().await;
    let booking = store
        .bookings
        .get_mut(&booking_id)
        .ok_or(AppError::NotFound("Booking not found"))?;
    if booking.status != "pending" {
        return Err(AppError::bad_request(format!("Cannot confirm a {} booking", booking.status)));
    }
    booking.status = "confirmed".to_string();
    Ok(Json(booking.clone()))
}

#[derive(Deserialize, Default)]
pub struct CancelBookingInput {
    reason: Option<String>,
}

/// Cancelling releases the seat.
pub async fn cancel_booking(
    State(db): State<Db>,
    Path(booking_id): Path<u64>,
    Json(input): Json<CancelBookingInput>,
) -> ApiResult<Json<BookingRecord>> {
    let mut store = db.write().await;
    let booking = store
        .bookings
        .get_mut(&booking_id)
        .ok_or(AppError::NotFound("Booking not found"))?;
    if booking.status == "cancelled" {
        return Err(AppError::bad_request("Booking already cancelled"));
    }
    booking.status = "cancelled".to_string();
    booking.cancellation_reason = input.reason;
    let booking = booking.clone();
    if let Some(seat) = store.seats.get_mut(&booking.seat_id) {
        if seat.reserved_by == Some(booking.user_id) {
            seat.reserved_by = None;
        }
    }
    Ok(Json(booking))
}

#[derive(Deserialize)]
pub struct PaymentInput {
    user_id: u64,
    booking_id: Option<u64>,
    amount: f64,
    payment_method: String,
}

/// Wallet payments debit the wallet; a paid booking is confirmed.
pub async fn create_payment(State(db): State<Db>, Json(input): Json<PaymentInput>) -> ApiResult<Created> {
    let mut store = db.write().await;
    if input.amount <= 0.0 {
        return Err(AppError::bad_request("Amount must be positive"));
    }
    if let Some(booking_id) = input.booking_id {
        if !store.bookings.contains_key(&booking_id) {
            return Err(AppError::NotFound("Booking not found"));
        }
    }
    if input.payment_method == "wallet" {
        if store.wallet_mut(input.user_id).balance < input.amount {
            return Err(AppError::bad_request("Insufficient wallet balance"));
        }
        let description = match input.booking_id {
            Some(id) => format!("Payment for booking {id}"),
            None => "Payment".to_string(),
        };
        store.post_transaction(input.user_id, "debit", input.amount, &description);
    }
    if let Some(booking) = input.booking_id.and_then(|id| store.bookings.get_mut(&id)) {
        booking.status = "confirmed".to_string();
    }

    let payment = PaymentRecord {
        id: store.next_id(),
        transaction_id: transaction_id(),
        user_id: input.user_id,
        booking_id: input.booking_id,
        amount: input.amount,
        method: input.payment_method,
        status: "completed".to_string(),
        created_at: Utc::now(),
    };
    let body = json!({
        "message": "Payment successful",
        "transaction_id": payment.transaction_id,
        "amount": payment.amount,
        "payment_status": payment.status,
    });
    store.payments.push(payment);
    Ok(created(body))
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

pub async fn wallet_balance(State(db): State<Db>, Path(user_id): Path<u64>) -> Json<Value> {
    let mut store = db.write().await;
    let wallet = store.wallet_mut(user_id);
    Json(json!({ "wallet_id": wallet.id, "balance": wallet.balance, "currency": "INR" }))
}

#[derive(Deserialize)]
pub struct AddMoneyInput {
    amount: f64,
    description: Option<String>,
}

pub async fn add_money(
    State(db): State<Db>,
    Path(user_id): Path<u64>,
    Json(input): Json<AddMoneyInput>,
) -> ApiResult<Json<Value>> {
    if !input.amount.is_finite() || input.amount <= 0.0 {
        return Err(AppError::bad_request("Amount must be positive"));
    }
    let mut store = db.write().await;
    let description = input.description.unwrap_or_else(|| "Money added to wallet".to_string());
    let new_balance = store.post_transaction(user_id, "credit", input.amount, &description);
    Ok(Json(json!({ "message": "Money added", "new_balance": new_balance })))
}

#[derive(Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

/// Newest first.
pub async fn wallet_transactions(
    State(db): State<Db>,
    Path(user_id): Path<u64>,
    Query(query): Query<LimitQuery>,
) -> Json<Value> {
    let store = db.read().await;
    let recent: Vec<_> = store
        .wallets
        .get(&user_id)
        .into_iter()
        .flat_map(|wallet| wallet.transactions.iter().rev())
        .take(query.limit.unwrap_or(20))
        .collect();
    Json(json!(recent))
}

// ---------------------------------------------------------------------------
// GPS
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct GpsInput {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    heading: f64,
}

/// Record a fix and move the bus to it.
pub async fn log_gps(
    State(db): State<Db>,
    Path(bus_id): Path<u64>,
    Json(input): Json<GpsInput>,
) -> ApiResult<Created> {
    let mut store = db.write().await;
    let bus = store.buses.get_mut(&bus_id).ok_or(AppError::NotFound("Bus not found"))?;
    bus.current_lat = Some(input.latitude);
    bus.current_lng = Some(input.longitude);
    store.gps.push(GpsRecord {
        bus_id,
        latitude: input.latitude,
        longitude: input.longitude,
        speed: input.speed,
        heading: input.heading,
        timestamp: Utc::now().naive_utc(),
    });
    Ok(created(json!({ "message": "GPS location logged" })))
}

pub async fn latest_gps(State(db): State<Db>, Path(bus_id): Path<u64>) -> ApiResult<Json<GpsRecord>> {
    let store = db.read().await;
    store
        .latest_fix(bus_id)
        .cloned()
        .map(Json)
        .ok_or(AppError::NotFound("No GPS data for this bus"))
}

/// The last `limit` fixes, oldest first.
pub async fn gps_history(
    State(db): State<Db>,
    Path(bus_id): Path<u64>,
    Query(query): Query<LimitQuery>,
) -> Json<Value> {
    let store = db.read().await;
    let mut fixes: Vec<&GpsRecord> = store
        .gps
        .iter()
        .rev()
        .filter(|fix| fix.bus_id == bus_id)
        .take(query.limit.unwrap_or(100))
        .collect();
    fixes.reverse();
    Json(json!(fixes))
}

pub async fn active_bus_locations(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let locations: Vec<Value> = store
        .buses
        .values()
        .filter(|bus| bus.status == "active")
        .filter_map(|bus| {
            let fix = store.latest_fix(bus.id)?;
            Some(json!({
                "bus_id": bus.id,
                "bus_number": bus.bus_number,
                "driver_name": bus.driver_name,
                "route": bus.route,
                "latitude": fix.latitude,
                "longitude": fix.longitude,
                "speed": fix.speed,
                "heading": fix.heading,
                "timestamp": fix.timestamp,
            }))
        })
        .collect();
    Json(Value::Array(locations))
}

fn stop_view(stop: &StopRecord) -> Value {
    json!({
        "id": stop.id,
        "stop_order": stop.stop_order,
        "stop_name": stop.name,
        "latitude": stop.latitude,
        "longitude": stop.longitude,
        "estimated_arrival": null,
        "actual_arrival": stop.actual_arrival,
        "is_completed": stop.is_completed,
    })
}

pub async fn route_stops(State(db): State<Db>, Path(bus_id): Path<u64>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    if !store.buses.contains_key(&bus_id) {
        return Err(AppError::NotFound("Bus not found"));
    }
    let stops: Vec<Value> = store.route_stops(bus_id).into_iter().map(stop_view).collect();
    Ok(Json(Value::Array(stops)))
}

/// Distance and minutes from the bus's position to each stop it has not reached yet.
pub async fn calculate_eta(State(db): State<Db>, Path(bus_id): Path<u64>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    let (lat, lng) = store
        .bus_position(bus_id)
        .ok_or(AppError::NotFound("Bus not found or GPS data unavailable"))?;
    let etas: Vec<Value> = store
        .route_stops(bus_id)
        .into_iter()
        .filter(|stop| !stop.is_completed)
        .map(|stop| {
            let distance = haversine_km(lat, lng, stop.latitude, stop.longitude);
            json!({
                "stop_id": stop.id,
                "stop_name": stop.name,
                "stop_order": stop.stop_order,
                "distance_km": (distance * 100.0).round() / 100.0,
                "eta_minutes": (distance / AVERAGE_SPEED_KMH * 60.0).round() as u32,
            })
        })
        .collect();
    Ok(Json(Value::Array(etas)))
}

pub async fn mark_stop_arrival(
    State(db): State<Db>,
    Path((bus_id, stop_id)): Path<(u64, u64)>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let stop = store
        .stops
        .iter_mut()
        .find(|stop| stop.id == stop_id && stop.bus_id == bus_id)
        .ok_or(AppError::NotFound("Stop not found"))?;
    stop.is_completed = true;
    stop.actual_arrival = Some(Utc::now());
    info!("bus {bus_id} arrived at {}", stop.name);
    Ok(Json(json!({ "message": "Stop arrival recorded" })))
}

#[derive(Deserialize)]
pub struct NextStopInput {
    latitude: f64,
    longitude: f64,
    #[serde(rename = "busId")]
    bus_id: Option<u64>,
}

/// Nearest stop on the bus's route, or on any route when no bus is given.
pub async fn next_stop(State(db): State<Db>, Json(input): Json<NextStopInput>) -> Json<Value> {
    let store = db.read().await;
    let nearest = store
        .stops
        .iter()
        .filter(|stop| input.bus_id.map_or(true, |bus_id| stop.bus_id == bus_id))
        .map(|stop| {
            let distance = haversine_km(input.latitude, input.longitude, stop.latitude, stop.longitude);
            (stop, distance)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let Some((stop, distance)) = nearest else {
        return Json(json!({ "nextStop": null }));
    };
    let minutes = (distance / AVERAGE_SPEED_KMH * 60.0).ceil().max(1.0) as u32;
    Json(json!({
        "nextStop": {
            "name": stop.name,
            "distance": (distance * 100.0).round() / 100.0,
            "estimatedTime": minutes,
            "latitude": stop.latitude,
            "longitude": stop.longitude,
        }
    }))
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

pub async fn dashboard_stats(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let count_role = |role: &str| store.users.values().filter(|u| u.account_type == role).count();
    let completed: Vec<&PaymentRecord> = store.payments.iter().filter(|p| p.status == "completed").collect();
    Json(json!({
        "total_users": store.users.len(),
        "total_buses": store.buses.len(),
        "active_buses": store.buses.values().filter(|b| b.status == "active").count(),
        "total_bookings": store.bookings.len(),
        "confirmed_bookings": store.bookings.values().filter(|b| b.status == "confirmed").count(),
        "total_revenue": completed.iter().map(|p| p.amount).sum::<f64>(),
        "user_stats": {
            "total_users": store.users.len(),
            "passengers": count_role("passenger"),
            "drivers": count_role("driver"),
            "workers": count_role("worker"),
        },
        "payment_stats": {
            "total_payments": store.payments.len(),
            "completed": completed.len(),
            "failed": store.payments.iter().filter(|p| p.status == "failed").count(),
            "refunded": store.payments.iter().filter(|p| p.status == "refunded").count(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Emergencies, lost & found, wake-up alerts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct EmergencyInput {
    bus_id: u64,
    user_id: Option<u64>,
    emergency_type: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    description: String,
}

pub async fn report_emergency(State(db): State<Db>, Json(input): Json<EmergencyInput>) -> ApiResult<Created> {
    let mut store = db.write().await;
    if !store.buses.contains_key(&input.bus_id) {
        return Err(AppError::NotFound("Bus not found"));
    }
    let id = store.next_id();
    let emergency = EmergencyRecord {
        id,
        bus_id: input.bus_id,
        user_id: input.user_id,
        emergency_type: input.emergency_type,
        latitude: input.latitude,
        longitude: input.longitude,
        description: input.description,
        status: "active".to_string(),
    };
    info!("emergency {id} reported on bus {}", emergency.bus_id);
    let body = json!(emergency);
    store.emergencies.insert(id, emergency);
    Ok(created(body))
}

pub async fn active_emergencies(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let active: Vec<_> = store.emergencies.values().filter(|e| e.status == "active").collect();
    Json(json!(active))
}

pub async fn resolve_emergency(State(db): State<Db>, Path(id): Path<u64>) -> ApiResult<Json<EmergencyRecord>> {
    let mut store = db.write().await;
    let emergency = store
        .emergencies
        .get_mut(&id)
        .ok_or(AppError::NotFound("Emergency not found"))?;
    emergency.status = "resolved".to_string();
    Ok(Json(emergency.clone()))
}

#[derive(Deserialize)]
pub struct LostItemInput {
    item_name: String,
    #[serde(default)]
    item_description: String,
    user_id: u64,
}

pub async fn report_lost_item(State(db): State<Db>, Json(input): Json<LostItemInput>) -> ApiResult<Created> {
    let mut store = db.write().await;
    let id = store.next_id();
    let item = LostItemRecord {
        id,
        item_name: input.item_name,
        item_description: input.item_description,
        status: "lost".to_string(),
        reported_by: input.user_id,
        found_by: None,
        location_found: None,
    };
    let body = json!(item);
    store.lost_items.insert(id, item);
    Ok(created(body))
}

#[derive(Deserialize)]
pub struct StatusQuery {
    status: Option<String>,
}

pub async fn lost_items(State(db): State<Db>, Query(query): Query<StatusQuery>) -> Json<Value> {
    let store = db.read().await;
    let items: Vec<_> = store
        .lost_items
        .values()
        .filter(|item| query.status.as_deref().map_or(true, |status| item.status == status))
        .collect();
    Json(json!(items))
}

#[derive(Deserialize)]
pub struct MarkFoundInput {
    worker_id: u64,
    location_found: String,
}

pub async fn mark_item_found(
    State(db): State<Db>,
    Path(item_id): Path<u64>,
    Json(input): Json<MarkFoundInput>,
) -> ApiResult<Json<LostItemRecord>> {
    let mut store = db.write().await;
    let worker = store
        .users
        .get(&input.worker_id)
        .map(|user| user.name.clone())
        .ok_or(AppError::NotFound("Worker not found"))?;
    let item = store
        .lost_items
        .get_mut(&item_id)
        .ok_or(AppError::NotFound("Item not found"))?;
    if item.status != "lost" {
        return Err(AppError::bad_request("Item is not marked as lost"));
    }
    item.status = "found".to_string();
    item.found_by = Some(worker);
    item.location_found = Some(input.location_found);
    Ok(Json(item.clone()))
}

pub async fn claim_item(State(db): State<Db>, Path(item_id): Path<u64>) -> ApiResult<Json<LostItemRecord>> {
    let mut store = db.write().await;
    let item = store
        .lost_items
        .get_mut(&item_id)
        .ok_or(AppError::NotFound("Item not found"))?;
    if item.status != "found" {
        return Err(AppError::bad_request("Item is not available for claim"));
    }
    item.status = "claimed".to_string();
    Ok(Json(item.clone()))
}

#[derive(Deserialize)]
pub struct WakeupAlertInput {
    user_id: u64,
    bus_id: u64,
    stop_name: String,
    stop_lat: f64,
    stop_lng: f64,
    #[serde(default = "default_alert_lead")]
    alert_before_time: u32,
}

fn default_alert_lead() -> u32 {
    300
}

pub async fn create_wakeup_alert(State(db): State<Db>, Json(input): Json<WakeupAlertInput>) -> ApiResult<Created> {
    let mut store = db.write().await;
    if !store.buses.contains_key(&input.bus_id) {
        return Err(AppError::NotFound("Bus not found"));
    }
    let id = store.next_id();
    let alert = WakeupAlertRecord {
        id,
        user_id: input.user_id,
        bus_id: input.bus_id,
        stop_name: input.stop_name,
        stop_lat: input.stop_lat,
        stop_lng: input.stop_lng,
        alert_before_time: input.alert_before_time,
        is_active: true,
    };
    let body = json!(alert);
    store.wakeup_alerts.insert(id, alert);
    Ok(created(body))
}

pub async fn user_wakeup_alerts(State(db): State<Db>, Path(user_id): Path<u64>) -> Json<Value> {
    let store = db.read().await;
    let alerts: Vec<_> = store.wakeup_alerts.values().filter(|a| a.user_id == user_id).collect();
    Json(json!(alerts))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// Admin routes identify the caller by `x-user-id`.
fn require_admin(store: &Store, headers: &HeaderMap) -> ApiResult<u64> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .ok_or(AppError::Unauthorized)?;
    if !store.is_admin(user_id) {
        return Err(AppError::Forbidden);
    }
    Ok(user_id)
}

pub async fn admin_dashboard(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;

    let today = Utc::now().date_naive();
    let total_buses = store.buses.len();
    let active_buses = store.buses.values().filter(|b| b.status == "active").count();
    let total_seats = store.seats.len();
    let reserved = store.seats.values().filter(|s| s.reserved_by.is_some()).count();
    let completed = store.payments.iter().filter(|p| p.status == "completed");
    let (today_revenue, total_revenue) = completed.fold((0.0, 0.0), |(day, all), p| {
        let day = if p.created_at.date_naive() == today { day + p.amount } else { day };
        (day, all + p.amount)
    });

    Ok(Json(json!({
        "buses": { "total": total_buses, "active": active_buses, "inactive": total_buses - active_buses },
        "users": { "total": store.users.len() },
        "seats": { "total": total_seats, "reserved": reserved, "available": total_seats - reserved },
        "revenue": { "today": today_revenue, "total": total_revenue, "currency": "INR" },
        "bookings": {
            "today": store.bookings.values().filter(|b| b.created_at.date_naive() == today).count(),
            "total": store.bookings.len(),
            "confirmed": store.bookings.values().filter(|b| b.status == "confirmed").count(),
        },
    })))
}

#[derive(Deserialize)]
pub struct BusStatusInput {
    status: String,
}

pub async fn update_bus_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(bus_id): Path<u64>,
    Json(input): Json<BusStatusInput>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let admin = require_admin(&store, &headers)?;
    if !matches!(input.status.as_str(), "active" | "inactive" | "maintenance") {
        return Err(AppError::bad_request(format!("Invalid status: {}", input.status)));
    }
    let bus = store.buses.get_mut(&bus_id).ok_or(AppError::NotFound("Bus not found"))?;
    info!("admin {admin} set bus {bus_id} {} -> {}", bus.status, input.status);
    let old_status = std::mem::replace(&mut bus.status, input.status.clone());
    store.log_admin_action(
        admin,
        "UPDATE_STATUS",
        "bus",
        Some(bus_id),
        json!({ "old_status": old_status, "new_status": input.status }),
    );
    Ok(Json(json!({ "message": "Bus status updated" })))
}

/// Every bus, whatever its status, with seat occupancy.
pub async fn admin_buses(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<Pagination>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;
    let buses: Vec<&BusRecord> = store.buses.values().collect();
    Ok(Json(query.envelope("buses", DEFAULT_PER_PAGE, buses, |bus| {
        let reserved = store.bus_seats(bus.id).filter(|seat| seat.reserved_by.is_some()).count();
        json!({
            "id": bus.id,
            "bus_number": bus.bus_number,
            "driver_name": bus.driver_name,
            "driver_phone": bus.driver_phone,
            "route": bus.route,
            "total_seats": bus.total_seats,
            "reserved_seats": reserved,
            "available_seats": bus.total_seats as usize - reserved,
            "status": bus.status,
            "current_location": { "latitude": bus.current_lat, "longitude": bus.current_lng },
            "created_at": bus.created_at,
        })
    })))
}

pub async fn admin_users(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<Pagination>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;
    let users: Vec<&UserRecord> = store.users.values().collect();
    Ok(Json(query.envelope("users", DEFAULT_PER_PAGE, users, |user| {
        json!({
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "phone": user.phone,
            "gender": user.gender,
            "account_type": user.account_type,
            "bookings": store.bookings.values().filter(|b| b.user_id == user.id).count(),
            "created_at": user.created_at,
        })
    })))
}

#[derive(Deserialize)]
pub struct PaymentQuery {
    page: Option<u64>,
    per_page: Option<u64>,
    status: Option<String>,
}

/// Newest first, optionally only one payment status.
pub async fn admin_payments(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<PaymentQuery>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;
    let payments: Vec<&PaymentRecord> = store
        .payments
        .iter()
        .rev()
        .filter(|p| query.status.as_deref().map_or(true, |status| p.status == status))
        .collect();
    let pages = Pagination { page: query.page, per_page: query.per_page };
    Ok(Json(pages.envelope("payments", DEFAULT_PER_PAGE, payments, |p| {
        json!({
            "id": p.id,
            "transaction_id": p.transaction_id,
            "user_id": p.user_id,
            "user_name": store.users.get(&p.user_id).map(|user| user.name.clone()),
            "booking_id": p.booking_id,
            "amount": p.amount,
            "currency": "INR",
            "payment_method": p.method,
            "payment_status": p.status,
            "gateway": "mock",
            "created_at": p.created_at,
        })
    })))
}

const DEFAULT_ANALYTICS_DAYS: u32 = 30;

#[derive(Deserialize)]
pub struct DaysQuery {
    days: Option<u32>,
}

impl DaysQuery {
    fn days(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_ANALYTICS_DAYS)
    }

    /// `None` when the window reaches back past the calendar's start.
    fn since(&self) -> Option<DateTime<Utc>> {
        Utc::now().checked_sub_signed(Duration::days(i64::from(self.days())))
    }

}

fn within(since: Option<DateTime<Utc>>, at: &DateTime<Utc>) -> bool {
    since.map_or(true, |since| *at >= since)
}

/// Completed payments in the window, by day and by method.
pub async fn revenue_analytics(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<DaysQuery>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;
    let mut by_date: BTreeMap<String, f64> = BTreeMap::new();
    let mut by_method: BTreeMap<String, f64> = BTreeMap::new();
    let mut total = 0.0;
    let mut count = 0usize;
    let since = query.since();
    for payment in store.completed_payments().filter(|p| within(since, &p.created_at)) {
        *by_date.entry(payment.created_at.date_naive().to_string()).or_default() += payment.amount;
        *by_method.entry(payment.method.clone()).or_default() += payment.amount;
        total += payment.amount;
        count += 1;
    }
    let average = if count == 0 { 0.0 } else { total / count as f64 };
    Ok(Json(json!({
        "total_revenue": total,
        "period_days": query.days(),
        "revenue_by_date": by_date,
        "revenue_by_method": by_method,
        "total_transactions": count,
        "average_transaction": average,
    })))
}

pub async fn booking_analytics(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<DaysQuery>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;
    let mut breakdown: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total = 0usize;
    let since = query.since();
    for booking in store.bookings.values().filter(|b| within(since, &b.created_at)) {
        *breakdown.entry(booking.status.as_str()).or_default() += 1;
        total += 1;
    }
    Ok(Json(json!({
        "total_bookings": total,
        "status_breakdown": breakdown,
        "period_days": query.days(),
    })))
}

/// Snapshot today's revenue and bookings with the fleet and user totals.
pub async fn daily_report(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Created> {
    let mut store = db.write().await;
    let admin = require_admin(&store, &headers)?;
    let today = Utc::now().date_naive();
    let report = ReportRecord {
        id: store.next_id(),
        report_date: today,
        total_revenue: store
            .completed_payments()
            .filter(|p| p.created_at.date_naive() == today)
            .map(|p| p.amount)
            .sum(),
        total_bookings: store.bookings.values().filter(|b| b.created_at.date_naive() == today).count(),
        total_users: store.users.len(),
        total_buses: store.buses.len(),
        active_buses: store.buses.values().filter(|b| b.status == "active").count(),
    };
    info!("admin {admin} generated report {} for {today}", report.id);
    let body = json!({ "message": "Daily report generated", "report_id": report.id, "data": report });
    store.reports.push(report);
    Ok(created(body))
}

const DEFAULT_LOGS_PER_PAGE: u64 = 20;

/// Newest first.
pub async fn admin_logs(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<Pagination>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    require_admin(&store, &headers)?;
    let logs: Vec<&AdminLogRecord> = store.admin_logs.iter().rev().collect();
    Ok(Json(query.envelope("logs", DEFAULT_LOGS_PER_PAGE, logs, |log| {
        json!({
            "id": log.id,
            "admin_name": store.users.get(&log.admin_id).map(|user| user.name.clone()),
            "action": log.action,
            "entity_type": log.entity_type,
            "entity_id": log.entity_id,
            "changes": log.changes,
            "timestamp": log.timestamp,
        })
    })))
}
