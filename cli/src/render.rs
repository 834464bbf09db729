//! Plain-text views of the cached manager state.

use transit_core::gps::{Announcer, Geolocation, GpsTracker};
use transit_core::managers::{BusManager, FleetManager, WalletManager};
use transit_core::types::{
    format_rupees, ActiveBusLocation, AdminBus, AdminDashboard, AdminLog, AdminPage, AdminPayment, AdminUser,
    Announcement, Booking, BookingAnalytics, BookingReceipt, BusId, DailyReport, Emergency, FormattedStats, GpsFix,
    LostItem, RevenueAnalytics, User, WakeupAlert,
};

/// Seats per printed row.
const SEAT_ROW: usize = 4;

pub fn home(user: Option<&User>) -> String {
    match user {
        Some(user) => format!("Welcome back, {} ({}).", user.name, user.account_type),
        None => "Welcome to Smart Transit. Run `transit login <email> <password>` to begin.".to_string(),
    }
}

pub fn auth() -> String {
    "Please log in: transit login <email> <password>\n\
     New here? transit register <name> <email> <phone> <gender> <password> <confirm>"
        .to_string()
}

pub fn buses(manager: &BusManager) -> String {
    let (page, pages, total) = manager.pagination();
    let mut lines = vec![format!("Buses (page {page} of {pages}, {total} total)")];
    if manager.buses().is_empty() {
        lines.push("  No buses running.".to_string());
    }
    for bus in manager.buses() {
        lines.push(format!(
            "  #{:<4} {:<12} {:<32} {}/{} seats free",
            bus.id, bus.bus_number, bus.route, bus.available_seats, bus.total_seats
        ));
    }
    lines.join("\n")
}

/// Seat map: `xx` reserved, `W` women-only.
pub fn seats(manager: &BusManager) -> String {
    let mut lines = Vec::new();
    if let Some(bus) = manager.selected_bus() {
        lines.push(format!("{} - {}", bus.bus_number, bus.route));
    }
    for row in manager.seats().chunks(SEAT_ROW) {
        let cells: Vec<String> = row
            .iter()
            .map(|seat| {
                let number = if seat.is_reserved {
                    " xx".to_string()
                } else {
                    format!("{:>3}", seat.seat_number)
                };
                let tag = if seat.is_women_seat { 'W' } else { ' ' };
                format!("[{number}{tag}]")
            })
            .collect();
        lines.push(cells.join(" "));
    }
    lines.push(format!(
        "{} free, {} reserved, {:.0}% occupied",
        manager.available_seats_count(),
        manager.reserved_seats_count(),
        manager.seat_occupancy()
    ));
    lines.join("\n")
}

pub fn booking_receipt(receipt: &BookingReceipt) -> String {
    format!(
        "Booking {} created (id {}). Amount due: {} {}",
        receipt.booking_ref,
        receipt.booking_id,
        format_rupees(receipt.amount),
        receipt.currency
    )
}

pub fn booking(booking: &Booking) -> String {
    let mut text = format!(
        "Booking {} (id {}): bus {}, seat {}, {} - {} [{:?}]",
        booking.booking_ref,
        booking.id,
        booking.bus_id,
        booking.seat_id,
        booking.travel_date,
        format_rupees(booking.price),
        booking.status
    );
    if let Some(reason) = &booking.cancellation_reason {
        text.push_str(&format!("\n  Cancelled: {reason}"));
    }
    text
}

pub fn wallet(manager: &WalletManager) -> String {
    let mut lines = vec![format!("Wallet balance: {}", manager.format_balance())];
    if manager.transactions().is_empty() {
        lines.push("  No transactions yet.".to_string());
    }
    for txn in manager.transactions() {
        lines.push(format!(
            "  {}  {:<10} {}",
            txn.date.format("%Y-%m-%d %H:%M"),
            txn.signed_amount(),
            txn.description
        ));
    }
    lines.join("\n")
}

pub fn dashboard(stats: &FormattedStats) -> String {
    [
        format!("Users:     {} ({} passengers)", stats.total_users, stats.passengers),
        format!("Buses:     {} ({} active)", stats.total_buses, stats.active_buses),
        format!("Bookings:  {} ({} confirmed)", stats.total_bookings, stats.confirmed_bookings),
        format!("Revenue:   {} from {} payments", stats.total_revenue, stats.completed_payments),
    ]
    .join("\n")
}

pub fn admin(dashboard: &AdminDashboard) -> String {
    let AdminDashboard {
        buses,
        users,
        seats,
        revenue,
        bookings,
    } = dashboard;
    [
        format!("Fleet:     {} buses, {} active, {} inactive", buses.total, buses.active, buses.inactive),
        format!("Users:     {}", users.total),
        format!("Seats:     {} reserved of {} ({} free)", seats.reserved, seats.total, seats.available),
        format!(
            "Revenue:   {} today, {} total ({})",
            format_rupees(revenue.today),
            format_rupees(revenue.total),
            revenue.currency
        ),
        format!("Bookings:  {} today, {} total, {} confirmed", bookings.today, bookings.total, bookings.confirmed),
    ]
    .join("\n")
}

fn page_heading<T>(what: &str, page: &AdminPage<T>) -> String {
    format!("{what} (page {} of {}, {} total)", page.current_page, page.pages, page.total)
}

pub fn admin_buses(page: &AdminPage<AdminBus>) -> String {
    let mut lines = vec![page_heading("Fleet", page)];
    for bus in &page.items {
        let location = match bus.current_location.point() {
            Some(point) => format!("{:.4}, {:.4}", point.latitude, point.longitude),
            None => "no location".to_string(),
        };
        lines.push(format!(
            "  #{:<4} {:<12} {:<11} {}/{} reserved  {location}",
            bus.id,
            bus.bus_number,
            bus.status.as_str(),
            bus.reserved_seats,
            bus.total_seats
        ));
    }
    lines.join("\n")
}

pub fn admin_users(page: &AdminPage<AdminUser>) -> String {
    let mut lines = vec![page_heading("Users", page)];
    for user in &page.items {
        lines.push(format!(
            "  #{:<4} {:<20} {:<28} {:<10} {} bookings",
            user.id,
            user.name,
            user.email,
            user.account_type.as_str(),
            user.bookings
        ));
    }
    lines.join("\n")
}

pub fn admin_payments(page: &AdminPage<AdminPayment>) -> String {
    let mut lines = vec![page_heading("Payments", page)];
    for payment in &page.items {
        let who = payment.user_name.as_deref().unwrap_or("unknown user");
        lines.push(format!(
            "  {}  {} {:<10} {:<9} {who}",
            payment.created_at.format("%Y-%m-%d %H:%M"),
            payment.transaction_id,
            format_rupees(payment.amount),
            payment.payment_status
        ));
    }
    lines.join("\n")
}

pub fn revenue(analytics: &RevenueAnalytics) -> String {
    let mut lines = vec![
        format!(
            "Revenue, last {} days: {} from {} payments (average {})",
            analytics.period_days,
            format_rupees(analytics.total_revenue),
            analytics.total_transactions,
            format_rupees(analytics.average_transaction)
        ),
    ];
    for (method, amount) in &analytics.revenue_by_method {
        lines.push(format!("  {method:<12} {}", format_rupees(*amount)));
    }
    for (date, amount) in &analytics.revenue_by_date {
        lines.push(format!("  {date}   {}", format_rupees(*amount)));
    }
    lines.join("\n")
}

pub fn booking_analytics(analytics: &BookingAnalytics) -> String {
    let mut lines = vec![format!(
        "Bookings, last {} days: {}",
        analytics.period_days, analytics.total_bookings
    )];
    for (status, count) in &analytics.status_breakdown {
        lines.push(format!("  {status:<10} {count}"));
    }
    lines.join("\n")
}

pub fn daily_report(report: &DailyReport) -> String {
    let data = &report.data;
    format!(
        "Report #{}: {} revenue, {} bookings today; {} users, {}/{} buses active",
        report.report_id,
        format_rupees(data.total_revenue),
        data.total_bookings,
        data.total_users,
        data.active_buses,
        data.total_buses
    )
}

pub fn admin_logs(page: &AdminPage<AdminLog>) -> String {
    let mut lines = vec![page_heading("Admin log", page)];
    for log in &page.items {
        let who = log.admin_name.as_deref().unwrap_or("unknown admin");
        let target = match log.entity_id {
            Some(id) => format!("{} #{id}", log.entity_type),
            None => log.entity_type.clone(),
        };
        let mut line = format!("  {}  {who}: {} {target}", log.timestamp.format("%Y-%m-%d %H:%M"), log.action);
        if let Some(changes) = &log.changes {
            line.push_str(&format!(" {changes}"));
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn active_buses(locations: &[ActiveBusLocation]) -> String {
    if locations.is_empty() {
        return "No buses are reporting their location.".to_string();
    }
    let mut lines = vec![format!("{} buses reporting:", locations.len())];
    for bus in locations {
        lines.push(format!(
            "  #{:<4} {:<12} {:.4}, {:.4}  {:.0} km/h  {}",
            bus.bus_id,
            bus.bus_number,
            bus.latitude,
            bus.longitude,
            bus.speed,
            bus.timestamp.format("%H:%M:%S")
        ));
    }
    lines.join("\n")
}

pub fn gps_fix(fix: &GpsFix) -> String {
    format!(
        "{:.4}, {:.4}  {:.0} km/h heading {:.0}  at {}",
        fix.latitude,
        fix.longitude,
        fix.speed,
        fix.heading,
        fix.timestamp.format("%Y-%m-%d %H:%M:%S")
    )
}

pub fn gps_history(bus: BusId, fixes: &[GpsFix]) -> String {
    if fixes.is_empty() {
        return format!("No GPS history for bus {bus}.");
    }
    let mut lines = vec![format!("{} fixes for bus {bus}, oldest first:", fixes.len())];
    lines.extend(fixes.iter().map(|fix| format!("  {}", gps_fix(fix))));
    lines.join("\n")
}

pub fn announcements(bus: BusId, announcements: &[Announcement]) -> String {
    if announcements.is_empty() {
        return format!("No announcements for bus {bus}.");
    }
    let mut lines = vec![format!("Announcements for bus {bus}:")];
    lines.extend(announcements.iter().map(|a| format!("  {}", a.message)));
    lines.join("\n")
}

/// Stops in order; reached ones are ticked, the rest carry their estimate.
pub fn route(fleet: &FleetManager) -> String {
    if fleet.route().is_empty() {
        return "No stops on this route.".to_string();
    }
    let mut lines = Vec::new();
    for stop in fleet.route() {
        let eta = fleet.etas().iter().find(|eta| eta.stop_id == stop.id);
        let status = match (stop.is_completed, eta) {
            (true, _) => "reached".to_string(),
            (false, Some(eta)) => format!("{:.2} km, ~{} min", eta.distance_km, eta.eta_minutes),
            (false, None) => "no estimate".to_string(),
        };
        lines.push(format!("  {}. {:<20} #{:<4} {status}", stop.stop_order, stop.stop_name, stop.id));
    }
    lines.join("\n")
}

pub fn emergencies(active: &[Emergency]) -> String {
    if active.is_empty() {
        return "No active emergencies.".to_string();
    }
    let mut lines = vec![format!("{} active emergencies:", active.len())];
    for emergency in active {
        lines.push(format!(
            "  #{} bus {} {}: {}",
            emergency.id, emergency.bus_id, emergency.emergency_type, emergency.description
        ));
    }
    lines.join("\n")
}

pub fn lost_items(items: &[LostItem]) -> String {
    if items.is_empty() {
        return "No items waiting to be claimed.".to_string();
    }
    let mut lines = vec!["Found items:".to_string()];
    for item in items {
        let place = item.location_found.as_deref().unwrap_or("unknown location");
        lines.push(format!("  #{} {} ({}) at {place}", item.id, item.item_name, item.status));
    }
    lines.join("\n")
}

pub fn alerts(alerts: &[WakeupAlert]) -> String {
    if alerts.is_empty() {
        return "No wake-up alerts set.".to_string();
    }
    let mut lines = vec!["Wake-up alerts:".to_string()];
    for alert in alerts {
        let state = if alert.is_active { "on" } else { "off" };
        lines.push(format!(
            "  #{} bus {} at {}, {} min before [{state}]",
            alert.id,
            alert.bus_id,
            alert.stop_name,
            alert.alert_before_time / 60
        ));
    }
    lines.join("\n")
}

/// One status line per fix.
pub fn tracking<G: Geolocation, A: Announcer>(tracker: &GpsTracker<G, A>) -> String {
    let Some(position) = tracker.position() else {
        return "Waiting for location...".to_string();
    };
    let mut line = format!(
        "{:.4}, {:.4}  signal {}",
        position.latitude,
        position.longitude,
        position.signal_quality()
    );
    if let Some(stop) = tracker.next_stop() {
        line.push_str(&format!("  next: {}", stop.name));
        if let Some(distance) = stop.distance {
            line.push_str(&format!(" {distance:.2} km"));
        }
        if let Some(minutes) = stop.estimated_time {
            line.push_str(&format!(" ~{minutes} min"));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_core::types::admin::RevenueSummary;
    use transit_core::types::{AccountType, LostItemStatus};

    #[test]
    fn home_greets_the_user() {
        let user = User {
            id: 7,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            account_type: AccountType::Driver,
        };
        assert_eq!(home(Some(&user)), "Welcome back, Asha (driver).");
        assert!(home(None).contains("transit login"));
    }

    #[test]
    fn admin_view_formats_rupees() {
        let dashboard = AdminDashboard {
            revenue: RevenueSummary {
                today: 250.0,
                total: 1200.5,
                currency: "INR".to_string(),
            },
            ..AdminDashboard::default()
        };
        assert!(admin(&dashboard).contains("₹250.00 today, ₹1200.50 total (INR)"));
    }

    #[test]
    fn empty_admin_page_still_has_a_heading() {
        let page: AdminPage<AdminUser> = serde_json::from_str(r#"{"users":[],"total":0,"pages":0,"current_page":3}"#).unwrap();
        assert_eq!(admin_users(&page), "Users (page 3 of 0, 0 total)");
    }

    #[test]
    fn revenue_lists_methods_then_days() {
        let analytics = RevenueAnalytics {
            total_revenue: 450.0,
            period_days: 7,
            revenue_by_date: [("2025-03-14".to_string(), 450.0)].into_iter().collect(),
            revenue_by_method: [("upi".to_string(), 200.0), ("wallet".to_string(), 250.0)].into_iter().collect(),
            total_transactions: 2,
            average_transaction: 225.0,
        };
        let text = revenue(&analytics);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Revenue, last 7 days: ₹450.00 from 2 payments (average ₹225.00)");
        assert!(lines[1].starts_with("  upi"));
        assert!(lines[3].starts_with("  2025-03-14"));
    }

    #[test]
    fn lost_item_without_location() {
        let items = [LostItem {
            id: 3,
            item_name: "Umbrella".to_string(),
            item_description: String::new(),
            status: LostItemStatus::Found,
            found_by: None,
            location_found: None,
        }];
        assert_eq!(lost_items(&items), "Found items:\n  #3 Umbrella (found) at unknown location");
    }

    #[test]
    fn empty_lists_say_so() {
        assert_eq!(alerts(&[]), "No wake-up alerts set.");
        assert_eq!(emergencies(&[]), "No active emergencies.");
    }
}
