//! Command-line parsing.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use transit_core::pages::Page;
use transit_core::managers::{DEFAULT_ANALYTICS_DAYS, DEFAULT_HISTORY_LIMIT};
use transit_core::types::{BusId, BusStatus, Gender, PaymentMethod};

pub const USAGE: &str = "\
usage: transit <command> [args]

  login <email> <password>
  register <name> <email> <phone> <gender> <password> <confirm>
  logout
  show <page>                      home, auth, buses, booking, dashboard, wallet,
                                   emergency, lost-found, tracking, alerts
  seats <bus>
  reserve <bus> <seat>
  cancel-seat <bus> <seat>
  book <bus> <seat> [YYYY-MM-DD]
  booking <id>
  confirm <id>
  cancel-booking <id> [reason]
  pay <booking> <amount> [card|upi|wallet|net_banking]
  add-money <amount>
  emergency <bus> <type> <description>
  resolve <emergency>
  report-lost <name> <description>
  found <item> <location>
  claim <item>
  alert <bus> <stop> <lat> <lng>
  fleet                            buses reporting GPS fixes
  gps latest <bus>
  gps history <bus> [limit]
  gps log <bus> <lat> <lng> [speed] [heading]
  move-bus <bus> <lat> <lng>
  announcements <bus>
  stops <bus>                      route stops with arrival estimates
  arrive <bus> <stop>
  admin [dashboard]
  admin buses [page]
  admin bus-status <bus> <active|inactive|maintenance>
  admin users [page]
  admin payments [page] [status]
  admin revenue [days]
  admin bookings [days]
  admin report
  admin logs [page]
  track [bus] [--voice]            reads `lat,lng[,accuracy]` lines from stdin";

/// Seats are addressed by their number on the bus, as printed by `seats`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { email: String, password: String },
    Register {
        name: String,
        email: String,
        phone: String,
        gender: Gender,
        password: String,
        confirm_password: String,
    },
    Logout,
    Show(Page),
    Seats(BusId),
    Reserve { bus: BusId, seat: u32 },
    CancelSeat { bus: BusId, seat: u32 },
    Book { bus: BusId, seat: u32, date: Option<NaiveDate> },
    Booking(u64),
    Confirm(u64),
    CancelBooking { id: u64, reason: Option<String> },
    Pay { booking: u64, amount: f64, method: PaymentMethod },
    AddMoney(f64),
    Emergency { bus: BusId, kind: String, description: String },
    Resolve(u64),
    ReportLost { name: String, description: String },
    Found { item: u64, location: String },
    Claim(u64),
    Alert { bus: BusId, stop: String, lat: f64, lng: f64 },
    Fleet,
    GpsLatest(BusId),
    GpsHistory { bus: BusId, limit: u32 },
    GpsLog { bus: BusId, lat: f64, lng: f64, speed: f64, heading: f64 },
    MoveBus { bus: BusId, lat: f64, lng: f64 },
    Announcements(BusId),
    Stops(BusId),
    Arrive { bus: BusId, stop: u64 },
    Admin(AdminCommand),
    Track { bus: Option<BusId>, voice: bool },
    Help,
}

/// `admin` subcommands. Pages count from 1.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminCommand {
    Dashboard,
    Buses { page: u32 },
    BusStatus { bus: BusId, status: BusStatus },
    Users { page: u32 },
    Payments { page: u32, status: Option<String> },
    Revenue { days: u32 },
    Bookings { days: u32 },
    Report,
    Logs { page: u32 },
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };
        let mut args = Args {
            name: name.as_str(),
            rest,
            next: 0,
        };
        let command = match name.as_str() {
            "login" => Command::Login {
                email: args.text("email")?,
                password: args.text("password")?,
            },
            "register" => Command::Register {
                name: args.text("name")?,
                email: args.text("email")?,
                phone: args.text("phone")?,
                gender: args.text("gender")?.parse().map_err(anyhow::Error::msg)?,
                password: args.text("password")?,
                confirm_password: args.text("password confirmation")?,
            },
            "logout" => Command::Logout,
            "show" => Command::Show(args.text("page")?.parse()?),
            "seats" => Command::Seats(args.number("bus")?),
            "reserve" => Command::Reserve {
                bus: args.number("bus")?,
                seat: args.number("seat")?,
            },
            "cancel-seat" => Command::CancelSeat {
                bus: args.number("bus")?,
                seat: args.number("seat")?,
            },
            "book" => Command::Book {
                bus: args.number("bus")?,
                seat: args.number("seat")?,
                date: args
                    .optional()
                    .map(|raw| raw.parse::<NaiveDate>().with_context(|| format!("invalid date: {raw}")))
                    .transpose()?,
            },
            "booking" => Command::Booking(args.number("booking id")?),
            "confirm" => Command::Confirm(args.number("booking id")?),
            "cancel-booking" => Command::CancelBooking {
                id: args.number("booking id")?,
                reason: args.remainder(),
            },
            "pay" => Command::Pay {
                booking: args.number("booking id")?,
                amount: args.number("amount")?,
                method: payment_method(args.optional().unwrap_or("wallet"))?,
            },
            "add-money" => Command::AddMoney(args.number("amount")?),
            "emergency" => Command::Emergency {
                bus: args.number("bus")?,
                kind: args.text("type")?,
                description: args.remainder().unwrap_or_default(),
            },
            "resolve" => Command::Resolve(args.number("emergency id")?),
            "found" => Command::Found {
                item: args.number("item id")?,
                location: match args.remainder() {
                    Some(location) => location,
                    None => bail!("found: missing location"),
                },
            },
            "report-lost" => Command::ReportLost {
                name: args.text("item name")?,
                description: args.remainder().unwrap_or_default(),
            },
            "claim" => Command::Claim(args.number("item id")?),
            "alert" => Command::Alert {
                bus: args.number("bus")?,
                stop: args.text("stop")?,
                lat: args.number("latitude")?,
                lng: args.number("longitude")?,
            },
            "fleet" => Command::Fleet,
            "gps" => match args.text("subcommand")?.as_str() {
                "latest" => Command::GpsLatest(args.number("bus")?),
                "history" => Command::GpsHistory {
                    bus: args.number("bus")?,
                    limit: args.number_or("limit", DEFAULT_HISTORY_LIMIT)?,
                },
                "log" => Command::GpsLog {
                    bus: args.number("bus")?,
                    lat: args.number("latitude")?,
                    lng: args.number("longitude")?,
                    speed: args.number_or("speed", 0.0)?,
                    heading: args.number_or("heading", 0.0)?,
                },
                other => bail!("gps: unknown subcommand: {other}"),
            },
            "move-bus" => Command::MoveBus {
                bus: args.number("bus")?,
                lat: args.number("latitude")?,
                lng: args.number("longitude")?,
            },
            "announcements" => Command::Announcements(args.number("bus")?),
            "stops" => Command::Stops(args.number("bus")?),
            "arrive" => Command::Arrive {
                bus: args.number("bus")?,
                stop: args.number("stop id")?,
            },
            "admin" => Command::Admin(match args.optional().unwrap_or("dashboard") {
                "dashboard" => AdminCommand::Dashboard,
                "buses" => AdminCommand::Buses {
                    page: args.number_or("page", 1)?,
                },
                "bus-status" => AdminCommand::BusStatus {
                    bus: args.number("bus")?,
                    status: args.text("status")?.parse().map_err(anyhow::Error::msg)?,
                },
                "users" => AdminCommand::Users {
                    page: args.number_or("page", 1)?,
                },
                "payments" => AdminCommand::Payments {
                    page: args.number_or("page", 1)?,
                    status: args.optional().map(str::to_string),
                },
                "revenue" => AdminCommand::Revenue {
                    days: args.number_or("days", DEFAULT_ANALYTICS_DAYS)?,
                },
                "bookings" => AdminCommand::Bookings {
                    days: args.number_or("days", DEFAULT_ANALYTICS_DAYS)?,
                },
                "report" => AdminCommand::Report,
                "logs" => AdminCommand::Logs {
                    page: args.number_or("page", 1)?,
                },
                other => bail!("admin: unknown subcommand: {other}"),
            }),
            "track" => {
                let voice = rest.iter().any(|arg| arg == "--voice");
                let bus = rest
                    .iter()
                    .find(|arg| *arg != "--voice")
                    .map(|raw| raw.parse::<BusId>().with_context(|| format!("invalid bus: {raw}")))
                    .transpose()?;
                return Ok(Command::Track { bus, voice });
            }
            "help" | "-h" | "--help" => Command::Help,
            other => bail!("unknown command: {other}\n\n{USAGE}"),
        };
        Ok(command)
    }
}

/// Method names as the API spells them: `card`, `upi`, `wallet`, `net_banking`.
fn payment_method(raw: &str) -> Result<PaymentMethod> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .with_context(|| format!("unknown payment method: {raw}"))
}

struct Args<'a> {
    name: &'a str,
    rest: &'a [String],
    next: usize,
}

impl<'a> Args<'a> {
    fn optional(&mut self) -> Option<&'a str> {
        let value = self.rest.get(self.next)?;
        self.next += 1;
        Some(value.as_str())
    }

    fn text(&mut self, what: &str) -> Result<String> {
        match self.optional() {
            Some(value) => Ok(value.to_string()),
            None => bail!("{}: missing {what}", self.name),
        }
    }

    fn number<N: std::str::FromStr>(&mut self, what: &str) -> Result<N> {
        let raw = self.text(what)?;
        raw.parse()
            .map_err(|_| anyhow::anyhow!("{}: invalid {what}: {raw}", self.name))
    }

    fn number_or<N: std::str::FromStr>(&mut self, what: &str, default: N) -> Result<N> {
        match self.rest.get(self.next) {
            Some(_) => self.number(what),
            None => Ok(default),
        }
    }

    /// Every remaining word, joined by spaces.
    fn remainder(&mut self) -> Option<String> {
        let rest = self.rest.get(self.next..).filter(|rest| !rest.is_empty())?;
        self.next = self.rest.len();
        Some(rest.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command> {
        let args: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        Command::parse(&args)
    }

    #[test]
    fn no_arguments_prints_help() {
        assert_eq!(parse("").unwrap(), Command::Help);
    }

    #[test]
    fn page_names_use_their_url_form() {
        assert_eq!(parse("show lost-found").unwrap(), Command::Show(Page::LostFound));
        assert!(parse("show settings").is_err());
    }

    #[test]
    fn free_text_takes_the_rest_of_the_line() {
        assert_eq!(
            parse("emergency 5 medical passenger fainted near door").unwrap(),
            Command::Emergency {
                bus: 5,
                kind: "medical".to_string(),
                description: "passenger fainted near door".to_string(),
            }
        );
        assert_eq!(
            parse("cancel-booking 9").unwrap(),
            Command::CancelBooking { id: 9, reason: None }
        );
    }

    #[test]
    fn track_flags_in_any_order() {
        assert_eq!(parse("track --voice 3").unwrap(), Command::Track { bus: Some(3), voice: true });
        assert_eq!(parse("track").unwrap(), Command::Track { bus: None, voice: false });
    }

    #[test]
    fn book_date_is_optional() {
        let Command::Book { date, .. } = parse("book 1 12 2025-03-14").unwrap() else {
            panic!("expected book");
        };
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert!(parse("book 1 12 tomorrow").is_err());
        assert!(matches!(parse("book 1 12").unwrap(), Command::Book { date: None, .. }));
    }

    #[test]
    fn payment_defaults_to_wallet() {
        assert_eq!(
            parse("pay 4 250").unwrap(),
            Command::Pay { booking: 4, amount: 250.0, method: PaymentMethod::Wallet }
        );
        assert!(matches!(parse("pay 4 250 upi").unwrap(), Command::Pay { method: PaymentMethod::Upi, .. }));
        assert!(parse("pay 4 250 cheque").is_err());
    }

    #[test]
    fn register_needs_the_confirmation() {
        let err = parse("register Asha asha@example.com 9876543210 female secret1").unwrap_err();
        assert_eq!(err.to_string(), "register: missing password confirmation");
        let Command::Register {
            password,
            confirm_password,
            gender,
            ..
        } = parse("register Asha asha@example.com 9876543210 female secret1 secret2").unwrap()
        else {
            panic!("expected register");
        };
        assert_eq!(gender, Gender::Female);
        assert_eq!((password.as_str(), confirm_password.as_str()), ("secret1", "secret2"));
    }

    #[test]
    fn admin_defaults_to_the_dashboard() {
        assert_eq!(parse("admin").unwrap(), Command::Admin(AdminCommand::Dashboard));
        assert_eq!(
            parse("admin payments 2 refunded").unwrap(),
            Command::Admin(AdminCommand::Payments { page: 2, status: Some("refunded".to_string()) })
        );
        assert_eq!(
            parse("admin revenue").unwrap(),
            Command::Admin(AdminCommand::Revenue { days: DEFAULT_ANALYTICS_DAYS })
        );
        assert_eq!(
            parse("admin bus-status 5 maintenance").unwrap(),
            Command::Admin(AdminCommand::BusStatus { bus: 5, status: BusStatus::Maintenance })
        );
        assert!(parse("admin bus-status 5 parked").is_err());
        assert_eq!(parse("admin audit").unwrap_err().to_string(), "admin: unknown subcommand: audit");
    }

    #[test]
    fn gps_subcommands_fill_optional_values() {
        assert_eq!(
            parse("gps history 5").unwrap(),
            Command::GpsHistory { bus: 5, limit: DEFAULT_HISTORY_LIMIT }
        );
        assert_eq!(
            parse("gps log 5 28.63 77.21 30").unwrap(),
            Command::GpsLog { bus: 5, lat: 28.63, lng: 77.21, speed: 30.0, heading: 0.0 }
        );
        assert_eq!(parse("gps log 5 28.63 77.21 fast").unwrap_err().to_string(), "gps: invalid speed: fast");
        assert_eq!(parse("gps").unwrap_err().to_string(), "gps: missing subcommand");
    }

    #[test]
    fn found_needs_a_location() {
        assert_eq!(
            parse("found 7 Saket depot lockers").unwrap(),
            Command::Found { item: 7, location: "Saket depot lockers".to_string() }
        );
        assert_eq!(parse("found 7").unwrap_err().to_string(), "found: missing location");
    }

    #[test]
    fn bad_numbers_name_the_argument() {
        let err = parse("reserve one 2").unwrap_err();
        assert_eq!(err.to_string(), "reserve: invalid bus: one");
        let err = parse("seats").unwrap_err();
        assert_eq!(err.to_string(), "seats: missing bus");
    }
}
