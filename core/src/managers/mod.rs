//! Feature managers.
//!
//! Each manager caches the last server response for one feature area and
//! mutates only its own fields. Managers never call each other; the host's
//! page controllers compose them.

pub mod admin;
pub mod auth;
pub mod booking;
pub mod bus;
pub mod dashboard;
pub mod fleet;
pub mod wallet;

pub use admin::{AdminManager, DEFAULT_ANALYTICS_DAYS, DEFAULT_LOGS_PER_PAGE};
pub use auth::AuthManager;
pub use booking::BookingManager;
pub use bus::{BusManager, DEFAULT_PER_PAGE};
pub use dashboard::DashboardManager;
pub use fleet::{FleetManager, DEFAULT_HISTORY_LIMIT};
pub use wallet::{WalletManager, DEFAULT_TRANSACTION_LIMIT, MIN_TOP_UP};
