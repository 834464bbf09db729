//! Terminal host for the transit client.
//!
//! Wires `transit-core` to the outside world: `reqwest` for HTTP, a JSON
//! file for the session, stdin for location fixes and stdout for pages and
//! voice announcements.

pub mod app;
pub mod command;
pub mod render;
pub mod storage;
pub mod tracking;
pub mod transport;

pub use app::App;
pub use command::{AdminCommand, Command};
pub use storage::FileStorage;
pub use transport::ReqwestTransport;
