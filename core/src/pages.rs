//! Page navigation.
//!
//! # Design
//! The host renders pages; this module only decides which page is shown and
//! which data loader runs for it. Each page has at most one loader and
//! showing a page never runs another page's loader.

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use thiserror::Error;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Page {
    #[default]
    Home,
    Auth,
    Buses,
    Booking,
    Dashboard,
    Wallet,
    Emergency,
    LostFound,
    Tracking,
    Alerts,
}

impl Page {
    pub const ALL: [Page; 10] = [
        Page::Home,
        Page::Auth,
        Page::Buses,
        Page::Booking,
        Page::Dashboard,
        Page::Wallet,
        Page::Emergency,
        Page::LostFound,
        Page::Tracking,
        Page::Alerts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Auth => "auth",
            Page::Buses => "buses",
            Page::Booking => "booking",
            Page::Dashboard => "dashboard",
            Page::Wallet => "wallet",
            Page::Emergency => "emergency",
            Page::LostFound => "lost-found",
            Page::Tracking => "tracking",
            Page::Alerts => "alerts",
        }
    }

    /// Everything except home and auth needs a session.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Page::Home | Page::Auth)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown page: {0}")]
pub struct UnknownPage(pub String);

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|page| page.as_str() == s)
            .ok_or_else(|| UnknownPage(s.to_string()))
    }
}

/// Data loaders, one per page that has data.
#[allow(async_fn_in_trait)]
pub trait PageLoader {
    async fn load_buses(&mut self) -> Result<(), ApiError>;
    async fn load_dashboard(&mut self) -> Result<(), ApiError>;
    /// Balance, then transactions.
    async fn load_wallet(&mut self) -> Result<(), ApiError>;
    async fn prepare_emergency(&mut self) -> Result<(), ApiError>;
    async fn load_lost_found(&mut self) -> Result<(), ApiError>;
    async fn load_alerts(&mut self) -> Result<(), ApiError>;
}

#[derive(Debug, Default)]
pub struct Navigator {
    current: Page,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Page {
        self.current
    }

    /// The page actually shown when `requested` is asked for.
    pub fn resolve(requested: Page, logged_in: bool) -> Page {
        if requested.is_protected() && !logged_in {
            Page::Auth
        } else {
            requested
        }
    }

    /// Switch pages and run the shown page's loader.
    ///
    /// The switch happens before loading, so a failed loader still leaves
    /// the new page current.
    pub async fn show<L: PageLoader>(&mut self, requested: Page, logged_in: bool, loader: &mut L) -> Result<Page, ApiError> {
        let page = Self::resolve(requested, logged_in);
        if page != requested {
            info!("Redirecting {requested} to {page}");
        }
        self.current = page;
        debug!("Showing page: {page}");

        match page {
            Page::Buses => loader.load_buses().await?,
            Page::Dashboard => loader.load_dashboard().await?,
            Page::Wallet => loader.load_wallet().await?,
            Page::Emergency => loader.prepare_emergency().await?,
            Page::LostFound => loader.load_lost_found().await?,
            Page::Alerts => loader.load_alerts().await?,
            Page::Home | Page::Auth | Page::Booking | Page::Tracking => {}
        }
        Ok(page)
    }
}
