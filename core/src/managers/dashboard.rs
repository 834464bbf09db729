use log::info;

use crate::error::ApiError;
use crate::transport::{ApiClient, Transport};
use crate::types::{AdminDashboard, DashboardStats, FormattedStats};

/// Platform statistics for the dashboard page and the admin overview.
#[derive(Debug, Default)]
pub struct DashboardManager {
    stats: Option<DashboardStats>,
    admin: Option<AdminDashboard>,
}

impl DashboardManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load_stats<T: Transport>(&mut self, api: &ApiClient<T>) -> Result<&DashboardStats, ApiError> {
        info!("Loading dashboard stats");
        let stats = api.call(api.client().build_dashboard_stats()).await?;
        info!("Dashboard stats loaded");
        Ok(self.stats.insert(stats))
    }

    /// Needs an admin session; the server answers 403 otherwise.
    pub async fn load_admin_dashboard<T: Transport>(&mut self, api: &ApiClient<T>) -> Result<&AdminDashboard, ApiError> {
        info!("Loading admin dashboard");
        let admin = api.call(api.client().build_admin_dashboard()).await?;
        Ok(self.admin.insert(admin))
    }

    /// Counter by key, zero before the first load.
    pub fn stat(&self, key: &str) -> f64 {
        self.stats.as_ref().map_or(0.0, |stats| stats.stat(key))
    }

    pub fn formatted_stats(&self) -> FormattedStats {
        self.stats.clone().unwrap_or_default().formatted()
    }

    pub fn stats(&self) -> Option<&DashboardStats> {
        self.stats.as_ref()
    }

    pub fn admin(&self) -> Option<&AdminDashboard> {
        self.admin.as_ref()
    }
}
