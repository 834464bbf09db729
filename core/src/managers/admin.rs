use log::info;

use crate::error::ApiError;
use crate::transport::{ApiClient, Transport};
use crate::types::{
    AdminBus, AdminLog, AdminPage, AdminPayment, AdminUser, BookingAnalytics, BusId, BusStatus, DailyReport,
    MessageResponse, RevenueAnalytics,
};

/// Window used by the analytics pages when none is given.
pub const DEFAULT_ANALYTICS_DAYS: u32 = 30;
pub const DEFAULT_LOGS_PER_PAGE: u32 = 20;

/// Fleet, user and payment management plus analytics for admin sessions.
///
/// Every call carries the caller's id in `x-user-id`; a passenger session
/// gets the server's 403 back and leaves the caches untouched.
#[derive(Debug, Default)]
pub struct AdminManager {
    buses: Option<AdminPage<AdminBus>>,
    users: Option<AdminPage<AdminUser>>,
    payments: Option<AdminPage<AdminPayment>>,
    revenue: Option<RevenueAnalytics>,
    booking_analytics: Option<BookingAnalytics>,
    reports: Vec<DailyReport>,
    logs: Option<AdminPage<AdminLog>>,
}

impl AdminManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load_buses<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        page: u32,
        per_page: u32,
    ) -> Result<&AdminPage<AdminBus>, ApiError> {
        info!("Loading fleet: page {page}");
        let buses = api.call(api.client().build_admin_buses(page, per_page)).await?;
        Ok(self.buses.insert(buses))
    }

    /// The cached fleet row follows the new status once the server accepts it.
    pub async fn update_bus_status<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        bus_id: BusId,
        status: BusStatus,
    ) -> Result<MessageResponse, ApiError> {
        info!("Setting bus {bus_id} to {status}");
        let response = api.call(api.client().build_update_bus_status(bus_id, status)?).await?;
        if let Some(bus) = self
            .buses
            .as_mut()
            .and_then(|page| page.items.iter_mut().find(|bus| bus.id == bus_id))
        {
            bus.status = status;
        }
        Ok(response)
    }

    pub async fn load_users<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        page: u32,
        per_page: u32,
    ) -> Result<&AdminPage<AdminUser>, ApiError> {
        info!("Loading users: page {page}");
        let users = api.call(api.client().build_admin_users(page, per_page)).await?;
        Ok(self.users.insert(users))
    }

    pub async fn load_payments<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        page: u32,
        per_page: u32,
        status: Option<&str>,
    ) -> Result<&AdminPage<AdminPayment>, ApiError> {
        info!("Loading payments: page {page}, status {}", status.unwrap_or("any"));
        let payments = api.call(api.client().build_admin_payments(page, per_page, status)).await?;
        Ok(self.payments.insert(payments))
    }

    pub async fn load_revenue<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        days: u32,
    ) -> Result<&RevenueAnalytics, ApiError> {
        info!("Loading revenue for the last {days} days");
        let revenue = api.call(api.client().build_revenue_analytics(days)).await?;
        Ok(self.revenue.insert(revenue))
    }

    pub async fn load_booking_analytics<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        days: u32,
    ) -> Result<&BookingAnalytics, ApiError> {
        info!("Loading booking analytics for the last {days} days");
        let analytics = api.call(api.client().build_booking_analytics(days)).await?;
        Ok(self.booking_analytics.insert(analytics))
    }

    /// Reports generated this session are kept, newest last.
    pub async fn generate_daily_report<T: Transport>(&mut self, api: &ApiClient<T>) -> Result<&DailyReport, ApiError> {
        let report = api.call(api.client().build_daily_report()?).await?;
        info!("Daily report generated: {}", report.report_id);
        let index = self.reports.len();
        self.reports.push(report);
        Ok(&self.reports[index])
    }

    pub async fn load_logs<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        page: u32,
        per_page: u32,
    ) -> Result<&AdminPage<AdminLog>, ApiError> {
        info!("Loading admin logs: page {page}");
        let logs = api.call(api.client().build_admin_logs(page, per_page)).await?;
        Ok(self.logs.insert(logs))
    }

    pub fn buses(&self) -> Option<&AdminPage<AdminBus>> {
        self.buses.as_ref()
    }

    pub fn users(&self) -> Option<&AdminPage<AdminUser>> {
        self.users.as_ref()
    }

    pub fn payments(&self) -> Option<&AdminPage<AdminPayment>> {
        self.payments.as_ref()
    }

    pub fn revenue(&self) -> Option<&RevenueAnalytics> {
        self.revenue.as_ref()
    }

    pub fn booking_analytics(&self) -> Option<&BookingAnalytics> {
        self.booking_analytics.as_ref()
    }

    pub fn reports(&self) -> &[DailyReport] {
        &self.reports
    }

    pub fn logs(&self) -> Option<&AdminPage<AdminLog>> {
        self.logs.as_ref()
    }
}
