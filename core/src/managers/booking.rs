use log::info;

use crate::error::ApiError;
use crate::transport::{ApiClient, Transport};
use crate::types::{Booking, BookingDraft, BookingId, BookingReceipt, CreatePayment, PaymentReceipt, UserId};

/// Caches the last receipt and the last booking the server returned.
#[derive(Debug, Default)]
pub struct BookingManager {
    last_receipt: Option<BookingReceipt>,
    current_booking: Option<Booking>,
}

impl BookingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit `draft` for `user_id`. An incomplete draft is rejected before
    /// any request goes out.
    pub async fn create_booking<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        user_id: UserId,
        draft: BookingDraft,
    ) -> Result<&BookingReceipt, ApiError> {
        let input = draft.into_request(user_id)?;
        info!("Creating booking: bus {} seat {}", input.bus_id, input.seat_id);
        let receipt = api.call(api.client().build_create_booking(&input)?).await?;
        info!("Booking created: {}", receipt.booking_ref);
        Ok(self.last_receipt.insert(receipt))
    }

    pub async fn get_booking<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        booking_id: BookingId,
    ) -> Result<&Booking, ApiError> {
        info!("Fetching booking: {booking_id}");
        let booking = api.call(api.client().build_get_booking(booking_id)).await?;
        Ok(self.current_booking.insert(booking))
    }

    pub async fn confirm_booking<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        booking_id: BookingId,
    ) -> Result<&Booking, ApiError> {
        info!("Confirming booking: {booking_id}");
        let booking = api.call(api.client().build_confirm_booking(booking_id)?).await?;
        info!("Booking confirmed: {}", booking.booking_ref);
        Ok(self.current_booking.insert(booking))
    }

    pub async fn cancel_booking<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        booking_id: BookingId,
        reason: Option<&str>,
    ) -> Result<&Booking, ApiError> {
        info!("Cancelling booking: {booking_id}");
        let booking = api.call(api.client().build_cancel_booking(booking_id, reason)?).await?;
        info!("Booking cancelled: {}", booking.booking_ref);
        Ok(self.current_booking.insert(booking))
    }

    /// Pay for a booking. The payment itself is not cached.
    pub async fn pay<T: Transport>(&self, api: &ApiClient<T>, input: &CreatePayment) -> Result<PaymentReceipt, ApiError> {
        info!("Creating payment: {:.2}", input.amount);
        let receipt = api.call(api.client().build_create_payment(input)?).await?;
        info!("Payment {}: {}", receipt.payment_status, receipt.transaction_id);
        Ok(receipt)
    }

    pub fn last_receipt(&self) -> Option<&BookingReceipt> {
        self.last_receipt.as_ref()
    }

    pub fn current_booking(&self) -> Option<&Booking> {
        self.current_booking.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::{api, ScriptedTransport};
    use crate::types::BookingStatus;

    fn draft() -> BookingDraft {
        BookingDraft::new(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap())
    }

    fn booking_json(status: &str) -> String {
        format!(
            r#"{{"id":5,"booking_ref":"BK1A2B3C4D5E","user_id":7,"bus_id":1,"seat_id":12,"travel_date":"2025-03-14","price":250.0,"status":"{status}"}}"#
        )
    }

    #[tokio::test]
    async fn incomplete_draft_sends_nothing() {
        let api = api(ScriptedTransport::new());
        let mut bookings = BookingManager::new();
        let mut draft = draft();
        draft.bus_id = Some(1);

        let err = bookings.create_booking(&api, 7, draft).await.unwrap_err();

        assert_eq!(err.to_string(), "Please select a seat first");
        assert!(api.transport().requests().is_empty());
        assert!(bookings.last_receipt().is_none());
    }

    #[tokio::test]
    async fn create_booking_caches_receipt() {
        let api = api(ScriptedTransport::new().reply(
            201,
            r#"{"message":"Booking created successfully","booking_id":5,"booking_ref":"BK1A2B3C4D5E","amount":250.0,"currency":"INR"}"#,
        ));
        let mut bookings = BookingManager::new();
        let mut draft = draft();
        draft.bus_id = Some(1);
        draft.seat_id = Some(12);

        let receipt = bookings.create_booking(&api, 7, draft).await.unwrap();
        assert_eq!(receipt.booking_ref, "BK1A2B3C4D5E");

        let request = &api.transport().requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["seat_id"], 12);
        assert_eq!(body["travel_date"], "2025-03-14");
        assert_eq!(body["price"], 250.0);
        assert_eq!(bookings.last_receipt().map(|r| r.booking_id), Some(5));
    }

    #[tokio::test]
    async fn confirm_then_cancel_tracks_status() {
        let api = api(
            ScriptedTransport::new()
                .reply(200, &booking_json("confirmed"))
                .reply(200, &booking_json("cancelled")),
        );
        let mut bookings = BookingManager::new();

        bookings.confirm_booking(&api, 5).await.unwrap();
        assert_eq!(bookings.current_booking().map(|b| b.status), Some(BookingStatus::Confirmed));

        bookings.cancel_booking(&api, 5, Some("plans changed")).await.unwrap();
        assert_eq!(bookings.current_booking().map(|b| b.status), Some(BookingStatus::Cancelled));

        let requests = api.transport().requests();
        assert_eq!(requests[1].path, "http://transit.test/api/bookings/5/cancel");
        assert_eq!(requests[1].body.as_deref(), Some(r#"{"reason":"plans changed"}"#));
    }

    #[tokio::test]
    async fn missing_booking_keeps_previous_cache() {
        let api = api(
            ScriptedTransport::new()
                .reply(200, &booking_json("pending"))
                .reply(404, r#"{"message":"Booking not found"}"#),
        );
        let mut bookings = BookingManager::new();
        bookings.get_booking(&api, 5).await.unwrap();

        let err = bookings.get_booking(&api, 6).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(bookings.current_booking().map(|b| b.id), Some(5));
    }
}
