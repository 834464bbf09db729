use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookingId, BusId, SeatId, UserId};
use crate::error::ApiError;

/// Fare used when the booking form does not set one.
pub const DEFAULT_FARE: f64 = 250.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// Selections collected by the booking page before submission.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub bus_id: Option<BusId>,
    pub seat_id: Option<SeatId>,
    pub travel_date: NaiveDate,
    pub price: f64,
}

impl BookingDraft {
    pub fn new(travel_date: NaiveDate) -> Self {
        Self {
            bus_id: None,
            seat_id: None,
            travel_date,
            price: DEFAULT_FARE,
        }
    }

    /// Turn the draft into a request; both a bus and a seat must be chosen.
    pub fn into_request(self, user_id: UserId) -> Result<CreateBooking, ApiError> {
        match (self.bus_id, self.seat_id) {
            (Some(bus_id), Some(seat_id)) => Ok(CreateBooking {
                user_id,
                bus_id,
                seat_id,
                travel_date: self.travel_date,
                price: self.price,
            }),
            _ => Err(ApiError::validation("Please select a seat first")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBooking {
    pub user_id: UserId,
    pub bus_id: BusId,
    pub seat_id: SeatId,
    pub travel_date: NaiveDate,
    pub price: f64,
}

/// Response to `POST /bookings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingReceipt {
    #[serde(default)]
    pub message: String,
    pub booking_id: BookingId,
    pub booking_ref: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub booking_ref: String,
    pub user_id: UserId,
    pub bus_id: BusId,
    pub seat_id: SeatId,
    pub travel_date: NaiveDate,
    pub price: f64,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelBooking {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Upi,
    Wallet,
    NetBanking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayment {
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
    pub amount: f64,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    #[serde(default)]
    pub message: String,
    pub transaction_id: String,
    pub amount: f64,
    #[serde(default)]
    pub payment_status: String,
}

pub(crate) fn default_currency() -> String {
    "INR".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn draft_without_seat_is_rejected() {
        let mut draft = BookingDraft::new(date());
        draft.bus_id = Some(1);
        let err = draft.into_request(7).unwrap_err();
        assert_eq!(err.to_string(), "Please select a seat first");
    }

    #[test]
    fn draft_without_bus_is_rejected() {
        let mut draft = BookingDraft::new(date());
        draft.seat_id = Some(4);
        assert!(matches!(draft.into_request(7), Err(ApiError::Validation(_))));
    }

    #[test]
    fn complete_draft_serializes_iso_date() {
        let draft = BookingDraft {
            bus_id: Some(1),
            seat_id: Some(4),
            travel_date: date(),
            price: DEFAULT_FARE,
        };
        let request = draft.into_request(7).unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["travel_date"], "2025-03-14");
        assert_eq!(body["price"], 250.0);
        assert_eq!(body["user_id"], 7);
    }

    #[test]
    fn cancel_without_reason_sends_null() {
        let body = serde_json::to_value(CancelBooking::default()).unwrap();
        assert!(body["reason"].is_null());
    }
}
