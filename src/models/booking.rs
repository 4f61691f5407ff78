use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
        }
    }

    /// Cancelled and refunded bookings never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Refunded)
    }

    /// Releases its tickets back to the available pool on entry.
    pub fn releases_tickets(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Refunded)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, Refunded)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub event_id: Uuid,
    pub total_amount: Decimal,
    pub status: BookingStatus,
    /// Reference to an external payment record; payment itself is handled
    /// outside this service.
    pub payment_reference: Option<String>,
    pub special_requests: Option<String>,
    pub booking_date: DateTime<Utc>,
}

/// A booking joined with the ids of the tickets it holds.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookingWithTickets {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub ticket_ids: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::BookingStatus::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Refunded));
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for terminal in [Cancelled, Refunded] {
            assert!(terminal.is_terminal());
            for next in [Pending, Confirmed, Cancelled, Refunded] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_refund_requires_confirmation_first() {
        assert!(!Pending.can_transition_to(Refunded));
    }

    #[test]
    fn test_no_self_transitions() {
        for status in [Pending, Confirmed, Cancelled, Refunded] {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_releasing_states() {
        assert!(Cancelled.releases_tickets());
        assert!(Refunded.releases_tickets());
        assert!(!Pending.releases_tickets());
        assert!(!Confirmed.releases_tickets());
    }
}
