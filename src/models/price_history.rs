use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One tier transition for an event. Rows are append-only: written when the
/// active tier changes, never updated or deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceHistory {
    pub id: i64,
    pub event_id: Uuid,
    pub old_tier_id: Option<Uuid>,
    pub new_tier_id: Uuid,
    /// Booking percentage snapshot at the moment of the transition.
    pub booking_percentage: Decimal,
    pub tickets_sold_count: i64,
    pub changed_at: DateTime<Utc>,
}
