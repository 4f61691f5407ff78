use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::models::event::Event;
use crate::models::price_history::PriceHistory;
use crate::models::tier::{self, PriceTier};
use crate::utils::error::{AppError, AppResult};

/// Multipliers applied to the event's base ticket price when seeding the
/// default tier set, in percent.
const DEFAULT_TIERS: [(&str, i32, i32, i64); 3] = [
    ("Early Bird", 0, 30, 80),
    ("Regular", 30, 70, 100),
    ("Premium", 70, 100, 150),
];

const DEFAULT_HISTORY_LIMIT: i64 = 20;

pub struct NewTier {
    pub tier_name: String,
    pub percentage_start: i32,
    pub percentage_end: i32,
    pub price: Decimal,
    pub created_by: Uuid,
}

pub struct CurrentPrice {
    pub event: Event,
    pub tier: PriceTier,
    pub booking_percentage: Decimal,
    pub available_count: i64,
    pub total_count: i64,
}

pub(crate) struct TicketCounts {
    pub total: i64,
    pub booked: i64,
    pub available: i64,
}

/// Point-in-time pricing view of an event: ticket counts, the derived
/// booking percentage, and the tier that percentage lands in.
struct PricingSnapshot {
    counts: TicketCounts,
    booking_percentage: Decimal,
    tier: Option<PriceTier>,
}

/// Booked capacity as a percentage in [0, 100], 2 decimal places. Events
/// without tickets count as 0% booked.
pub fn booking_percentage(booked: i64, total: i64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(booked) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(2)
}

fn scaled_price(base_price: Decimal, multiplier_pct: i64) -> Decimal {
    (base_price * Decimal::new(multiplier_pct, 2)).round_dp(2)
}

pub(crate) async fn fetch_event(conn: &mut PgConnection, event_id: Uuid) -> AppResult<Event> {
    sqlx::query_as::<_, Event>(
        "SELECT id, name, description, ticket_price, max_tickets_per_customer, is_active,
                created_at, updated_at
         FROM events WHERE id = $1",
    )
    .bind(event_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Event with id '{}' was not found", event_id)))
}

pub(crate) async fn ticket_counts(
    conn: &mut PgConnection,
    event_id: Uuid,
) -> AppResult<TicketCounts> {
    let (total, booked, available): (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*),
                COUNT(*) FILTER (WHERE status = 'booked'),
                COUNT(*) FILTER (WHERE status = 'available')
         FROM tickets WHERE event_id = $1",
    )
    .bind(event_id)
    .fetch_one(&mut *conn)
    .await?;

    if booked > total {
        return Err(AppError::InvariantViolation(format!(
            "Event {} reports {} booked tickets out of {}",
            event_id, booked, total
        )));
    }

    Ok(TicketCounts {
        total,
        booked,
        available,
    })
}

async fn active_tiers(conn: &mut PgConnection, event_id: Uuid) -> AppResult<Vec<PriceTier>> {
    let tiers = sqlx::query_as::<_, PriceTier>(
        "SELECT id, event_id, tier_name, percentage_start, percentage_end, price, created_by,
                is_active, created_at
         FROM price_tiers
         WHERE event_id = $1 AND is_active
         ORDER BY percentage_start",
    )
    .bind(event_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(tiers)
}

async fn insert_tier(
    conn: &mut PgConnection,
    event_id: Uuid,
    new_tier: &NewTier,
) -> AppResult<PriceTier> {
    let created = sqlx::query_as::<_, PriceTier>(
        "INSERT INTO price_tiers
             (event_id, tier_name, percentage_start, percentage_end, price, created_by)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, event_id, tier_name, percentage_start, percentage_end, price, created_by,
                   is_active, created_at",
    )
    .bind(event_id)
    .bind(&new_tier.tier_name)
    .bind(new_tier.percentage_start)
    .bind(new_tier.percentage_end)
    .bind(new_tier.price)
    .bind(new_tier.created_by)
    .fetch_one(&mut *conn)
    .await?;
    Ok(created)
}

async fn pricing_snapshot(
    conn: &mut PgConnection,
    event_id: Uuid,
) -> AppResult<PricingSnapshot> {
    let counts = ticket_counts(&mut *conn, event_id).await?;
    let percentage = booking_percentage(counts.booked, counts.total);
    let tiers = active_tiers(&mut *conn, event_id).await?;
    let tier = tier::select_tier(&tiers, percentage).cloned();
    Ok(PricingSnapshot {
        counts,
        booking_percentage: percentage,
        tier,
    })
}

/// The tier currently governing the event's price, derived from live ticket
/// counts rather than any stored singleton.
pub async fn current_tier(
    conn: &mut PgConnection,
    event_id: Uuid,
) -> AppResult<Option<PriceTier>> {
    Ok(pricing_snapshot(conn, event_id).await?.tier)
}

/// Reprice all available tickets of the event to the active tier and record
/// the transition. Must run inside the transaction that changed the booked
/// counts, so the repricing observes exactly that state.
///
/// Appends a history row only when the active tier differs from the one the
/// latest history row recorded; re-running without an intervening booking
/// change rewrites the same price and logs nothing.
pub async fn update_ticket_prices(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> AppResult<(u64, Option<Decimal>)> {
    // Serializes repricing against concurrent booking and cancellation
    // commits for the same event; released when the transaction ends.
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
        .bind(event_id)
        .execute(&mut **tx)
        .await?;

    let snapshot = pricing_snapshot(&mut *tx, event_id).await?;

    let Some(current) = snapshot.tier else {
        return Ok((0, None));
    };

    let updated = sqlx::query(
        "UPDATE tickets
         SET final_price = $1, current_tier_id = $2, updated_at = NOW()
         WHERE event_id = $3 AND status = 'available'",
    )
    .bind(current.price)
    .bind(current.id)
    .bind(event_id)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    let previous: Option<(Uuid,)> = sqlx::query_as(
        "SELECT new_tier_id FROM price_history WHERE event_id = $1 ORDER BY id DESC LIMIT 1",
    )
    .bind(event_id)
    .fetch_optional(&mut **tx)
    .await?;
    let previous_tier_id = previous.map(|row| row.0);

    if previous_tier_id != Some(current.id) {
        sqlx::query(
            "INSERT INTO price_history
                 (event_id, old_tier_id, new_tier_id, booking_percentage, tickets_sold_count)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event_id)
        .bind(previous_tier_id)
        .bind(current.id)
        .bind(snapshot.booking_percentage)
        .bind(snapshot.counts.booked)
        .execute(&mut **tx)
        .await?;

        info!(
            event_id = %event_id,
            tier = %current.tier_name,
            price = %current.price,
            booking_percentage = %snapshot.booking_percentage,
            "Price tier changed"
        );
    }

    Ok((updated, Some(current.price)))
}

pub async fn create_tier(pool: &PgPool, event_id: Uuid, new_tier: NewTier) -> AppResult<PriceTier> {
    if new_tier.tier_name.trim().is_empty() {
        return Err(AppError::ValidationError("Tier name is required".to_string()));
    }
    if !tier::valid_range(new_tier.percentage_start, new_tier.percentage_end) {
        return Err(AppError::ValidationError(
            "Tier range must satisfy 0 <= start < end <= 100".to_string(),
        ));
    }
    if new_tier.price < Decimal::ZERO {
        return Err(AppError::ValidationError(
            "Tier price cannot be negative".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    fetch_event(&mut tx, event_id).await?;

    // Overlap check and insert happen in the same transaction.
    let existing = active_tiers(&mut tx, event_id).await?;
    if let Some(conflict) = existing.iter().find(|t| {
        tier::ranges_overlap(
            new_tier.percentage_start,
            new_tier.percentage_end,
            t.percentage_start,
            t.percentage_end,
        )
    }) {
        return Err(AppError::ValidationError(format!(
            "Price tier overlaps with existing tier: {}",
            conflict.tier_name
        )));
    }

    let created = insert_tier(&mut tx, event_id, &new_tier).await?;
    tx.commit().await?;

    info!(
        event_id = %event_id,
        tier = %created.tier_name,
        range = %format!("{}-{}%", created.percentage_start, created.percentage_end),
        "Price tier created"
    );

    Ok(created)
}

/// Seed the standard Early Bird / Regular / Premium bands, priced off the
/// event's base ticket price.
pub async fn create_default_tiers(
    pool: &PgPool,
    event_id: Uuid,
    manager_id: Uuid,
) -> AppResult<Vec<PriceTier>> {
    let mut tx = pool.begin().await?;

    let event = fetch_event(&mut tx, event_id).await?;
    let existing = active_tiers(&mut tx, event_id).await?;
    if !existing.is_empty() {
        return Err(AppError::ValidationError(
            "Event already has active price tiers".to_string(),
        ));
    }

    let mut created = Vec::with_capacity(DEFAULT_TIERS.len());
    for (name, start, end, multiplier_pct) in DEFAULT_TIERS {
        let tier = insert_tier(
            &mut tx,
            event_id,
            &NewTier {
                tier_name: name.to_string(),
                percentage_start: start,
                percentage_end: end,
                price: scaled_price(event.ticket_price, multiplier_pct),
                created_by: manager_id,
            },
        )
        .await?;
        created.push(tier);
    }

    tx.commit().await?;

    info!(event_id = %event_id, count = created.len(), "Default price tiers created");

    Ok(created)
}

pub async fn list_tiers(pool: &PgPool, event_id: Uuid) -> AppResult<Vec<PriceTier>> {
    let mut conn = pool.acquire().await?;
    fetch_event(&mut conn, event_id).await?;
    active_tiers(&mut conn, event_id).await
}

pub async fn current_price(pool: &PgPool, event_id: Uuid) -> AppResult<CurrentPrice> {
    let mut conn = pool.acquire().await?;

    let event = fetch_event(&mut conn, event_id).await?;
    let snapshot = pricing_snapshot(&mut conn, event_id).await?;

    let tier = snapshot.tier.ok_or_else(|| {
        AppError::NotFound("No price tier is configured for the current booking level".to_string())
    })?;

    Ok(CurrentPrice {
        event,
        tier,
        booking_percentage: snapshot.booking_percentage,
        available_count: snapshot.counts.available,
        total_count: snapshot.counts.total,
    })
}

pub async fn price_history(pool: &PgPool, event_id: Uuid) -> AppResult<Vec<PriceHistory>> {
    let mut conn = pool.acquire().await?;
    fetch_event(&mut conn, event_id).await?;

    let history = sqlx::query_as::<_, PriceHistory>(
        "SELECT id, event_id, old_tier_id, new_tier_id, booking_percentage, tickets_sold_count,
                changed_at
         FROM price_history
         WHERE event_id = $1
         ORDER BY changed_at DESC, id DESC
         LIMIT $2",
    )
    .bind(event_id)
    .bind(DEFAULT_HISTORY_LIMIT)
    .fetch_all(&mut *conn)
    .await?;
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_percentage_empty_event_is_zero() {
        assert_eq!(booking_percentage(0, 0), Decimal::ZERO);
    }

    #[test]
    fn test_booking_percentage_exact() {
        assert_eq!(booking_percentage(8, 10), Decimal::from(80));
        assert_eq!(booking_percentage(10, 10), Decimal::from(100));
        assert_eq!(booking_percentage(0, 10), Decimal::ZERO);
    }

    #[test]
    fn test_booking_percentage_rounds_to_two_places() {
        assert_eq!(booking_percentage(1, 3), Decimal::new(3333, 2));
        assert_eq!(booking_percentage(2, 3), Decimal::new(6667, 2));
    }

    #[test]
    fn test_default_tier_prices_scale_from_base() {
        let base = Decimal::new(5000, 2); // 50.00
        assert_eq!(scaled_price(base, 80), Decimal::new(4000, 2));
        assert_eq!(scaled_price(base, 100), Decimal::new(5000, 2));
        assert_eq!(scaled_price(base, 150), Decimal::new(7500, 2));
    }

    #[test]
    fn test_default_tiers_partition_the_full_range() {
        let mut end_of_previous = 0;
        for (_, start, end, _) in DEFAULT_TIERS {
            assert_eq!(start, end_of_previous);
            assert!(tier::valid_range(start, end));
            end_of_previous = end;
        }
        assert_eq!(end_of_previous, tier::MAX_PERCENTAGE);
    }
}
