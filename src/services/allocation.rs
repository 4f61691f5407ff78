use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, BookingWithTickets};
use crate::models::ticket::{Ticket, TicketStatus};
use crate::services::pricing;
use crate::utils::error::{AppError, AppResult};

pub struct AllocationRequest {
    pub event_id: Uuid,
    pub ticket_ids: Vec<Uuid>,
    pub customer_id: Uuid,
    pub special_requests: Option<String>,
}

/// Atomically claim the requested tickets and commit a confirmed booking.
///
/// The claim is an optimistic compare-and-swap: only rows still available
/// flip to booked, and the whole request fails with an inventory conflict
/// unless every requested ticket was claimed. Under concurrent requests for
/// overlapping ticket sets exactly one side wins each contested ticket.
/// Repricing runs inside the same transaction, so it observes the booked
/// count this booking just produced.
pub async fn allocate(pool: &PgPool, request: AllocationRequest) -> AppResult<BookingWithTickets> {
    if request.ticket_ids.is_empty() {
        return Err(AppError::ValidationError(
            "At least one ticket is required".to_string(),
        ));
    }
    let mut deduped = request.ticket_ids.clone();
    deduped.sort_unstable();
    deduped.dedup();
    if deduped.len() != request.ticket_ids.len() {
        return Err(AppError::ValidationError(
            "Duplicate ticket ids in request".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let event = pricing::fetch_event(&mut tx, request.event_id).await?;
    if !event.is_active {
        return Err(AppError::ValidationError(
            "Event is not open for booking".to_string(),
        ));
    }
    if request.ticket_ids.len() > event.max_tickets_per_customer as usize {
        return Err(AppError::ValidationError(format!(
            "A booking may hold at most {} tickets for this event",
            event.max_tickets_per_customer
        )));
    }

    // Claim the tickets. Rows already claimed by a concurrent booking are
    // left untouched and make the count check below fail.
    let claimed: Vec<Ticket> = sqlx::query_as(
        "UPDATE tickets
         SET status = 'booked', updated_at = NOW()
         WHERE id = ANY($1) AND event_id = $2 AND status = 'available'
         RETURNING id, event_id, seat_number, section, base_price, final_price, current_tier_id,
                   status, created_at, updated_at",
    )
    .bind(&request.ticket_ids)
    .bind(request.event_id)
    .fetch_all(&mut *tx)
    .await?;

    if claimed.len() != request.ticket_ids.len() {
        // Dropping the transaction rolls the claim back; no partial
        // allocation survives.
        return Err(AppError::InventoryConflict(
            "Some tickets are no longer available".to_string(),
        ));
    }

    let total_amount: Decimal = claimed.iter().map(|ticket| ticket.final_price).sum();

    let booking: Booking = sqlx::query_as(
        "INSERT INTO bookings (customer_id, event_id, total_amount, status, special_requests)
         VALUES ($1, $2, $3, 'confirmed', $4)
         RETURNING id, customer_id, event_id, total_amount, status, payment_reference,
                   special_requests, booking_date",
    )
    .bind(request.customer_id)
    .bind(request.event_id)
    .bind(total_amount)
    .bind(&request.special_requests)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO booking_tickets (booking_id, ticket_id) SELECT $1, UNNEST($2::uuid[])",
    )
    .bind(booking.id)
    .bind(&request.ticket_ids)
    .execute(&mut *tx)
    .await?;

    pricing::update_ticket_prices(&mut tx, request.event_id).await?;

    tx.commit().await?;

    info!(
        booking_id = %booking.id,
        event_id = %request.event_id,
        tickets = claimed.len(),
        total_amount = %booking.total_amount,
        "Booking confirmed"
    );

    let ticket_ids = claimed.iter().map(|ticket| ticket.id).collect();
    Ok(BookingWithTickets { booking, ticket_ids })
}

/// Move a booking into a releasing state (cancelled or refunded), return its
/// tickets to the available pool, and reprice in the same transaction.
pub async fn release(
    pool: &PgPool,
    booking_id: Uuid,
    target: BookingStatus,
) -> AppResult<BookingWithTickets> {
    if !target.releases_tickets() {
        return Err(AppError::ValidationError(format!(
            "Unsupported booking update: {}",
            target
        )));
    }

    let mut tx = pool.begin().await?;

    // Row lock keeps two concurrent releases of the same booking from both
    // passing the transition check.
    let booking: Booking = sqlx::query_as(
        "SELECT id, customer_id, event_id, total_amount, status, payment_reference,
                special_requests, booking_date
         FROM bookings WHERE id = $1 FOR UPDATE",
    )
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Booking with id '{}' was not found", booking_id)))?;

    if !booking.status.can_transition_to(target) {
        return Err(AppError::ValidationError(format!(
            "Cannot move a {} booking to {}",
            booking.status, target
        )));
    }

    let booking: Booking = sqlx::query_as(
        "UPDATE bookings SET status = $2 WHERE id = $1
         RETURNING id, customer_id, event_id, total_amount, status, payment_reference,
                   special_requests, booking_date",
    )
    .bind(booking_id)
    .bind(target)
    .fetch_one(&mut *tx)
    .await?;

    let released: Vec<(Uuid,)> = sqlx::query_as(
        "UPDATE tickets
         SET status = 'available', updated_at = NOW()
         WHERE status = 'booked'
           AND id IN (SELECT ticket_id FROM booking_tickets WHERE booking_id = $1)
         RETURNING id",
    )
    .bind(booking_id)
    .fetch_all(&mut *tx)
    .await?;

    // The freed seats lower the booking percentage; the active tier may
    // regress to a cheaper band.
    pricing::update_ticket_prices(&mut tx, booking.event_id).await?;

    tx.commit().await?;

    info!(
        booking_id = %booking.id,
        event_id = %booking.event_id,
        released = released.len(),
        status = %booking.status,
        "Booking released"
    );

    let ticket_ids = released.into_iter().map(|row| row.0).collect();
    Ok(BookingWithTickets { booking, ticket_ids })
}

pub async fn get_booking(pool: &PgPool, booking_id: Uuid) -> AppResult<BookingWithTickets> {
    let mut conn = pool.acquire().await?;

    sqlx::query_as::<_, BookingWithTickets>(
        "SELECT b.id, b.customer_id, b.event_id, b.total_amount, b.status, b.payment_reference,
                b.special_requests, b.booking_date,
                COALESCE(ARRAY_AGG(bt.ticket_id) FILTER (WHERE bt.ticket_id IS NOT NULL),
                         '{}'::uuid[]) AS ticket_ids
         FROM bookings b
         LEFT JOIN booking_tickets bt ON bt.booking_id = b.id
         WHERE b.id = $1
         GROUP BY b.id",
    )
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Booking with id '{}' was not found", booking_id)))
}

pub async fn bookings_for_customer(
    pool: &PgPool,
    customer_id: Uuid,
) -> AppResult<Vec<BookingWithTickets>> {
    let mut conn = pool.acquire().await?;

    let bookings = sqlx::query_as::<_, BookingWithTickets>(
        "SELECT b.id, b.customer_id, b.event_id, b.total_amount, b.status, b.payment_reference,
                b.special_requests, b.booking_date,
                COALESCE(ARRAY_AGG(bt.ticket_id) FILTER (WHERE bt.ticket_id IS NOT NULL),
                         '{}'::uuid[]) AS ticket_ids
         FROM bookings b
         LEFT JOIN booking_tickets bt ON bt.booking_id = b.id
         WHERE b.customer_id = $1
         GROUP BY b.id
         ORDER BY b.booking_date DESC",
    )
    .bind(customer_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(bookings)
}

pub async fn list_tickets(
    pool: &PgPool,
    event_id: Uuid,
    status: TicketStatus,
) -> AppResult<Vec<Ticket>> {
    let mut conn = pool.acquire().await?;

    pricing::fetch_event(&mut conn, event_id).await?;

    let tickets = sqlx::query_as::<_, Ticket>(
        "SELECT id, event_id, seat_number, section, base_price, final_price, current_tier_id,
                status, created_at, updated_at
         FROM tickets
         WHERE event_id = $1 AND status = $2
         ORDER BY seat_number",
    )
    .bind(event_id)
    .bind(status)
    .fetch_all(&mut *conn)
    .await?;
    Ok(tickets)
}
