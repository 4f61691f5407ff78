use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::booking::BookingStatus;
use crate::services::allocation::{self, AllocationRequest};
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub event: Uuid,
    pub tickets: Vec<Uuid>,
    pub customer: Uuid,
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    Cancel,
    Refund,
}

#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub action: BookingAction,
}

#[derive(Deserialize)]
pub struct ListBookingsQuery {
    pub customer: Uuid,
}

pub async fn create_booking(
    State(pool): State<PgPool>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Response, AppError> {
    let booking = allocation::allocate(
        &pool,
        AllocationRequest {
            event_id: body.event,
            ticket_ids: body.tickets,
            customer_id: body.customer,
            special_requests: body.special_requests,
        },
    )
    .await?;

    Ok(created(booking, "Booking confirmed").into_response())
}

pub async fn update_booking(
    State(pool): State<PgPool>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<UpdateBookingRequest>,
) -> Result<Response, AppError> {
    let (target, message) = match body.action {
        BookingAction::Cancel => (BookingStatus::Cancelled, "Booking cancelled successfully"),
        BookingAction::Refund => (BookingStatus::Refunded, "Booking refunded successfully"),
    };

    let booking = allocation::release(&pool, booking_id, target).await?;
    Ok(success(booking, message).into_response())
}

pub async fn get_booking(
    State(pool): State<PgPool>,
    Path(booking_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let booking = allocation::get_booking(&pool, booking_id).await?;
    Ok(success(booking, "Booking retrieved").into_response())
}

pub async fn list_bookings(
    State(pool): State<PgPool>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Response, AppError> {
    let bookings = allocation::bookings_for_customer(&pool, query.customer).await?;
    Ok(success(bookings, "Bookings retrieved").into_response())
}
