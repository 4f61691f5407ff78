use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::pricing::{self, NewTier};
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Deserialize)]
pub struct CreateTierRequest {
    pub tier_name: String,
    pub percentage_start: i32,
    pub percentage_end: i32,
    pub price: Decimal,
    pub manager: Uuid,
}

#[derive(Deserialize)]
pub struct CreateDefaultTiersRequest {
    pub manager: Uuid,
}

#[derive(Serialize)]
pub struct CurrentPricePayload {
    pub event_id: Uuid,
    pub event_name: String,
    pub tier_name: String,
    pub price: Decimal,
    pub booking_percentage: Decimal,
    pub available_count: i64,
    pub total_count: i64,
}

pub async fn current_price(
    State(pool): State<PgPool>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let price = pricing::current_price(&pool, event_id).await?;

    let payload = CurrentPricePayload {
        event_id: price.event.id,
        event_name: price.event.name,
        tier_name: price.tier.tier_name,
        price: price.tier.price,
        booking_percentage: price.booking_percentage,
        available_count: price.available_count,
        total_count: price.total_count,
    };
    Ok(success(payload, "Current price retrieved").into_response())
}

pub async fn list_tiers(
    State(pool): State<PgPool>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let tiers = pricing::list_tiers(&pool, event_id).await?;
    Ok(success(tiers, "Price tiers retrieved").into_response())
}

pub async fn create_tier(
    State(pool): State<PgPool>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<CreateTierRequest>,
) -> Result<Response, AppError> {
    let tier = pricing::create_tier(
        &pool,
        event_id,
        NewTier {
            tier_name: body.tier_name,
            percentage_start: body.percentage_start,
            percentage_end: body.percentage_end,
            price: body.price,
            created_by: body.manager,
        },
    )
    .await?;

    Ok(created(tier, "Price tier created").into_response())
}

pub async fn create_default_tiers(
    State(pool): State<PgPool>,
    Path(event_id): Path<Uuid>,
    Json(body): Json<CreateDefaultTiersRequest>,
) -> Result<Response, AppError> {
    let tiers = pricing::create_default_tiers(&pool, event_id, body.manager).await?;
    Ok(created(tiers, "Default price tiers created").into_response())
}

pub async fn price_history(
    State(pool): State<PgPool>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let history = pricing::price_history(&pool, event_id).await?;
    Ok(success(history, "Price history retrieved").into_response())
}
