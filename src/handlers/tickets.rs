use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ticket::TicketStatus;
use crate::services::allocation;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Deserialize)]
pub struct ListTicketsQuery {
    pub event: Uuid,
    #[serde(default = "default_status")]
    pub status: TicketStatus,
}

fn default_status() -> TicketStatus {
    TicketStatus::Available
}

pub async fn list_tickets(
    State(pool): State<PgPool>,
    Query(query): Query<ListTicketsQuery>,
) -> Result<Response, AppError> {
    let tickets = allocation::list_tickets(&pool, query.event, query.status).await?;
    Ok(success(tickets, "Tickets retrieved").into_response())
}
