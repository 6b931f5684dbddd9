use crate::{errors::ServiceError, services::calendar::CalendarEntry, AppState};
use axum::{extract::State, response::Json, routing::get, Router};

/// Calendar feed. The calendar widget expects a bare array, so no envelope.
pub async fn calendar_feed(
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarEntry>>, ServiceError> {
    let entries = state.services.calendar.entries().await?;
    Ok(Json(entries))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/eventos", get(calendar_feed))
}
