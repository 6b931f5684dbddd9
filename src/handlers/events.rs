use crate::{
    errors::{ApiError, ServiceError},
    handlers::common::{created_response, success_response},
    services::events::{EventFilters, EventInput, EventListing, EventView},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use uuid::Uuid;

pub async fn list_events(
    State(state): State<AppState>,
    Query(filters): Query<EventFilters>,
) -> ApiResult<EventListing> {
    let listing = state.services.events.list(&filters).await?;
    Ok(Json(ApiResponse::success(listing)))
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(input): Json<EventInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .events
        .create(input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    Ok(created_response(created, "Evento creado con éxito."))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<EventView> {
    let event = state.services.events.get(id).await?;
    Ok(Json(ApiResponse::success(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<EventInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .events
        .update(id, input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    Ok(success_response(updated, "Evento actualizado con éxito."))
}

/// Refused with 409 while reservations still point at the event
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.events.delete(id).await?;
    Ok(success_response(id, "Evento eliminado con éxito."))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/eventos", get(list_events).post(create_event))
        .route("/eventos/nuevo", post(create_event))
        .route(
            "/eventos/editar/:id",
            get(get_event).post(update_event).put(update_event),
        )
        .route(
            "/eventos/eliminar/:id",
            get(delete_event).post(delete_event).delete(delete_event),
        )
}
