use crate::{
    errors::{ApiError, ServiceError},
    handlers::common::{created_response, success_response},
    services::reservations::{
        ReservationFilters, ReservationFormOptions, ReservationInput, ReservationListing,
        ReservationRow,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::get,
    Router,
};
use uuid::Uuid;

/// Reservations with live payment state and the total still owed
pub async fn list_reservations(
    State(state): State<AppState>,
    Query(filters): Query<ReservationFilters>,
) -> ApiResult<ReservationListing> {
    let listing = state.services.reservations.list(&filters).await?;
    Ok(Json(ApiResponse::success(listing)))
}

/// Clients, releases, events and games to choose from when reserving
pub async fn reservation_form(State(state): State<AppState>) -> ApiResult<ReservationFormOptions> {
    let options = state.services.reservations.form_options().await?;
    Ok(Json(ApiResponse::success(options)))
}

pub async fn create_reservation(
    State(state): State<AppState>,
    Json(input): Json<ReservationInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .reservations
        .create(input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    Ok(created_response(created, "Reserva creada con éxito."))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ReservationRow> {
    let reservation = state.services.reservations.get(id).await?;
    Ok(Json(ApiResponse::success(reservation)))
}

pub async fn update_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReservationInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .reservations
        .update(id, input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    Ok(success_response(updated, "Reserva actualizada con éxito."))
}

pub async fn delete_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.reservations.delete(id).await?;
    Ok(success_response(id, "Reserva eliminada correctamente."))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reservas", get(list_reservations).post(create_reservation))
        .route(
            "/reservas/nuevo",
            get(reservation_form).post(create_reservation),
        )
        .route(
            "/reservas/editar/:id",
            get(get_reservation)
                .post(update_reservation)
                .put(update_reservation),
        )
        .route(
            "/reservas/eliminar/:id",
            get(delete_reservation)
                .post(delete_reservation)
                .delete(delete_reservation),
        )
}
