use crate::{
    entities::staff,
    errors::{ApiError, ServiceError},
    handlers::common::{created_response, success_response, SearchQuery},
    services::staff::StaffInput,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use uuid::Uuid;

pub async fn list_staff(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<staff::Model>> {
    let members = state.services.staff.list(query.q.as_deref()).await?;
    Ok(Json(ApiResponse::success(members)))
}

pub async fn create_staff(
    State(state): State<AppState>,
    Json(input): Json<StaffInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .staff
        .create(input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    Ok(created_response(created, "Miembro del staff añadido correctamente."))
}

pub async fn get_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<staff::Model> {
    let member = state.services.staff.get(id).await?;
    Ok(Json(ApiResponse::success(member)))
}

pub async fn update_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StaffInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .staff
        .update(id, input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    Ok(success_response(updated, "Miembro del staff actualizado correctamente."))
}

pub async fn delete_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.staff.delete(id).await?;
    Ok(success_response(id, "Miembro del staff eliminado correctamente."))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/staff", get(list_staff).post(create_staff))
        .route("/staff/nuevo", post(create_staff))
        .route(
            "/staff/editar/:id",
            get(get_staff).post(update_staff).put(update_staff),
        )
        .route(
            "/staff/eliminar/:id",
            get(delete_staff).post(delete_staff).delete(delete_staff),
        )
}
