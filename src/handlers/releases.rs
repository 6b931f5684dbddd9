use crate::{
    errors::{ApiError, ServiceError},
    handlers::common::{created_response, success_response},
    services::releases::{ReleaseFilters, ReleaseInput, ReleaseListing, ReleaseView},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use uuid::Uuid;

/// Filtered, sorted release list together with the palette for the filter form
pub async fn list_releases(
    State(state): State<AppState>,
    Query(filters): Query<ReleaseFilters>,
) -> ApiResult<ReleaseListing> {
    let listing = state.services.releases.list(&filters).await?;
    Ok(Json(ApiResponse::success(listing)))
}

pub async fn create_release(
    State(state): State<AppState>,
    Json(input): Json<ReleaseInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .releases
        .create(input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    Ok(created_response(created, "Lanzamiento añadido con éxito."))
}

pub async fn get_release(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ReleaseView> {
    let release = state.services.releases.get(id).await?;
    Ok(Json(ApiResponse::success(release)))
}

pub async fn update_release(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReleaseInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .releases
        .update(id, input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    Ok(success_response(updated, "Lanzamiento actualizado con éxito."))
}

/// Deletes the release and every reservation made against it
pub async fn delete_release(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let removed = state.services.releases.delete(id).await?;
    Ok(success_response(
        json!({ "id": id, "reservations_removed": removed }),
        "Lanzamiento eliminado con éxito.",
    ))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/lanzamientos", get(list_releases).post(create_release))
        .route("/lanzamientos/nuevo", post(create_release))
        .route(
            "/lanzamientos/editar/:id",
            get(get_release).post(update_release).put(update_release),
        )
        .route(
            "/lanzamientos/eliminar/:id",
            get(delete_release).post(delete_release).delete(delete_release),
        )
}
