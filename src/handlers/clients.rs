use crate::{
    entities::client,
    errors::{ApiError, ServiceError},
    handlers::common::{created_response, success_response, SearchQuery},
    services::clients::{ClientInput, ClientWithReservations},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use uuid::Uuid;

/// Client directory with each client's reservations
pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<ClientWithReservations>> {
    let clients = state.services.clients.list(query.q.as_deref()).await?;
    Ok(Json(ApiResponse::success(clients)))
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(input): Json<ClientInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .clients
        .create(input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    Ok(created_response(created, "Cliente añadido correctamente."))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<client::Model> {
    let client = state.services.clients.get(id).await?;
    Ok(Json(ApiResponse::success(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ClientInput>,
) -> Result<Response, ApiError> {
    let updated = state
        .services
        .clients
        .update(id, input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    Ok(success_response(updated, "Cliente actualizado correctamente."))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.clients.delete(id).await?;
    Ok(success_response(id, "Cliente eliminado correctamente."))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clientes", get(list_clients).post(create_client))
        .route("/clientes/nuevo", post(create_client))
        .route(
            "/clientes/editar/:id",
            get(get_client).post(update_client).put(update_client),
        )
        .route(
            "/clientes/eliminar/:id",
            get(delete_client).post(delete_client).delete(delete_client),
        )
}
