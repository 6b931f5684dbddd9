use crate::{
    errors::ApiError,
    handlers::common::{created_response, success_response},
    services::{
        colors::Palette,
        palette::{CollectionAdded, CollectionInput, GameInput},
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::State,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

pub async fn get_palette(State(state): State<AppState>) -> ApiResult<Palette> {
    let palette = state.services.palette.load().await?;
    Ok(Json(ApiResponse::success(palette)))
}

/// Replaces the whole palette; duplicate games and collections are collapsed
pub async fn replace_palette(
    State(state): State<AppState>,
    Json(palette): Json<Palette>,
) -> Result<Response, ApiError> {
    let stored = state
        .services
        .palette
        .replace(palette.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &palette))?;
    Ok(success_response(stored, "Paleta actualizada correctamente."))
}

/// Adds a game or recolours an existing one
pub async fn upsert_game(
    State(state): State<AppState>,
    Json(input): Json<GameInput>,
) -> Result<Response, ApiError> {
    let created = state
        .services
        .palette
        .upsert_game(input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    let body = json!({ "juego": input.name.trim(), "created": created });
    if created {
        Ok(created_response(body, "Juego añadido a la paleta."))
    } else {
        Ok(success_response(body, "Color del juego actualizado."))
    }
}

pub async fn add_collection(
    State(state): State<AppState>,
    Json(input): Json<CollectionInput>,
) -> Result<Response, ApiError> {
    let outcome = state
        .services
        .palette
        .add_collection(input.clone())
        .await
        .map_err(|e| ApiError::rejected(e, &input))?;
    let body = json!({ "juego": input.game.trim(), "coleccion": input.name.trim(), "result": outcome });
    match outcome {
        CollectionAdded::Added => Ok(created_response(body, "Colección añadida al juego.")),
        CollectionAdded::AlreadyPresent => {
            Ok(success_response(body, "La colección ya existía en el juego."))
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/paleta", get(get_palette).put(replace_palette))
        .route("/api/paleta/juegos", post(upsert_game))
        .route("/api/paleta/colecciones", post(add_collection))
}
