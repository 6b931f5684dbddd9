use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::repositories::PaletteRepository;
use crate::services::colors::{is_valid_hex_color, GamePalette, Palette};
use crate::services::required;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInput {
    #[serde(default, alias = "juego")]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInput {
    #[serde(default, alias = "juego")]
    pub game: String,
    #[serde(default, alias = "coleccion")]
    pub name: String,
}

/// Outcome of adding a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionAdded {
    Added,
    AlreadyPresent,
}

pub(crate) fn checked_color(color: &str) -> Result<String, ServiceError> {
    let color = color.trim().to_lowercase();
    if !is_valid_hex_color(&color) {
        return Err(ServiceError::ValidationError(format!(
            "El color '{}' no es válido. Usa el formato #rrggbb.",
            color
        )));
    }
    Ok(color)
}

/// Trims names, drops blank entries and keeps the first occurrence of
/// repeated games and of repeated collections within a game
pub fn dedupe(palette: Palette) -> Palette {
    let mut games: Vec<GamePalette> = Vec::new();
    for game in palette.games {
        let name = game.name.trim().to_string();
        if name.is_empty() || games.iter().any(|g| g.name == name) {
            continue;
        }

        let mut collections: Vec<String> = Vec::new();
        for collection in game.collections {
            let collection = collection.trim().to_string();
            if !collection.is_empty() && !collections.contains(&collection) {
                collections.push(collection);
            }
        }

        games.push(GamePalette {
            name,
            color: game.color,
            collections,
        });
    }
    Palette::new(games)
}

#[derive(Clone)]
pub struct PaletteService {
    palette: PaletteRepository,
}

impl PaletteService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            palette: PaletteRepository::new(db),
        }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Palette, ServiceError> {
        self.palette.load().await
    }

    /// Adds the game or recolours it. Returns true when the game is new.
    #[instrument(skip(self))]
    pub async fn upsert_game(&self, input: GameInput) -> Result<bool, ServiceError> {
        let name = required(&input.name, "El nombre del juego es obligatorio.")?;
        let color = checked_color(&input.color)?;

        let created = self.palette.upsert_game(&name, &color).await?;
        info!(game = %name, color = %color, created, "palette game saved");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn add_collection(&self, input: CollectionInput) -> Result<CollectionAdded, ServiceError> {
        let game_name = required(&input.game, "El juego es obligatorio.")?;
        let name = required(&input.name, "El nombre de la colección es obligatorio.")?;

        let game = self
            .palette
            .find_game(&game_name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No se encontró el juego '{}'.", game_name)))?;

        if self.palette.add_collection(game.id, &name).await? {
            info!(game = %game_name, collection = %name, "collection added");
            Ok(CollectionAdded::Added)
        } else {
            Ok(CollectionAdded::AlreadyPresent)
        }
    }

    /// Replaces the whole palette. Every colour must be valid.
    #[instrument(skip(self, palette))]
    pub async fn replace(&self, palette: Palette) -> Result<Palette, ServiceError> {
        let mut palette = dedupe(palette);
        for game in &mut palette.games {
            game.color = checked_color(&game.color)?;
        }

        self.palette.replace(&palette).await?;
        info!(games = palette.games.len(), "palette replaced");
        self.palette.load().await
    }
}
