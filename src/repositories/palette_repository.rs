use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{collection, game};
use crate::errors::ServiceError;
use crate::repositories::{BaseRepository, Repository};
use crate::services::colors::{GamePalette, Palette};

/// Storage for the game / collection palette
#[derive(Debug, Clone)]
pub struct PaletteRepository {
    base: BaseRepository,
}

impl PaletteRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Games sorted by name, each with its collections in position order
    pub async fn load(&self) -> Result<Palette, ServiceError> {
        let db = self.get_db();
        let games = game::Entity::find()
            .order_by_asc(game::Column::Name)
            .all(db)
            .await?;
        let collections = collection::Entity::find()
            .order_by_asc(collection::Column::Position)
            .all(db)
            .await?;

        let mut by_game: HashMap<Uuid, Vec<String>> = HashMap::new();
        for c in collections {
            by_game.entry(c.game_id).or_default().push(c.name);
        }

        Ok(Palette::new(
            games
                .into_iter()
                .map(|g| GamePalette {
                    collections: by_game.remove(&g.id).unwrap_or_default(),
                    name: g.name,
                    color: g.color,
                })
                .collect(),
        ))
    }

    pub async fn find_game(&self, name: &str) -> Result<Option<game::Model>, ServiceError> {
        Ok(game::Entity::find()
            .filter(game::Column::Name.eq(name))
            .one(self.get_db())
            .await?)
    }

    /// Inserts the game or updates its colour. Returns true when it was new.
    pub async fn upsert_game(&self, name: &str, color: &str) -> Result<bool, ServiceError> {
        match self.find_game(name).await? {
            Some(existing) => {
                let mut active: game::ActiveModel = existing.into();
                active.color = Set(color.to_string());
                active.update(self.get_db()).await?;
                Ok(false)
            }
            None => {
                game::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(name.to_string()),
                    color: Set(color.to_string()),
                }
                .insert(self.get_db())
                .await?;
                Ok(true)
            }
        }
    }

    /// Appends a collection at the end of the game's list. Returns false when
    /// the game already has a collection with that name.
    pub async fn add_collection(&self, game_id: Uuid, name: &str) -> Result<bool, ServiceError> {
        let db = self.get_db();
        let existing = collection::Entity::find()
            .filter(collection::Column::GameId.eq(game_id))
            .filter(collection::Column::Name.eq(name))
            .one(db)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let position = collection::Entity::find()
            .filter(collection::Column::GameId.eq(game_id))
            .count(db)
            .await?;

        collection::ActiveModel {
            id: Set(Uuid::new_v4()),
            game_id: Set(game_id),
            name: Set(name.to_string()),
            position: Set(position as i32),
        }
        .insert(db)
        .await?;
        Ok(true)
    }

    /// Swaps the whole palette for `palette` in a single transaction
    pub async fn replace(&self, palette: &Palette) -> Result<(), ServiceError> {
        let txn = self.get_db().begin().await?;

        collection::Entity::delete_many().exec(&txn).await?;
        game::Entity::delete_many().exec(&txn).await?;

        for entry in &palette.games {
            let game_id = Uuid::new_v4();
            game::ActiveModel {
                id: Set(game_id),
                name: Set(entry.name.clone()),
                color: Set(entry.color.clone()),
            }
            .insert(&txn)
            .await?;

            for (position, name) in entry.collections.iter().enumerate() {
                collection::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    game_id: Set(game_id),
                    name: Set(name.clone()),
                    position: Set(position as i32),
                }
                .insert(&txn)
                .await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }
}

impl Repository for PaletteRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}
