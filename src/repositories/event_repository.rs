use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::event;
use crate::errors::ServiceError;
use crate::repositories::{crud_repository, same_label, Repository};

crud_repository!(EventRepository, event);

impl EventRepository {
    /// Looks an event up by its display identity
    pub async fn find_by_identity(
        &self,
        name: &str,
        game: Option<&str>,
        collection: Option<&str>,
    ) -> Result<Option<event::Model>, ServiceError> {
        let candidates = event::Entity::find()
            .filter(event::Column::Name.eq(name))
            .order_by_asc(event::Column::CreatedAt)
            .all(self.get_db())
            .await?;

        Ok(candidates.into_iter().find(|e| {
            same_label(e.game.as_deref(), game) && same_label(e.collection.as_deref(), collection)
        }))
    }
}
