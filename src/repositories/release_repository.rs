use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{release, reservation};
use crate::errors::ServiceError;
use crate::repositories::{crud_repository, same_label, Repository};

crud_repository!(ReleaseRepository, release);

impl ReleaseRepository {
    /// Looks a release up by its display identity
    pub async fn find_by_identity(
        &self,
        name: &str,
        game: Option<&str>,
        collection: Option<&str>,
    ) -> Result<Option<release::Model>, ServiceError> {
        let candidates = release::Entity::find()
            .filter(release::Column::Name.eq(name))
            .order_by_asc(release::Column::CreatedAt)
            .all(self.get_db())
            .await?;

        Ok(candidates.into_iter().find(|r| {
            same_label(r.game.as_deref(), game) && same_label(r.collection.as_deref(), collection)
        }))
    }

    /// Deletes the release and every reservation pointing at it in one
    /// transaction. Returns the number of reservations removed, or `None`
    /// when the release did not exist.
    pub async fn delete_with_reservations(&self, id: Uuid) -> Result<Option<u64>, ServiceError> {
        let txn = self.get_db().begin().await?;

        let deleted = release::Entity::delete_by_id(id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        let cascaded = reservation::Entity::delete_many()
            .filter(reservation::Column::ReleaseId.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        debug!(release_id = %id, reservations = cascaded.rows_affected, "release deleted");
        Ok(Some(cascaded.rows_affected))
    }
}
