use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::reservation;
use crate::errors::ServiceError;
use crate::repositories::{crud_repository, Repository};

crud_repository!(ReservationRepository, reservation);

impl ReservationRepository {
    async fn find_where(
        &self,
        column: reservation::Column,
        id: Uuid,
    ) -> Result<Vec<reservation::Model>, ServiceError> {
        Ok(reservation::Entity::find()
            .filter(column.eq(id))
            .order_by_asc(reservation::Column::CreatedAt)
            .all(self.get_db())
            .await?)
    }

    async fn count_where(&self, column: reservation::Column, id: Uuid) -> Result<u64, ServiceError> {
        Ok(reservation::Entity::find()
            .filter(column.eq(id))
            .count(self.get_db())
            .await?)
    }

    pub async fn find_by_release(
        &self,
        release_id: Uuid,
    ) -> Result<Vec<reservation::Model>, ServiceError> {
        self.find_where(reservation::Column::ReleaseId, release_id)
            .await
    }

    pub async fn count_for_client(&self, client_id: Uuid) -> Result<u64, ServiceError> {
        self.count_where(reservation::Column::ClientId, client_id)
            .await
    }

    pub async fn count_for_event(&self, event_id: Uuid) -> Result<u64, ServiceError> {
        self.count_where(reservation::Column::EventId, event_id).await
    }
}
