use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Implements [`CrudRepository`] for a repository wrapping one entity module.
macro_rules! crud_repository {
    ($repo:ident, $entity:ident) => {
        #[derive(Debug, Clone)]
        pub struct $repo {
            base: $crate::repositories::BaseRepository,
        }

        impl $repo {
            pub fn new(db: std::sync::Arc<sea_orm::DatabaseConnection>) -> Self {
                Self {
                    base: $crate::repositories::BaseRepository::new(db),
                }
            }
        }

        impl $crate::repositories::Repository for $repo {
            fn get_db(&self) -> &sea_orm::DatabaseConnection {
                $crate::repositories::Repository::get_db(&self.base)
            }
        }

        #[async_trait::async_trait]
        impl $crate::repositories::CrudRepository for $repo {
            type Model = $entity::Model;
            type ActiveModel = $entity::ActiveModel;

            async fn get(
                &self,
                id: uuid::Uuid,
            ) -> Result<Option<Self::Model>, $crate::errors::ServiceError> {
                use sea_orm::EntityTrait;
                use $crate::repositories::Repository;
                Ok($entity::Entity::find_by_id(id).one(self.get_db()).await?)
            }

            async fn list(&self) -> Result<Vec<Self::Model>, $crate::errors::ServiceError> {
                use sea_orm::{EntityTrait, QueryOrder};
                use $crate::repositories::Repository;
                Ok($entity::Entity::find()
                    .order_by_asc($entity::Column::CreatedAt)
                    .all(self.get_db())
                    .await?)
            }

            async fn create(
                &self,
                model: Self::ActiveModel,
            ) -> Result<Self::Model, $crate::errors::ServiceError> {
                use sea_orm::ActiveModelTrait;
                use $crate::repositories::Repository;
                Ok(model.insert(self.get_db()).await?)
            }

            async fn update(
                &self,
                model: Self::ActiveModel,
            ) -> Result<Self::Model, $crate::errors::ServiceError> {
                use sea_orm::ActiveModelTrait;
                use $crate::repositories::Repository;
                Ok(model.update(self.get_db()).await?)
            }

            async fn delete(&self, id: uuid::Uuid) -> Result<bool, $crate::errors::ServiceError> {
                use sea_orm::EntityTrait;
                use $crate::repositories::Repository;
                let result = $entity::Entity::delete_by_id(id).exec(self.get_db()).await?;
                Ok(result.rows_affected > 0)
            }

            async fn insert_all(
                &self,
                models: Vec<Self::ActiveModel>,
            ) -> Result<usize, $crate::errors::ServiceError> {
                use sea_orm::{ActiveModelTrait, TransactionTrait};
                use $crate::repositories::Repository;
                let count = models.len();
                let txn = self.get_db().begin().await?;
                for model in models {
                    model.insert(&txn).await?;
                }
                txn.commit().await?;
                Ok(count)
            }

            async fn replace_all(
                &self,
                models: Vec<Self::ActiveModel>,
            ) -> Result<usize, $crate::errors::ServiceError> {
                use sea_orm::{ActiveModelTrait, EntityTrait, TransactionTrait};
                use $crate::repositories::Repository;
                let count = models.len();
                let txn = self.get_db().begin().await?;
                $entity::Entity::delete_many().exec(&txn).await?;
                for model in models {
                    model.insert(&txn).await?;
                }
                txn.commit().await?;
                Ok(count)
            }
        }
    };
}

pub(crate) use crud_repository;

pub mod client_repository;
pub mod event_repository;
pub mod palette_repository;
pub mod release_repository;
pub mod reservation_repository;
pub mod staff_repository;

pub use client_repository::ClientRepository;
pub use event_repository::EventRepository;
pub use palette_repository::PaletteRepository;
pub use release_repository::ReleaseRepository;
pub use reservation_repository::ReservationRepository;
pub use staff_repository::StaffRepository;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Whole-table access for one record type. Lists come back in creation order.
#[async_trait]
pub trait CrudRepository: Repository + Send + Sync {
    type Model: Send + Sync;
    type ActiveModel: Send;

    async fn get(&self, id: Uuid) -> Result<Option<Self::Model>, ServiceError>;

    async fn list(&self) -> Result<Vec<Self::Model>, ServiceError>;

    async fn create(&self, model: Self::ActiveModel) -> Result<Self::Model, ServiceError>;

    async fn update(&self, model: Self::ActiveModel) -> Result<Self::Model, ServiceError>;

    /// Returns false when nothing had that id
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;

    async fn insert_all(&self, models: Vec<Self::ActiveModel>) -> Result<usize, ServiceError>;

    /// Empties the table and inserts `models`, all or nothing
    async fn replace_all(&self, models: Vec<Self::ActiveModel>) -> Result<usize, ServiceError>;
}


/// `None` and `""` name the same game or collection
pub(crate) fn same_label(stored: Option<&str>, wanted: Option<&str>) -> bool {
    stored.unwrap_or("").trim() == wanted.unwrap_or("").trim()
}
