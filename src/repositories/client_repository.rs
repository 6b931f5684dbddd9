use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entities::client;
use crate::errors::ServiceError;
use crate::repositories::{crud_repository, Repository};

crud_repository!(ClientRepository, client);

impl ClientRepository {
    pub async fn find_by_email(&self, email: &str) -> Result<Option<client::Model>, ServiceError> {
        Ok(client::Entity::find()
            .filter(client::Column::Email.eq(email))
            .one(self.get_db())
            .await?)
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<client::Model>, ServiceError> {
        Ok(client::Entity::find()
            .filter(client::Column::Phone.eq(phone))
            .one(self.get_db())
            .await?)
    }
}
