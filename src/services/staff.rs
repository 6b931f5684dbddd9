use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::staff;
use crate::errors::ServiceError;
use crate::repositories::{CrudRepository, StaffRepository};
use crate::services::listing::matches_query;
use crate::services::{non_blank, required};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StaffInput {
    #[serde(default, alias = "nombre")]
    #[validate(length(max = 200, message = "El nombre es demasiado largo."))]
    pub name: String,
    #[serde(default, alias = "rol")]
    pub role: Option<String>,
    #[serde(default)]
    #[validate(email(message = "El email no tiene un formato válido."))]
    pub email: Option<String>,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
}

impl StaffInput {
    pub(crate) fn into_active_model(self) -> Result<staff::ActiveModel, ServiceError> {
        let name = required(&self.name, "El nombre del miembro del staff es obligatorio.")?;
        let input = Self {
            name,
            role: non_blank(self.role),
            email: non_blank(self.email),
            phone: non_blank(self.phone),
        };
        input.validate()?;

        Ok(staff::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            role: Set(input.role),
            email: Set(input.email),
            phone: Set(input.phone),
            created_at: Set(Utc::now()),
        })
    }
}

#[derive(Clone)]
pub struct StaffService {
    staff: StaffRepository,
}

impl StaffService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            staff: StaffRepository::new(db),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, q: Option<&str>) -> Result<Vec<staff::Model>, ServiceError> {
        Ok(self
            .staff
            .list()
            .await?
            .into_iter()
            .filter(|s| {
                matches_query(
                    q,
                    &[
                        Some(s.name.as_str()),
                        s.role.as_deref(),
                        s.email.as_deref(),
                        s.phone.as_deref(),
                    ],
                )
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<staff::Model, ServiceError> {
        self.staff
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("el miembro del staff", id))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: StaffInput) -> Result<staff::Model, ServiceError> {
        let created = self.staff.create(input.into_active_model()?).await?;
        info!(staff_id = %created.id, "staff member created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: StaffInput) -> Result<staff::Model, ServiceError> {
        let existing = self.get(id).await?;

        let mut active = input.into_active_model()?;
        active.id = Set(existing.id);
        active.created_at = Set(existing.created_at);
        let updated = self.staff.update(active).await?;
        info!(staff_id = %id, "staff member updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.staff.delete(id).await? {
            return Err(ServiceError::not_found("el miembro del staff", id));
        }
        info!(staff_id = %id, "staff member deleted");
        Ok(())
    }
}
