use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{client, reservation};
use crate::errors::ServiceError;
use crate::repositories::{
    ClientRepository, CrudRepository, EventRepository, ReleaseRepository, ReservationRepository,
};
use crate::services::listing::matches_query;
use crate::services::reservations::{Catalog, Product};
use crate::services::{non_blank, required};

pub const NAME_REQUIRED: &str = "El nombre del cliente es obligatorio.";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ClientInput {
    #[serde(default, alias = "nombre")]
    #[validate(length(max = 200, message = "El nombre es demasiado largo."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "El email no tiene un formato válido."))]
    pub email: Option<String>,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
}

impl ClientInput {
    /// Trimmed copy with blank optional fields dropped
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: non_blank(self.email),
            phone: non_blank(self.phone),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientReservation {
    #[serde(flatten)]
    pub reservation: reservation::Model,
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientWithReservations {
    #[serde(flatten)]
    pub client: client::Model,
    pub reservations: Vec<ClientReservation>,
}

#[derive(Clone)]
pub struct ClientService {
    clients: ClientRepository,
    reservations: ReservationRepository,
    releases: ReleaseRepository,
    events: EventRepository,
}

impl ClientService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            clients: ClientRepository::new(db.clone()),
            reservations: ReservationRepository::new(db.clone()),
            releases: ReleaseRepository::new(db.clone()),
            events: EventRepository::new(db),
        }
    }

    /// Clients matching `q` on name, email or phone, each with its
    /// reservations and the product each one is for
    #[instrument(skip(self))]
    pub async fn list(&self, q: Option<&str>) -> Result<Vec<ClientWithReservations>, ServiceError> {
        let catalog = Catalog::load(&self.clients, &self.releases, &self.events).await?;

        let mut by_client: HashMap<Uuid, Vec<ClientReservation>> = HashMap::new();
        for reservation in self.reservations.list().await? {
            let product = catalog.product_of(&reservation);
            by_client
                .entry(reservation.client_id)
                .or_default()
                .push(ClientReservation {
                    reservation,
                    product,
                });
        }

        let clients = self
            .clients
            .list()
            .await?
            .into_iter()
            .filter(|c| {
                matches_query(q, &[Some(c.name.as_str()), c.email.as_deref(), c.phone.as_deref()])
            })
            .map(|client| ClientWithReservations {
                reservations: by_client.remove(&client.id).unwrap_or_default(),
                client,
            })
            .collect();

        Ok(clients)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<client::Model, ServiceError> {
        self.clients
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("el cliente", id))
    }

    /// Checks the form and returns it normalised. `current` is the client
    /// being edited, if any, so it does not collide with its own email.
    async fn validate(
        &self,
        input: ClientInput,
        current: Option<Uuid>,
    ) -> Result<ClientInput, ServiceError> {
        let input = input.normalized();
        required(&input.name, NAME_REQUIRED)?;
        input.validate()?;

        if let Some(email) = input.email.as_deref() {
            if let Some(owner) = self.clients.find_by_email(email).await? {
                if Some(owner.id) != current {
                    return Err(email_taken(email, current.is_some()));
                }
            }
        }

        Ok(input)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: ClientInput) -> Result<client::Model, ServiceError> {
        let input = self.validate(input, None).await?;
        let email = input.email.clone();

        let created = self
            .clients
            .create(client::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(input.name),
                email: Set(input.email),
                phone: Set(input.phone),
                created_at: Set(Utc::now()),
            })
            .await
            .map_err(|err| lost_email_race(err, email.as_deref(), false))?;

        info!(client_id = %created.id, "client created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: ClientInput) -> Result<client::Model, ServiceError> {
        let existing = self.get(id).await?;
        let input = self.validate(input, Some(id)).await?;

        let email = input.email.clone();
        let mut active: client::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.email = Set(input.email);
        active.phone = Set(input.phone);

        let updated = self
            .clients
            .update(active)
            .await
            .map_err(|err| lost_email_race(err, email.as_deref(), true))?;
        info!(client_id = %id, "client updated");
        Ok(updated)
    }

    /// Refused while the client still has reservations
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.reservations.count_for_client(id).await? > 0 {
            return Err(ServiceError::Conflict(
                "No se puede eliminar un cliente que tiene reservas asociadas.".to_string(),
            ));
        }

        if !self.clients.delete(id).await? {
            return Err(ServiceError::not_found("el cliente", id));
        }

        info!(client_id = %id, "client deleted");
        Ok(())
    }

    /// Validates a batch of imported rows against the stored clients and
    /// each other. Accepted rows come back as insertable models; rejected
    /// ones as `(row number, message)`.
    pub(crate) async fn prepare_import(
        &self,
        rows: Vec<(usize, ClientInput)>,
        keep_existing: bool,
    ) -> Result<(Vec<client::ActiveModel>, Vec<(usize, String)>), ServiceError> {
        let mut taken: Vec<String> = if keep_existing {
            self.clients
                .list()
                .await?
                .into_iter()
                .filter_map(|c| c.email)
                .collect()
        } else {
            Vec::new()
        };

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for (row, input) in rows {
            let input = input.normalized();
            let checked = required(&input.name, NAME_REQUIRED)
                .and_then(|_| input.validate().map_err(ServiceError::from));
            if let Err(err) = checked {
                rejected.push((row, err.response_message()));
                continue;
            }

            if let Some(email) = input.email.as_deref() {
                if taken.iter().any(|t| t == email) {
                    rejected.push((row, format!("El email '{}' ya está registrado.", email)));
                    continue;
                }
                taken.push(email.to_string());
            }

            accepted.push(client::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(input.name),
                email: Set(input.email),
                phone: Set(input.phone),
                created_at: Set(Utc::now()),
            });
        }

        Ok((accepted, rejected))
    }
}

fn email_taken(email: &str, editing: bool) -> ServiceError {
    let message = if editing {
        format!("El email '{}' ya está registrado por otro cliente.", email)
    } else {
        format!("El email '{}' ya está registrado.", email)
    };
    ServiceError::ValidationError(message)
}

/// A concurrent write can claim the email between the lookup and the insert;
/// the unique index then refuses ours.
fn lost_email_race(err: ServiceError, email: Option<&str>, editing: bool) -> ServiceError {
    match email {
        Some(email) if err.is_unique_violation() => email_taken(email, editing),
        _ => err,
    }
}
