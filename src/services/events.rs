use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::event;
use crate::errors::ServiceError;
use crate::repositories::{CrudRepository, EventRepository, PaletteRepository, ReservationRepository};
use crate::services::colors::{DisplayColors, Palette};
use crate::services::listing::{apply_criteria, DateRange, ListCriteria, Listable, SortKey, SortOrder};
use crate::services::releases::validate_catalogue_item;
use crate::services::{blank_as_none, checkbox, lenient, non_blank, today};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum EventSortField {
    #[default]
    #[strum(serialize = "date", serialize = "fecha")]
    Date,
    #[strum(serialize = "name", serialize = "nombre")]
    Name,
    #[strum(serialize = "game", serialize = "juego")]
    Game,
    #[strum(serialize = "collection", serialize = "coleccion")]
    Collection,
    #[strum(serialize = "price", serialize = "precio")]
    Price,
}

impl Listable for event::Model {
    type SortField = EventSortField;

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.name.as_str()),
            self.collection.as_deref(),
            self.game.as_deref(),
        ]
    }

    fn listing_date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }

    fn sort_key(&self, field: EventSortField) -> Option<SortKey> {
        match field {
            EventSortField::Date => Some(SortKey::Date(self.date)),
            EventSortField::Name => Some(SortKey::text(&self.name)),
            EventSortField::Game => self.game.as_deref().map(SortKey::text),
            EventSortField::Collection => self.collection.as_deref().map(SortKey::text),
            EventSortField::Price => Some(SortKey::Amount(self.price)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilters {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "checkbox")]
    pub hide_past: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub sort_by: Option<EventSortField>,
    #[serde(default, deserialize_with = "lenient")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: event::Model,
    #[serde(flatten)]
    pub colors: DisplayColors,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventListing {
    pub events: Vec<EventView>,
    pub palette: Palette,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInput {
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "juego")]
    pub game: Option<String>,
    #[serde(default, alias = "coleccion")]
    pub collection: Option<String>,
    #[serde(alias = "fecha")]
    pub date: NaiveDate,
    #[serde(default, alias = "precio")]
    pub price: Option<Decimal>,
    #[serde(default, alias = "precio_reserva")]
    pub reservation_fee: Option<Decimal>,
    #[serde(default, alias = "comentario")]
    pub comment: Option<String>,
}

impl EventInput {
    pub(crate) fn into_active_model(self) -> Result<event::ActiveModel, ServiceError> {
        let (name, price, fee) = validate_catalogue_item(
            &self.name,
            "El nombre del evento es obligatorio.",
            self.price,
            self.reservation_fee,
        )?;

        Ok(event::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            game: Set(non_blank(self.game)),
            collection: Set(non_blank(self.collection)),
            date: Set(self.date),
            price: Set(price),
            reservation_fee: Set(fee),
            comment: Set(non_blank(self.comment)),
            created_at: Set(Utc::now()),
        })
    }
}

#[derive(Clone)]
pub struct EventService {
    events: EventRepository,
    reservations: ReservationRepository,
    palette: PaletteRepository,
}

impl EventService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            events: EventRepository::new(db.clone()),
            reservations: ReservationRepository::new(db.clone()),
            palette: PaletteRepository::new(db),
        }
    }

    /// Newest first unless another order is asked for
    #[instrument(skip(self))]
    pub async fn list(&self, filters: &EventFilters) -> Result<EventListing, ServiceError> {
        let palette = self.palette.load().await?;

        let criteria = ListCriteria {
            query: filters.q.clone(),
            range: DateRange::new(filters.start_date, filters.end_date),
            hide_before: filters.hide_past.then(today),
            sort: Some(match filters.sort_by {
                Some(field) => (field, filters.sort_order.unwrap_or_default()),
                None => (
                    EventSortField::Date,
                    filters.sort_order.unwrap_or(SortOrder::Desc),
                ),
            }),
        };

        let events = apply_criteria(self.events.list().await?, &criteria)
            .into_iter()
            .map(|event| EventView {
                colors: palette.colors_for(event.game.as_deref(), event.collection.as_deref()),
                event,
            })
            .collect();

        Ok(EventListing { events, palette })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<EventView, ServiceError> {
        let event = self
            .events
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("el evento", id))?;
        let palette = self.palette.load().await?;

        Ok(EventView {
            colors: palette.colors_for(event.game.as_deref(), event.collection.as_deref()),
            event,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: EventInput) -> Result<event::Model, ServiceError> {
        let created = self.events.create(input.into_active_model()?).await?;
        info!(event_id = %created.id, name = %created.name, "event created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: EventInput) -> Result<event::Model, ServiceError> {
        let existing = self
            .events
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("el evento", id))?;

        let mut active = input.into_active_model()?;
        active.id = Set(existing.id);
        active.created_at = Set(existing.created_at);
        let updated = self.events.update(active).await?;
        info!(event_id = %id, "event updated");
        Ok(updated)
    }

    /// Refused while reservations point at the event
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if self.reservations.count_for_event(id).await? > 0 {
            return Err(ServiceError::Conflict(
                "No se puede eliminar un evento que tiene reservas asociadas.".to_string(),
            ));
        }

        if !self.events.delete(id).await? {
            return Err(ServiceError::not_found("el evento", id));
        }

        info!(event_id = %id, "event deleted");
        Ok(())
    }
}
