use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{client, release, reservation};
use crate::errors::ServiceError;
use crate::repositories::{
    ClientRepository, CrudRepository, PaletteRepository, ReleaseRepository, ReservationRepository,
};
use crate::services::colors::{DisplayColors, Palette};
use crate::services::listing::{apply_criteria, DateRange, ListCriteria, Listable, SortKey, SortOrder};
use crate::services::pricing::{amount_in_range, MAX_AMOUNT};
use crate::services::{blank_as_none, checkbox, lenient, non_blank, required, today};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ReleaseSortField {
    #[default]
    #[strum(serialize = "release_date", serialize = "fecha_salida")]
    ReleaseDate,
    #[strum(serialize = "name", serialize = "nombre")]
    Name,
    #[strum(serialize = "game", serialize = "juego")]
    Game,
    #[strum(serialize = "collection", serialize = "coleccion")]
    Collection,
    #[strum(serialize = "price", serialize = "precio")]
    Price,
    #[strum(serialize = "ship_date", serialize = "fecha_envio")]
    ShipDate,
    #[strum(serialize = "reservation_fee", serialize = "precio_reserva")]
    ReservationFee,
}

impl Listable for release::Model {
    type SortField = ReleaseSortField;

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.name.as_str()),
            self.collection.as_deref(),
            self.game.as_deref(),
        ]
    }

    fn listing_date(&self) -> Option<NaiveDate> {
        Some(self.release_date)
    }

    fn sort_key(&self, field: ReleaseSortField) -> Option<SortKey> {
        match field {
            ReleaseSortField::ReleaseDate => Some(SortKey::Date(self.release_date)),
            ReleaseSortField::Name => Some(SortKey::text(&self.name)),
            ReleaseSortField::Game => self.game.as_deref().map(SortKey::text),
            ReleaseSortField::Collection => self.collection.as_deref().map(SortKey::text),
            ReleaseSortField::Price => Some(SortKey::Amount(self.price)),
            ReleaseSortField::ShipDate => self.ship_date.map(SortKey::Date),
            ReleaseSortField::ReservationFee => Some(SortKey::Amount(self.reservation_fee)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseFilters {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, alias = "juego")]
    pub game: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "checkbox")]
    pub hide_past: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub sort_by: Option<ReleaseSortField>,
    #[serde(default, deserialize_with = "lenient")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationWithClient {
    #[serde(flatten)]
    pub reservation: reservation::Model,
    pub client: Option<client::Model>,
}

/// A release with its display colours and the reservations against it
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseView {
    #[serde(flatten)]
    pub release: release::Model,
    #[serde(flatten)]
    pub colors: DisplayColors,
    pub reservations: Vec<ReservationWithClient>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseListing {
    pub releases: Vec<ReleaseView>,
    pub palette: Palette,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInput {
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "juego")]
    pub game: Option<String>,
    #[serde(default, alias = "coleccion")]
    pub collection: Option<String>,
    #[serde(alias = "fecha_salida")]
    pub release_date: NaiveDate,
    #[serde(default, alias = "fecha_envio", deserialize_with = "blank_as_none")]
    pub ship_date: Option<NaiveDate>,
    #[serde(default, alias = "precio")]
    pub price: Option<Decimal>,
    #[serde(default, alias = "precio_reserva")]
    pub reservation_fee: Option<Decimal>,
    #[serde(default, alias = "comentario")]
    pub comment: Option<String>,
}

/// Checks the catalogue fields shared by releases and events and returns
/// the normalised name, price and fee
pub(crate) fn validate_catalogue_item(
    name: &str,
    name_message: &str,
    price: Option<Decimal>,
    fee: Option<Decimal>,
) -> Result<(String, Decimal, Decimal), ServiceError> {
    let name = required(name, name_message)?;
    let price = price.unwrap_or(Decimal::ZERO);
    let fee = fee.unwrap_or(Decimal::ZERO);
    if price < Decimal::ZERO || fee < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Los precios no pueden ser negativos.".to_string(),
        ));
    }
    if !amount_in_range(price) || !amount_in_range(fee) {
        return Err(ServiceError::ValidationError(format!(
            "Los precios no pueden superar {}.",
            MAX_AMOUNT
        )));
    }
    Ok((name, price, fee))
}

impl ReleaseInput {
    pub(crate) fn into_active_model(self) -> Result<release::ActiveModel, ServiceError> {
        let (name, price, fee) = validate_catalogue_item(
            &self.name,
            "El nombre del lanzamiento es obligatorio.",
            self.price,
            self.reservation_fee,
        )?;

        Ok(release::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            game: Set(non_blank(self.game)),
            collection: Set(non_blank(self.collection)),
            release_date: Set(self.release_date),
            ship_date: Set(self.ship_date),
            price: Set(price),
            reservation_fee: Set(fee),
            comment: Set(non_blank(self.comment)),
            created_at: Set(Utc::now()),
        })
    }
}

#[derive(Clone)]
pub struct ReleaseService {
    releases: ReleaseRepository,
    reservations: ReservationRepository,
    clients: ClientRepository,
    palette: PaletteRepository,
}

impl ReleaseService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            releases: ReleaseRepository::new(db.clone()),
            reservations: ReservationRepository::new(db.clone()),
            clients: ClientRepository::new(db.clone()),
            palette: PaletteRepository::new(db),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &ReleaseFilters) -> Result<ReleaseListing, ServiceError> {
        let palette = self.palette.load().await?;
        let game = filters.game.as_deref().map(str::trim).filter(|g| !g.is_empty());

        let releases: Vec<release::Model> = self
            .releases
            .list()
            .await?
            .into_iter()
            .filter(|r| game.map_or(true, |g| r.game.as_deref() == Some(g)))
            .collect();

        let criteria = ListCriteria {
            query: filters.q.clone(),
            range: DateRange::new(filters.start_date, filters.end_date),
            hide_before: filters.hide_past.then(today),
            sort: Some((
                filters.sort_by.unwrap_or_default(),
                filters.sort_order.unwrap_or_default(),
            )),
        };
        let releases = apply_criteria(releases, &criteria);

        let clients: HashMap<Uuid, client::Model> = self
            .clients
            .list()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut by_release: HashMap<Uuid, Vec<ReservationWithClient>> = HashMap::new();
        for reservation in self.reservations.list().await? {
            if let Some(release_id) = reservation.release_id {
                let client = clients.get(&reservation.client_id).cloned();
                by_release
                    .entry(release_id)
                    .or_default()
                    .push(ReservationWithClient {
                        reservation,
                        client,
                    });
            }
        }

        let releases = releases
            .into_iter()
            .map(|release| ReleaseView {
                colors: palette.colors_for(release.game.as_deref(), release.collection.as_deref()),
                reservations: by_release.remove(&release.id).unwrap_or_default(),
                release,
            })
            .collect();

        Ok(ReleaseListing { releases, palette })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ReleaseView, ServiceError> {
        let release = self
            .releases
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("el lanzamiento", id))?;
        let palette = self.palette.load().await?;

        let mut reservations = Vec::new();
        for reservation in self.reservations.find_by_release(id).await? {
            let client = self.clients.get(reservation.client_id).await?;
            reservations.push(ReservationWithClient {
                reservation,
                client,
            });
        }

        Ok(ReleaseView {
            colors: palette.colors_for(release.game.as_deref(), release.collection.as_deref()),
            reservations,
            release,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: ReleaseInput) -> Result<release::Model, ServiceError> {
        let created = self.releases.create(input.into_active_model()?).await?;
        info!(release_id = %created.id, name = %created.name, "release created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: ReleaseInput) -> Result<release::Model, ServiceError> {
        let existing = self
            .releases
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("el lanzamiento", id))?;

        let mut active = input.into_active_model()?;
        active.id = Set(existing.id);
        active.created_at = Set(existing.created_at);
        // every column is Set, so this overwrites the whole row
        let updated = self.releases.update(active).await?;
        info!(release_id = %id, "release updated");
        Ok(updated)
    }

    /// Deletes the release together with its reservations
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<u64, ServiceError> {
        let removed = self
            .releases
            .delete_with_reservations(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("el lanzamiento", id))?;
        info!(release_id = %id, reservations_removed = removed, "release deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn sort_fields_accept_spanish_aliases() {
        assert_eq!(
            ReleaseSortField::from_str("fecha_salida").unwrap(),
            ReleaseSortField::ReleaseDate
        );
        assert_eq!(
            ReleaseSortField::from_str("precio_reserva").unwrap(),
            ReleaseSortField::ReservationFee
        );
        assert_eq!(ReleaseSortField::from_str("GAME").unwrap(), ReleaseSortField::Game);
        assert!(ReleaseSortField::from_str("color").is_err());
    }

    #[test]
    fn filters_parse_from_query_string_shapes() {
        let filters: ReleaseFilters = serde_json::from_value(serde_json::json!({
            "q": "spider",
            "juego": "Marvel's Spiderman",
            "start_date": "",
            "hide_past": "on",
            "sort_by": "precio",
            "sort_order": "desc"
        }))
        .unwrap();

        assert_eq!(filters.game.as_deref(), Some("Marvel's Spiderman"));
        assert!(filters.start_date.is_none());
        assert!(filters.hide_past);
        assert_eq!(filters.sort_by, Some(ReleaseSortField::Price));
        assert_eq!(filters.sort_order, Some(SortOrder::Desc));
    }

    #[test]
    fn release_form_defaults_prices_to_zero() {
        let input: ReleaseInput = serde_json::from_value(serde_json::json!({
            "nombre": "Bundle",
            "fecha_salida": "2025-09-26",
            "fecha_envio": ""
        }))
        .unwrap();

        let model = input.into_active_model().unwrap();
        assert_eq!(model.price.unwrap(), Decimal::ZERO);
        assert_eq!(model.ship_date.unwrap(), None);
    }

    #[test]
    fn negative_prices_are_rejected() {
        let result = validate_catalogue_item("Bundle", "x", Some(dec!(-1)), None);
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn prices_above_the_ceiling_are_rejected() {
        let result = validate_catalogue_item(
            "Bundle",
            "x",
            Some(dec!(195)),
            Some(dec!(40000000000000000000000000000)),
        );
        assert!(matches!(
            result,
            Err(ServiceError::ValidationError(msg)) if msg == "Los precios no pueden superar 9999999.99."
        ));
    }

    #[test]
    fn blank_name_is_rejected_with_message() {
        let result = validate_catalogue_item(" ", "El nombre del lanzamiento es obligatorio.", None, None);
        assert!(matches!(
            result,
            Err(ServiceError::ValidationError(msg)) if msg == "El nombre del lanzamiento es obligatorio."
        ));
    }
}
