//! Calendar feed: one entry per release date, ship date and event.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::entities::{event, release};
use crate::errors::ServiceError;
use crate::repositories::{CrudRepository, EventRepository, PaletteRepository, ReleaseRepository};
use crate::services::colors::{DisplayColors, Palette};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    #[serde(rename = "Lanzamiento")]
    Release,
    #[serde(rename = "Envío")]
    Shipment,
    #[serde(rename = "Evento")]
    Event,
}

impl EntryKind {
    fn icon(self) -> &'static str {
        match self {
            EntryKind::Release => "🚀",
            EntryKind::Shipment => "📦",
            EntryKind::Event => "🎲",
        }
    }
}

/// Details shown when an entry is opened. Keys match what the calendar
/// front end reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryDetails {
    #[serde(rename = "tipo")]
    pub kind: EntryKind,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "lanzamiento_id", skip_serializing_if = "Option::is_none")]
    pub release_id: Option<Uuid>,
    #[serde(rename = "juego")]
    pub game: Option<String>,
    #[serde(rename = "coleccion")]
    pub collection: Option<String>,
    #[serde(rename = "juego_inicial")]
    pub game_initial: String,
    #[serde(rename = "juego_color")]
    pub game_color: String,
    #[serde(rename = "coleccion_color")]
    pub collection_color: String,
    #[serde(rename = "precio")]
    pub price: Decimal,
    #[serde(rename = "reserva")]
    pub reservation_fee: Decimal,
    #[serde(rename = "comentario")]
    pub comment: Option<String>,
    #[serde(rename = "fecha_salida", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(rename = "fecha_envio", skip_serializing_if = "Option::is_none")]
    pub ship_date: Option<NaiveDate>,
    #[serde(rename = "fecha", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub start: NaiveDate,
    pub background_color: String,
    pub border_color: String,
    pub extended_props: EntryDetails,
}

/// First letter of the game name, or a blank for ungrouped products
fn initial(game: Option<&str>) -> String {
    game.and_then(|g| g.chars().next())
        .map(String::from)
        .unwrap_or_else(|| " ".to_string())
}

fn entry(id: String, start: NaiveDate, colors: &DisplayColors, details: EntryDetails) -> CalendarEntry {
    CalendarEntry {
        title: format!("{} {}", details.kind.icon(), details.name),
        id,
        start,
        background_color: colors.collection_color.clone(),
        border_color: colors.collection_color.clone(),
        extended_props: details,
    }
}

/// Release-date entry plus, when the release has one, a ship-date entry
pub fn release_entries(release: &release::Model, palette: &Palette) -> Vec<CalendarEntry> {
    let colors = palette.colors_for(release.game.as_deref(), release.collection.as_deref());
    let details = |kind: EntryKind| EntryDetails {
        kind,
        name: release.name.clone(),
        release_id: (kind == EntryKind::Shipment).then_some(release.id),
        game: release.game.clone(),
        collection: release.collection.clone(),
        game_initial: initial(release.game.as_deref()),
        game_color: colors.game_color.clone(),
        collection_color: colors.collection_color.clone(),
        price: release.price,
        reservation_fee: release.reservation_fee,
        comment: release.comment.clone(),
        release_date: Some(release.release_date),
        ship_date: release.ship_date,
        date: None,
    };

    let mut entries = vec![entry(
        format!("salida-{}", release.id),
        release.release_date,
        &colors,
        details(EntryKind::Release),
    )];
    if let Some(ship_date) = release.ship_date {
        entries.push(entry(
            format!("envio-{}", release.id),
            ship_date,
            &colors,
            details(EntryKind::Shipment),
        ));
    }
    entries
}

pub fn event_entry(event: &event::Model, palette: &Palette) -> CalendarEntry {
    let colors = palette.colors_for(event.game.as_deref(), event.collection.as_deref());
    let details = EntryDetails {
        kind: EntryKind::Event,
        name: event.name.clone(),
        release_id: None,
        game: event.game.clone(),
        collection: event.collection.clone(),
        game_initial: initial(event.game.as_deref()),
        game_color: colors.game_color.clone(),
        collection_color: colors.collection_color.clone(),
        price: event.price,
        reservation_fee: event.reservation_fee,
        comment: event.comment.clone(),
        release_date: None,
        ship_date: None,
        date: Some(event.date),
    };
    entry(event.id.to_string(), event.date, &colors, details)
}

#[derive(Clone)]
pub struct CalendarService {
    releases: ReleaseRepository,
    events: EventRepository,
    palette: PaletteRepository,
}

impl CalendarService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            releases: ReleaseRepository::new(db.clone()),
            events: EventRepository::new(db.clone()),
            palette: PaletteRepository::new(db),
        }
    }

    /// Releases first, then events, each in creation order
    #[instrument(skip(self))]
    pub async fn entries(&self) -> Result<Vec<CalendarEntry>, ServiceError> {
        let palette = self.palette.load().await?;

        let mut entries: Vec<CalendarEntry> = self
            .releases
            .list()
            .await?
            .iter()
            .flat_map(|r| release_entries(r, &palette))
            .collect();
        entries.extend(self.events.list().await?.iter().map(|e| event_entry(e, &palette)));

        debug!(count = entries.len(), "calendar entries built");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::colors::{GamePalette, DEFAULT_COLOR};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn palette() -> Palette {
        Palette::new(vec![GamePalette {
            name: "Lorcana".into(),
            color: "#3366cc".into(),
            collections: vec!["Primer Capítulo".into(), "Marea".into()],
        }])
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn release(ship_date: Option<NaiveDate>) -> release::Model {
        release::Model {
            id: Uuid::new_v4(),
            name: "Caja de sobres".into(),
            game: Some("Lorcana".into()),
            collection: Some("Marea".into()),
            release_date: date("2025-11-14"),
            ship_date,
            price: dec!(195),
            reservation_fee: dec!(20),
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn release_without_ship_date_has_one_entry() {
        let entries = release_entries(&release(None), &palette());
        assert_eq!(entries.len(), 1);
        assert!(entries[0].id.starts_with("salida-"));
        assert_eq!(entries[0].title, "🚀 Caja de sobres");
        assert_eq!(entries[0].background_color, "#2851a3");
        assert_eq!(entries[0].extended_props.game_initial, "L");
    }

    #[test]
    fn ship_date_adds_a_second_entry() {
        let r = release(Some(date("2025-11-10")));
        let entries = release_entries(&r, &palette());
        assert_eq!(entries.len(), 2);

        let shipment = &entries[1];
        assert_eq!(shipment.id, format!("envio-{}", r.id));
        assert_eq!(shipment.start, date("2025-11-10"));
        assert_eq!(shipment.title, "📦 Caja de sobres");
        assert_eq!(shipment.extended_props.release_id, Some(r.id));
        assert_eq!(entries[0].extended_props.release_id, None);
    }

    #[test]
    fn unknown_game_falls_back_to_grey() {
        let event = event::Model {
            id: Uuid::new_v4(),
            name: "Noche de juegos".into(),
            game: None,
            collection: None,
            date: date("2025-10-18"),
            price: Decimal::ZERO,
            reservation_fee: Decimal::ZERO,
            comment: None,
            created_at: Utc::now(),
        };

        let entry = event_entry(&event, &palette());
        assert_eq!(entry.id, event.id.to_string());
        assert_eq!(entry.title, "🎲 Noche de juegos");
        assert_eq!(entry.border_color, DEFAULT_COLOR);
        assert_eq!(entry.extended_props.game_initial, " ");
    }

    #[test]
    fn entries_serialize_in_calendar_shape() {
        let json = serde_json::to_value(&release_entries(&release(None), &palette())[0]).unwrap();
        assert!(json.get("backgroundColor").is_some());
        assert_eq!(json["extendedProps"]["tipo"], "Lanzamiento");
        assert_eq!(json["extendedProps"]["coleccion_color"], "#2851a3");
        assert_eq!(json["start"], "2025-11-14");
        assert!(json["extendedProps"].get("fecha").is_none());
    }
}
