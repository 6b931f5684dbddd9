//! Seed data script - populates the database with a small demo catalogue
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - a palette with two games and their collections
//! - 4 releases and 2 events
//! - 3 clients, 2 staff members
//! - 3 reservations in various payment states

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

use jocrol_api::{
    entities::reservation::ReservationStatus,
    handlers::AppServices,
    services::{
        clients::ClientInput,
        colors::{GamePalette, Palette},
        events::EventInput,
        releases::ReleaseInput,
        reservations::{ProductKind, ReservationInput},
        staff::StaffInput,
    },
};

const MAGIC: &str = "Magic: The Gathering";
const LORCANA: &str = "Disney Lorcana";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = jocrol_api::config::load_config()?;
    jocrol_api::config::init_tracing(cfg.log_level(), cfg.log_json);

    info!("=== Jocrol Seed Data ===");

    let db = jocrol_api::db::establish_connection_from_app_config(&cfg).await?;
    jocrol_api::db::run_migrations(&db).await?;
    let services = AppServices::new(Arc::new(db));

    info!("Creating palette...");
    let palette = services
        .palette
        .replace(Palette::new(vec![
            GamePalette {
                name: MAGIC.to_string(),
                color: "#d97706".to_string(),
                collections: vec!["Marvel's Spiderman".to_string(), "Avatar".to_string()],
            },
            GamePalette {
                name: LORCANA.to_string(),
                color: "#7c3aed".to_string(),
                collections: vec!["Fabled".to_string()],
            },
        ]))
        .await?;
    info!("  Palette has {} games", palette.games.len());

    info!("Creating releases...");
    let releases = [
        ("Cajas de sobres", MAGIC, "Marvel's Spiderman", date(2025, 9, 26), dec!(195), dec!(20)),
        ("Bundle", MAGIC, "Marvel's Spiderman", date(2025, 9, 26), dec!(70), dec!(5)),
        ("Caja de escena", MAGIC, "Marvel's Spiderman", date(2025, 9, 26), dec!(45), dec!(5)),
        ("Cajas de sobres", MAGIC, "Avatar", date(2025, 11, 21), dec!(195), dec!(20)),
    ];
    let mut created_releases = Vec::new();
    for (name, game, collection, release_date, price, fee) in releases {
        let release = services
            .releases
            .create(ReleaseInput {
                name: name.to_string(),
                game: Some(game.to_string()),
                collection: Some(collection.to_string()),
                release_date,
                ship_date: None,
                price: Some(price),
                reservation_fee: Some(fee),
                comment: None,
            })
            .await?;
        created_releases.push(release);
    }
    info!("  Created {} releases", created_releases.len());

    info!("Creating events...");
    for (name, event_date) in [
        ("Comm Party 1", date(2025, 10, 4)),
        ("Halloween Spiderman", date(2025, 10, 31)),
    ] {
        services
            .events
            .create(EventInput {
                name: name.to_string(),
                game: Some(MAGIC.to_string()),
                collection: Some("Marvel's Spiderman".to_string()),
                date: event_date,
                price: Some(dec!(0)),
                reservation_fee: Some(dec!(0)),
                comment: None,
            })
            .await?;
    }

    info!("Creating clients...");
    let mut clients = Vec::new();
    for (name, email, phone) in [
        ("Juan Pérez", "juan@email.com", "666777888"),
        ("María García", "maria@email.com", "666111222"),
        ("Carlos López", "carlos@email.com", "666333444"),
    ] {
        let client = services
            .clients
            .create(ClientInput {
                name: name.to_string(),
                email: Some(email.to_string()),
                phone: Some(phone.to_string()),
            })
            .await?;
        clients.push(client);
    }
    info!("  Created {} clients", clients.len());

    info!("Creating staff...");
    for (name, role) in [("Laura Martín", "Encargada"), ("Pablo Ruiz", "Dependiente")] {
        services
            .staff
            .create(StaffInput {
                name: name.to_string(),
                role: Some(role.to_string()),
                ..Default::default()
            })
            .await?;
    }

    info!("Creating reservations...");
    let reservations = [
        (0, 0, 1, dec!(195), ReservationStatus::Confirmed, "295 puntos de fidelidad aplicados"),
        (1, 1, 2, dec!(10), ReservationStatus::Pending, "Pendiente de pago. Contactar esta semana."),
        (2, 3, 1, dec!(0), ReservationStatus::Pending, ""),
    ];
    for (client_idx, release_idx, quantity, paid, status, notes) in reservations {
        services
            .reservations
            .create(ReservationInput {
                client_id: clients[client_idx].id,
                product_type: Some(ProductKind::Release),
                product_id: Some(created_releases[release_idx].id),
                quantity: Some(quantity),
                reservation_date: Some(date(2025, 9, 23)),
                status: Some(status),
                amount_paid: Some(paid),
                payment_type: None,
                notes: Some(notes.to_string()),
            })
            .await?;
    }

    info!("=== Seed Data Complete ===");
    info!("Try these API calls:");
    info!("  curl http://localhost:{}/lanzamientos", cfg.port);
    info!("  curl http://localhost:{}/reservas", cfg.port);
    info!("  curl http://localhost:{}/api/eventos", cfg.port);

    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
