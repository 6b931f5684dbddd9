mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, id_of, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn names(listing: &Value, key: &str) -> Vec<String> {
    listing["data"][key]
        .as_array()
        .expect("listing array")
        .iter()
        .map(|item| item["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

async fn seed_releases(app: &TestApp) {
    for (name, game, date, price) in [
        ("Cajas de sobres", "Magic", "2025-09-26", "195"),
        ("Bundle", "Magic", "2025-10-10", "70"),
        ("Starter deck", "Lorcana", "2025-11-21", "20"),
    ] {
        app.create(
            "/lanzamientos",
            json!({"nombre": name, "juego": game, "fecha_salida": date, "precio": price}),
        )
        .await;
    }
}

#[tokio::test]
async fn release_dates_filter_inclusively() {
    let app = TestApp::new().await;
    seed_releases(&app).await;

    let listing = app
        .json(
            Method::GET,
            "/lanzamientos?start_date=2025-09-26&end_date=2025-10-10",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(names(&listing, "releases"), vec!["Cajas de sobres", "Bundle"]);

    let open_ended = app
        .json(Method::GET, "/lanzamientos?start_date=2025-10-11&end_date=", None, StatusCode::OK)
        .await;
    assert_eq!(names(&open_ended, "releases"), vec!["Starter deck"]);
}

#[tokio::test]
async fn releases_filter_by_game_and_sort() {
    let app = TestApp::new().await;
    seed_releases(&app).await;

    let magic = app
        .json(
            Method::GET,
            "/lanzamientos?juego=Magic&sort_by=precio&sort_order=asc",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(names(&magic, "releases"), vec!["Bundle", "Cajas de sobres"]);

    let unknown_sort = app
        .json(
            Method::GET,
            "/lanzamientos?sort_by=color&sort_order=sideways",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(
        names(&unknown_sort, "releases"),
        vec!["Cajas de sobres", "Bundle", "Starter deck"]
    );
}

#[tokio::test]
async fn negative_prices_are_rejected() {
    let app = TestApp::new().await;
    let body = app
        .json(
            Method::POST,
            "/lanzamientos",
            Some(json!({"nombre": "Bundle", "fecha_salida": "2025-09-26", "precio": "-1"})),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    assert_eq!(body["message"], "Los precios no pueden ser negativos.");
    assert_eq!(body["submitted"]["name"], "Bundle");
}

#[tokio::test]
async fn deleting_a_release_removes_its_reservations() {
    let app = TestApp::new().await;
    let client = app.create("/clientes", json!({"nombre": "Juan"})).await;
    let release = app
        .create(
            "/lanzamientos",
            json!({"nombre": "Bundle", "fecha_salida": "2025-09-26", "precio": "70"}),
        )
        .await;
    for _ in 0..2 {
        app.create(
            "/reservas",
            json!({
                "cliente_id": id_of(&client),
                "tipo_producto": "release",
                "producto_id": id_of(&release),
            }),
        )
        .await;
    }

    let view = app
        .json(
            Method::GET,
            &format!("/lanzamientos/editar/{}", id_of(&release)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(view["data"]["reservations"].as_array().unwrap().len(), 2);

    let deleted = app
        .json(
            Method::POST,
            &format!("/lanzamientos/eliminar/{}", id_of(&release)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(deleted["message"], "Lanzamiento eliminado con éxito.");
    assert_eq!(deleted["data"]["reservations_removed"], 2);

    let reservations = app.json(Method::GET, "/reservas", None, StatusCode::OK).await;
    assert!(reservations["data"]["reservations"].as_array().unwrap().is_empty());

    app.json(
        Method::GET,
        &format!("/lanzamientos/editar/{}", id_of(&release)),
        None,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn release_update_keeps_colours_from_palette() {
    let app = TestApp::new().await;
    app.json(
        Method::POST,
        "/api/paleta/juegos",
        Some(json!({"juego": "Magic", "color": "#FF0000"})),
        StatusCode::CREATED,
    )
    .await;
    let release = app
        .create(
            "/lanzamientos",
            json!({"nombre": "Bundle", "fecha_salida": "2025-09-26"}),
        )
        .await;
    assert_eq!(decimal(&release["price"]), dec!(0));

    let updated = app
        .json(
            Method::PUT,
            &format!("/lanzamientos/editar/{}", id_of(&release)),
            Some(json!({
                "nombre": "Bundle",
                "juego": "Magic",
                "fecha_salida": "2025-09-26",
                "fecha_envio": "2025-10-01",
                "precio": "70",
            })),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["message"], "Lanzamiento actualizado con éxito.");

    let view = app
        .json(
            Method::GET,
            &format!("/lanzamientos/editar/{}", id_of(&release)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(view["data"]["game_color"], "#ff0000");
    assert_eq!(view["data"]["ship_date"], "2025-10-01");
}

#[tokio::test]
async fn events_list_newest_first_and_guard_deletion() {
    let app = TestApp::new().await;
    let early = app
        .json(
            Method::POST,
            "/eventos/nuevo",
            Some(json!({"nombre": "Comm Party 1", "fecha": "2025-10-04"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(early["message"], "Evento creado con éxito.");
    app.create(
        "/eventos",
        json!({"nombre": "Halloween Spiderman", "fecha": "2025-10-31", "precio": "5"}),
    )
    .await;

    let listing = app.json(Method::GET, "/eventos", None, StatusCode::OK).await;
    assert_eq!(
        names(&listing, "events"),
        vec!["Halloween Spiderman", "Comm Party 1"]
    );

    let event_id = id_of(&early["data"]);
    let client = app.create("/clientes", json!({"nombre": "Carlos"})).await;
    app.create(
        "/reservas",
        json!({
            "cliente_id": id_of(&client),
            "tipo_producto": "evento",
            "producto_id": event_id,
        }),
    )
    .await;

    let refused = app
        .json(
            Method::DELETE,
            &format!("/eventos/eliminar/{}", event_id),
            None,
            StatusCode::CONFLICT,
        )
        .await;
    assert_eq!(
        refused["message"],
        "No se puede eliminar un evento que tiene reservas asociadas."
    );

    app.json(
        Method::GET,
        &format!("/eventos/editar/{}", uuid::Uuid::new_v4()),
        None,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn event_without_name_is_rejected() {
    let app = TestApp::new().await;
    let body = app
        .json(
            Method::POST,
            "/eventos",
            Some(json!({"nombre": "", "fecha": "2025-10-04"})),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    assert_eq!(body["message"], "El nombre del evento es obligatorio.");
}
