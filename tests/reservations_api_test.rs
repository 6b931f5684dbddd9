mod common;

use axum::http::{Method, StatusCode};
use common::{decimal, id_of, TestApp};
use jocrol_api::{entities::reservation, repositories::CrudRepository};
use rust_decimal_macros::dec;
use sea_orm::Set;
use serde_json::{json, Value};

struct Fixture {
    client: Value,
    release: Value,
}

async fn fixture(app: &TestApp) -> Fixture {
    let client = app
        .create("/clientes", json!({"nombre": "Juan Pérez", "telefono": "666777888"}))
        .await;
    let release = app
        .create(
            "/lanzamientos",
            json!({
                "nombre": "Cajas de sobres",
                "juego": "Magic",
                "coleccion": "Marvel's Spiderman",
                "fecha_salida": "2025-09-26",
                "precio": "195",
                "precio_reserva": "20",
            }),
        )
        .await;
    Fixture { client, release }
}

#[tokio::test]
async fn payment_state_is_derived_from_price_fee_and_quantity() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;

    let created = app
        .json(
            Method::POST,
            "/reservas/nuevo",
            Some(json!({
                "cliente_id": id_of(&f.client),
                "tipo_producto": "lanzamiento",
                "producto_id": id_of(&f.release),
                "cantidad": 1,
                "pagado": "100",
                "fecha_reserva": "2025-09-23",
            })),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(created["message"], "Reserva creada con éxito.");
    assert_eq!(created["data"]["fully_paid"], false);
    assert_eq!(created["data"]["status"], "pending");

    let listing = app.json(Method::GET, "/reservas", None, StatusCode::OK).await;
    let row = &listing["data"]["reservations"][0];
    assert_eq!(decimal(&row["payment"]["total"]), dec!(215));
    assert_eq!(decimal(&row["payment"]["pending"]), dec!(115));
    assert_eq!(row["client"]["name"], "Juan Pérez");
    assert_eq!(row["product"]["name"], "Cajas de sobres");
    assert_eq!(decimal(&listing["data"]["total_pending"]), dec!(115));
}

#[tokio::test]
async fn paying_in_full_settles_the_reservation() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;
    let created = app
        .create(
            "/reservas",
            json!({
                "cliente_id": id_of(&f.client),
                "tipo_producto": "release",
                "producto_id": id_of(&f.release),
                "cantidad": 2,
            }),
        )
        .await;
    assert_eq!(created["quantity"], 2);

    let updated = app
        .json(
            Method::POST,
            &format!("/reservas/editar/{}", id_of(&created)),
            Some(json!({"cliente_id": id_of(&f.client), "pagado": "410", "estado": "confirmada"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["message"], "Reserva actualizada con éxito.");
    assert_eq!(updated["data"]["fully_paid"], true);
    assert_eq!(updated["data"]["status"], "confirmed");
    assert_eq!(updated["data"]["quantity"], 2);

    let paid = app
        .json(Method::GET, "/reservas?payment_status=pagado", None, StatusCode::OK)
        .await;
    assert_eq!(paid["data"]["reservations"].as_array().unwrap().len(), 1);
    assert_eq!(decimal(&paid["data"]["total_pending"]), dec!(0));

    let pending = app
        .json(Method::GET, "/reservas?payment_status=pending", None, StatusCode::OK)
        .await;
    assert!(pending["data"]["reservations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reservation_needs_an_existing_client_and_product() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;

    let no_product = app
        .json(
            Method::POST,
            "/reservas",
            Some(json!({"cliente_id": id_of(&f.client)})),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    assert_eq!(
        no_product["message"],
        "Selecciona un lanzamiento o un evento para la reserva."
    );

    let unknown_client = app
        .json(
            Method::POST,
            "/reservas",
            Some(json!({
                "cliente_id": uuid::Uuid::new_v4(),
                "tipo_producto": "lanzamiento",
                "producto_id": id_of(&f.release),
            })),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    assert_eq!(unknown_client["message"], "El cliente seleccionado no existe.");

    let unknown_product = app
        .json(
            Method::POST,
            "/reservas",
            Some(json!({
                "cliente_id": id_of(&f.client),
                "tipo_producto": "evento",
                "producto_id": id_of(&f.release),
            })),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    assert_eq!(unknown_product["message"], "El producto seleccionado no existe.");
}

#[tokio::test]
async fn form_options_list_everything_reservable() {
    let app = TestApp::new().await;
    fixture(&app).await;
    app.create("/eventos", json!({"nombre": "Comm Party", "fecha": "2025-10-04"}))
        .await;

    let options = app.json(Method::GET, "/reservas/nuevo", None, StatusCode::OK).await;
    assert_eq!(options["data"]["clients"].as_array().unwrap().len(), 1);
    assert_eq!(options["data"]["releases"].as_array().unwrap().len(), 1);
    assert_eq!(options["data"]["events"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn orphaned_reservations_are_listed_as_unresolved() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;

    let repo = jocrol_api::repositories::ReservationRepository::new(app.state.db.clone());
    let now = chrono::Utc::now();
    repo.create(reservation::ActiveModel {
        id: Set(uuid::Uuid::new_v4()),
        client_id: Set(uuid::Uuid::new_v4()),
        release_id: Set(Some(uuid::Uuid::new_v4())),
        event_id: Set(None),
        quantity: Set(1),
        reservation_date: Set(chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()),
        status: Set(reservation::ReservationStatus::Pending),
        amount_paid: Set(dec!(0)),
        payment_type: Set(None),
        notes: Set(None),
        fully_paid: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    })
    .await
    .expect("insert orphan");
    app.create(
        "/reservas",
        json!({
            "cliente_id": id_of(&f.client),
            "tipo_producto": "lanzamiento",
            "producto_id": id_of(&f.release),
        }),
    )
    .await;

    let listing = app
        .json(Method::GET, "/reservas?sort_by=fecha&sort_order=asc", None, StatusCode::OK)
        .await;
    let rows = listing["data"]["reservations"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["unresolved"], json!(["client", "product"]));
    assert!(rows[0]["payment"].is_null());
    assert!(rows[1].get("unresolved").is_none());
    assert_eq!(decimal(&listing["data"]["total_pending"]), dec!(215));
}

#[tokio::test]
async fn deleting_a_reservation() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;
    let created = app
        .create(
            "/reservas",
            json!({
                "cliente_id": id_of(&f.client),
                "tipo_producto": "lanzamiento",
                "producto_id": id_of(&f.release),
            }),
        )
        .await;

    let deleted = app
        .json(
            Method::GET,
            &format!("/reservas/eliminar/{}", id_of(&created)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(deleted["message"], "Reserva eliminada correctamente.");

    app.json(
        Method::GET,
        &format!("/reservas/editar/{}", id_of(&created)),
        None,
        StatusCode::NOT_FOUND,
    )
    .await;
}

struct Shop {
    juan: Value,
    maria: Value,
    cajas: Value,
    party: Value,
}

/// Two clients, a release and an event, and three reservations:
/// Juan owes 115 on the release (09-20), María owes 25 on the event (09-25)
/// and has settled the release (09-30).
async fn shop(app: &TestApp) -> Shop {
    let f = fixture(app).await;
    let maria = app
        .create("/clientes", json!({"nombre": "María García", "telefono": "666111222"}))
        .await;
    let party = app
        .create(
            "/eventos",
            json!({"nombre": "Comm Party", "fecha": "2025-10-04", "precio": "10", "precio_reserva": "5"}),
        )
        .await;

    for (client, kind, product, quantity, paid, date) in [
        (&f.client, "lanzamiento", &f.release, 1, "100", "2025-09-20"),
        (&maria, "evento", &party, 2, "0", "2025-09-25"),
        (&maria, "lanzamiento", &f.release, 1, "215", "2025-09-30"),
    ] {
        app.create(
            "/reservas",
            json!({
                "cliente_id": id_of(client),
                "tipo_producto": kind,
                "producto_id": id_of(product),
                "cantidad": quantity,
                "pagado": paid,
                "fecha_reserva": date,
            }),
        )
        .await;
    }

    Shop {
        juan: f.client,
        maria,
        cajas: f.release,
        party,
    }
}

async fn listed(app: &TestApp, query: &str) -> (Vec<String>, rust_decimal::Decimal) {
    let listing = app
        .json(
            Method::GET,
            &format!("/reservas?sort_by=fecha&sort_order=asc&{query}"),
            None,
            StatusCode::OK,
        )
        .await;
    let dates = listing["data"]["reservations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["reservation_date"].as_str().unwrap().to_string())
        .collect();
    (dates, decimal(&listing["data"]["total_pending"]))
}

#[tokio::test]
async fn total_pending_follows_the_active_filters() {
    let app = TestApp::new().await;
    let shop = shop(&app).await;
    assert_eq!(shop.juan["name"], "Juan Pérez");
    assert_eq!(shop.maria["name"], "María García");

    let (dates, total) = listed(&app, "").await;
    assert_eq!(dates, ["2025-09-20", "2025-09-25", "2025-09-30"]);
    assert_eq!(total, dec!(140));

    let (dates, total) = listed(&app, "q=garc").await;
    assert_eq!(dates, ["2025-09-25", "2025-09-30"]);
    assert_eq!(total, dec!(25));

    let (dates, total) = listed(&app, "q=CAJAS").await;
    assert_eq!(dates, ["2025-09-20", "2025-09-30"]);
    assert_eq!(total, dec!(115));

    let (dates, total) = listed(&app, "q=comm").await;
    assert_eq!(dates, ["2025-09-25"]);
    assert_eq!(total, dec!(25));

    let (dates, total) = listed(&app, "start_date=2025-09-25&end_date=2025-09-30").await;
    assert_eq!(dates, ["2025-09-25", "2025-09-30"]);
    assert_eq!(total, dec!(25));

    let (dates, total) = listed(&app, "start_date=2025-09-30&end_date=2025-09-30").await;
    assert_eq!(dates, ["2025-09-30"]);
    assert_eq!(total, dec!(0));

    let (dates, total) = listed(&app, "start_date=2025-09-20&end_date=2025-09-30&payment_status=pendiente").await;
    assert_eq!(dates, ["2025-09-20", "2025-09-25"]);
    assert_eq!(total, dec!(140));

    let (dates, total) = listed(&app, "start_date=2025-09-21&end_date=2025-09-30&payment_status=pendiente").await;
    assert_eq!(dates, ["2025-09-25"]);
    assert_eq!(total, dec!(25));

    let (dates, total) = listed(&app, "start_date=2025-09-21&payment_status=pagado").await;
    assert_eq!(dates, ["2025-09-30"]);
    assert_eq!(total, dec!(0));
}

#[tokio::test]
async fn changing_the_product_needs_both_kind_and_id() {
    let app = TestApp::new().await;
    let shop = shop(&app).await;
    let listing = app.json(Method::GET, "/reservas?q=juan", None, StatusCode::OK).await;
    let reservation = listing["data"]["reservations"][0].clone();

    for partial in [
        json!({"cliente_id": id_of(&shop.juan), "tipo_producto": "evento"}),
        json!({"cliente_id": id_of(&shop.juan), "producto_id": id_of(&shop.party)}),
    ] {
        let body = app
            .json(
                Method::POST,
                &format!("/reservas/editar/{}", id_of(&reservation)),
                Some(partial),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        assert_eq!(
            body["message"],
            "Selecciona un lanzamiento o un evento para la reserva."
        );
    }

    let unchanged = app
        .json(
            Method::GET,
            &format!("/reservas/editar/{}", id_of(&reservation)),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(unchanged["data"]["release_id"], id_of(&shop.cajas));
    assert!(unchanged["data"]["event_id"].is_null());
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;

    let body = app
        .json(
            Method::POST,
            "/lanzamientos",
            Some(json!({
                "nombre": "Caja coleccionista",
                "fecha_salida": "2025-12-01",
                "precio": "40000000000000000000000000000",
                "precio_reserva": "40000000000000000000000000000",
            })),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    assert_eq!(body["message"], "Los precios no pueden superar 9999999.99.");

    app.json(
        Method::PUT,
        &format!("/lanzamientos/editar/{}", id_of(&f.release)),
        Some(json!({"nombre": "Cajas de sobres", "fecha_salida": "2025-09-26", "precio": "10000000"})),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;

    let body = app
        .json(
            Method::POST,
            "/reservas",
            Some(json!({
                "cliente_id": id_of(&f.client),
                "tipo_producto": "lanzamiento",
                "producto_id": id_of(&f.release),
                "cantidad": 2_000_000_000,
            })),
            StatusCode::UNPROCESSABLE_ENTITY,
        )
        .await;
    assert_eq!(body["message"], "La cantidad no puede superar 10000.");

    app.json(
        Method::POST,
        "/reservas",
        Some(json!({
            "cliente_id": id_of(&f.client),
            "tipo_producto": "lanzamiento",
            "producto_id": id_of(&f.release),
            "pagado": "99999999999",
        })),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
}

#[tokio::test]
async fn stored_rows_beyond_the_ceiling_still_list() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;
    app.create(
        "/reservas",
        json!({
            "cliente_id": id_of(&f.client),
            "tipo_producto": "lanzamiento",
            "producto_id": id_of(&f.release),
        }),
    )
    .await;

    let releases = jocrol_api::repositories::ReleaseRepository::new(app.state.db.clone());
    let stored = releases
        .get(f.release["id"].as_str().unwrap().parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    let mut active: jocrol_api::entities::release::ActiveModel = stored.into();
    active.price = Set(dec!(40000000000000000000000000000));
    active.reservation_fee = Set(dec!(40000000000000000000000000000));
    releases.update(active).await.expect("bypass form validation");

    let listing = app.json(Method::GET, "/reservas", None, StatusCode::OK).await;
    assert_eq!(listing["data"]["reservations"].as_array().unwrap().len(), 1);
    assert_eq!(decimal(&listing["data"]["total_pending"]), rust_decimal::Decimal::MAX);
}

#[tokio::test]
async fn cents_survive_storage_exactly() {
    let app = TestApp::new().await;
    let client = app
        .create("/clientes", json!({"nombre": "Ana Ruiz", "telefono": "600123123"}))
        .await;
    let release = app
        .create(
            "/lanzamientos",
            json!({
                "nombre": "Sobres sueltos",
                "fecha_salida": "2025-10-10",
                "precio": "19.99",
                "precio_reserva": "0.10",
            }),
        )
        .await;
    app.create(
        "/reservas",
        json!({
            "cliente_id": id_of(&client),
            "tipo_producto": "lanzamiento",
            "producto_id": id_of(&release),
            "cantidad": 3,
            "pagado": "30.07",
        }),
    )
    .await;

    let listing = app.json(Method::GET, "/reservas", None, StatusCode::OK).await;
    let row = &listing["data"]["reservations"][0];
    assert_eq!(decimal(&row["product"]["price"]), dec!(19.99));
    assert_eq!(decimal(&row["amount_paid"]), dec!(30.07));
    assert_eq!(decimal(&row["payment"]["total"]), dec!(60.07));
    assert_eq!(decimal(&row["payment"]["pending"]), dec!(30.00));
}
