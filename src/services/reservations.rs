use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::{client, event, release, reservation, ReservationStatus};
use crate::errors::ServiceError;
use crate::repositories::{
    ClientRepository, CrudRepository, EventRepository, PaletteRepository, ReleaseRepository,
    ReservationRepository,
};
use crate::services::colors::Palette;
use crate::services::listing::{apply_criteria, DateRange, ListCriteria, Listable, SortKey, SortOrder};
use crate::services::pricing::{
    amount_in_range, outstanding_balance, summarize, PaymentSummary, MAX_AMOUNT, MAX_QUANTITY,
};
use crate::services::{blank_as_none, lenient, non_blank, today};

/// Which catalogue a reservation points into
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ProductKind {
    #[serde(alias = "lanzamiento")]
    #[strum(to_string = "release", serialize = "lanzamiento")]
    Release,
    #[serde(alias = "evento")]
    #[strum(to_string = "event", serialize = "evento")]
    Event,
}

impl ProductKind {
    /// Label used in the calendar and the workbook
    pub fn label(self) -> &'static str {
        match self {
            ProductKind::Release => "Lanzamiento",
            ProductKind::Event => "Evento",
        }
    }
}

/// The release or event a reservation is for
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Product {
    Release(release::Model),
    Event(event::Model),
}

impl Product {
    pub fn kind(&self) -> ProductKind {
        match self {
            Product::Release(_) => ProductKind::Release,
            Product::Event(_) => ProductKind::Event,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Product::Release(r) => r.id,
            Product::Event(e) => e.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Product::Release(r) => &r.name,
            Product::Event(e) => &e.name,
        }
    }

    pub fn game(&self) -> Option<&str> {
        match self {
            Product::Release(r) => r.game.as_deref(),
            Product::Event(e) => e.game.as_deref(),
        }
    }

    pub fn collection(&self) -> Option<&str> {
        match self {
            Product::Release(r) => r.collection.as_deref(),
            Product::Event(e) => e.collection.as_deref(),
        }
    }

    pub fn price(&self) -> Decimal {
        match self {
            Product::Release(r) => r.price,
            Product::Event(e) => e.price,
        }
    }

    pub fn reservation_fee(&self) -> Decimal {
        match self {
            Product::Release(r) => r.reservation_fee,
            Product::Event(e) => e.reservation_fee,
        }
    }

    pub fn summarize(&self, quantity: i32, paid: Decimal) -> PaymentSummary {
        summarize(self.price(), self.reservation_fee(), quantity, paid)
    }
}

/// A reference a reservation holds that no longer resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unresolved {
    Client,
    Product,
}

/// A reservation joined with its client, product and payment state
#[derive(Debug, Clone, Serialize)]
pub struct ReservationRow {
    #[serde(flatten)]
    pub reservation: reservation::Model,
    pub client: Option<client::Model>,
    pub product: Option<Product>,
    /// Absent when the product is unknown
    pub payment: Option<PaymentSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<Unresolved>,
}

impl ReservationRow {
    /// Live payment state, or the stored flag when the product is gone
    pub fn is_fully_paid(&self) -> bool {
        self.payment
            .map(|p| p.fully_paid)
            .unwrap_or(self.reservation.fully_paid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ReservationSortField {
    #[strum(serialize = "reservation_date", serialize = "fecha_reserva", serialize = "fecha")]
    ReservationDate,
    #[strum(serialize = "client", serialize = "cliente")]
    Client,
    #[strum(serialize = "product", serialize = "producto")]
    Product,
}

impl Listable for ReservationRow {
    type SortField = ReservationSortField;

    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.client.as_ref().map(|c| c.name.as_str()),
            self.product.as_ref().map(Product::name),
        ]
    }

    fn listing_date(&self) -> Option<NaiveDate> {
        Some(self.reservation.reservation_date)
    }

    fn sort_key(&self, field: ReservationSortField) -> Option<SortKey> {
        match field {
            ReservationSortField::ReservationDate => {
                Some(SortKey::Date(self.reservation.reservation_date))
            }
            ReservationSortField::Client => self.client.as_ref().map(|c| SortKey::text(&c.name)),
            ReservationSortField::Product => self.product.as_ref().map(|p| SortKey::text(p.name())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum PaymentStatusFilter {
    #[strum(serialize = "paid", serialize = "pagado")]
    Paid,
    #[strum(serialize = "pending", serialize = "pendiente")]
    Pending,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationFilters {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing)]
    pub payment_status: Option<PaymentStatusFilter>,
    #[serde(default, deserialize_with = "lenient", skip_serializing)]
    pub sort_by: Option<ReservationSortField>,
    #[serde(default, deserialize_with = "lenient")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationListing {
    pub reservations: Vec<ReservationRow>,
    /// What is still owed over the listed, unsettled reservations
    pub total_pending: Decimal,
}

/// Data needed to fill in the reservation form
#[derive(Debug, Clone, Serialize)]
pub struct ReservationFormOptions {
    pub clients: Vec<client::Model>,
    pub releases: Vec<release::Model>,
    pub events: Vec<event::Model>,
    pub games: Vec<String>,
    pub palette: Palette,
}

/// Submitted reservation form. On update, absent amounts, dates and status
/// keep their stored values, and the product is kept only when both its
/// kind and id are absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationInput {
    #[serde(alias = "cliente_id")]
    pub client_id: Uuid,
    #[serde(
        default,
        alias = "tipo_producto",
        deserialize_with = "blank_as_none"
    )]
    pub product_type: Option<ProductKind>,
    #[serde(default, alias = "producto_id")]
    pub product_id: Option<Uuid>,
    #[serde(default, alias = "cantidad")]
    pub quantity: Option<i32>,
    #[serde(default, alias = "fecha_reserva", deserialize_with = "blank_as_none")]
    pub reservation_date: Option<NaiveDate>,
    #[serde(default, alias = "estado", deserialize_with = "blank_as_none")]
    pub status: Option<ReservationStatus>,
    #[serde(default, alias = "pagado")]
    pub amount_paid: Option<Decimal>,
    #[serde(default, alias = "tipo_pago")]
    pub payment_type: Option<String>,
    #[serde(default, alias = "notas")]
    pub notes: Option<String>,
}

/// Every client, release and event keyed by id, for in-memory joins
pub(crate) struct Catalog {
    pub clients: HashMap<Uuid, client::Model>,
    pub releases: HashMap<Uuid, release::Model>,
    pub events: HashMap<Uuid, event::Model>,
}

impl Catalog {
    pub(crate) async fn load(
        clients: &ClientRepository,
        releases: &ReleaseRepository,
        events: &EventRepository,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            clients: clients.list().await?.into_iter().map(|c| (c.id, c)).collect(),
            releases: releases.list().await?.into_iter().map(|r| (r.id, r)).collect(),
            events: events.list().await?.into_iter().map(|e| (e.id, e)).collect(),
        })
    }

    pub(crate) fn product_of(&self, reservation: &reservation::Model) -> Option<Product> {
        if let Some(id) = reservation.release_id {
            return self.releases.get(&id).cloned().map(Product::Release);
        }
        reservation
            .event_id
            .and_then(|id| self.events.get(&id).cloned())
            .map(Product::Event)
    }

    pub(crate) fn resolve(&self, reservation: reservation::Model) -> ReservationRow {
        let client = self.clients.get(&reservation.client_id).cloned();
        let product = self.product_of(&reservation);
        let payment = product
            .as_ref()
            .map(|p| p.summarize(reservation.quantity, reservation.amount_paid));

        let mut unresolved = Vec::new();
        if client.is_none() {
            unresolved.push(Unresolved::Client);
        }
        if product.is_none() {
            unresolved.push(Unresolved::Product);
        }

        ReservationRow {
            reservation,
            client,
            product,
            payment,
            unresolved,
        }
    }
}

#[derive(Clone)]
pub struct ReservationService {
    reservations: ReservationRepository,
    clients: ClientRepository,
    releases: ReleaseRepository,
    events: EventRepository,
    palette: PaletteRepository,
}

impl ReservationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            reservations: ReservationRepository::new(db.clone()),
            clients: ClientRepository::new(db.clone()),
            releases: ReleaseRepository::new(db.clone()),
            events: EventRepository::new(db.clone()),
            palette: PaletteRepository::new(db),
        }
    }

    async fn catalog(&self) -> Result<Catalog, ServiceError> {
        Catalog::load(&self.clients, &self.releases, &self.events).await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filters: &ReservationFilters) -> Result<ReservationListing, ServiceError> {
        let catalog = self.catalog().await?;
        let rows: Vec<ReservationRow> = self
            .reservations
            .list()
            .await?
            .into_iter()
            .map(|r| catalog.resolve(r))
            .collect();

        let orphans = rows.iter().filter(|r| !r.unresolved.is_empty()).count();
        if orphans > 0 {
            warn!(orphans, "reservations with dangling references");
        }

        let criteria = ListCriteria {
            query: filters.q.clone(),
            range: DateRange::new(filters.start_date, filters.end_date),
            hide_before: None,
            sort: filters
                .sort_by
                .map(|field| (field, filters.sort_order.unwrap_or_default())),
        };
        let mut rows = apply_criteria(rows, &criteria);

        if let Some(status) = filters.payment_status {
            let want_paid = status == PaymentStatusFilter::Paid;
            rows.retain(|row| row.is_fully_paid() == want_paid);
        }

        let total_pending = outstanding_balance(rows.iter().filter_map(|r| r.payment.as_ref()));

        Ok(ReservationListing {
            reservations: rows,
            total_pending,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ReservationRow, ServiceError> {
        let reservation = self
            .reservations
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("la reserva", id))?;
        Ok(self.catalog().await?.resolve(reservation))
    }

    #[instrument(skip(self))]
    pub async fn form_options(&self) -> Result<ReservationFormOptions, ServiceError> {
        let palette = self.palette.load().await?;
        Ok(ReservationFormOptions {
            clients: self.clients.list().await?,
            releases: self.releases.list().await?,
            events: self.events.list().await?,
            games: palette.game_names().map(str::to_string).collect(),
            palette,
        })
    }

    async fn find_product(&self, kind: ProductKind, id: Uuid) -> Result<Product, ServiceError> {
        let product = match kind {
            ProductKind::Release => self.releases.get(id).await?.map(Product::Release),
            ProductKind::Event => self.events.get(id).await?.map(Product::Event),
        };
        product.ok_or_else(|| {
            ServiceError::ValidationError("El producto seleccionado no existe.".to_string())
        })
    }

    async fn ensure_client(&self, id: Uuid) -> Result<(), ServiceError> {
        match self.clients.get(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::ValidationError(
                "El cliente seleccionado no existe.".to_string(),
            )),
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: ReservationInput) -> Result<reservation::Model, ServiceError> {
        self.ensure_client(input.client_id).await?;

        let (kind, product_id) = match (input.product_type, input.product_id) {
            (Some(kind), Some(id)) => (kind, id),
            _ => return Err(product_required()),
        };
        let product = self.find_product(kind, product_id).await?;

        let model = build_reservation(input.client_id, &product, input)?;
        let created = self.reservations.create(model).await?;
        info!(reservation_id = %created.id, client_id = %created.client_id, "reservation created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: ReservationInput,
    ) -> Result<reservation::Model, ServiceError> {
        let existing = self
            .reservations
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("la reserva", id))?;

        self.ensure_client(input.client_id).await?;

        let (release_id, event_id, product) = match (input.product_type, input.product_id) {
            (Some(kind), Some(product_id)) => {
                let product = self.find_product(kind, product_id).await?;
                match kind {
                    ProductKind::Release => (Some(product_id), None, Some(product)),
                    ProductKind::Event => (None, Some(product_id), Some(product)),
                }
            }
            (None, None) => {
                let catalog = self.catalog().await?;
                let product = catalog.product_of(&existing);
                (existing.release_id, existing.event_id, product)
            }
            _ => return Err(product_required()),
        };

        let quantity = validate_quantity(input.quantity.unwrap_or(existing.quantity))?;
        let paid = validate_paid(input.amount_paid.unwrap_or(existing.amount_paid))?;
        let fully_paid = product
            .map(|p| p.summarize(quantity, paid).fully_paid)
            .unwrap_or(existing.fully_paid);

        let mut active: reservation::ActiveModel = existing.clone().into();
        active.client_id = Set(input.client_id);
        active.release_id = Set(release_id);
        active.event_id = Set(event_id);
        active.quantity = Set(quantity);
        active.reservation_date = Set(input.reservation_date.unwrap_or(existing.reservation_date));
        active.status = Set(input.status.unwrap_or(existing.status));
        active.amount_paid = Set(paid);
        active.payment_type = Set(non_blank(input.payment_type));
        active.notes = Set(non_blank(input.notes));
        active.fully_paid = Set(fully_paid);

        let updated = self.reservations.update(active).await?;
        info!(reservation_id = %id, fully_paid, "reservation updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.reservations.delete(id).await? {
            return Err(ServiceError::not_found("la reserva", id));
        }
        info!(reservation_id = %id, "reservation deleted");
        Ok(())
    }
}

/// A new reservation of `product` for an existing client, with the form
/// defaults applied: one unit, nothing paid, dated today, pending.
pub(crate) fn build_reservation(
    client_id: Uuid,
    product: &Product,
    input: ReservationInput,
) -> Result<reservation::ActiveModel, ServiceError> {
    let quantity = validate_quantity(input.quantity.unwrap_or(1))?;
    let paid = validate_paid(input.amount_paid.unwrap_or(Decimal::ZERO))?;
    let summary = product.summarize(quantity, paid);
    let now = Utc::now();
    let kind = product.kind();

    Ok(reservation::ActiveModel {
        id: Set(Uuid::new_v4()),
        client_id: Set(client_id),
        release_id: Set((kind == ProductKind::Release).then_some(product.id())),
        event_id: Set((kind == ProductKind::Event).then_some(product.id())),
        quantity: Set(quantity),
        reservation_date: Set(input.reservation_date.unwrap_or_else(today)),
        status: Set(input.status.unwrap_or_default()),
        amount_paid: Set(paid),
        payment_type: Set(non_blank(input.payment_type)),
        notes: Set(non_blank(input.notes)),
        fully_paid: Set(summary.fully_paid),
        created_at: Set(now),
        updated_at: Set(now),
    })
}

fn product_required() -> ServiceError {
    ServiceError::ValidationError(
        "Selecciona un lanzamiento o un evento para la reserva.".to_string(),
    )
}

fn validate_quantity(quantity: i32) -> Result<i32, ServiceError> {
    if quantity < 1 {
        return Err(ServiceError::ValidationError(
            "La cantidad debe ser al menos 1.".to_string(),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(ServiceError::ValidationError(format!(
            "La cantidad no puede superar {}.",
            MAX_QUANTITY
        )));
    }
    Ok(quantity)
}

fn validate_paid(paid: Decimal) -> Result<Decimal, ServiceError> {
    if paid.is_sign_negative() && !paid.is_zero() {
        return Err(ServiceError::ValidationError(
            "El importe pagado no puede ser negativo.".to_string(),
        ));
    }
    if !amount_in_range(paid) {
        return Err(ServiceError::ValidationError(format!(
            "El importe pagado no puede superar {}.",
            MAX_AMOUNT
        )));
    }
    Ok(paid)
}
