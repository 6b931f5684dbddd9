use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a reservation. Spanish labels are accepted when parsing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ReservationStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    #[serde(alias = "pendiente")]
    #[strum(to_string = "pending", serialize = "pendiente")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    #[serde(alias = "confirmada")]
    #[strum(to_string = "confirmed", serialize = "confirmada")]
    Confirmed,
    #[sea_orm(string_value = "cancelled")]
    #[serde(alias = "cancelada")]
    #[strum(to_string = "cancelled", serialize = "cancelada")]
    Cancelled,
}

/// A client's pre-order of one release or one event.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub release_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub quantity: i32,
    pub reservation_date: NaiveDate,
    pub status: ReservationStatus,
    pub amount_paid: Decimal,
    pub payment_type: Option<String>,
    pub notes: Option<String>,
    /// Snapshot of the payment state at the last write
    pub fully_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.updated_at = Set(Utc::now());
        }
        Ok(self)
    }
}
