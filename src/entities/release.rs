use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled product drop (lanzamiento).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "releases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub game: Option<String>,
    pub collection: Option<String>,
    pub release_date: NaiveDate,
    /// Date the distributor ships the product, when it differs from release
    pub ship_date: Option<NaiveDate>,
    pub price: Decimal,
    /// Flat fee charged once per reservation
    pub reservation_fee: Decimal,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
