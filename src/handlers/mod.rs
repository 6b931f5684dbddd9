pub mod calendar;
pub mod clients;
pub mod common;
pub mod events;
pub mod palette;
pub mod releases;
pub mod reservations;
pub mod staff;
pub mod transfer;

use crate::db::DbPool;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub clients: Arc<crate::services::clients::ClientService>,
    pub releases: Arc<crate::services::releases::ReleaseService>,
    pub events: Arc<crate::services::events::EventService>,
    pub reservations: Arc<crate::services::reservations::ReservationService>,
    pub staff: Arc<crate::services::staff::StaffService>,
    pub palette: Arc<crate::services::palette::PaletteService>,
    pub calendar: Arc<crate::services::calendar::CalendarService>,
    pub transfer: Arc<crate::services::transfer::TransferService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            clients: Arc::new(crate::services::clients::ClientService::new(db_pool.clone())),
            releases: Arc::new(crate::services::releases::ReleaseService::new(
                db_pool.clone(),
            )),
            events: Arc::new(crate::services::events::EventService::new(db_pool.clone())),
            reservations: Arc::new(crate::services::reservations::ReservationService::new(
                db_pool.clone(),
            )),
            staff: Arc::new(crate::services::staff::StaffService::new(db_pool.clone())),
            palette: Arc::new(crate::services::palette::PaletteService::new(db_pool.clone())),
            calendar: Arc::new(crate::services::calendar::CalendarService::new(
                db_pool.clone(),
            )),
            transfer: Arc::new(crate::services::transfer::TransferService::new(db_pool)),
        }
    }
}
