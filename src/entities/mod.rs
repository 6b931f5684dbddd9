pub mod client;
pub mod collection;
pub mod event;
pub mod game;
pub mod release;
pub mod reservation;
pub mod staff;

pub use reservation::ReservationStatus;
