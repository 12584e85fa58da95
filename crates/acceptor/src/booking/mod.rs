//! Restful-Booker API: payloads, client and schema validation.

mod client;
mod model;
pub mod schema;

pub use client::{ApiResponse, Auth, BookingClient};
pub use model::{
    normalize_date, Booking, BookingDates, BookingDatesPatch, BookingId, BookingPatch,
    CreatedBooking,
};
pub use schema::SchemaStore;
