//! Fakes for running the suite without a browser or a live booking API.

mod booking_stub;
mod store;

pub use booking_stub::{router as booking_router, BookingStub};
pub use store::{FakeStore, PASSWORD, PRODUCTS};
