pub mod models;
pub mod validation;
pub mod changes;
pub mod finance;
pub mod manager;

pub use models::{Booking, BookingStatus, Gender, NewBooking, Passenger, RebookIntent};
pub use manager::BookingManager;
pub use changes::ChangeHandler;
pub use finance::ResellQuote;
