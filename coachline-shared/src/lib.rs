pub mod models;
pub mod pii;

pub use models::events::{
    BookingCreatedEvent, BookingEvent, BookingRebookedEvent, BookingResoldEvent,
};
pub use pii::Masked;
