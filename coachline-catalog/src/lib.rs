pub mod inventory;
pub mod layout;
pub mod pricing;

pub use inventory::{search, BusRun, BusTypeFilter, Deck, SearchQuery, SeatId};
pub use layout::{Seat, SeatLayout, SeatRow, SeatSelection, SeatStatus, ToggleOutcome};
pub use pricing::{FareBreakdown, FareCalculator, RebookQuote, ResaleOutcome};
