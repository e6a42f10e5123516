pub mod error;
pub mod ids;
pub mod policy;

pub use error::{EngineError, EngineResult};
pub use ids::BookingId;
pub use policy::{FarePolicy, LayoutPolicy, PolicyError, RefundPolicy};

/// Whole currency units. Signed so that a fare difference can be represented
/// before the no-refund clamp is applied.
pub type Amount = i64;
