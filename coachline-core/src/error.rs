use crate::ids::BookingId;

/// Every failure the reservation engine can report.
///
/// All variants are recoverable by the caller: re-select seats, fix passenger
/// details, or pick another action. The engine never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Empty, over-capacity or otherwise unusable seat selection.
    #[error("Invalid seat selection: {reason}")]
    InvalidSelection {
        seat: Option<String>,
        reason: String,
    },

    /// An amount went negative (or overflowed) before any policy clamp.
    #[error("Invalid fare: {reason}")]
    InvalidFare { reason: String },

    #[error("Validation failed for {field}: {reason}")]
    ValidationError {
        field: &'static str,
        seat: Option<String>,
        reason: String,
    },

    /// Flexi-gated action attempted on a booking without Flexi.
    #[error("Booking {booking_id} not eligible: {reason}")]
    NotEligible {
        booking_id: BookingId,
        reason: String,
    },

    #[error("Booking {booking_id} already resolved (status {status})")]
    AlreadyResolved {
        booking_id: BookingId,
        status: String,
    },

    #[error("Booking not found: {booking_id}")]
    NotFound { booking_id: BookingId },

    #[error("Internal engine error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn selection(seat: Option<&str>, reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            seat: seat.map(str::to_string),
            reason: reason.into(),
        }
    }

    pub fn fare(reason: impl Into<String>) -> Self {
        Self::InvalidFare {
            reason: reason.into(),
        }
    }

    pub fn validation(field: &'static str, seat: Option<&str>, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            field,
            seat: seat.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// The seat the failure refers to, if any.
    pub fn seat(&self) -> Option<&str> {
        match self {
            Self::InvalidSelection { seat, .. } | Self::ValidationError { seat, .. } => {
                seat.as_deref()
            }
            _ => None,
        }
    }

    /// The booking the failure refers to, if any.
    pub fn booking_id(&self) -> Option<BookingId> {
        match self {
            Self::NotEligible { booking_id, .. }
            | Self::AlreadyResolved { booking_id, .. }
            | Self::NotFound { booking_id } => Some(*booking_id),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let err = EngineError::validation("passenger.age", Some("L7"), "age 0 is outside 1..=119");
        assert_eq!(err.seat(), Some("L7"));
        assert_eq!(
            err.to_string(),
            "Validation failed for passenger.age: age 0 is outside 1..=119"
        );

        let id = BookingId::new();
        let err = EngineError::AlreadyResolved {
            booking_id: id,
            status: "Reselled".to_string(),
        };
        assert_eq!(err.booking_id(), Some(id));
        assert!(err.to_string().contains("Reselled"));
    }
}
