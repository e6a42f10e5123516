use crate::models::{Booking, BookingStatus};
use coachline_catalog::{FareCalculator, ResaleOutcome};
use coachline_core::{Amount, BookingId, EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// What the seller pays now and may get back later for a resale listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResellQuote {
    pub booking_id: BookingId,
    /// Charged when the listing is created, whatever the outcome
    pub processing_fee: Amount,
    pub refund_if_resold: Amount,
    pub refund_if_unsold: Amount,
    /// Never refunded
    pub flexi_fee_forfeited: Amount,
}

impl ResellQuote {
    pub fn for_booking(booking: &Booking, calculator: &FareCalculator) -> EngineResult<Self> {
        Ok(Self {
            booking_id: booking.id,
            processing_fee: calculator.resell_processing_fee(),
            refund_if_resold: calculator.resell_refund(booking.fare, ResaleOutcome::Resold)?,
            refund_if_unsold: calculator.resell_refund(booking.fare, ResaleOutcome::Unsold)?,
            flexi_fee_forfeited: booking.flexi_fee,
        })
    }

    pub fn refund_for(&self, outcome: ResaleOutcome) -> Amount {
        match outcome {
            ResaleOutcome::Resold => self.refund_if_resold,
            ResaleOutcome::Unsold => self.refund_if_unsold,
        }
    }
}

/// Refund owed on a listed booking once its resale outcome is known.
///
/// Nothing in the engine decides the outcome; a departure-time sweep or an
/// operator supplies it.
pub fn resale_refund(
    booking: &Booking,
    outcome: ResaleOutcome,
    calculator: &FareCalculator,
) -> EngineResult<Amount> {
    if booking.status != BookingStatus::Reselled {
        return Err(EngineError::NotEligible {
            booking_id: booking.id,
            reason: format!("booking is {}, not listed for resale", booking.status),
        });
    }
    calculator.resell_refund(booking.fare, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn booking(status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId::new(),
            user_id: "user-1".to_string(),
            bus_run_id: "bus-1".to_string(),
            from: "Hyderabad".to_string(),
            to: "Bangalore".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 18).unwrap(),
            departure_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            bus_name: "Orange Travels".to_string(),
            bus_type: "AC Sleeper (2+1)".to_string(),
            seats: vec![],
            passengers: vec![],
            fare: 1798,
            flexi_purchased: true,
            flexi_fee: 50,
            status,
            created_at: now,
            updated_at: now,
            original_booking_id: None,
        }
    }

    #[test]
    fn test_quote() {
        let calc = FareCalculator::default();
        let quote = ResellQuote::for_booking(&booking(BookingStatus::Active), &calc).unwrap();
        assert_eq!(quote.processing_fee, 75);
        assert_eq!(quote.refund_if_resold, 1798);
        assert_eq!(quote.refund_if_unsold, 899);
        assert_eq!(quote.flexi_fee_forfeited, 50);
        assert_eq!(quote.refund_for(ResaleOutcome::Unsold), 899);
    }

    #[test]
    fn test_resale_refund_requires_listing() {
        let calc = FareCalculator::default();
        let listed = booking(BookingStatus::Reselled);
        assert_eq!(resale_refund(&listed, ResaleOutcome::Resold, &calc).unwrap(), 1798);

        let active = booking(BookingStatus::Active);
        let err = resale_refund(&active, ResaleOutcome::Resold, &calc).unwrap_err();
        assert!(matches!(err, EngineError::NotEligible { .. }));
    }
}
