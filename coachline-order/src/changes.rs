use crate::models::{Booking, BookingStatus};
use chrono::Utc;
use coachline_core::{EngineError, EngineResult};

/// Guards and applies post-purchase status changes on a single booking.
pub struct ChangeHandler;

impl ChangeHandler {
    /// Resell and rebook share the same gate: Flexi purchased, still Active.
    pub fn ensure_flexi_eligible(booking: &Booking) -> EngineResult<()> {
        if !booking.flexi_purchased {
            return Err(EngineError::NotEligible {
                booking_id: booking.id,
                reason: "resell and rebook require the Flexi add-on".to_string(),
            });
        }
        Self::ensure_active(booking)
    }

    pub fn ensure_active(booking: &Booking) -> EngineResult<()> {
        if booking.status != BookingStatus::Active {
            return Err(EngineError::AlreadyResolved {
                booking_id: booking.id,
                status: booking.status.to_string(),
            });
        }
        Ok(())
    }

    /// Active → Reselled
    pub fn mark_reselled(booking: &mut Booking) -> EngineResult<()> {
        Self::transition(booking, BookingStatus::Reselled)
    }

    /// Active → ReBooked. Only called once the replacement booking exists.
    pub fn mark_rebooked(booking: &mut Booking) -> EngineResult<()> {
        Self::transition(booking, BookingStatus::ReBooked)
    }

    fn transition(booking: &mut Booking, to: BookingStatus) -> EngineResult<()> {
        Self::ensure_flexi_eligible(booking)?;

        tracing::info!(
            booking_id = %booking.id,
            from = %booking.status,
            to = %to,
            "booking status transition"
        );
        booking.status = to;
        booking.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use coachline_catalog::SeatId;
    use coachline_core::BookingId;

    fn booking(flexi: bool) -> Booking {
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
            seats: vec![SeatId::parse("L7").unwrap()],
            passengers: vec![],
            fare: 899,
            flexi_purchased: flexi,
            flexi_fee: if flexi { 50 } else { 0 },
            status: BookingStatus::Active,
            created_at: now,
            updated_at: now,
            original_booking_id: None,
        }
    }

    #[test]
    fn test_mark_reselled() {
        let mut b = booking(true);
        ChangeHandler::mark_reselled(&mut b).unwrap();
        assert_eq!(b.status, BookingStatus::Reselled);
        assert!(!b.can_use_flexi());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut b = booking(true);
        ChangeHandler::mark_rebooked(&mut b).unwrap();

        let err = ChangeHandler::mark_reselled(&mut b).unwrap_err();
        assert!(matches!(err, EngineError::AlreadyResolved { .. }));
        assert_eq!(b.status, BookingStatus::ReBooked);
    }

    #[test]
    fn test_without_flexi() {
        let mut b = booking(false);
        let err = ChangeHandler::mark_reselled(&mut b).unwrap_err();
        assert!(matches!(err, EngineError::NotEligible { .. }));
        assert_eq!(b.status, BookingStatus::Active);
    }
}
