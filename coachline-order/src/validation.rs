use crate::models::{NewBooking, Passenger};
use coachline_catalog::{FareCalculator, SeatLayout, SeatSelection};
use coachline_core::{EngineError, EngineResult};
use std::collections::HashSet;
use std::ops::RangeInclusive;

pub const PASSENGER_AGE: RangeInclusive<u32> = 1..=119;

pub fn validate_passenger(passenger: &Passenger) -> EngineResult<()> {
    let seat = passenger.seat_number.to_string();

    if passenger.name.expose().trim().is_empty() {
        return Err(EngineError::validation(
            "passenger.name",
            Some(&seat),
            format!("passenger on seat {seat} has no name"),
        ));
    }

    if !PASSENGER_AGE.contains(&passenger.age) {
        return Err(EngineError::validation(
            "passenger.age",
            Some(&seat),
            format!(
                "passenger on seat {seat} has age {}, expected {}..={}",
                passenger.age,
                PASSENGER_AGE.start(),
                PASSENGER_AGE.end()
            ),
        ));
    }

    Ok(())
}

/// Passengers must map one-to-one onto the selected seats.
pub fn validate_passengers(
    selection: &SeatSelection,
    passengers: &[Passenger],
) -> EngineResult<()> {
    if selection.is_empty() {
        return Err(EngineError::selection(None, "booking requires at least one seat"));
    }

    let mut seated = HashSet::with_capacity(passengers.len());
    for passenger in passengers {
        validate_passenger(passenger)?;

        let seat = passenger.seat_number;
        let raw = seat.to_string();
        if !selection.contains(&seat) {
            return Err(EngineError::validation(
                "passenger.seat_number",
                Some(&raw),
                format!("seat {raw} is not part of the selection"),
            ));
        }
        if !seated.insert(seat) {
            return Err(EngineError::validation(
                "passenger.seat_number",
                Some(&raw),
                format!("seat {raw} has more than one passenger"),
            ));
        }
    }

    if let Some(empty) = selection.iter().find(|seat| !seated.contains(*seat)) {
        let raw = empty.to_string();
        return Err(EngineError::validation(
            "passengers",
            Some(&raw),
            format!("seat {raw} has no passenger"),
        ));
    }

    Ok(())
}

/// Full pre-commit check of a booking draft. Touches no state.
///
/// The fare is recomputed from the draft's seat price under the engine's own
/// policy; a breakdown that differs in any field is rejected.
pub fn validate_draft(
    draft: &NewBooking,
    layout: &SeatLayout,
    calculator: &FareCalculator,
) -> EngineResult<()> {
    if draft.user_id.trim().is_empty() {
        return Err(EngineError::validation("user_id", None, "booking has no owner"));
    }

    draft.selection.validate(layout)?;
    validate_passengers(&draft.selection, &draft.passengers)?;

    let expected =
        calculator.breakdown_at(draft.price_per_seat, &draft.selection, draft.fare.flexi_selected)?;
    if draft.fare != expected {
        return Err(EngineError::fare(format!(
            "breakdown {}+{}={} does not match policy {}+{}={}",
            draft.fare.base_fare,
            draft.fare.flexi_fee,
            draft.fare.total,
            expected.base_fare,
            expected.flexi_fee,
            expected.total
        )));
    }

    Ok(())
}
