use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use coachline_catalog::{BusRun, FareBreakdown, SeatId, SeatSelection};
use coachline_core::{Amount, BookingId};
use coachline_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// One traveller, bound to exactly one selected seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub name: Masked<String>,
    pub age: u32,
    pub gender: Gender,
    pub seat_number: SeatId,
}

impl Passenger {
    pub fn new(name: impl Into<String>, age: u32, gender: Gender, seat_number: SeatId) -> Self {
        Self {
            name: Masked::new(name.into()),
            age,
            gender,
            seat_number,
        }
    }
}

/// Booking status in the lifecycle. `Reselled` and `ReBooked` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Active,
    Reselled,
    ReBooked,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, BookingStatus::Active)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingStatus::Active => "Active",
            BookingStatus::Reselled => "Reselled",
            BookingStatus::ReBooked => "ReBooked",
        };
        f.write_str(label)
    }
}

/// A purchased ticket. Seats and passengers are snapshots taken at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: String,
    pub bus_run_id: String,
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
    pub departure_time: NaiveTime,
    pub bus_name: String,
    pub bus_type: String,
    pub seats: Vec<SeatId>,
    pub passengers: Vec<Passenger>,
    /// Base fare only; the Flexi fee is tracked separately
    pub fare: Amount,
    pub flexi_purchased: bool,
    pub flexi_fee: Amount,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set only on a replacement booking produced by a rebook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_booking_id: Option<BookingId>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }

    /// Whether resell or rebook may be offered
    pub fn can_use_flexi(&self) -> bool {
        self.flexi_purchased && self.is_active()
    }

    pub fn total_paid(&self) -> Amount {
        self.fare.saturating_add(self.flexi_fee)
    }
}

/// Everything needed to record a purchase. Status is not part of the draft:
/// every booking starts `Active`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub bus_run_id: String,
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
    pub departure_time: NaiveTime,
    pub bus_name: String,
    pub bus_type: String,
    /// Seat price of the run at purchase time; the fare is re-derived from it on commit
    pub price_per_seat: Amount,
    pub selection: SeatSelection,
    pub passengers: Vec<Passenger>,
    pub fare: FareBreakdown,
    pub original_booking_id: Option<BookingId>,
}

impl NewBooking {
    pub fn for_run(
        user_id: impl Into<String>,
        run: &BusRun,
        selection: SeatSelection,
        passengers: Vec<Passenger>,
        fare: FareBreakdown,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            bus_run_id: run.id.clone(),
            from: run.from.clone(),
            to: run.to.clone(),
            date: run.date,
            departure_time: run.departure_time,
            bus_name: run.operator.clone(),
            bus_type: run.bus_type.clone(),
            price_per_seat: run.price_per_seat,
            selection,
            passengers,
            fare,
            original_booking_id: None,
        }
    }

    pub(crate) fn into_booking(self, id: BookingId, now: DateTime<Utc>) -> Booking {
        Booking {
            id,
            user_id: self.user_id,
            bus_run_id: self.bus_run_id,
            from: self.from,
            to: self.to,
            date: self.date,
            departure_time: self.departure_time,
            bus_name: self.bus_name,
            bus_type: self.bus_type,
            seats: self.selection.as_slice().to_vec(),
            passengers: self.passengers,
            fare: self.fare.base_fare,
            flexi_purchased: self.fare.flexi_selected,
            flexi_fee: self.fare.flexi_fee,
            status: BookingStatus::Active,
            created_at: now,
            updated_at: now,
            original_booking_id: self.original_booking_id,
        }
    }
}

/// Pending rebook, held by the caller while the replacement journey is chosen.
///
/// Not `Clone`: it is consumed by [`crate::BookingManager::complete_rebook`].
/// Dropping it leaves the original booking untouched.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a rebook only takes effect when the intent is completed"]
pub struct RebookIntent {
    original_booking_id: BookingId,
    original_fare: Amount,
}

impl RebookIntent {
    pub(crate) fn new(original_booking_id: BookingId, original_fare: Amount) -> Self {
        Self {
            original_booking_id,
            original_fare,
        }
    }

    pub fn original_booking_id(&self) -> BookingId {
        self.original_booking_id
    }

    pub fn original_fare(&self) -> Amount {
        self.original_fare
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&BookingStatus::Reselled).unwrap(), "\"Reselled\"");
        assert_eq!(serde_json::to_string(&BookingStatus::ReBooked).unwrap(), "\"ReBooked\"");
        assert_eq!(BookingStatus::Active.to_string(), "Active");
        assert!(BookingStatus::ReBooked.is_terminal());
        assert!(!BookingStatus::Active.is_terminal());
    }

    #[test]
    fn test_passenger_debug_is_masked() {
        let seat = SeatId::parse("L7").unwrap();
        let passenger = Passenger::new("Rahul Sharma", 28, Gender::Male, seat);
        let debug = format!("{:?}", passenger);
        assert!(!debug.contains("Rahul"));

        let json = serde_json::to_value(&passenger).unwrap();
        assert_eq!(json["name"], "Rahul Sharma");
        assert_eq!(json["seat_number"], "L7");
    }
}
