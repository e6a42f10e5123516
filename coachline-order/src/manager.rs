use crate::changes::ChangeHandler;
use crate::finance::ResellQuote;
use crate::models::{Booking, NewBooking, RebookIntent};
use crate::validation::validate_draft;
use chrono::Utc;
use coachline_catalog::{FareBreakdown, FareCalculator, RebookQuote, SeatLayout};
use coachline_core::{Amount, BookingId, EngineError, EngineResult};
use coachline_shared::{
    BookingCreatedEvent, BookingEvent, BookingRebookedEvent, BookingResoldEvent,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Events kept for [`BookingManager::drain_events`] before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

#[derive(Default)]
struct Ledger {
    bookings: HashMap<BookingId, Booking>,
    events: VecDeque<BookingEvent>,
}

impl Ledger {
    fn record(&mut self, event: BookingEvent, capacity: usize) {
        if capacity == 0 {
            return;
        }
        while self.events.len() >= capacity {
            if let Some(dropped) = self.events.pop_front() {
                tracing::warn!(
                    booking_id = %dropped.booking_id(),
                    capacity,
                    "event outbox full, oldest event dropped"
                );
            }
        }
        self.events.push_back(event);
    }
}

/// Owns every booking record and is the only writer of booking status.
///
/// Each mutation runs its eligibility check and its commit under one write
/// lock, so of two racing `resell`/`rebook` completions on the same booking
/// exactly one succeeds and the other sees `AlreadyResolved`.
///
/// Committed transitions are queued as [`BookingEvent`]s. The queue holds at most
/// `event_capacity` events (default [`DEFAULT_EVENT_CAPACITY`]); callers that
/// publish them must call [`Self::drain_events`] regularly or the oldest are lost.
/// A capacity of 0 turns event capture off.
pub struct BookingManager {
    ledger: RwLock<Ledger>,
    calculator: FareCalculator,
    layout: SeatLayout,
    event_capacity: usize,
}

impl BookingManager {
    pub fn new(calculator: FareCalculator, layout: SeatLayout) -> Self {
        Self {
            ledger: RwLock::new(Ledger::default()),
            calculator,
            layout,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn calculator(&self) -> &FareCalculator {
        &self.calculator
    }

    pub fn layout(&self) -> &SeatLayout {
        &self.layout
    }

    /// Record a new purchase. The booking always starts `Active`.
    ///
    /// A draft carrying `original_booking_id` is a rebook replacement: the
    /// predecessor must still be eligible and flips to `ReBooked` in the same commit.
    pub fn create(&self, draft: NewBooking) -> EngineResult<Booking> {
        self.commit(draft, None).map(|(booking, _)| booking)
    }

    /// Import an existing record (e.g. loaded from storage) as-is.
    pub fn seed(&self, booking: Booking) -> EngineResult<()> {
        let mut ledger = self.write()?;
        if ledger.bookings.contains_key(&booking.id) {
            return Err(EngineError::validation(
                "id",
                None,
                format!("booking {} already exists", booking.id),
            ));
        }
        tracing::debug!(booking_id = %booking.id, status = %booking.status, "booking seeded");
        ledger.bookings.insert(booking.id, booking);
        Ok(())
    }

    pub fn find_by_id(&self, booking_id: BookingId) -> EngineResult<Booking> {
        self.read()?
            .bookings
            .get(&booking_id)
            .cloned()
            .ok_or(EngineError::NotFound { booking_id })
    }

    /// All bookings, oldest first, taken under a single read lock.
    pub fn snapshot(&self) -> EngineResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self.read()?.bookings.values().cloned().collect();
        sort_by_creation(&mut bookings);
        Ok(bookings)
    }

    pub fn list_for_user(&self, user_id: &str) -> EngineResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .read()?
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        sort_by_creation(&mut bookings);
        Ok(bookings)
    }

    /// (active, past) for a user; past means any terminal status.
    pub fn partition_for_user(&self, user_id: &str) -> EngineResult<(Vec<Booking>, Vec<Booking>)> {
        Ok(self
            .list_for_user(user_id)?
            .into_iter()
            .partition(Booking::is_active))
    }

    /// List a booking for resale: Active → Reselled.
    ///
    /// The returned quote carries the processing fee due now and the refund
    /// for each possible outcome.
    pub fn resell(&self, booking_id: BookingId) -> EngineResult<ResellQuote> {
        let mut guard = self.write()?;
        let ledger = &mut *guard;

        let booking = ledger
            .bookings
            .get_mut(&booking_id)
            .ok_or(EngineError::NotFound { booking_id })?;
        ChangeHandler::ensure_flexi_eligible(booking)?;

        let quote = ResellQuote::for_booking(booking, &self.calculator)?;
        ChangeHandler::mark_reselled(booking)?;

        let event = BookingEvent::Resold(BookingResoldEvent {
            booking_id: booking_id.into(),
            user_id: booking.user_id.clone(),
            processing_fee: quote.processing_fee,
            timestamp: booking.updated_at,
        });
        ledger.record(event, self.event_capacity);

        tracing::info!(
            %booking_id,
            processing_fee = quote.processing_fee,
            refund_if_resold = quote.refund_if_resold,
            refund_if_unsold = quote.refund_if_unsold,
            "booking listed for resale"
        );
        Ok(quote)
    }

    /// Start a rebook. Checks eligibility but changes nothing: the original
    /// booking stays `Active` until [`Self::complete_rebook`] commits.
    pub fn rebook(&self, booking_id: BookingId) -> EngineResult<RebookIntent> {
        let ledger = self.read()?;
        let booking = ledger
            .bookings
            .get(&booking_id)
            .ok_or(EngineError::NotFound { booking_id })?;
        ChangeHandler::ensure_flexi_eligible(booking)?;

        tracing::info!(%booking_id, original_fare = booking.fare, "rebook initiated");
        Ok(RebookIntent::new(booking_id, booking.fare))
    }

    /// Create the replacement booking for `intent` and retire the original.
    pub fn complete_rebook(
        &self,
        intent: RebookIntent,
        mut draft: NewBooking,
    ) -> EngineResult<(Booking, RebookQuote)> {
        let original_id = intent.original_booking_id();
        if let Some(other) = draft.original_booking_id {
            if other != original_id {
                return Err(EngineError::validation(
                    "original_booking_id",
                    None,
                    format!("draft replaces {other} but the rebook was started for {original_id}"),
                ));
            }
        }
        draft.original_booking_id = Some(original_id);

        let (booking, quote) = self.commit(draft, Some(intent.original_fare()))?;
        let quote = quote
            .ok_or_else(|| EngineError::Internal("rebook committed without a quote".to_string()))?;
        Ok((booking, quote))
    }

    /// Hand committed events to the caller, oldest first.
    pub fn drain_events(&self) -> EngineResult<Vec<BookingEvent>> {
        Ok(std::mem::take(&mut self.write()?.events).into())
    }

    fn commit(
        &self,
        mut draft: NewBooking,
        expected_original_fare: Option<Amount>,
    ) -> EngineResult<(Booking, Option<RebookQuote>)> {
        if draft.original_booking_id.is_some() && draft.fare.flexi_selected {
            // The predecessor's Flexi is consumed by the rebook, not carried over or resold
            tracing::debug!("dropping flexi from rebook replacement");
            draft.fare = FareBreakdown {
                flexi_selected: false,
                flexi_fee: 0,
                total: draft.fare.base_fare,
                ..draft.fare
            };
        }
        validate_draft(&draft, &self.layout, &self.calculator)?;

        let mut guard = self.write()?;
        let ledger = &mut *guard;

        let quote = match draft.original_booking_id {
            Some(original_id) => {
                let predecessor = ledger
                    .bookings
                    .get(&original_id)
                    .ok_or(EngineError::NotFound { booking_id: original_id })?;
                ChangeHandler::ensure_flexi_eligible(predecessor)?;

                if let Some(expected) = expected_original_fare {
                    if expected != predecessor.fare {
                        return Err(EngineError::validation(
                            "original_fare",
                            None,
                            format!(
                                "rebook intent carries fare {expected}, \
                                 booking {original_id} has {}",
                                predecessor.fare
                            ),
                        ));
                    }
                }
                Some(self.calculator.rebook_quote(predecessor.fare, draft.fare.base_fare)?)
            }
            None => None,
        };

        let mut id = BookingId::new();
        while ledger.bookings.contains_key(&id) {
            id = BookingId::new();
        }
        let booking = draft.into_booking(id, Utc::now());

        if let Some(original_id) = booking.original_booking_id {
            let predecessor = ledger
                .bookings
                .get_mut(&original_id)
                .ok_or(EngineError::NotFound { booking_id: original_id })?;
            ChangeHandler::mark_rebooked(predecessor)?;
        }

        ledger.bookings.insert(id, booking.clone());
        let created = BookingEvent::Created(BookingCreatedEvent {
            booking_id: id.into(),
            user_id: booking.user_id.clone(),
            bus_run_id: booking.bus_run_id.clone(),
            seats: booking.seats.iter().map(|s| s.to_string()).collect(),
            fare: booking.fare,
            flexi_purchased: booking.flexi_purchased,
            original_booking_id: booking.original_booking_id.map(Into::into),
            timestamp: booking.created_at,
        });
        ledger.record(created, self.event_capacity);

        if let (Some(original_id), Some(quote)) = (booking.original_booking_id, quote) {
            let rebooked = BookingEvent::Rebooked(BookingRebookedEvent {
                booking_id: original_id.into(),
                replacement_booking_id: id.into(),
                fare_difference: quote.fare_difference,
                amount_to_pay: quote.amount_to_pay,
                timestamp: booking.created_at,
            });
            ledger.record(rebooked, self.event_capacity);
            tracing::info!(
                booking_id = %id,
                %original_id,
                fare_difference = quote.fare_difference,
                amount_to_pay = quote.amount_to_pay,
                "rebook completed"
            );
        }

        tracing::info!(
            booking_id = %id,
            user_id = %booking.user_id,
            seats = booking.seats.len(),
            fare = booking.fare,
            flexi = booking.flexi_purchased,
            "booking created"
        );
        tracing::debug!(booking_id = %id, passengers = ?booking.passengers, "passenger manifest");

        Ok((booking, quote))
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, Ledger>> {
        self.ledger
            .read()
            .map_err(|_| EngineError::Internal("booking ledger lock poisoned".to_string()))
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, Ledger>> {
        self.ledger
            .write()
            .map_err(|_| EngineError::Internal("booking ledger lock poisoned".to_string()))
    }
}

impl Default for BookingManager {
    fn default() -> Self {
        Self::new(FareCalculator::default(), SeatLayout::default())
    }
}

fn sort_by_creation(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
