//! Seat map projection and seat selection.
//!
//! Seat status is never stored. It is recomputed from the run's booked set and the
//! caller's current selection every time a map is requested, so there is no seat
//! entity that could drift out of sync with the inventory snapshot.

use crate::inventory::{BusRun, Deck, SeatId};
use coachline_core::{EngineError, EngineResult, FarePolicy, LayoutPolicy, PolicyError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Booked,
    Ladies,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    pub deck: Deck,
    pub status: SeatStatus,
}

/// One row of a 2+1 layout: a pair on one side of the aisle, a single on the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRow {
    pub pair: [Seat; 2],
    pub single: Seat,
}

/// Ordered, duplicate-free list of seats the caller is holding for purchase.
///
/// Deserializing rejects duplicates. Size and deck bounds depend on policy and
/// are checked by [`SeatSelection::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SeatId>", into = "Vec<SeatId>")]
pub struct SeatSelection(Vec<SeatId>);

impl SeatSelection {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Validate a complete caller-supplied selection against the run.
    pub fn try_from_ids(ids: &[SeatId], run: &BusRun, layout: &SeatLayout) -> EngineResult<Self> {
        let selection = Self(ids.to_vec());
        selection.validate(layout)?;

        if let Some(taken) = selection.iter().find(|seat| run.is_booked(seat)) {
            let raw = taken.to_string();
            return Err(EngineError::selection(
                Some(&raw),
                format!("seat {raw} is already booked"),
            ));
        }
        Ok(selection)
    }

    /// Shape check for a purchase: 1..=max seats, no duplicates, every seat on the coach.
    pub fn validate(&self, layout: &SeatLayout) -> EngineResult<()> {
        if self.0.is_empty() {
            return Err(EngineError::selection(None, "at least one seat must be selected"));
        }
        if self.0.len() > layout.max_seats() {
            return Err(EngineError::selection(
                None,
                format!("{} seats selected, at most {} allowed", self.0.len(), layout.max_seats()),
            ));
        }

        let mut seen = HashSet::with_capacity(self.0.len());
        for seat in &self.0 {
            let raw = seat.to_string();
            if !seen.insert(*seat) {
                return Err(EngineError::selection(
                    Some(&raw),
                    format!("seat {raw} selected twice"),
                ));
            }
            if !layout.is_on_deck(seat) {
                return Err(EngineError::selection(
                    Some(&raw),
                    format!("seat {raw} does not exist on this coach"),
                ));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, seat: &SeatId) -> bool {
        self.0.contains(seat)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeatId> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[SeatId] {
        &self.0
    }

    fn with(&self, seat: SeatId) -> Self {
        let mut seats = self.0.clone();
        seats.push(seat);
        Self(seats)
    }

    fn without(&self, seat: &SeatId) -> Self {
        Self(self.0.iter().filter(|s| *s != seat).copied().collect())
    }
}

impl TryFrom<Vec<SeatId>> for SeatSelection {
    type Error = EngineError;

    fn try_from(seats: Vec<SeatId>) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(seats.len());
        if let Some(dup) = seats.iter().find(|seat| !seen.insert(**seat)) {
            let raw = dup.to_string();
            return Err(EngineError::selection(
                Some(&raw),
                format!("seat {raw} selected twice"),
            ));
        }
        Ok(Self(seats))
    }
}

impl From<SeatSelection> for Vec<SeatId> {
    fn from(selection: SeatSelection) -> Self {
        selection.0
    }
}

/// What a toggle request did. The `Rejected*` outcomes leave the selection
/// unchanged; they are not errors, callers may choose to warn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToggleOutcome {
    Added,
    Removed,
    RejectedBooked,
    RejectedCapacity,
    /// Seat id outside the coach's decks
    RejectedOffDeck,
}

impl ToggleOutcome {
    pub fn changed(self) -> bool {
        matches!(self, ToggleOutcome::Added | ToggleOutcome::Removed)
    }
}

#[derive(Debug, Clone)]
pub struct SeatLayout {
    policy: LayoutPolicy,
    max_seats: usize,
}

impl Default for SeatLayout {
    fn default() -> Self {
        Self {
            policy: LayoutPolicy::default(),
            max_seats: FarePolicy::default().max_seats_per_booking,
        }
    }
}

impl SeatLayout {
    pub fn new(policy: LayoutPolicy, fares: &FarePolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        fares.validate()?;
        Ok(Self {
            policy,
            max_seats: fares.max_seats_per_booking,
        })
    }

    pub fn max_seats(&self) -> usize {
        self.max_seats
    }

    pub fn is_on_deck(&self, seat: &SeatId) -> bool {
        (1..=self.policy.seats_per_deck).contains(&seat.index())
    }

    /// Booked beats selected beats ladies beats available.
    pub fn classify(&self, run: &BusRun, selection: &SeatSelection, seat: &SeatId) -> SeatStatus {
        if run.is_booked(seat) {
            SeatStatus::Booked
        } else if selection.contains(seat) {
            SeatStatus::Selected
        } else if seat.deck() == Deck::Lower && self.policy.is_ladies_index(seat.index()) {
            SeatStatus::Ladies
        } else {
            SeatStatus::Available
        }
    }

    /// All seats of one deck in index order.
    pub fn derive_seats(&self, run: &BusRun, deck: Deck, selection: &SeatSelection) -> Vec<Seat> {
        (1..=self.policy.seats_per_deck)
            .map(|index| {
                let id = SeatId::new(deck, index);
                Seat {
                    id,
                    deck,
                    status: self.classify(run, selection, &id),
                }
            })
            .collect()
    }

    /// Seats of one deck grouped front to back into pair + single rows.
    pub fn derive_rows(&self, run: &BusRun, deck: Deck, selection: &SeatSelection) -> Vec<SeatRow> {
        let width = self.policy.seats_per_row as usize;
        self.derive_seats(run, deck, selection)
            .chunks_exact(width)
            .filter_map(|row| match *row {
                [first, second, single] => Some(SeatRow {
                    pair: [first, second],
                    single,
                }),
                _ => None,
            })
            .collect()
    }

    /// Add or remove `seat` given the status the caller last saw for it.
    ///
    /// Returns the new selection; on a rejected toggle it equals the input.
    pub fn toggle_seat(
        &self,
        selection: &SeatSelection,
        seat: SeatId,
        status: SeatStatus,
    ) -> (SeatSelection, ToggleOutcome) {
        if !self.is_on_deck(&seat) {
            tracing::warn!(%seat, "toggle on seat outside the coach ignored");
            return (selection.clone(), ToggleOutcome::RejectedOffDeck);
        }

        if status == SeatStatus::Booked {
            tracing::warn!(%seat, "toggle on booked seat ignored");
            return (selection.clone(), ToggleOutcome::RejectedBooked);
        }

        if selection.contains(&seat) {
            tracing::debug!(%seat, "seat deselected");
            return (selection.without(&seat), ToggleOutcome::Removed);
        }

        if selection.len() >= self.max_seats {
            tracing::warn!(%seat, max = self.max_seats, "seat limit reached, toggle ignored");
            return (selection.clone(), ToggleOutcome::RejectedCapacity);
        }

        tracing::debug!(%seat, "seat selected");
        (selection.with(seat), ToggleOutcome::Added)
    }
}
