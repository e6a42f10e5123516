use chrono::{NaiveDate, NaiveTime};
use coachline_core::{Amount, EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Deck of a double-decker sleeper coach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deck {
    Lower,
    Upper,
}

impl Deck {
    pub const ALL: [Deck; 2] = [Deck::Lower, Deck::Upper];

    pub fn prefix(self) -> char {
        match self {
            Deck::Lower => 'L',
            Deck::Upper => 'U',
        }
    }

    fn from_prefix(c: char) -> Option<Self> {
        match c {
            'L' => Some(Deck::Lower),
            'U' => Some(Deck::Upper),
            _ => None,
        }
    }
}

/// Seat identifier: deck prefix plus 1-based index, e.g. `L7`, `U3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatId {
    deck: Deck,
    index: u32,
}

impl SeatId {
    /// Callers guarantee `index >= 1`; external input goes through [`SeatId::parse`].
    pub(crate) fn new(deck: Deck, index: u32) -> Self {
        Self { deck, index }
    }

    pub fn parse(raw: &str) -> EngineResult<Self> {
        let mut chars = raw.chars();
        let deck = chars
            .next()
            .and_then(Deck::from_prefix)
            .ok_or_else(|| {
                EngineError::selection(Some(raw), "seat must start with deck prefix L or U")
            })?;

        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::selection(Some(raw), "seat index must be a positive number"));
        }

        let index: u32 = digits
            .parse()
            .map_err(|_| EngineError::selection(Some(raw), "seat index out of range"))?;
        if index == 0 {
            return Err(EngineError::selection(Some(raw), "seat index starts at 1"));
        }

        Ok(Self { deck, index })
    }

    pub fn deck(&self) -> Deck {
        self.deck
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.deck.prefix(), self.index)
    }
}

impl FromStr for SeatId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SeatId {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SeatId> for String {
    fn from(seat: SeatId) -> Self {
        seat.to_string()
    }
}

/// A single scheduled departure as returned by the inventory search.
/// Immutable snapshot: nothing in the engine writes to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusRun {
    pub id: String,
    pub operator: String,
    /// Marketing label, e.g. "AC Sleeper (2+1)"
    pub bus_type: String,
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub duration: String,
    pub total_seats: u32,
    pub price_per_seat: Amount,
    pub rating: f32,
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Seats already sold to other customers
    #[serde(default)]
    pub booked_seats: HashSet<SeatId>,
}

impl BusRun {
    pub fn is_booked(&self, seat: &SeatId) -> bool {
        self.booked_seats.contains(seat)
    }

    pub fn seats_available(&self) -> u32 {
        let booked = u32::try_from(self.booked_seats.len()).unwrap_or(u32::MAX);
        self.total_seats.saturating_sub(booked)
    }

    pub fn serves(&self, query: &SearchQuery) -> bool {
        self.date == query.date
            && self.from.eq_ignore_ascii_case(query.from.trim())
            && self.to.eq_ignore_ascii_case(query.to.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
}

/// Quick filters offered over a search result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusTypeFilter {
    #[default]
    All,
    Ac,
    NonAc,
    Sleeper,
    Seater,
}

impl BusTypeFilter {
    pub fn matches(self, bus_type: &str) -> bool {
        let label = bus_type.to_ascii_lowercase();
        let words: Vec<&str> = label
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-'))
            .collect();
        let non_ac = words.contains(&"non-ac");

        match self {
            BusTypeFilter::All => true,
            BusTypeFilter::Ac => !non_ac && words.contains(&"ac"),
            BusTypeFilter::NonAc => non_ac,
            BusTypeFilter::Sleeper => words.contains(&"sleeper"),
            BusTypeFilter::Seater => words.contains(&"seater"),
        }
    }
}

/// Runs on the requested route and date whose type passes `filter`, in input order.
pub fn search<'a>(
    runs: &'a [BusRun],
    query: &SearchQuery,
    filter: BusTypeFilter,
) -> Vec<&'a BusRun> {
    let results: Vec<&BusRun> = runs
        .iter()
        .filter(|run| run.serves(query) && filter.matches(&run.bus_type))
        .collect();

    tracing::debug!(
        from = %query.from,
        to = %query.to,
        date = %query.date,
        ?filter,
        matches = results.len(),
        "bus search"
    );
    results
}
