use crate::inventory::BusRun;
use crate::layout::SeatSelection;
use coachline_core::{Amount, EngineError, EngineResult, FarePolicy, RefundPolicy};
use serde::{Deserialize, Serialize};

/// Amounts due at purchase time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub base_fare: Amount,
    pub flexi_selected: bool,
    pub flexi_fee: Amount,
    pub total: Amount,
}

/// Fare reconciliation for moving an existing booking to a new journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebookQuote {
    pub original_fare: Amount,
    pub new_base_fare: Amount,
    /// Signed: negative when the new journey is cheaper
    pub fare_difference: Amount,
    /// Never negative. A cheaper journey is not refunded.
    pub amount_to_pay: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResaleOutcome {
    /// Another customer bought the seats before departure
    Resold,
    /// Departure passed with the listing still open
    Unsold,
}

/// Pure fare arithmetic. Holds policy only, no state.
#[derive(Debug, Clone, Default)]
pub struct FareCalculator {
    fares: FarePolicy,
    refunds: RefundPolicy,
}

impl FareCalculator {
    pub fn new(fares: FarePolicy, refunds: RefundPolicy) -> Self {
        Self { fares, refunds }
    }

    /// `price_per_seat × |selection|`
    pub fn base_fare(&self, run: &BusRun, selection: &SeatSelection) -> EngineResult<Amount> {
        self.base_fare_at(run.price_per_seat, selection)
    }

    /// Base fare for a selection at a given seat price, e.g. one recorded on a booking draft.
    pub fn base_fare_at(
        &self,
        price_per_seat: Amount,
        selection: &SeatSelection,
    ) -> EngineResult<Amount> {
        if selection.is_empty() {
            return Err(EngineError::selection(None, "cannot price an empty seat selection"));
        }
        if selection.len() > self.fares.max_seats_per_booking {
            return Err(EngineError::selection(
                None,
                format!(
                    "{} seats selected, at most {} allowed",
                    selection.len(),
                    self.fares.max_seats_per_booking
                ),
            ));
        }
        if price_per_seat < 0 {
            return Err(EngineError::fare(format!("negative seat price {price_per_seat}")));
        }

        let seats = Amount::try_from(selection.len())
            .map_err(|_| EngineError::fare("seat count does not fit an amount"))?;
        price_per_seat.checked_mul(seats).ok_or_else(|| {
            EngineError::fare(format!("base fare overflow at seat price {price_per_seat}"))
        })
    }

    pub fn flexi_fee(&self, flexi_selected: bool) -> Amount {
        if flexi_selected {
            self.fares.flexi_fee
        } else {
            0
        }
    }

    pub fn breakdown(
        &self,
        run: &BusRun,
        selection: &SeatSelection,
        flexi_selected: bool,
    ) -> EngineResult<FareBreakdown> {
        self.breakdown_at(run.price_per_seat, selection, flexi_selected)
    }

    pub fn breakdown_at(
        &self,
        price_per_seat: Amount,
        selection: &SeatSelection,
        flexi_selected: bool,
    ) -> EngineResult<FareBreakdown> {
        let base_fare = self.base_fare_at(price_per_seat, selection)?;
        let flexi_fee = self.flexi_fee(flexi_selected);
        if flexi_fee < 0 {
            return Err(EngineError::fare(format!("negative flexi fee {flexi_fee}")));
        }
        let total = base_fare
            .checked_add(flexi_fee)
            .ok_or_else(|| EngineError::fare("purchase total overflow"))?;

        Ok(FareBreakdown {
            base_fare,
            flexi_selected,
            flexi_fee,
            total,
        })
    }

    /// Difference between the replacement journey and the fare already paid.
    ///
    /// The Flexi fee plays no part: it is consumed by the rebook, not bought again.
    pub fn rebook_quote(
        &self,
        original_fare: Amount,
        new_base_fare: Amount,
    ) -> EngineResult<RebookQuote> {
        if original_fare < 0 {
            return Err(EngineError::fare(format!("negative original fare {original_fare}")));
        }
        if new_base_fare < 0 {
            return Err(EngineError::fare(format!("negative new base fare {new_base_fare}")));
        }

        // Both operands are non-negative, so this cannot overflow
        let fare_difference = new_base_fare - original_fare;
        let amount_to_pay = fare_difference.max(0);

        Ok(RebookQuote {
            original_fare,
            new_base_fare,
            fare_difference,
            amount_to_pay,
        })
    }

    /// Refund of the base fare for a resale outcome, rounded down to whole units.
    pub fn resell_refund(&self, fare: Amount, outcome: ResaleOutcome) -> EngineResult<Amount> {
        if fare < 0 {
            return Err(EngineError::fare(format!("negative fare {fare}")));
        }
        let percent = match outcome {
            ResaleOutcome::Resold => self.refunds.resold_refund_percent,
            ResaleOutcome::Unsold => self.refunds.unsold_refund_percent,
        };

        fare.checked_mul(Amount::from(percent))
            .map(|scaled| scaled / 100)
            .ok_or_else(|| EngineError::fare(format!("refund overflow for fare {fare}")))
    }

    pub fn resell_processing_fee(&self) -> Amount {
        self.fares.resell_processing_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::fixtures::{orange_travels, seat};
    use crate::inventory::SeatId;
    use crate::layout::SeatLayout;
    use proptest::prelude::*;

    fn selection(seats: &[&str]) -> SeatSelection {
        let ids: Vec<SeatId> = seats.iter().map(|s| seat(s)).collect();
        SeatSelection::try_from_ids(&ids, &orange_travels(), &SeatLayout::default()).unwrap()
    }

    #[test]
    fn test_purchase_breakdown() {
        let calc = FareCalculator::default();
        let run = orange_travels();

        let breakdown = calc.breakdown(&run, &selection(&["L7", "L9"]), true).unwrap();
        assert_eq!(breakdown.base_fare, 1798);
        assert_eq!(breakdown.flexi_fee, 50);
        assert_eq!(breakdown.total, 1848);
        assert!(breakdown.flexi_selected);

        let breakdown = calc.breakdown(&run, &selection(&["L7"]), false).unwrap();
        assert_eq!(breakdown.total, 899);
        assert!(!breakdown.flexi_selected);
    }

    #[test]
    fn test_empty_selection() {
        let calc = FareCalculator::default();
        let err = calc.base_fare(&orange_travels(), &SeatSelection::new()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSelection { .. }));
    }

    #[test]
    fn test_negative_price() {
        let calc = FareCalculator::default();
        let mut run = orange_travels();
        run.price_per_seat = -1;
        let err = calc.base_fare(&run, &selection(&["L7"])).unwrap_err();
        assert!(matches!(err, EngineError::InvalidFare { .. }));

        let err = calc.breakdown_at(-5, &selection(&["L7"]), true).unwrap_err();
        assert!(matches!(err, EngineError::InvalidFare { .. }));
    }

    #[test]
    fn test_rebook_quote() {
        let calc = FareCalculator::default();

        let cheaper = calc.rebook_quote(1798, 1200).unwrap();
        assert_eq!(cheaper.fare_difference, -598);
        assert_eq!(cheaper.amount_to_pay, 0);

        let dearer = calc.rebook_quote(1798, 2200).unwrap();
        assert_eq!(dearer.fare_difference, 402);
        assert_eq!(dearer.amount_to_pay, 402);

        let same = calc.rebook_quote(1798, 1798).unwrap();
        assert_eq!(same.amount_to_pay, 0);

        assert!(matches!(calc.rebook_quote(-1, 100), Err(EngineError::InvalidFare { .. })));
        assert!(matches!(calc.rebook_quote(100, -1), Err(EngineError::InvalidFare { .. })));
    }

    #[test]
    fn test_resell_refund() {
        let calc = FareCalculator::default();
        assert_eq!(calc.resell_refund(1798, ResaleOutcome::Resold).unwrap(), 1798);
        assert_eq!(calc.resell_refund(1798, ResaleOutcome::Unsold).unwrap(), 899);
        assert_eq!(calc.resell_refund(899, ResaleOutcome::Unsold).unwrap(), 449);
        assert_eq!(calc.resell_processing_fee(), 75);
    }

    #[test]
    fn test_custom_policy() {
        let calc = FareCalculator::new(
            FarePolicy {
                flexi_fee: 80,
                ..FarePolicy::default()
            },
            RefundPolicy {
                unsold_refund_percent: 25,
                ..RefundPolicy::default()
            },
        );
        assert_eq!(calc.flexi_fee(true), 80);
        assert_eq!(calc.flexi_fee(false), 0);
        assert_eq!(calc.resell_refund(1000, ResaleOutcome::Unsold).unwrap(), 250);
    }

    proptest! {
        #[test]
        fn prop_base_fare_is_price_times_seats(price in 0i64..100_000, count in 1usize..=6) {
            let calc = FareCalculator::default();
            let mut run = orange_travels();
            run.booked_seats.clear();
            run.price_per_seat = price;

            let ids: Vec<SeatId> = (1..=count as u32)
                .map(|i| SeatId::new(crate::inventory::Deck::Upper, i))
                .collect();
            let selection =
                SeatSelection::try_from_ids(&ids, &run, &SeatLayout::default()).unwrap();

            prop_assert_eq!(calc.base_fare(&run, &selection).unwrap(), price * count as i64);
            prop_assert_eq!(calc.base_fare_at(price, &selection).unwrap(), price * count as i64);
        }

        #[test]
        fn prop_rebook_never_charges_negative(original in 0i64..1_000_000, new in 0i64..1_000_000) {
            let quote = FareCalculator::default().rebook_quote(original, new).unwrap();
            prop_assert!(quote.amount_to_pay >= 0);
            prop_assert_eq!(quote.fare_difference, new - original);
            prop_assert_eq!(quote.amount_to_pay, (new - original).max(0));
        }
    }
}
