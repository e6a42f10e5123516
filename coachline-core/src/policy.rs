use crate::Amount;
use serde::{Deserialize, Serialize};

/// Fees and limits applied at purchase and resell time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarePolicy {
    /// Flat Flexi add-on fee per booking
    #[serde(default = "default_flexi_fee")]
    pub flexi_fee: Amount,

    /// Charged to the seller when a resale listing is created
    #[serde(default = "default_resell_processing_fee")]
    pub resell_processing_fee: Amount,

    #[serde(default = "default_max_seats")]
    pub max_seats_per_booking: usize,
}

fn default_flexi_fee() -> Amount {
    50
}

fn default_resell_processing_fee() -> Amount {
    75
}

fn default_max_seats() -> usize {
    6
}

impl Default for FarePolicy {
    fn default() -> Self {
        Self {
            flexi_fee: default_flexi_fee(),
            resell_processing_fee: default_resell_processing_fee(),
            max_seats_per_booking: default_max_seats(),
        }
    }
}

impl FarePolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.flexi_fee < 0 {
            return Err(PolicyError::NegativeFee {
                field: "fares.flexi_fee",
                value: self.flexi_fee,
            });
        }
        if self.resell_processing_fee < 0 {
            return Err(PolicyError::NegativeFee {
                field: "fares.resell_processing_fee",
                value: self.resell_processing_fee,
            });
        }
        if self.max_seats_per_booking == 0 {
            return Err(PolicyError::ZeroSeatLimit);
        }
        Ok(())
    }
}

/// Shape of one deck of a 2+1 sleeper coach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPolicy {
    #[serde(default = "default_seats_per_deck")]
    pub seats_per_deck: u32,

    /// Pair plus single; anything other than 3 breaks the aisle split
    #[serde(default = "default_seats_per_row")]
    pub seats_per_row: u32,

    /// Lower-deck indices divisible by this are ladies seats. 0 disables the rule.
    #[serde(default = "default_ladies_interval")]
    pub ladies_seat_interval: u32,
}

fn default_seats_per_deck() -> u32 {
    18
}

fn default_seats_per_row() -> u32 {
    3
}

fn default_ladies_interval() -> u32 {
    3
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            seats_per_deck: default_seats_per_deck(),
            seats_per_row: default_seats_per_row(),
            ladies_seat_interval: default_ladies_interval(),
        }
    }
}

impl LayoutPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.seats_per_row != 3 {
            return Err(PolicyError::UnsupportedRowWidth(self.seats_per_row));
        }
        if self.seats_per_deck == 0 || self.seats_per_deck % self.seats_per_row != 0 {
            return Err(PolicyError::RaggedDeck {
                seats_per_deck: self.seats_per_deck,
                seats_per_row: self.seats_per_row,
            });
        }
        Ok(())
    }

    pub fn is_ladies_index(&self, index: u32) -> bool {
        self.ladies_seat_interval != 0 && index % self.ladies_seat_interval == 0
    }
}

/// Refund percentages for the two resale outcomes. The Flexi fee is never refunded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPolicy {
    #[serde(default = "default_resold_percent")]
    pub resold_refund_percent: u32,

    #[serde(default = "default_unsold_percent")]
    pub unsold_refund_percent: u32,
}

fn default_resold_percent() -> u32 {
    100
}

fn default_unsold_percent() -> u32 {
    50
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            resold_refund_percent: default_resold_percent(),
            unsold_refund_percent: default_unsold_percent(),
        }
    }
}

impl RefundPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (field, value) in [
            ("refunds.resold_refund_percent", self.resold_refund_percent),
            ("refunds.unsold_refund_percent", self.unsold_refund_percent),
        ] {
            if value > 100 {
                return Err(PolicyError::PercentOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("{field} must not be negative, got {value}")]
    NegativeFee { field: &'static str, value: Amount },

    #[error("fares.max_seats_per_booking must be at least 1")]
    ZeroSeatLimit,

    #[error("layout.seats_per_row must be 3 (pair + single), got {0}")]
    UnsupportedRowWidth(u32),

    #[error(
        "layout.seats_per_deck ({seats_per_deck}) must be a positive multiple \
         of seats_per_row ({seats_per_row})"
    )]
    RaggedDeck { seats_per_deck: u32, seats_per_row: u32 },

    #[error("{field} must be between 0 and 100, got {value}")]
    PercentOutOfRange { field: &'static str, value: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(FarePolicy::default().validate().is_ok());
        assert!(LayoutPolicy::default().validate().is_ok());
        assert!(RefundPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let fares: FarePolicy = serde_json::from_str(r#"{"flexi_fee": 60}"#).unwrap();
        assert_eq!(fares.flexi_fee, 60);
        assert_eq!(fares.resell_processing_fee, 75);
        assert_eq!(fares.max_seats_per_booking, 6);
    }

    #[test]
    fn test_ladies_index() {
        let layout = LayoutPolicy::default();
        assert!(layout.is_ladies_index(3));
        assert!(layout.is_ladies_index(18));
        assert!(!layout.is_ladies_index(7));

        let disabled = LayoutPolicy {
            ladies_seat_interval: 0,
            ..LayoutPolicy::default()
        };
        assert!(!disabled.is_ladies_index(3));
    }

    #[test]
    fn test_invalid_policies() {
        let layout = LayoutPolicy {
            seats_per_row: 4,
            ..LayoutPolicy::default()
        };
        assert_eq!(layout.validate(), Err(PolicyError::UnsupportedRowWidth(4)));

        let layout = LayoutPolicy {
            seats_per_deck: 17,
            ..LayoutPolicy::default()
        };
        assert!(matches!(layout.validate(), Err(PolicyError::RaggedDeck { .. })));

        let refunds = RefundPolicy {
            unsold_refund_percent: 150,
            ..RefundPolicy::default()
        };
        assert!(matches!(
            refunds.validate(),
            Err(PolicyError::PercentOutOfRange { value: 150, .. })
        ));

        let fares = FarePolicy {
            max_seats_per_booking: 0,
            ..FarePolicy::default()
        };
        assert_eq!(fares.validate(), Err(PolicyError::ZeroSeatLimit));
    }
}
