use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub user_id: String,
    pub bus_run_id: String,
    pub seats: Vec<String>,
    pub fare: i64,
    pub flexi_purchased: bool,
    pub original_booking_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct BookingResoldEvent {
    pub booking_id: Uuid,
    pub user_id: String,
    /// Charged to the seller when the listing is created
    pub processing_fee: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct BookingRebookedEvent {
    pub booking_id: Uuid,
    pub replacement_booking_id: Uuid,
    pub fare_difference: i64,
    pub amount_to_pay: i64,
    pub timestamp: DateTime<Utc>,
}

/// Committed lifecycle transitions, in commit order.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEvent {
    Created(BookingCreatedEvent),
    Resold(BookingResoldEvent),
    Rebooked(BookingRebookedEvent),
}

impl BookingEvent {
    pub fn booking_id(&self) -> Uuid {
        match self {
            BookingEvent::Created(e) => e.booking_id,
            BookingEvent::Resold(e) => e.booking_id,
            BookingEvent::Rebooked(e) => e.booking_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = BookingEvent::Resold(BookingResoldEvent {
            booking_id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            processing_fee: 75,
            timestamp: Utc::now(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RESOLD");
        assert_eq!(json["processing_fee"], 75);

        let back: BookingEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
