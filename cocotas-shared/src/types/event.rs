use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

/// Realtime insert notification envelope.
///
/// ```json
/// {
///   "id":         "evt_a1b2c3d4",
///   "table":      "swipes",
///   "created_at": "2025-06-15T14:22:33.123Z",
///   "row":        { "swiper_id": "...", "swiped_id": "...", "direction": "right" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertEvent {
    /// Globally unique event identifier (format: `evt_<uuid-v4>`).
    pub id: String,

    /// Table the row was inserted into.
    pub table: String,

    /// The inserted row, undecoded.
    pub row: serde_json::Value,

    /// ISO-8601 timestamp (UTC).
    pub created_at: DateTime<Utc>,
}

impl InsertEvent {
    pub fn new(table: impl Into<String>, row: serde_json::Value) -> Self {
        Self {
            id: format!("evt_{}", uuid::Uuid::new_v4()),
            table: table.into(),
            row,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(id: impl Into<String>, table: impl Into<String>, row: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            table: table.into(),
            row,
            created_at: Utc::now(),
        }
    }

    /// Decode the carried row into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_value(self.row.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, NewSwipeDecision};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn event_ids_carry_the_evt_prefix() {
        let event = InsertEvent::new("swipes", json!({}));
        assert!(event.id.starts_with("evt_"));
        assert_eq!(event.table, "swipes");
    }

    #[test]
    fn decode_round_trips_the_row() {
        let decision = NewSwipeDecision {
            swiper_id: Uuid::new_v4(),
            swiped_id: Uuid::new_v4(),
            direction: Direction::Right,
        };
        let event = InsertEvent::new("swipes", serde_json::to_value(&decision).unwrap());
        let decoded: NewSwipeDecision = event.decode().unwrap();
        assert_eq!(decoded.swiper_id, decision.swiper_id);
        assert_eq!(decoded.direction, Direction::Right);
    }

    #[test]
    fn decode_surfaces_shape_mismatches() {
        let event = InsertEvent::new("swipes", json!({ "direction": "sideways" }));
        assert!(event.decode::<NewSwipeDecision>().is_err());
    }
}
